/*!

  A small register-and-stack bytecode virtual machine. A front end compiles a
  minimal procedural language into an ordered sequence of typed operations;
  this crate is the engine that executes such a sequence.

  The machine owns four stores: a role-indexed register file, an addressable
  auxiliary memory with single-assignment slots, a fixed-capacity value stack,
  and a symbol table mapping labels to program-counter addresses. A program is
  loaded behind a synthetic prologue that calls the entry label and halts, its
  labels are collected in one forward scan, and execution is a synchronous
  fetch-decode-execute loop that stops at `EXIT` or at the first error.

*/

#[macro_use]
extern crate prettytable;
#[macro_use]
extern crate lazy_static;

pub mod error;
pub mod machine;
pub mod memory;
pub mod object;
pub mod operation;
pub mod program;
pub mod register;
pub mod stack;
pub mod symbol_table;

pub use crate::error::MachineError;
pub use crate::machine::{Machine, Status, StreamKind, ENTRY_LABEL_ID, ROOT_LABEL_ID};
pub use crate::object::Object;
pub use crate::operation::{Opcode, Operation};
pub use crate::program::Program;
pub use crate::register::{RegisterFile, RegisterKind};
