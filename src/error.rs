//! The failure taxonomy of the execution engine. Every operation handler returns
//! `Result<_, MachineError>` and propagates with `?`; the dispatch loop stops at
//! the first error and leaves the machine state inspectable.

use thiserror::Error;

use crate::object::Object;
use crate::operation::Opcode;
use crate::register::RegisterKind;

#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum MachineError {
  /// An operand position holds an object of the wrong kind for its opcode.
  #[error("{opcode} expects {expected}, got {found}")]
  OperandKind {
    opcode   :  Opcode,
    expected :  &'static str,
    found    :  Object
  },

  /// An operand position an opcode requires is absent.
  #[error("{opcode} is missing operand {index}")]
  MissingOperand {
    opcode :  Opcode,
    index  :  usize
  },

  #[error("label {0} is not defined")]
  UnboundLabel(String),

  #[error("label {0} is already defined")]
  RedefinedLabel(String),

  #[error("register {0} holds no value")]
  EmptyRegister(RegisterKind),

  #[error("memory key {0} is not bound to an address")]
  UnboundKey(String),

  #[error("memory address {0} is empty")]
  EmptyAddress(usize),

  #[error("memory address {0} is already occupied")]
  OccupiedAddress(usize),

  #[error("memory address {address} is outside 0..{size}")]
  AddressOutOfRange {
    address :  usize,
    size    :  usize
  },

  #[error("memory has no empty slot left (size {size})")]
  MemoryFull {
    size :  usize
  },

  #[error("stack has no empty slot left (size {size})")]
  StackFull {
    size :  usize
  },

  #[error("stack holds no value")]
  StackEmpty,

  #[error("return address on the stack is {0}, not a reference")]
  ReturnNotReference(Object),

  #[error("boolean flag register holds {0}, not a boolean")]
  FlagNotBoolean(Object),

  #[error("{0} selects no output stream")]
  BadStream(Object),

  #[error("cannot apply an arithmetic offset to {0}")]
  NonNumeric(Object),

  #[error("arithmetic produced an invalid character value {0}")]
  CharOutOfRange(i64),

  #[error("program counter {pc} is outside the loaded program (length {len})")]
  PcOutOfRange {
    pc  :  i64,
    len :  usize
  },

  #[error("write syscall failed: {0}")]
  WriteFailed(String)
}
