//! The execution engine: owns the register file, memory, stack, symbol table,
//! and the loaded program, and implements the fetch-decode-execute loop.
//!
//! A machine is single-owner: one instance must not be driven by more than one
//! thread at a time, but separate instances share nothing and may run
//! concurrently without coordination.

use std::fmt::{Display, Formatter};
use std::io::{self, Write};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use prettytable::{format as TableFormat, Table};
use strum::IntoEnumIterator;
use strum_macros::Display as StrumDisplay;

use crate::error::MachineError;
use crate::memory::Memory;
use crate::object::Object;
use crate::operation::{Opcode, Operation};
use crate::program::Program;
use crate::register::{RegisterFile, RegisterKind};
use crate::stack::Stack;
use crate::symbol_table::{label_key, SymbolTable};

/// Id of the synthetic label the load prologue defines; execution starts here.
pub const ROOT_LABEL_ID: i64 = -1;
/// Id of the label conventionally bound to the program's entry point.
pub const ENTRY_LABEL_ID: i64 = 0;

/// Execution status, stored in the STATUS register as an integer payload.
#[derive(StrumDisplay, TryFromPrimitive, IntoPrimitive, Clone, Copy, Eq, PartialEq, Debug)]
#[repr(i64)]
pub enum Status {
  #[strum(serialize = "SUCCESS")]
  Success = 0,
  #[strum(serialize = "ERROR")]
  Error = 1
}

/**
  Selector for the write syscall's two logical streams. The backing integer
  encoding is an implementation detail; programs obtain a selector operand
  through the `From<StreamKind> for Object` conversion.
*/
#[derive(StrumDisplay, TryFromPrimitive, IntoPrimitive, Clone, Copy, Eq, PartialEq, Debug)]
#[repr(i64)]
pub enum StreamKind {
  #[strum(serialize = "STANDARD_OUT")]
  StandardOut = 2,
  #[strum(serialize = "STANDARD_ERROR")]
  StandardError = 3
}

impl From<StreamKind> for Object {
  fn from(stream: StreamKind) -> Object {
    Object::Int(i64::from(stream))
  }
}

/// Outcome of dispatching one operation.
enum Flow {
  Continue,
  Halt
}

pub struct Machine {
  registers :  RegisterFile,
  memory    :  Memory,
  stack     :  Stack,
  symbols   :  SymbolTable,
  program   :  Program,
  stdout    :  Box<dyn Write + Send>,
  stderr    :  Box<dyn Write + Send>
}

impl Machine {

  // region Construction and accessors

  /// A machine wired to the process's standard streams.
  pub fn new(stack_size: usize, memory_size: usize) -> Machine {
    Machine::with_streams(
      stack_size,
      memory_size,
      Box::new(io::stdout()),
      Box::new(io::stderr())
    )
  }

  /// A machine with injected output sinks, for tests and embedders.
  pub fn with_streams(
    stack_size  :  usize,
    memory_size :  usize,
    stdout      :  Box<dyn Write + Send>,
    stderr      :  Box<dyn Write + Send>
  ) -> Machine
  {
    Machine {
      registers :  RegisterFile::new(),
      memory    :  Memory::new(memory_size),
      stack     :  Stack::new(stack_size),
      symbols   :  SymbolTable::new(),
      program   :  Program::default(),
      stdout,
      stderr
    }
  }

  // The stores stay inspectable after a failed run.

  pub fn registers(&self) -> &RegisterFile {
    &self.registers
  }

  pub fn memory(&self) -> &Memory {
    &self.memory
  }

  pub fn stack(&self) -> &Stack {
    &self.stack
  }

  pub fn symbols(&self) -> &SymbolTable {
    &self.symbols
  }

  /// Mutable symbol access, so a harness can re-register labels between runs.
  pub fn symbols_mut(&mut self) -> &mut SymbolTable {
    &mut self.symbols
  }

  pub fn program(&self) -> &Program {
    &self.program
  }

  /// The decoded STATUS register, if it holds a known status value.
  pub fn status(&self) -> Option<Status> {
    self
      .registers
      .get(RegisterKind::Status)
      .and_then(|object| Status::try_from(object.payload()).ok())
  }

  // endregion

  // region Program lifecycle

  /**
    Stores `program` behind a startup prologue: define the root label, call
    the entry label, halt. Running the combined program therefore begins at
    the user's entry function and stops when it returns.
  */
  pub fn load(&mut self, program: Program) {
    let mut operations = vec![
      Operation::def_label(Object::label(ROOT_LABEL_ID)),
      Operation::call(Object::label(ENTRY_LABEL_ID)),
      Operation::exit(),
    ];
    operations.extend(program);
    self.program = Program::new(operations);
  }

  /**
    Single forward scan over the loaded program recording the program-counter
    address of every label definition. A non-label operand or a repeated id
    is an error.
  */
  pub fn collect_labels(&mut self) -> Result<(), MachineError> {
    for (pc, operation) in self.program.iter().enumerate() {
      if operation.opcode() != Opcode::DefLabel {
        continue;
      }
      match operation.param(0) {

        Some(Object::Label(id)) => {
          self.symbols.set(&label_key(*id), pc)?;
        }

        Some(other) => {
          return Err(MachineError::OperandKind {
            opcode   :  Opcode::DefLabel,
            expected :  "a label operand",
            found    :  other.clone()
          });
        }

        None => {
          return Err(MachineError::MissingOperand { opcode: Opcode::DefLabel, index: 0 });
        }

      }
    }
    Ok(())
  }

  /**
    Resolves the root label, points the program counter at it, marks the
    status successful, and loops fetch / advance / dispatch until an `EXIT`
    or the first error.

    Any handler failure stops the loop immediately: the status register is
    set to the error sentinel, the structured error is returned, and no
    partial mutation is rolled back.
  */
  pub fn run(&mut self) -> Result<(), MachineError> {
    let entry_point_address = self.symbols.get(&label_key(ROOT_LABEL_ID))?;
    self.set_pc(entry_point_address);
    self.set_status(Status::Success);

    loop {
      let operation = match self.consume_op() {
        Ok(operation) => operation,
        Err(error) => {
          self.set_status(Status::Error);
          return Err(error);
        }
      };

      #[cfg(feature = "trace_computation")]
      println!("{}", operation);

      match self.dispatch(&operation) {

        Ok(Flow::Halt) => {
          break;
        }

        Ok(Flow::Continue) => {}

        Err(error) => {
          self.set_status(Status::Error);
          return Err(error);
        }

      }

      #[cfg(feature = "trace_computation")]
      println!("{}", self);
    }
    Ok(())
  }

  // endregion

  // region Fetch cycle

  /// Fetches the operation under the program counter and advances past it.
  fn consume_op(&mut self) -> Result<Operation, MachineError> {
    let pc = self.registers.require(RegisterKind::ProgramCounter)?.payload();
    let len = self.program.len();
    let operation = match usize::try_from(pc).ok().and_then(|pc| self.program.get(pc)) {
      Some(operation) => operation.clone(),
      None            => return Err(MachineError::PcOutOfRange { pc, len })
    };
    self.advance()?;
    Ok(operation)
  }

  /// Increments the program counter. Runs once per fetch, before the handler,
  /// so `JUMP` and `CALL` overwrite a just-incremented counter.
  fn advance(&mut self) -> Result<(), MachineError> {
    let pc = self.registers.require(RegisterKind::ProgramCounter)?.payload();
    self.registers.set(RegisterKind::ProgramCounter, Object::Int(pc + 1));
    Ok(())
  }

  fn set_pc(&mut self, address: usize) {
    self.registers.set(RegisterKind::ProgramCounter, Object::Int(address as i64));
  }

  fn set_status(&mut self, status: Status) {
    self.registers.set(RegisterKind::Status, Object::Int(i64::from(status)));
  }

  fn dispatch(&mut self, operation: &Operation) -> Result<Flow, MachineError> {
    match operation.opcode() {

      Opcode::Exit => {
        return Ok(Flow::Halt);
      }

      Opcode::Move => {
        self.do_move(operation.require_param(0)?, operation.require_param(1)?)?;
      }

      Opcode::Push => {
        self.do_push(operation.require_param(0)?)?;
      }

      Opcode::Pop => {
        self.do_pop(operation.require_param(0)?)?;
      }

      Opcode::Call => {
        self.do_call(operation.require_param(0)?)?;
      }

      Opcode::Return => {
        self.do_return()?;
      }

      Opcode::Add => {
        self.do_arithmetic(Opcode::Add, operation.require_param(0)?, operation.require_param(1)?, 1)?;
      }

      Opcode::Sub => {
        self.do_arithmetic(Opcode::Sub, operation.require_param(0)?, operation.require_param(1)?, -1)?;
      }

      Opcode::Eq => {
        self.do_compare(operation.require_param(0)?, operation.require_param(1)?, |lhs, rhs| lhs == rhs)?;
      }

      Opcode::Ne => {
        self.do_compare(operation.require_param(0)?, operation.require_param(1)?, |lhs, rhs| lhs != rhs)?;
      }

      Opcode::Lt => {
        self.do_compare(operation.require_param(0)?, operation.require_param(1)?, |lhs, rhs| lhs < rhs)?;
      }

      Opcode::Le => {
        self.do_compare(operation.require_param(0)?, operation.require_param(1)?, |lhs, rhs| lhs <= rhs)?;
      }

      Opcode::Jump => {
        self.do_jump(Opcode::Jump, operation.require_param(0)?)?;
      }

      Opcode::JumpTrue => {
        self.do_jump_conditional(Opcode::JumpTrue, operation.require_param(0)?, true)?;
      }

      Opcode::JumpFalse => {
        self.do_jump_conditional(Opcode::JumpFalse, operation.require_param(0)?, false)?;
      }

      // Already consumed by `collect_labels`; nothing to do at execution time.
      Opcode::DefLabel => {}

      Opcode::SyscallWrite => {
        self.do_syscall_write(operation.require_param(0)?, operation.require_param(1)?)?;
      }

    }
    Ok(Flow::Continue)
  }

  // endregion

  // region Operand resolution

  /// Dereferences a `Register` operand through the register file; every other
  /// kind stands for itself. The returned object is an independent copy.
  fn resolve_value(&self, operand: &Object) -> Result<Object, MachineError> {
    match operand {
      Object::Register(kind) => Ok(self.registers.require(*kind)?.clone()),
      literal                => Ok(literal.clone())
    }
  }

  /// `MOVE` sources additionally dereference `Reference` operands through
  /// memory; an empty source slot is a failure.
  fn resolve_move_source(&self, src: &Object) -> Result<Object, MachineError> {
    match src {
      Object::Register(kind)     => Ok(self.registers.require(*kind)?.clone()),
      Object::Reference(address) => Ok(self.memory.get_at(*address)?.clone()),
      literal                    => Ok(literal.clone())
    }
  }

  // endregion

  // region Operation handlers

  fn do_move(&mut self, dest: &Object, src: &Object) -> Result<(), MachineError> {
    match dest {

      Object::Register(kind) => {
        let value = self.resolve_move_source(src)?;
        self.registers.set(*kind, value);
        Ok(())
      }

      Object::Reference(address) => {
        // Memory destinations are single-assignment.
        if !self.memory.is_empty_at(*address) {
          return Err(MachineError::OccupiedAddress(*address));
        }
        let value = self.resolve_move_source(src)?;
        self.memory.set_at(*address, value)
      }

      other => Err(MachineError::OperandKind {
        opcode   :  Opcode::Move,
        expected :  "a register or reference destination",
        found    :  other.clone()
      })

    }
  }

  fn do_push(&mut self, src: &Object) -> Result<(), MachineError> {
    let value = self.resolve_value(src)?;
    self.stack.push(&value)
  }

  fn do_pop(&mut self, dest: &Object) -> Result<(), MachineError> {
    match dest {

      Object::Register(kind) => {
        let value = self.stack.pop()?;
        self.registers.set(*kind, value);
        Ok(())
      }

      other => Err(MachineError::OperandKind {
        opcode   :  Opcode::Pop,
        expected :  "a register destination",
        found    :  other.clone()
      })

    }
  }

  fn do_call(&mut self, dest: &Object) -> Result<(), MachineError> {
    match dest {

      Object::Label(id) => {
        let pc = self.registers.require(RegisterKind::ProgramCounter)?.payload();
        // The return address is pushed before the label resolves.
        self.stack.push(&Object::Reference(pc as usize))?;
        let dest_address = self.symbols.get(&label_key(*id))?;
        self.set_pc(dest_address);
        Ok(())
      }

      other => Err(MachineError::OperandKind {
        opcode   :  Opcode::Call,
        expected :  "a label operand",
        found    :  other.clone()
      })

    }
  }

  fn do_return(&mut self) -> Result<(), MachineError> {
    let dest = self.stack.pop()?;
    match dest {
      Object::Reference(address) => {
        self.set_pc(address);
        Ok(())
      }
      other => Err(MachineError::ReturnNotReference(other))
    }
  }

  fn do_arithmetic(
    &mut self,
    opcode :  Opcode,
    dest   :  &Object,
    src    :  &Object,
    sign   :  i64
  ) -> Result<(), MachineError>
  {
    match dest {

      Object::Register(kind) => {
        let delta = sign * self.resolve_value(src)?.payload();
        let updated = self.registers.require(*kind)?.apply_delta(delta)?;
        self.registers.set(*kind, updated);
        Ok(())
      }

      other => Err(MachineError::OperandKind {
        opcode,
        expected :  "a register destination",
        found    :  other.clone()
      })

    }
  }

  /// Compares the operands as written, dereferencing registers first, and
  /// stores the verdict in the boolean flag register. Payloads compare raw:
  /// no coercion across INT/CHAR/BOOL.
  fn do_compare(
    &mut self,
    obj1     :  &Object,
    obj2     :  &Object,
    relation :  fn(i64, i64) -> bool
  ) -> Result<(), MachineError>
  {
    let lhs = self.resolve_value(obj1)?.payload();
    let rhs = self.resolve_value(obj2)?.payload();
    self.registers.set(RegisterKind::BoolFlag, Object::Bool(relation(lhs, rhs)));
    Ok(())
  }

  fn do_jump(&mut self, opcode: Opcode, dest: &Object) -> Result<(), MachineError> {
    match dest {

      Object::Label(id) => {
        let dest_address = self.symbols.get(&label_key(*id))?;
        self.set_pc(dest_address);
        Ok(())
      }

      other => Err(MachineError::OperandKind {
        opcode,
        expected :  "a label operand",
        found    :  other.clone()
      })

    }
  }

  /// Branches iff the boolean flag register holds exactly `Bool(expected)`.
  /// The label only resolves when the branch is taken.
  fn do_jump_conditional(
    &mut self,
    opcode   :  Opcode,
    dest     :  &Object,
    expected :  bool
  ) -> Result<(), MachineError>
  {
    if !matches!(dest, Object::Label(_)) {
      return Err(MachineError::OperandKind {
        opcode,
        expected :  "a label operand",
        found    :  dest.clone()
      });
    }
    let take_branch = match self.registers.get(RegisterKind::BoolFlag) {
      Some(Object::Bool(value)) => *value == expected,
      Some(other)               => return Err(MachineError::FlagNotBoolean(other.clone())),
      None                      => return Err(MachineError::EmptyRegister(RegisterKind::BoolFlag))
    };
    match take_branch {
      true  => self.do_jump(opcode, dest),
      false => Ok(())
    }
  }

  fn do_syscall_write(&mut self, dest: &Object, src: &Object) -> Result<(), MachineError> {
    let stream = match dest {
      Object::Int(value) => {
        StreamKind::try_from(*value).map_err(|_| MachineError::BadStream(dest.clone()))?
      }
      other => return Err(MachineError::BadStream(other.clone()))
    };
    let value = self.resolve_value(src)?;
    let sink = match stream {
      StreamKind::StandardOut   => self.stdout.as_mut(),
      StreamKind::StandardError => self.stderr.as_mut()
    };
    write!(sink, "{}", value.data_string())
      .and_then(|_| sink.flush())
      .map_err(|error| MachineError::WriteFailed(error.to_string()))
  }

  // endregion

}

// region Display methods

lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

fn render_slot(slot: Option<&Object>) -> String {
  match slot {
    Some(object) => format!("{}", object),
    None         => "`".to_string()
  }
}

fn make_store_table(rows: Vec<(String, String)>) -> Table {
  let mut table = Table::new();

  table.set_format(*TABLE_DISPLAY_FORMAT);
  table.set_titles(row![ubr->"Address", ubl->"Contents"]);

  for (address, contents) in rows {
    table.add_row(row![r->address, contents]);
  }
  table
}

impl Display for Machine {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let register_rows = RegisterKind::iter()
      .map(|kind| (format!("{} =", kind), render_slot(self.registers.get(kind))))
      .collect();

    let stack_rows = self
      .stack
      .iter()
      .enumerate()
      .map(|(slot, contents)| (format!("S[{}] =", slot), render_slot(contents)))
      .collect();

    let memory_rows = self
      .memory
      .iter()
      .enumerate()
      .map(|(address, contents)| {
        let label = match self.memory.key_at(address) {
          Some(key) => format!("{}: M[{}] =", key, address),
          None      => format!("M[{}] =", address)
        };
        (label, render_slot(contents))
      })
      .collect();

    let mut symbol_rows: Vec<(String, String)> = self
      .symbols
      .iter()
      .map(|(name, address)| (format!("{} =", name), address.to_string()))
      .collect();
    symbol_rows.sort();

    let mut combined_table = table!([
      make_store_table(register_rows),
      make_store_table(stack_rows),
      make_store_table(memory_rows),
      make_store_table(symbol_rows)
    ]);

    combined_table.set_titles(row![ub->"Registers", ub->"Stack", ub->"Memory", ub->"Symbols"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    let status = match (self.status(), self.registers.get(RegisterKind::Status)) {
      (Some(status), _)   => status.to_string(),
      (None, Some(other)) => other.to_string(),
      (None, None)        => "(unset)".to_string()
    };

    write!(f, "Status: {}\n{}", status, combined_table)
  }
}

// endregion
