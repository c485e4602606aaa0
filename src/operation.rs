//! Opcodes of the virtual machine and the `Operation` the dispatch loop
//! consumes: an opcode tag plus up to four `Object` operands.

use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};

use crate::error::MachineError;
use crate::object::Object;

#[derive(
StrumDisplay, IntoStaticStr, EnumString, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,          Eq,         PartialEq,        Debug,        Hash
)]
#[repr(u8)]
pub enum Opcode {
  #[strum(serialize = "EXIT")]
  Exit,
  #[strum(serialize = "MOVE")]
  Move,
  #[strum(serialize = "PUSH")]
  Push,
  #[strum(serialize = "POP")]
  Pop,
  #[strum(serialize = "CALL")]
  Call,
  #[strum(serialize = "RETURN")]
  Return,
  #[strum(serialize = "ADD")]
  Add,
  #[strum(serialize = "SUB")]
  Sub,
  #[strum(serialize = "EQ")]
  Eq,
  #[strum(serialize = "NE")]
  Ne,
  #[strum(serialize = "LT")]
  Lt,
  #[strum(serialize = "LE")]
  Le,
  #[strum(serialize = "JUMP")]
  Jump,
  #[strum(serialize = "JUMP_TRUE")]
  JumpTrue,
  #[strum(serialize = "JUMP_FALSE")]
  JumpFalse,
  #[strum(serialize = "DEF_LABEL")]
  DefLabel,
  #[strum(serialize = "SYSCALL_WRITE")]
  SyscallWrite
}

/// One instruction of a program. Unused operand positions are absent.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Operation {
  opcode :  Opcode,
  params :  [Option<Object>; 4]
}

impl Operation {

  fn nullary(opcode: Opcode) -> Operation {
    Operation {
      opcode,
      params: [None, None, None, None]
    }
  }

  fn unary(opcode: Opcode, param1: Object) -> Operation {
    Operation {
      opcode,
      params: [Some(param1), None, None, None]
    }
  }

  fn binary(opcode: Opcode, param1: Object, param2: Object) -> Operation {
    Operation {
      opcode,
      params: [Some(param1), Some(param2), None, None]
    }
  }

  // region Per-opcode constructors

  pub fn exit() -> Operation {
    Operation::nullary(Opcode::Exit)
  }

  pub fn move_value(dest: Object, src: Object) -> Operation {
    Operation::binary(Opcode::Move, dest, src)
  }

  pub fn push(src: Object) -> Operation {
    Operation::unary(Opcode::Push, src)
  }

  pub fn pop(dest: Object) -> Operation {
    Operation::unary(Opcode::Pop, dest)
  }

  pub fn call(label: Object) -> Operation {
    Operation::unary(Opcode::Call, label)
  }

  pub fn ret() -> Operation {
    Operation::nullary(Opcode::Return)
  }

  pub fn add(dest: Object, src: Object) -> Operation {
    Operation::binary(Opcode::Add, dest, src)
  }

  pub fn sub(dest: Object, src: Object) -> Operation {
    Operation::binary(Opcode::Sub, dest, src)
  }

  pub fn eq(obj1: Object, obj2: Object) -> Operation {
    Operation::binary(Opcode::Eq, obj1, obj2)
  }

  pub fn ne(obj1: Object, obj2: Object) -> Operation {
    Operation::binary(Opcode::Ne, obj1, obj2)
  }

  pub fn lt(obj1: Object, obj2: Object) -> Operation {
    Operation::binary(Opcode::Lt, obj1, obj2)
  }

  pub fn le(obj1: Object, obj2: Object) -> Operation {
    Operation::binary(Opcode::Le, obj1, obj2)
  }

  pub fn jump(label: Object) -> Operation {
    Operation::unary(Opcode::Jump, label)
  }

  pub fn jump_true(label: Object) -> Operation {
    Operation::unary(Opcode::JumpTrue, label)
  }

  pub fn jump_false(label: Object) -> Operation {
    Operation::unary(Opcode::JumpFalse, label)
  }

  pub fn def_label(label: Object) -> Operation {
    Operation::unary(Opcode::DefLabel, label)
  }

  pub fn syscall_write(stream: Object, value: Object) -> Operation {
    Operation::binary(Opcode::SyscallWrite, stream, value)
  }

  // endregion

  pub fn opcode(&self) -> Opcode {
    self.opcode
  }

  pub fn param(&self, index: usize) -> Option<&Object> {
    self.params.get(index).and_then(Option::as_ref)
  }

  pub(crate) fn require_param(&self, index: usize) -> Result<&Object, MachineError> {
    self.param(index).ok_or(MachineError::MissingOperand {
      opcode: self.opcode,
      index
    })
  }
}

impl Display for Operation {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.opcode)?;
    for param in self.params.iter().flatten() {
      write!(f, " {}", param)?;
    }
    Ok(())
  }
}


#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use crate::register::RegisterKind;

  use super::*;

  #[test]
  fn constructors_fill_the_operand_slots() {
    let operation = Operation::move_value(Object::register(RegisterKind::Status), Object::from(999));
    assert_eq!(operation.opcode(), Opcode::Move);
    assert_eq!(operation.param(0), Some(&Object::Register(RegisterKind::Status)));
    assert_eq!(operation.param(1), Some(&Object::Int(999)));
    assert_eq!(operation.param(2), None);
    assert_eq!(operation.param(3), None);

    let operation = Operation::exit();
    assert_eq!(operation.opcode(), Opcode::Exit);
    assert_eq!(operation.param(0), None);
  }

  #[test]
  fn require_param_reports_the_missing_position() {
    let operation = Operation::ret();
    assert_eq!(
      operation.require_param(0),
      Err(MachineError::MissingOperand { opcode: Opcode::Return, index: 0 })
    );
  }

  #[test]
  fn display_joins_opcode_and_operands() {
    assert_eq!(Operation::exit().to_string(), "EXIT");
    assert_eq!(
      Operation::move_value(Object::register(RegisterKind::General1), Object::from(30)).to_string(),
      "MOVE register(GENERAL_1) 30"
    );
    assert_eq!(Operation::jump_true(Object::label(3)).to_string(), "JUMP_TRUE label(3)");
    assert_eq!(Operation::def_label(Object::label(-1)).to_string(), "DEF_LABEL label(-1)");
  }

  #[test]
  fn opcode_names_round_trip() {
    assert_eq!(Opcode::SyscallWrite.to_string(), "SYSCALL_WRITE");
    assert_eq!(Opcode::from_str("JUMP_FALSE"), Ok(Opcode::JumpFalse));
    assert_eq!(Opcode::from_str("MOVE"), Ok(Opcode::Move));
    assert!(Opcode::from_str("NOP").is_err());
  }
}
