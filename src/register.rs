//! The fixed register file: one `Object` slot per role in a closed enumeration.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

use crate::error::MachineError;
use crate::object::Object;

/// Number of slots in a register file, one per `RegisterKind`.
pub const REGISTER_COUNT: usize = 7;

/**
  The roles of the register file. `ReturnAddress` and `Temp1` belong to the
  calling convention: a callee parks the return reference in `ReturnAddress`
  while it pops its arguments through `Temp1` into memory.
*/
#[derive(
StrumDisplay, IntoStaticStr, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,          Eq,         PartialEq, Debug,           Hash
)]
#[repr(u8)]
pub enum RegisterKind {
  #[strum(serialize = "RETURN_ADDRESS")]
  ReturnAddress,
  #[strum(serialize = "PROGRAM_COUNTER")]
  ProgramCounter,
  #[strum(serialize = "STATUS")]
  Status,
  #[strum(serialize = "BOOL_FLAG")]
  BoolFlag,
  #[strum(serialize = "GENERAL_1")]
  General1,
  #[strum(serialize = "GENERAL_2")]
  General2,
  #[strum(serialize = "TEMP_1")]
  Temp1
}

/// All slots start unset; "unset" is distinguishable from every held value.
pub struct RegisterFile {
  slots: [Option<Object>; REGISTER_COUNT]
}

impl RegisterFile {

  pub fn new() -> RegisterFile {
    RegisterFile {
      slots: Default::default()
    }
  }

  pub fn get(&self, kind: RegisterKind) -> Option<&Object> {
    self.slots[kind as usize].as_ref()
  }

  /// Like `get`, but an unset slot is a resolution failure.
  pub fn require(&self, kind: RegisterKind) -> Result<&Object, MachineError> {
    self.get(kind).ok_or(MachineError::EmptyRegister(kind))
  }

  pub fn set(&mut self, kind: RegisterKind, object: Object) {
    self.slots[kind as usize] = Some(object);
  }

  pub fn is_set(&self, kind: RegisterKind) -> bool {
    self.slots[kind as usize].is_some()
  }
}

impl Default for RegisterFile {
  fn default() -> RegisterFile {
    RegisterFile::new()
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fresh_file_is_unset() {
    let registers = RegisterFile::new();
    assert!(registers.get(RegisterKind::ProgramCounter).is_none());
    assert!(!registers.is_set(RegisterKind::General1));
    assert_eq!(
      registers.require(RegisterKind::General1),
      Err(MachineError::EmptyRegister(RegisterKind::General1))
    );
  }

  #[test]
  fn set_then_get() {
    let mut registers = RegisterFile::new();
    registers.set(RegisterKind::General1, Object::from(30));
    assert_eq!(registers.get(RegisterKind::General1), Some(&Object::Int(30)));
    assert_eq!(registers.require(RegisterKind::General1), Ok(&Object::Int(30)));
    // Other slots stay unset.
    assert!(registers.get(RegisterKind::General2).is_none());
  }

  #[test]
  fn role_names() {
    assert_eq!(RegisterKind::ReturnAddress.to_string(), "RETURN_ADDRESS");
    assert_eq!(RegisterKind::ProgramCounter.to_string(), "PROGRAM_COUNTER");
    assert_eq!(RegisterKind::BoolFlag.to_string(), "BOOL_FLAG");
    assert_eq!(RegisterKind::General1.to_string(), "GENERAL_1");
    assert_eq!(RegisterKind::Temp1.to_string(), "TEMP_1");
  }

  #[test]
  fn kinds_are_indices() {
    assert_eq!(u8::from(RegisterKind::ReturnAddress), 0);
    assert_eq!(RegisterKind::try_from(3u8).ok(), Some(RegisterKind::BoolFlag));
    assert!(RegisterKind::try_from(REGISTER_COUNT as u8).is_err());
  }
}
