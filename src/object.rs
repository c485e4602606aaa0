//! The discriminated value manipulated by the engine. An `Object` is either a
//! proper value (`Null`, `Int`, `Char`, `Bool`, `List`) or an operand
//! descriptor (`Register`, `Label`, `Reference`) telling an operation handler
//! where to read or write rather than what.

use std::fmt::{Display, Formatter};

use crate::error::MachineError;
use crate::register::RegisterKind;

/**
  A tagged value with an integer payload. Booleans are backed by 0/1 and
  characters by their scalar value, so every kind exposes a raw `payload`
  the comparison opcodes operate on. Values never share mutable state:
  a `Clone` crossing a storage boundary is an independent copy.
*/
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Object {
  Null,
  Int(i64),
  Char(char),
  Bool(bool),
  /// A list of the given size. Carried for the front end; the engine treats it as opaque.
  List(usize),
  /// Descriptor of a register slot.
  Register(RegisterKind),
  /// Descriptor of a program label, resolved through the symbol table.
  Label(i64),
  /// Descriptor of a memory address.
  Reference(usize)
}

impl Object {

  pub fn null() -> Object {
    Object::Null
  }

  pub fn list(size: usize) -> Object {
    Object::List(size)
  }

  pub fn register(kind: RegisterKind) -> Object {
    Object::Register(kind)
  }

  pub fn label(id: i64) -> Object {
    Object::Label(id)
  }

  pub fn reference(address: usize) -> Object {
    Object::Reference(address)
  }

  /// The raw integer payload backing the object, regardless of kind.
  pub fn payload(&self) -> i64 {
    match self {
      Object::Null              => 0,
      Object::Int(value)        => *value,
      Object::Char(character)   => *character as i64,
      Object::Bool(value)       => *value as i64,
      Object::List(size)        => *size as i64,
      Object::Register(kind)    => u8::from(*kind) as i64,
      Object::Label(id)         => *id,
      Object::Reference(address) => *address as i64
    }
  }

  /**
    The bare rendering used by the write syscall: no type annotation, just the
    data. Distinct from `Display`, which annotates descriptor kinds; the two
    forms are both observable, `Display` in program exports and `data_string`
    in program output.
  */
  pub fn data_string(&self) -> String {
    match self {
      Object::Null            => "null".to_string(),
      Object::Char(character) => character.to_string(),
      Object::Bool(value)     => value.to_string(),
      other                   => other.payload().to_string()
    }
  }

  /**
    Produces a copy of the object offset by `delta`, backing the ADD and SUB
    opcodes. Defined for `Int` and `Char`; a character offset that leaves the
    Unicode scalar range is an error, as is arithmetic on any other kind.
  */
  pub fn apply_delta(&self, delta: i64) -> Result<Object, MachineError> {
    match self {
      Object::Int(value) => Ok(Object::Int(value + delta)),

      Object::Char(character) => {
        let scalar = *character as i64 + delta;
        u32::try_from(scalar)
          .ok()
          .and_then(char::from_u32)
          .map(Object::Char)
          .ok_or(MachineError::CharOutOfRange(scalar))
      }

      other => Err(MachineError::NonNumeric(other.clone()))
    }
  }
}

impl From<i64> for Object {
  fn from(value: i64) -> Object {
    Object::Int(value)
  }
}

impl From<char> for Object {
  fn from(character: char) -> Object {
    Object::Char(character)
  }
}

impl From<bool> for Object {
  fn from(value: bool) -> Object {
    Object::Bool(value)
  }
}

impl Display for Object {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Object::Null => {
        write!(f, "null")
      },
      Object::Int(value) => {
        write!(f, "{}", value)
      },
      Object::Char(character) => {
        write!(f, "{}", character)
      },
      Object::Bool(value) => {
        write!(f, "{}", value)
      },
      Object::List(size) => {
        write!(f, "list({})", size)
      },
      Object::Register(kind) => {
        write!(f, "register({})", kind)
      },
      Object::Label(id) => {
        write!(f, "label({})", id)
      },
      Object::Reference(address) => {
        write!(f, "reference({})", address)
      }
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn constructors_pick_the_kind() {
    assert_eq!(Object::from(39), Object::Int(39));
    assert_eq!(Object::from('c'), Object::Char('c'));
    assert_eq!(Object::from(false), Object::Bool(false));
    assert_eq!(Object::from(true), Object::Bool(true));
    assert_eq!(Object::null(), Object::Null);
    assert_eq!(Object::list(3), Object::List(3));
    assert_eq!(Object::register(RegisterKind::General1), Object::Register(RegisterKind::General1));
    assert_eq!(Object::label(-1), Object::Label(-1));
    assert_eq!(Object::reference(5), Object::Reference(5));
  }

  #[test]
  fn display_forms() {
    assert_eq!(Object::null().to_string(), "null");
    assert_eq!(Object::from(30).to_string(), "30");
    assert_eq!(Object::from('x').to_string(), "x");
    assert_eq!(Object::from(true).to_string(), "true");
    assert_eq!(Object::list(3).to_string(), "list(3)");
    assert_eq!(Object::register(RegisterKind::General1).to_string(), "register(GENERAL_1)");
    assert_eq!(Object::label(3).to_string(), "label(3)");
    assert_eq!(Object::reference(5).to_string(), "reference(5)");
  }

  #[test]
  fn data_string_has_no_annotation() {
    assert_eq!(Object::null().data_string(), "null");
    assert_eq!(Object::from(30).data_string(), "30");
    assert_eq!(Object::from('x').data_string(), "x");
    assert_eq!(Object::from(true).data_string(), "true");
    assert_eq!(Object::from(false).data_string(), "false");
    assert_eq!(Object::label(3).data_string(), "3");
  }

  #[test]
  fn payload_is_the_raw_backing_integer() {
    assert_eq!(Object::from(false).payload(), 0);
    assert_eq!(Object::from(true).payload(), 1);
    assert_eq!(Object::from('a').payload(), 97);
    assert_eq!(Object::null().payload(), 0);
    assert_eq!(Object::label(-1).payload(), -1);
  }

  // CHAR and INT with equal payload are distinct objects but compare equal
  // through `payload`, which is what the comparison opcodes see.
  #[test]
  fn char_and_int_share_a_payload_space() {
    let character = Object::from('a');
    let number    = Object::from(97);
    assert_ne!(character, number);
    assert_eq!(character.payload(), number.payload());
  }

  #[test]
  fn clones_are_independent_copies() {
    let original = Object::from(7);
    let copy     = original.clone();
    assert_eq!(original, copy);
    let shifted = copy.apply_delta(1).unwrap();
    assert_eq!(original, Object::Int(7));
    assert_eq!(shifted, Object::Int(8));
  }

  #[test]
  fn apply_delta_on_numbers_and_characters() {
    assert_eq!(Object::from(30).apply_delta(5).unwrap(), Object::Int(35));
    assert_eq!(Object::from(30).apply_delta(-5).unwrap(), Object::Int(25));
    assert_eq!(Object::from('a').apply_delta(1).unwrap(), Object::Char('b'));
  }

  #[test]
  fn apply_delta_rejects_other_kinds() {
    assert_eq!(
      Object::from(true).apply_delta(1),
      Err(MachineError::NonNumeric(Object::Bool(true)))
    );
    assert_eq!(
      Object::from('a').apply_delta(-1000),
      Err(MachineError::CharOutOfRange(-903))
    );
  }
}
