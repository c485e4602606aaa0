//! An ordered, immutable sequence of operations. Indices into the sequence
//! are program-counter addresses.

use std::fmt::{Display, Formatter};

use crate::operation::Operation;

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Program {
  operations: Vec<Operation>
}

impl Program {

  pub fn new(operations: Vec<Operation>) -> Program {
    Program { operations }
  }

  pub fn get(&self, pc: usize) -> Option<&Operation> {
    self.operations.get(pc)
  }

  pub fn len(&self) -> usize {
    self.operations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.operations.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
    self.operations.iter()
  }

  /// The newline-joined rendering of every operation, used for diagnostics
  /// and golden-file tests. Never re-parsed.
  pub fn export(&self) -> String {
    self
      .operations
      .iter()
      .map(Operation::to_string)
      .collect::<Vec<String>>()
      .join("\n")
  }
}

impl From<Vec<Operation>> for Program {
  fn from(operations: Vec<Operation>) -> Program {
    Program::new(operations)
  }
}

impl IntoIterator for Program {
  type Item = Operation;
  type IntoIter = std::vec::IntoIter<Operation>;

  fn into_iter(self) -> Self::IntoIter {
    self.operations.into_iter()
  }
}

impl Display for Program {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.export())
  }
}


#[cfg(test)]
mod tests {
  use crate::object::Object;
  use crate::register::RegisterKind;

  use super::*;

  #[test]
  fn export_joins_lines_without_a_trailing_newline() {
    let program = Program::new(vec![Operation::exit()]);
    assert_eq!(program.export(), "EXIT");

    let program = Program::new(vec![
      Operation::move_value(Object::register(RegisterKind::General1), Object::from(30)),
      Operation::exit(),
    ]);
    assert_eq!(program.export(), "MOVE register(GENERAL_1) 30\nEXIT");
  }

  #[test]
  fn indices_are_program_counter_addresses() {
    let program = Program::new(vec![
      Operation::def_label(Object::label(0)),
      Operation::ret(),
    ]);
    assert_eq!(program.len(), 2);
    assert_eq!(program.get(1), Some(&Operation::ret()));
    assert_eq!(program.get(2), None);
  }
}
