//! The label table: a mapping between label keys and program-counter
//! addresses, built once per load by `collect_labels`. A convenience wrapper
//! around a `BiMap` keyed by interned atoms; the right-to-left direction
//! resolves an address back to its label for diagnostics.

use bimap::BiMap;
use string_cache::DefaultAtom;

use crate::error::MachineError;

/// Label keys are formed as `"l_" + <label id>`. Ids are signed; the
/// synthetic root label injected by `load` uses id -1.
pub fn label_key(id: i64) -> String {
  format!("l_{}", id)
}

pub struct SymbolTable {
  table: BiMap<DefaultAtom, usize>
}

impl SymbolTable {

  pub fn new() -> SymbolTable {
    SymbolTable {
      table: BiMap::new()
    }
  }

  /// A label may be defined at most once; re-definition is an error.
  pub fn set(&mut self, name: &str, address: usize) -> Result<(), MachineError> {
    self
      .table
      .insert_no_overwrite(DefaultAtom::from(name), address)
      .map_err(|_| MachineError::RedefinedLabel(name.to_string()))
  }

  pub fn get(&self, name: &str) -> Result<usize, MachineError> {
    self
      .table
      .get_by_left(&DefaultAtom::from(name))
      .copied()
      .ok_or_else(|| MachineError::UnboundLabel(name.to_string()))
  }

  pub fn name_of(&self, address: usize) -> Option<&DefaultAtom> {
    self.table.get_by_right(&address)
  }

  /// Unconditional; deleting an unbound name is a no-op. Test harnesses use
  /// this to re-register labels between runs.
  pub fn delete(&mut self, name: &str) {
    self.table.remove_by_left(&DefaultAtom::from(name));
  }

  pub fn iter(&self) -> impl Iterator<Item = (&DefaultAtom, &usize)> {
    self.table.iter()
  }

  pub fn len(&self) -> usize {
    self.table.len()
  }

  pub fn is_empty(&self) -> bool {
    self.table.is_empty()
  }
}

impl Default for SymbolTable {
  fn default() -> SymbolTable {
    SymbolTable::new()
  }
}
