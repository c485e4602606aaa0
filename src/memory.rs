//! The auxiliary memory: a bounded store of `Object` slots reachable either by
//! raw address or through a symbolic key, with write-once semantics per slot.
//!
//! The single-assignment rule is what keeps a function call's argument slots
//! from being silently clobbered by re-entry or mis-generated code: a second
//! write to an occupied slot is an error, and a slot only becomes writable
//! again after an explicit delete.

use std::collections::HashMap;

use string_cache::DefaultAtom;

use crate::error::MachineError;
use crate::object::Object;

pub struct Memory {
  /// Symbolic key to address bindings. A binding outlives the data in its
  /// slot, so a key keeps resolving after `delete_at` clears the slot.
  mapping :  HashMap<DefaultAtom, usize>,
  data    :  Vec<Option<Object>>
}

impl Memory {

  pub fn new(size: usize) -> Memory {
    Memory {
      mapping :  HashMap::new(),
      data    :  vec![None; size]
    }
  }

  /**
    Writes through a symbolic key. A key already bound resolves to its
    address; an unbound key is bound to the lowest empty slot first. The
    write itself is single-assignment: an occupied slot is an error.
  */
  pub fn set(&mut self, key: &str, object: Object) -> Result<(), MachineError> {
    let atom = DefaultAtom::from(key);
    match self.mapping.get(&atom) {

      Some(&address) => {
        self.set_at(address, object)
      }

      None => {
        let address = self
          .data
          .iter()
          .position(Option::is_none)
          .ok_or(MachineError::MemoryFull { size: self.data.len() })?;
        self.mapping.insert(atom, address);
        self.data[address] = Some(object);
        Ok(())
      }

    }
  }

  /// Positional single-assignment write.
  pub fn set_at(&mut self, address: usize, object: Object) -> Result<(), MachineError> {
    let size = self.data.len();
    match self.data.get_mut(address) {
      None => Err(MachineError::AddressOutOfRange { address, size }),
      Some(slot) => {
        if slot.is_some() {
          return Err(MachineError::OccupiedAddress(address));
        }
        *slot = Some(object);
        Ok(())
      }
    }
  }

  pub fn get(&self, key: &str) -> Result<&Object, MachineError> {
    let address = self
      .address_of(key)
      .ok_or_else(|| MachineError::UnboundKey(key.to_string()))?;
    self.get_at(address)
  }

  pub fn get_at(&self, address: usize) -> Result<&Object, MachineError> {
    match self.data.get(address) {
      None       => Err(MachineError::AddressOutOfRange { address, size: self.data.len() }),
      Some(slot) => slot.as_ref().ok_or(MachineError::EmptyAddress(address))
    }
  }

  pub fn address_of(&self, key: &str) -> Option<usize> {
    self.mapping.get(&DefaultAtom::from(key)).copied()
  }

  /// The key bound to `address`, if any. Reverse lookup for diagnostics.
  pub fn key_at(&self, address: usize) -> Option<&DefaultAtom> {
    self
      .mapping
      .iter()
      .find(|(_, &bound)| bound == address)
      .map(|(key, _)| key)
  }

  pub fn is_empty_at(&self, address: usize) -> bool {
    self.data.get(address).map_or(true, Option::is_none)
  }

  /// Unbinds the key and clears its slot.
  pub fn delete(&mut self, key: &str) -> Result<(), MachineError> {
    match self.mapping.remove(&DefaultAtom::from(key)) {
      None          => Err(MachineError::UnboundKey(key.to_string())),
      Some(address) => {
        self.data[address] = None;
        Ok(())
      }
    }
  }

  /// Clears the slot only. Bindings survive, so a symbolic key can later
  /// point at a re-populated slot without being re-resolved.
  pub fn delete_at(&mut self, address: usize) -> Result<(), MachineError> {
    let size = self.data.len();
    match self.data.get_mut(address) {
      None => Err(MachineError::AddressOutOfRange { address, size }),
      Some(slot) => {
        if slot.is_none() {
          return Err(MachineError::EmptyAddress(address));
        }
        *slot = None;
        Ok(())
      }
    }
  }

  /// Capacity, not occupancy.
  pub fn size(&self) -> usize {
    self.data.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = Option<&Object>> {
    self.data.iter().map(Option::as_ref)
  }
}


#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn new_memory_is_empty() {
    let memory = Memory::new(3);
    assert_eq!(memory.size(), 3);
    assert!(memory.is_empty_at(0));
    assert!(memory.is_empty_at(2));
    assert_eq!(memory.address_of("a"), None);
  }

  #[test]
  fn set_binds_the_lowest_empty_slot() {
    let mut memory = Memory::new(10);
    memory.set("a", Object::from('x')).unwrap();
    assert_eq!(memory.address_of("a"), Some(0));
    assert_eq!(memory.get_at(0), Ok(&Object::Char('x')));
    memory.set("b", Object::from('y')).unwrap();
    assert_eq!(memory.address_of("b"), Some(1));
  }

  #[test]
  fn set_at_leaves_bindings_alone() {
    let mut memory = Memory::new(3);
    memory.set_at(2, Object::from('x')).unwrap();
    assert!(memory.is_empty_at(0));
    assert!(memory.is_empty_at(1));
    assert_eq!(memory.get_at(2), Ok(&Object::Char('x')));
    assert_eq!(memory.key_at(2), None);
  }

  #[test]
  fn get_fails_on_an_unbound_key() {
    let mut memory = Memory::new(3);
    assert_eq!(memory.get("a"), Err(MachineError::UnboundKey("a".to_string())));
    memory.set("b", Object::from('x')).unwrap();
    assert_eq!(memory.get("b"), Ok(&Object::Char('x')));
  }

  #[test]
  fn get_at_fails_on_empty_or_out_of_range() {
    let mut memory = Memory::new(2);
    assert_eq!(memory.get_at(0), Err(MachineError::EmptyAddress(0)));
    assert_eq!(
      memory.get_at(5),
      Err(MachineError::AddressOutOfRange { address: 5, size: 2 })
    );
    memory.set("a", Object::from('x')).unwrap();
    assert_eq!(memory.get_at(0), Ok(&Object::Char('x')));
    assert_eq!(memory.get("a"), memory.get_at(0));
  }

  #[test]
  fn slots_are_single_assignment() {
    let mut memory = Memory::new(2);
    memory.set("a", Object::from(1)).unwrap();
    assert_eq!(memory.set("a", Object::from(2)), Err(MachineError::OccupiedAddress(0)));
    assert_eq!(memory.set_at(0, Object::from(2)), Err(MachineError::OccupiedAddress(0)));
    // The first write survives.
    assert_eq!(memory.get("a"), Ok(&Object::Int(1)));
  }

  #[test]
  fn set_fails_when_no_slot_is_left() {
    let mut memory = Memory::new(2);
    memory.set("a", Object::from(1)).unwrap();
    memory.set("b", Object::from(2)).unwrap();
    assert_eq!(
      memory.set("c", Object::from(3)),
      Err(MachineError::MemoryFull { size: 2 })
    );
  }

  #[test]
  fn delete_unbinds_and_clears() {
    let mut memory = Memory::new(2);
    assert_eq!(memory.delete("a"), Err(MachineError::UnboundKey("a".to_string())));
    memory.set("a", Object::from('x')).unwrap();
    memory.delete("a").unwrap();
    assert_eq!(memory.address_of("a"), None);
    assert!(memory.is_empty_at(0));
    // The freed slot is reusable.
    memory.set("b", Object::from('y')).unwrap();
    assert_eq!(memory.address_of("b"), Some(0));
  }

  #[test]
  fn delete_at_keeps_the_binding() {
    let mut memory = Memory::new(2);
    assert_eq!(memory.delete_at(0), Err(MachineError::EmptyAddress(0)));
    memory.set("a", Object::from('x')).unwrap();
    memory.delete_at(0).unwrap();
    assert!(memory.is_empty_at(0));
    assert_eq!(memory.address_of("a"), Some(0));
    // The same key now points at a re-populated slot.
    memory.set("a", Object::from('y')).unwrap();
    assert_eq!(memory.get("a"), Ok(&Object::Char('y')));
  }
}
