//! Sparse microcode address map with collision detection

use std::collections::btree_map::{BTreeMap, Entry};

use crate::control::ControlWord;
use crate::error::{MicrocodeError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
struct Slot {
    owner: String,
    word: ControlWord,
}

/// ROM address to control word, remembering which instruction owns each
/// address
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MicrocodeMap {
    slots: BTreeMap<u32, Slot>,
}

impl MicrocodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `word` at `address` for instruction `owner`.
    ///
    /// Fails if another instruction already owns the address.
    pub fn insert(&mut self, address: u32, owner: &str, word: ControlWord) -> Result<()> {
        match self.slots.entry(address) {
            Entry::Occupied(slot) => Err(MicrocodeError::MicrocodeAddressConflict {
                address,
                existing: slot.get().owner.clone(),
                incoming: owner.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Slot {
                    owner: owner.to_string(),
                    word,
                });
                Ok(())
            }
        }
    }

    pub fn get(&self, address: u32) -> Option<ControlWord> {
        self.slots.get(&address).map(|slot| slot.word)
    }

    pub fn owner(&self, address: u32) -> Option<&str> {
        self.slots.get(&address).map(|slot| slot.owner.as_str())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Entries in address order
    pub fn iter(&self) -> impl Iterator<Item = (u32, ControlWord)> + '_ {
        self.slots.iter().map(|(&address, slot)| (address, slot.word))
    }
}
