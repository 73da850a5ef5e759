//! Register and expansion-port name tables

use crate::error::{Result, SpecError};
use std::collections::BTreeMap;

/// Register identifier as packed into the 5-bit register fields
pub type RegisterId = u8;

/// Number of ids addressable by a register field
pub const REGISTER_FIELD_SIZE: usize = 32;

// ALU registers
pub const REA: RegisterId = 0x0;
pub const REB: RegisterId = 0x1;
pub const ACC: RegisterId = 0x2;

// General purpose registers
pub const REZ: RegisterId = 0x3;
pub const REY: RegisterId = 0x4;
pub const REX: RegisterId = 0x5;
pub const REW: RegisterId = 0x6;
pub const REV: RegisterId = 0x7;
pub const REU: RegisterId = 0x8;
pub const RET: RegisterId = 0x9;
pub const RES: RegisterId = 0xA;
pub const RER: RegisterId = 0xB;
pub const REQ: RegisterId = 0xC;
pub const REP: RegisterId = 0xD;

// System registers
pub const SP: RegisterId = 0xE;
pub const PC: RegisterId = 0xF;

/// First id used by expansion ports (EP0)
pub const EXPANSION_PORT_BASE: RegisterId = 0x10;

/// Number of expansion ports
pub const NUM_EXPANSION_PORTS: u8 = 16;

const NAMED_REGISTERS: [(&str, RegisterId); 16] = [
    ("REA", REA),
    ("REB", REB),
    ("ACC", ACC),
    ("REZ", REZ),
    ("REY", REY),
    ("REX", REX),
    ("REW", REW),
    ("REV", REV),
    ("REU", REU),
    ("RET", RET),
    ("RES", RES),
    ("RER", RER),
    ("REQ", REQ),
    ("REP", REP),
    ("SP", SP),
    ("PC", PC),
];

/// Immutable-after-construction map from register/port names to ids.
///
/// Lookups are case-insensitive; names are stored upper-case.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterTable {
    names: BTreeMap<String, RegisterId>,
}

impl RegisterTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// The W24 register file: named registers, `R0`-`R15` aliases and
    /// expansion ports `EP0`-`EP15`.
    pub fn standard() -> Self {
        let mut names = BTreeMap::new();
        for (name, id) in NAMED_REGISTERS {
            names.insert(name.to_string(), id);
            names.insert(format!("R{id}"), id);
        }
        for port in 0..NUM_EXPANSION_PORTS {
            names.insert(format!("EP{port}"), EXPANSION_PORT_BASE + port);
        }
        Self { names }
    }

    /// Add a register name. Ids must fit the 5-bit register field.
    pub fn insert(&mut self, name: &str, id: RegisterId) -> Result<()> {
        let name = name.to_ascii_uppercase();
        if usize::from(id) >= REGISTER_FIELD_SIZE {
            return Err(SpecError::RegisterOutOfRange { name, id });
        }
        if self.names.contains_key(&name) {
            return Err(SpecError::DuplicateRegister(name));
        }
        self.names.insert(name, id);
        Ok(())
    }

    /// Look up a register or port by name
    pub fn lookup(&self, name: &str) -> Option<RegisterId> {
        self.names.get(&name.to_ascii_uppercase()).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over (name, id) pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, RegisterId)> {
        self.names.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_names() {
        let table = RegisterTable::standard();
        assert_eq!(table.lookup("REA"), Some(0));
        assert_eq!(table.lookup("reb"), Some(1));
        assert_eq!(table.lookup("ACC"), Some(2));
        assert_eq!(table.lookup("SP"), Some(14));
        assert_eq!(table.lookup("pc"), Some(15));
    }

    #[test]
    fn test_numeric_aliases() {
        let table = RegisterTable::standard();
        assert_eq!(table.lookup("R0"), table.lookup("REA"));
        assert_eq!(table.lookup("R1"), table.lookup("REB"));
        assert_eq!(table.lookup("R15"), Some(PC));
        assert_eq!(table.lookup("R16"), None);
    }

    #[test]
    fn test_expansion_ports() {
        let table = RegisterTable::standard();
        assert_eq!(table.lookup("EP0"), Some(16));
        assert_eq!(table.lookup("ep15"), Some(31));
        assert_eq!(table.lookup("EP16"), None);
    }

    #[test]
    fn test_insert_validation() {
        let mut table = RegisterTable::new();
        assert!(table.is_empty());
        table.insert("tmp", 3).unwrap();
        assert_eq!(table.lookup("TMP"), Some(3));
        assert!(matches!(
            table.insert("TMP", 4),
            Err(SpecError::DuplicateRegister(_))
        ));
        assert!(matches!(
            table.insert("big", 32),
            Err(SpecError::RegisterOutOfRange { id: 32, .. })
        ));
    }
}
