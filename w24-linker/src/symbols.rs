//! Global symbol table

use std::collections::BTreeMap;

use crate::error::{LinkError, Result};
use w24_spec::Address;

/// How a name defined by more than one object resolves
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SymbolPolicy {
    /// The definition from the object loaded last wins
    #[default]
    LastLoadedWins,
    /// Referencing a name defined by more than one object is an error
    Strict,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Definition {
    address: Address,
    objects: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    policy: SymbolPolicy,
    symbols: BTreeMap<String, Definition>,
}

impl SymbolTable {
    pub fn new(policy: SymbolPolicy) -> Self {
        Self {
            policy,
            symbols: BTreeMap::new(),
        }
    }

    pub fn policy(&self) -> SymbolPolicy {
        self.policy
    }

    /// Record `name` at `address` as defined by `object`
    pub fn define(&mut self, name: &str, address: Address, object: &str) {
        let definition = self
            .symbols
            .entry(name.to_string())
            .or_insert_with(|| Definition {
                address,
                objects: Vec::new(),
            });
        definition.address = address;
        if !definition.objects.iter().any(|o| o == object) {
            definition.objects.push(object.to_string());
        }
    }

    /// Address of `name` as referenced from `object`
    pub fn resolve(&self, name: &str, object: &str) -> Result<Address> {
        let definition = self
            .symbols
            .get(name)
            .ok_or_else(|| LinkError::UndefinedSymbol {
                symbol: name.to_string(),
                object: object.to_string(),
            })?;

        if self.policy == SymbolPolicy::Strict && definition.objects.len() > 1 {
            return Err(LinkError::AmbiguousSymbol {
                symbol: name.to_string(),
                definitions: definition.objects.clone(),
            });
        }
        Ok(definition.address)
    }

    pub fn address(&self, name: &str) -> Option<Address> {
        self.symbols.get(name).map(|definition| definition.address)
    }

    /// Objects defining `name`, in load order
    pub fn definitions(&self, name: &str) -> &[String] {
        self.symbols
            .get(name)
            .map(|definition| definition.objects.as_slice())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Address)> {
        self.symbols
            .iter()
            .map(|(name, definition)| (name.as_str(), definition.address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_resolve() {
        let mut table = SymbolTable::new(SymbolPolicy::default());
        table.define("MAIN.LOOP", 0x10, "main.obj");
        table.define("LOOP", 0x10, "main.obj");

        assert_eq!(table.resolve("LOOP", "main.obj").unwrap(), 0x10);
        assert_eq!(table.len(), 2);
        assert!(matches!(
            table.resolve("EXIT", "main.obj"),
            Err(LinkError::UndefinedSymbol { .. })
        ));
    }

    #[test]
    fn test_last_loaded_wins() {
        let mut table = SymbolTable::new(SymbolPolicy::LastLoadedWins);
        table.define("INIT", 0x100, "a.obj");
        table.define("INIT", 0x200, "b.obj");

        assert_eq!(table.resolve("INIT", "main.obj").unwrap(), 0x200);
        assert_eq!(table.definitions("INIT"), ["a.obj", "b.obj"]);
    }

    #[test]
    fn test_strict_rejects_ambiguity() {
        let mut table = SymbolTable::new(SymbolPolicy::Strict);
        table.define("INIT", 0x100, "a.obj");
        table.define("INIT", 0x200, "b.obj");
        table.define("A.INIT", 0x100, "a.obj");

        assert!(matches!(
            table.resolve("INIT", "main.obj"),
            Err(LinkError::AmbiguousSymbol { .. })
        ));
        assert_eq!(table.resolve("A.INIT", "main.obj").unwrap(), 0x100);
    }

    #[test]
    fn test_iter_sorted() {
        let mut table = SymbolTable::default();
        table.define("B", 2, "x");
        table.define("A", 1, "x");
        let names: Vec<_> = table.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["A", "B"]);
    }
}
