use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::diag::ErrorKind;

pub type SymbolMap = HashMap<String, u32>;

static LABEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("invalid label regex"));

pub fn is_valid_name(name: &str) -> bool {
    LABEL_REGEX.is_match(name)
}

/// Symbol bindings established during layout. Each name may be defined
/// exactly once across the whole program.
#[derive(Debug, Default)]
pub struct SymbolTable {
    map: SymbolMap,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: String, address: u32) -> Result<(), ErrorKind> {
        if self.map.contains_key(&name) {
            return Err(ErrorKind::DuplicateSymbol(name));
        }
        self.map.insert(name, address);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.map.get(name).copied()
    }

    pub fn into_map(self) -> SymbolMap {
        self.map
    }
}
