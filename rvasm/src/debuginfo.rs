use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One emitted line: where its bytes landed and the source line they came
/// from. Pseudo-expanded lines map back to the line the user wrote.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SourceMapLine {
    pub address: u32,
    pub text: String,
    pub line_number: usize,
}

/// Advisory address-to-source sidecar for downstream consumers (debugger,
/// editor highlighting). No effect on encoding.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceMap {
    pub lines: Vec<SourceMapLine>,
    pub address_map: HashMap<u32, usize>,
    pub labels: HashMap<String, u32>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_label(&mut self, label: String, address: u32) {
        self.labels.insert(label, address);
    }

    pub fn add_line(&mut self, address: u32, text: String, line_number: usize) {
        self.lines.push(SourceMapLine {
            address,
            text,
            line_number,
        });
        self.address_map.insert(address, self.lines.len() - 1);
    }

    pub fn line_at(&self, address: u32) -> Option<&SourceMapLine> {
        self.address_map.get(&address).map(|&index| &self.lines[index])
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
