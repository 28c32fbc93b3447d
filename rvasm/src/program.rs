use std::collections::{BTreeMap, BTreeSet};

use crate::debuginfo::SourceMap;
use crate::symbols::SymbolMap;

/// A named contiguous byte region with its ISA-defined base address.
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub base: u32,
    pub data: Vec<u8>,
}

impl Section {
    /// Address one past the last emitted byte; the insertion cursor.
    pub fn end(&self) -> u32 {
        self.base + self.data.len() as u32
    }
}

/// The assembled output: section buffers, the symbol map, the advisory
/// export set, and the address-to-source map. Immutable once built.
#[derive(Debug)]
pub struct ProgramImage {
    sections: BTreeMap<String, Section>,
    symbols: SymbolMap,
    globals: BTreeSet<String>,
    source_map: SourceMap,
}

impl ProgramImage {
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    pub fn symbols(&self) -> &SymbolMap {
        &self.symbols
    }

    pub fn globals(&self) -> &BTreeSet<String> {
        &self.globals
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }
}

/// Owns the section table during encoding. Switching to a section that was
/// left earlier resumes appending at its previous cursor.
pub(crate) struct ImageBuilder {
    sections: BTreeMap<String, Section>,
    current: String,
}

impl ImageBuilder {
    pub fn new() -> Self {
        let mut builder = ImageBuilder {
            sections: BTreeMap::new(),
            current: String::new(),
        };
        builder.switch(".text");
        builder
    }

    pub fn switch(&mut self, name: &str) {
        let base = rvisa::section_base(name).expect("section base");
        self.sections.entry(name.to_owned()).or_insert_with(|| Section {
            name: name.to_owned(),
            base,
            data: Vec::new(),
        });
        self.current = name.to_owned();
    }

    pub fn cursor(&self) -> u32 {
        self.sections[&self.current].end()
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.sections
            .get_mut(&self.current)
            .expect("current section")
            .data
            .extend_from_slice(bytes);
    }

    pub fn finish(
        self,
        symbols: SymbolMap,
        globals: BTreeSet<String>,
        source_map: SourceMap,
    ) -> ProgramImage {
        ProgramImage {
            sections: self.sections,
            symbols,
            globals,
            source_map,
        }
    }
}
