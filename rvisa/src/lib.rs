pub mod instruction;
pub mod matcher;
pub mod pseudo;
pub mod registers;
pub mod rv32i;

pub use instruction::{BitRange, Field, FieldKind, ImmError, ImmField, ImmSlice, InstructionDef};
pub use matcher::{MatchError, Matcher};
pub use pseudo::{ExpandCtx, PseudoDef, PseudoError};

use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IsaError {
    #[error("instructions '{first}' and '{second}' share mask {mask:#010x} and pattern {pattern:#010x}")]
    AmbiguousEncoding {
        first: &'static str,
        second: &'static str,
        mask: u32,
        pattern: u32,
    },
}

/// Section base addresses are fixed by the ISA's memory map.
pub const TEXT_BASE: u32 = 0x0000_0000;
pub const DATA_BASE: u32 = 0x1000_0000;
pub const BSS_BASE: u32 = 0x2000_0000;

pub fn section_base(name: &str) -> Option<u32> {
    match name {
        ".text" => Some(TEXT_BASE),
        ".data" => Some(DATA_BASE),
        ".bss" => Some(BSS_BASE),
        _ => None,
    }
}

/// A flat catalog of instruction and pseudo-instruction descriptors.
/// Read-only once constructed.
pub struct Isa {
    pub name: &'static str,
    instructions: Vec<InstructionDef>,
    by_name: HashMap<&'static str, usize>,
    pseudos: Vec<PseudoDef>,
}

impl Isa {
    pub fn new(
        name: &'static str,
        instructions: Vec<InstructionDef>,
        pseudos: Vec<PseudoDef>,
    ) -> Self {
        let by_name = instructions
            .iter()
            .enumerate()
            .map(|(index, def)| (def.name, index))
            .collect();
        Isa {
            name,
            instructions,
            by_name,
            pseudos,
        }
    }

    pub fn instruction(&self, name: &str) -> Option<&InstructionDef> {
        self.by_name.get(name).map(|&index| &self.instructions[index])
    }

    pub fn instructions(&self) -> &[InstructionDef] {
        &self.instructions
    }

    pub fn pseudo(&self, name: &str, arity: usize) -> Option<&PseudoDef> {
        self.pseudos
            .iter()
            .find(|p| p.name == name && p.arity == arity)
    }

    /// Any arity registered for this pseudo name, for arity-mismatch reporting.
    pub fn pseudo_arity(&self, name: &str) -> Option<usize> {
        self.pseudos.iter().find(|p| p.name == name).map(|p| p.arity)
    }
}
