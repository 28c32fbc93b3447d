use std::cmp::Reverse;

use itertools::Itertools;
use thiserror::Error;

use crate::instruction::{FieldKind, InstructionDef};
use crate::registers;
use crate::{Isa, IsaError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("no instruction matches word {0:#010x}")]
    NoMatch(u32),
}

struct Entry<'a> {
    mask: u32,
    pattern: u32,
    def: &'a InstructionDef,
}

/// The decode direction of the instruction table: finds the descriptor whose
/// fixed bits match a word and extracts its operands back out.
pub struct Matcher<'a> {
    entries: Vec<Entry<'a>>,
}

impl<'a> Matcher<'a> {
    pub fn new(isa: &'a Isa) -> Result<Self, IsaError> {
        let mut entries: Vec<Entry> = isa
            .instructions()
            .iter()
            .map(|def| Entry {
                mask: def.fixed_mask(),
                pattern: def.base_word(),
                def,
            })
            .collect();
        // Most specific first, so a pattern that refines another's fixed bits
        // (ecall vs jalr-shaped words) wins deterministically.
        entries.sort_by_key(|e| Reverse(e.mask.count_ones()));
        for (index, a) in entries.iter().enumerate() {
            for b in &entries[index + 1..] {
                if a.mask == b.mask && a.pattern == b.pattern {
                    return Err(IsaError::AmbiguousEncoding {
                        first: a.def.name,
                        second: b.def.name,
                        mask: a.mask,
                        pattern: a.pattern,
                    });
                }
            }
        }
        Ok(Matcher { entries })
    }

    pub fn match_word(&self, word: u32) -> Result<&'a InstructionDef, MatchError> {
        self.entries
            .iter()
            .find(|e| word & e.mask == e.pattern)
            .map(|e| e.def)
            .ok_or(MatchError::NoMatch(word))
    }

    /// Mnemonic plus operand tokens, canonical spellings: `x`-named
    /// registers, decimal immediates. PC-relative offsets come back as the
    /// raw offset, not an absolute target.
    pub fn disassemble(&self, word: u32) -> Result<Vec<String>, MatchError> {
        let def = self.match_word(word)?;
        let mut tokens = vec![def.name.to_owned()];
        for field in def.operands() {
            match &field.kind {
                FieldKind::Register { bits } => {
                    tokens.push(registers::canonical(bits.extract(word) as u8));
                }
                FieldKind::Immediate(imm) => tokens.push(imm.extract(word).to_string()),
                FieldKind::Fixed { .. } => unreachable!("operands() skips fixed fields"),
            }
        }
        Ok(tokens)
    }

    pub fn display(&self, word: u32) -> Result<String, MatchError> {
        Ok(self.disassemble(word)?.iter().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{BitRange, Field};
    use crate::rv32i::rv32im;

    #[test]
    fn matches_known_words() {
        let matcher = Matcher::new(rv32im()).unwrap();
        let expected = [
            (0b0000000_00010_00010_000_00010_0110011u32, "add"),
            (0b0100000_00010_00010_000_00010_0110011u32, "sub"),
            (0b1111111_00000_00000_000_11101_1100011u32, "beq"),
            (0b0000011_11011_00010_000_00001_0010011u32, "addi"),
            (0b0000000_00001_00010_010_00010_0010011u32, "slti"),
            (0b0000000_00001_00010_100_00010_0010011u32, "xori"),
            (0b0000000_00001_00010_001_00010_0010011u32, "slli"),
            (0b0100000_00001_00010_101_00010_0010011u32, "srai"),
        ];
        for (word, name) in expected {
            assert_eq!(matcher.match_word(word).unwrap().name, name, "{name}");
        }
    }

    #[test]
    fn disassembles_operands() {
        let matcher = Matcher::new(rv32im()).unwrap();
        let tokens = matcher
            .disassemble(0b0000000_00010_00010_000_00010_0110011)
            .unwrap();
        assert_eq!(tokens, ["add", "x2", "x2", "x2"]);

        let tokens = matcher
            .disassemble(0b0000011_11011_00010_000_00001_0010011)
            .unwrap();
        assert_eq!(tokens, ["addi", "x1", "x2", "123"]);

        // beq x0 x0 -4
        let tokens = matcher
            .disassemble(0b1111111_00000_00000_000_11101_1100011)
            .unwrap();
        assert_eq!(tokens, ["beq", "x0", "x0", "-4"]);
    }

    #[test]
    fn no_match_is_reported() {
        let matcher = Matcher::new(rv32im()).unwrap();
        assert!(matches!(
            matcher.match_word(0xffff_ffff),
            Err(MatchError::NoMatch(0xffff_ffff))
        ));
    }

    #[test]
    fn duplicate_patterns_fail_construction() {
        let clash = |name| InstructionDef {
            name,
            size: 4,
            fields: vec![Field {
                name: "opcode",
                kind: FieldKind::Fixed {
                    bits: BitRange::new(6, 0),
                    value: 0b0110011,
                },
            }],
            mem_operands: false,
        };
        let isa = Isa::new("clash", vec![clash("one"), clash("two")], Vec::new());
        assert!(Matcher::new(&isa).is_err());
    }
}
