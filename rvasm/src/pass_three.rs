use itertools::Itertools;

use rvisa::{registers, FieldKind, Isa};

use crate::debuginfo::SourceMap;
use crate::diag::{Diagnostic, Diagnostics, ErrorKind};
use crate::directive::{self, Directive};
use crate::expr;
use crate::line::SourceLine;
use crate::pass_two::Layout;
use crate::program::{ImageBuilder, ProgramImage};

/// Machine code translation. The symbol map is complete before this pass
/// starts; nothing here defines a symbol. Errors accumulate per line (and
/// per operand within a line) so one bad instruction does not hide the next.
pub fn pass_three(
    isa: &Isa,
    program: &[SourceLine],
    layout: Layout,
) -> Result<ProgramImage, Diagnostics> {
    let mut builder = ImageBuilder::new();
    let mut source_map = SourceMap::new();
    let mut errors = Vec::new();

    for (name, address) in &layout.symbols {
        source_map.add_label(name.clone(), *address);
    }

    for line in program {
        let Some(first) = line.tokens.first() else { continue };
        if first.starts_with('.') {
            let dir = Directive::lookup(first).expect("directive validated during layout");
            if let Some(section) = dir.section_name() {
                builder.switch(section);
                continue;
            }
            let cursor = builder.cursor();
            match directive::emit(dir, first, &line.tokens[1..], cursor, &layout.symbols) {
                Ok(bytes) => builder.append(&bytes),
                Err(kinds) => {
                    errors.extend(
                        kinds
                            .into_iter()
                            .map(|kind| Diagnostic::new(line.source_line, kind)),
                    );
                }
            }
        } else {
            let address = builder.cursor();
            match encode_instruction(isa, line, address, &layout) {
                Ok(word) => {
                    builder.append(&word.to_le_bytes());
                    source_map.add_line(address, line.tokens.iter().join(" "), line.source_line);
                }
                Err(kinds) => {
                    errors.extend(
                        kinds
                            .into_iter()
                            .map(|kind| Diagnostic::new(line.source_line, kind)),
                    );
                    // Keep the cursor honest so later diagnostics stay accurate.
                    builder.append(&0u32.to_le_bytes());
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(builder.finish(layout.symbols, layout.globals, source_map))
    } else {
        Err(errors)
    }
}

/// Split the folded memory operand spelling: `24(sp)` and
/// `(4*3+123)(x10)` divide into an offset expression and a base register.
fn split_mem_operand(token: &str) -> Option<(String, String)> {
    let body = token.strip_suffix(')')?;
    let mut depth = 1u32;
    for (index, c) in body.char_indices().rev() {
        match c {
            ')' => depth += 1,
            '(' => {
                depth -= 1;
                if depth == 0 {
                    let (offset, base) = body.split_at(index);
                    if offset.is_empty() {
                        return None;
                    }
                    return Some((offset.to_owned(), base[1..].to_owned()));
                }
            }
            _ => {}
        }
    }
    None
}

fn encode_instruction(
    isa: &Isa,
    line: &SourceLine,
    address: u32,
    layout: &Layout,
) -> Result<u32, Vec<ErrorKind>> {
    let mnemonic = &line.tokens[0];
    let Some(def) = isa.instruction(mnemonic) else {
        return Err(vec![ErrorKind::UnknownInstruction(mnemonic.clone())]);
    };

    let mut operands: Vec<String> = line.tokens[1..].to_vec();
    if def.mem_operands && operands.len() + 1 == def.operand_count() {
        if let Some((offset, base)) = operands.last().and_then(|t| split_mem_operand(t)) {
            operands.pop();
            operands.push(offset);
            operands.push(base);
        }
    }
    if operands.len() != def.operand_count() {
        return Err(vec![ErrorKind::WrongOperandCount {
            mnemonic: mnemonic.clone(),
            expected: def.operand_count(),
            found: operands.len(),
        }]);
    }

    let mut word = def.base_word();
    let mut errors = Vec::new();
    for (field, token) in def.operands().zip(&operands) {
        match &field.kind {
            FieldKind::Register { bits } => match registers::register(token) {
                Some(index) => word |= bits.place(u32::from(index)),
                None => errors.push(ErrorKind::UnknownRegister(token.clone())),
            },
            FieldKind::Immediate(imm) => match expr::parse_and_eval(token, &layout.symbols) {
                Ok(evaluated) => {
                    let mut value = evaluated.value;
                    if imm.pc_relative && evaluated.saw_symbol {
                        value -= i64::from(address);
                    }
                    match imm.check(value) {
                        Ok(()) => word |= imm.place(value),
                        Err(imm_error) => errors.push(imm_error.into()),
                    }
                }
                Err(kind) => errors.push(kind),
            },
            FieldKind::Fixed { .. } => unreachable!("operands() skips fixed fields"),
        }
    }

    if errors.is_empty() {
        Ok(word)
    } else {
        Err(errors)
    }
}
