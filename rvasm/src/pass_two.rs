use std::collections::{BTreeSet, HashMap};

use rvisa::Isa;

use crate::diag::{Diagnostic, Diagnostics, ErrorKind};
use crate::directive::{self, Directive};
use crate::line::SourceLine;
use crate::symbols::{SymbolMap, SymbolTable};

/// Everything the encoding pass needs from layout: the complete symbol map
/// and the validated export set.
#[derive(Debug)]
pub struct Layout {
    pub symbols: SymbolMap,
    pub globals: BTreeSet<String>,
}

/// Symbol binding and layout. One virtual address cursor per section,
/// starting at `.text`; labels bind to the cursor of the section that is
/// current when their line is reached. No bytes are produced here, but the
/// cursor arithmetic matches the encoding pass exactly.
pub fn pass_two(isa: &Isa, program: &[SourceLine]) -> Result<Layout, Diagnostics> {
    let mut table = SymbolTable::new();
    let mut cursors: HashMap<String, u32> = HashMap::new();
    let mut current = ".text".to_owned();
    cursors.insert(current.clone(), rvisa::TEXT_BASE);
    let mut globals: Vec<(usize, String)> = Vec::new();
    let mut errors = Vec::new();

    for line in program {
        let cursor = cursors[&current];
        for label in &line.symbols {
            if let Err(kind) = table.define(label.clone(), cursor) {
                errors.push(Diagnostic::new(line.source_line, kind));
            }
        }
        let Some(first) = line.tokens.first() else { continue };
        if first.starts_with('.') {
            let Some(dir) = Directive::lookup(first) else {
                errors.push(Diagnostic::new(
                    line.source_line,
                    ErrorKind::UnknownDirective(first.clone()),
                ));
                continue;
            };
            match directive::size(dir, first, &line.tokens[1..], cursor) {
                Err(kind) => errors.push(Diagnostic::new(line.source_line, kind)),
                Ok(size) => {
                    if let Some(section) = dir.section_name() {
                        current = section.to_owned();
                        cursors
                            .entry(current.clone())
                            .or_insert_with(|| rvisa::section_base(section).expect("section base"));
                    } else if dir == Directive::Globl {
                        globals.push((line.source_line, line.tokens[1].clone()));
                    } else {
                        *cursors.get_mut(&current).expect("current cursor") += size;
                    }
                }
            }
        } else {
            let size = isa.instruction(first).map_or(4, |def| def.size);
            *cursors.get_mut(&current).expect("current cursor") += size;
        }
    }

    let mut exported = BTreeSet::new();
    for (line_no, name) in globals {
        if table.get(&name).is_none() {
            errors.push(Diagnostic::new(line_no, ErrorKind::UndefinedSymbol(name)));
        } else {
            exported.insert(name);
        }
    }

    if errors.is_empty() {
        Ok(Layout {
            symbols: table.into_map(),
            globals: exported,
        })
    } else {
        Err(errors)
    }
}
