use rvisa::{ExpandCtx, Isa};

use crate::diag::{Diagnostic, Diagnostics, ErrorKind};
use crate::expr;
use crate::line::SourceLine;
use crate::symbols;

/// Split zero or more leading `label:` tokens from a line. A token may fuse
/// the colon with what follows (`end:nop`), so the remainder is pushed back
/// as the first residual token.
pub fn split_symbols(tokens: &[String]) -> Result<(Vec<String>, Vec<String>), ErrorKind> {
    let mut labels = Vec::new();
    let mut rest: Vec<String> = tokens.to_vec();
    loop {
        let Some(first) = rest.first() else { break };
        let Some(colon) = first.find(':') else { break };
        let (label, tail) = first.split_at(colon);
        if !symbols::is_valid_name(label) {
            return Err(ErrorKind::BadLabelName(label.to_owned()));
        }
        let label = label.to_owned();
        let tail = tail[1..].to_owned();
        labels.push(label);
        rest.remove(0);
        if !tail.is_empty() {
            rest.insert(0, tail);
        }
    }
    Ok((labels, rest))
}

/// Pseudo-op expansion. Each pseudo line becomes one or more real
/// instruction lines carrying the originating source line number; only the
/// first expanded line keeps the labels. Directives and real instructions
/// pass through unchanged.
pub fn pass_one(isa: &Isa, program: Vec<SourceLine>) -> Result<Vec<SourceLine>, Diagnostics> {
    let ctx = ExpandCtx {
        eval: &expr::constant,
    };
    let mut out = Vec::new();
    let mut errors = Vec::new();
    for line in program {
        let (labels, rest) = match split_symbols(&line.tokens) {
            Ok(split) => split,
            Err(kind) => {
                errors.push(Diagnostic::new(line.source_line, kind));
                continue;
            }
        };
        if rest.is_empty() {
            out.push(SourceLine {
                source_line: line.source_line,
                tokens: Vec::new(),
                symbols: labels,
            });
            continue;
        }
        let mnemonic = rest[0].clone();
        let args = &rest[1..];
        if let Some(pseudo) = isa.pseudo(&mnemonic, args.len()) {
            match (pseudo.expand)(args, &ctx) {
                Ok(expanded) => {
                    for (index, tokens) in expanded.into_iter().enumerate() {
                        out.push(SourceLine {
                            source_line: line.source_line,
                            tokens,
                            symbols: if index == 0 { labels.clone() } else { Vec::new() },
                        });
                    }
                }
                Err(pseudo_error) => {
                    errors.push(Diagnostic::new(line.source_line, pseudo_error.into()));
                }
            }
        } else if isa.instruction(&mnemonic).is_none() && isa.pseudo_arity(&mnemonic).is_some() {
            let expected = isa.pseudo_arity(&mnemonic).expect("pseudo arity");
            errors.push(Diagnostic::new(
                line.source_line,
                ErrorKind::WrongOperandCount {
                    mnemonic,
                    expected,
                    found: args.len(),
                },
            ));
        } else {
            out.push(SourceLine {
                source_line: line.source_line,
                tokens: rest,
                symbols: labels,
            });
        }
    }
    if errors.is_empty() {
        Ok(out)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass_zero::pass_zero;
    use rvisa::rv32i::rv32im;

    fn run(source: &str) -> Result<Vec<SourceLine>, Diagnostics> {
        pass_one(rv32im(), pass_zero(source).unwrap())
    }

    #[test]
    fn splits_fused_and_stacked_labels() {
        let (labels, rest) = split_symbols(&["B:nop".to_owned()]).unwrap();
        assert_eq!(labels, ["B"]);
        assert_eq!(rest, ["nop"]);

        let tokens: Vec<String> = ["D:", "E:", "addi", "a0", "a0", "-1"]
            .map(str::to_owned)
            .into();
        let (labels, rest) = split_symbols(&tokens).unwrap();
        assert_eq!(labels, ["D", "E"]);
        assert_eq!(rest, ["addi", "a0", "a0", "-1"]);
    }

    #[test]
    fn rejects_bad_label_names() {
        let err = split_symbols(&["ABC+:".to_owned()]).unwrap_err();
        assert_eq!(err, ErrorKind::BadLabelName("ABC+".to_owned()));
    }

    #[test]
    fn expands_nop() {
        let program = run("nop").unwrap();
        assert_eq!(program.len(), 1);
        assert_eq!(program[0].tokens, ["addi", "x0", "x0", "0"]);
    }

    #[test]
    fn label_sticks_to_first_expanded_line() {
        let program = run("start: li a0 0x12345678").unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(program[0].symbols, ["start"]);
        assert_eq!(program[0].tokens[0], "lui");
        assert!(program[1].symbols.is_empty());
        assert_eq!(program[1].tokens[0], "addi");
        assert_eq!(program[0].source_line, 1);
        assert_eq!(program[1].source_line, 1);
    }

    #[test]
    fn jump_pseudo_keeps_symbol_operand() {
        let program = run("j end\nend:nop").unwrap();
        assert_eq!(program[0].tokens, ["jal", "x0", "end"]);
        assert_eq!(program[1].symbols, ["end"]);
    }

    #[test]
    fn pseudo_arity_mismatch_is_reported() {
        let errors = run("mv a0").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].kind,
            ErrorKind::WrongOperandCount {
                mnemonic: "mv".to_owned(),
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn directives_pass_through() {
        let program = run(".data\nB: .word 1, 2, 2").unwrap();
        assert_eq!(program[0].tokens, [".data"]);
        assert_eq!(program[1].symbols, ["B"]);
        assert_eq!(program[1].tokens, [".word", "1", "2", "2"]);
    }
}
