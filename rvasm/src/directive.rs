use strum::EnumString;

use rvisa::ImmError;

use crate::diag::ErrorKind;
use crate::expr;
use crate::symbols::{self, SymbolMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum Directive {
    #[strum(serialize = ".text")]
    Text,
    #[strum(serialize = ".data")]
    Data,
    #[strum(serialize = ".bss")]
    Bss,
    #[strum(serialize = ".word")]
    Word,
    #[strum(serialize = ".half")]
    Half,
    #[strum(serialize = ".byte")]
    Byte,
    #[strum(serialize = ".string", serialize = ".asciz")]
    Asciz,
    #[strum(serialize = ".ascii")]
    Ascii,
    #[strum(serialize = ".zero")]
    Zero,
    #[strum(serialize = ".align")]
    Align,
    #[strum(serialize = ".globl")]
    Globl,
}

const MAX_ALIGN: i64 = 12;

impl Directive {
    pub fn lookup(token: &str) -> Option<Directive> {
        token.parse().ok()
    }

    pub fn section_name(self) -> Option<&'static str> {
        match self {
            Directive::Text => Some(".text"),
            Directive::Data => Some(".data"),
            Directive::Bss => Some(".bss"),
            _ => None,
        }
    }
}

fn string_bytes(token: &str) -> Result<&str, ErrorKind> {
    token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .ok_or_else(|| ErrorKind::ExpectedString(token.to_owned()))
}

fn count_argument(token: &str, args: &[String]) -> Result<i64, ErrorKind> {
    let [arg] = args else {
        return Err(if args.is_empty() {
            ErrorKind::MissingArgument(token.to_owned())
        } else {
            ErrorKind::UnexpectedArgument(token.to_owned())
        });
    };
    let value = expr::parse_and_eval(arg, &SymbolMap::new())?.value;
    if value < 0 {
        return Err(ErrorKind::BadCount {
            token: token.to_owned(),
            value,
        });
    }
    Ok(value)
}

fn alignment_padding(token: &str, args: &[String], cursor: u32) -> Result<u32, ErrorKind> {
    let exponent = count_argument(token, args)?;
    if exponent > MAX_ALIGN {
        return Err(ErrorKind::AlignTooLarge(exponent));
    }
    let step = 1u32 << exponent;
    Ok((step - cursor % step) % step)
}

/// Bytes the directive will emit at `cursor`. The layout pass uses this to
/// advance its address cursors; the encoding pass emits exactly this many
/// bytes. Arity problems surface here.
pub fn size(dir: Directive, token: &str, args: &[String], cursor: u32) -> Result<u32, ErrorKind> {
    match dir {
        Directive::Text | Directive::Data | Directive::Bss => {
            if args.is_empty() {
                Ok(0)
            } else {
                Err(ErrorKind::UnexpectedArgument(token.to_owned()))
            }
        }
        Directive::Globl => {
            let [name] = args else {
                return Err(if args.is_empty() {
                    ErrorKind::MissingArgument(token.to_owned())
                } else {
                    ErrorKind::UnexpectedArgument(token.to_owned())
                });
            };
            if !symbols::is_valid_name(name) {
                return Err(ErrorKind::BadLabelName(name.clone()));
            }
            Ok(0)
        }
        Directive::Word | Directive::Half | Directive::Byte => {
            if args.is_empty() {
                return Err(ErrorKind::MissingArgument(token.to_owned()));
            }
            let element = match dir {
                Directive::Word => 4,
                Directive::Half => 2,
                _ => 1,
            };
            Ok(args.len() as u32 * element)
        }
        Directive::Asciz | Directive::Ascii => {
            if args.is_empty() {
                return Err(ErrorKind::MissingArgument(token.to_owned()));
            }
            let terminator = u32::from(dir == Directive::Asciz);
            let mut total = 0;
            for arg in args {
                total += string_bytes(arg)?.len() as u32 + terminator;
            }
            Ok(total)
        }
        Directive::Zero => Ok(count_argument(token, args)? as u32),
        Directive::Align => alignment_padding(token, args, cursor),
    }
}

fn check_range(value: i64, bits: u32) -> Result<(), ErrorKind> {
    // Both signed and unsigned spellings of the width are accepted.
    let lo = -(1i64 << (bits - 1));
    let hi = (1i64 << bits) - 1;
    if value < lo || value > hi {
        return Err(ErrorKind::Immediate(ImmError::OutOfRange {
            value,
            width: bits,
            sign: "data",
        }));
    }
    Ok(())
}

/// Execute a data directive: the bytes to append at `cursor`, little-endian
/// for the multi-byte element types. Section switches and `.globl` emit
/// nothing. Errors accumulate per argument.
pub fn emit(
    dir: Directive,
    token: &str,
    args: &[String],
    cursor: u32,
    symbols: &SymbolMap,
) -> Result<Vec<u8>, Vec<ErrorKind>> {
    let mut bytes = Vec::new();
    let mut errors = Vec::new();
    match dir {
        Directive::Text | Directive::Data | Directive::Bss | Directive::Globl => {}
        Directive::Word | Directive::Half | Directive::Byte => {
            let element = match dir {
                Directive::Word => 4usize,
                Directive::Half => 2,
                _ => 1,
            };
            for arg in args {
                match expr::parse_and_eval(arg, symbols) {
                    Ok(evaluated) => {
                        let value = evaluated.value;
                        if let Err(kind) = check_range(value, element as u32 * 8) {
                            errors.push(kind);
                            continue;
                        }
                        bytes.extend_from_slice(&value.to_le_bytes()[..element]);
                    }
                    Err(kind) => errors.push(kind),
                }
            }
        }
        Directive::Asciz | Directive::Ascii => {
            for arg in args {
                match string_bytes(arg) {
                    Ok(contents) => {
                        bytes.extend_from_slice(contents.as_bytes());
                        if dir == Directive::Asciz {
                            bytes.push(0);
                        }
                    }
                    Err(kind) => errors.push(kind),
                }
            }
        }
        Directive::Zero | Directive::Align => match size(dir, token, args, cursor) {
            Ok(count) => bytes.resize(count as usize, 0),
            Err(kind) => errors.push(kind),
        },
    }
    if errors.is_empty() {
        Ok(bytes)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn directive_spellings() {
        assert_eq!(Directive::lookup(".text"), Some(Directive::Text));
        assert_eq!(Directive::lookup(".string"), Some(Directive::Asciz));
        assert_eq!(Directive::lookup(".asciz"), Some(Directive::Asciz));
        assert_eq!(Directive::lookup(".a"), None);
        assert_eq!(Directive::lookup("word"), None);
    }

    #[test]
    fn section_switch_rejects_arguments() {
        let err = size(Directive::Data, ".data", &args(&["foo"]), 0).unwrap_err();
        assert_eq!(err, ErrorKind::UnexpectedArgument(".data".to_owned()));
        assert_eq!(size(Directive::Data, ".data", &[], 0).unwrap(), 0);
    }

    #[test]
    fn data_sizes() {
        assert_eq!(size(Directive::Word, ".word", &args(&["1", "2", "2"]), 0).unwrap(), 12);
        assert_eq!(size(Directive::Half, ".half", &args(&["42"]), 0).unwrap(), 2);
        assert_eq!(size(Directive::Byte, ".byte", &args(&["42"]), 0).unwrap(), 1);
        assert_eq!(
            size(Directive::Asciz, ".string", &args(&["\"hello world!\""]), 0).unwrap(),
            13
        );
        assert_eq!(
            size(Directive::Ascii, ".ascii", &args(&["\"abc\""]), 0).unwrap(),
            3
        );
        assert_eq!(size(Directive::Zero, ".zero", &args(&["8"]), 0).unwrap(), 8);
    }

    #[test]
    fn align_pads_to_power_of_two() {
        assert_eq!(size(Directive::Align, ".align", &args(&["2"]), 5).unwrap(), 3);
        assert_eq!(size(Directive::Align, ".align", &args(&["2"]), 8).unwrap(), 0);
        assert_eq!(size(Directive::Align, ".align", &args(&["0"]), 7).unwrap(), 0);
        assert_eq!(
            size(Directive::Align, ".align", &args(&["13"]), 0).unwrap_err(),
            ErrorKind::AlignTooLarge(13)
        );
    }

    #[test]
    fn word_emits_little_endian() {
        let bytes = emit(
            Directive::Word,
            ".word",
            &args(&["1", "2", "2"]),
            0,
            &SymbolMap::new(),
        )
        .unwrap();
        assert_eq!(bytes, [1, 0, 0, 0, 2, 0, 0, 0, 2, 0, 0, 0]);
    }

    #[test]
    fn string_emits_nul_terminated() {
        let bytes = emit(
            Directive::Asciz,
            ".string",
            &args(&["\"foo\"", "\"bar\""]),
            0,
            &SymbolMap::new(),
        )
        .unwrap();
        assert_eq!(bytes, b"foo\0bar\0");
    }

    #[test]
    fn data_values_range_checked() {
        let errs = emit(
            Directive::Byte,
            ".byte",
            &args(&["300", "-200", "42"]),
            0,
            &SymbolMap::new(),
        )
        .unwrap_err();
        assert_eq!(errs.len(), 2);

        let ok = emit(
            Directive::Byte,
            ".byte",
            &args(&["255", "-128"]),
            0,
            &SymbolMap::new(),
        )
        .unwrap();
        assert_eq!(ok, [255, 128]);
    }

    #[test]
    fn word_resolves_symbols() {
        let mut symbols = SymbolMap::new();
        symbols.insert("main".to_owned(), 0x40);
        let bytes = emit(
            Directive::Word,
            ".word",
            &args(&["main+4"]),
            0,
            &symbols,
        )
        .unwrap();
        assert_eq!(bytes, [0x44, 0, 0, 0]);
    }

    #[test]
    fn globl_takes_one_symbol() {
        assert_eq!(size(Directive::Globl, ".globl", &args(&["main"]), 0).unwrap(), 0);
        assert!(size(Directive::Globl, ".globl", &[], 0).is_err());
        assert!(size(Directive::Globl, ".globl", &args(&["1bad"]), 0).is_err());
    }
}
