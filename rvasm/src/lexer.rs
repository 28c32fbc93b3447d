use crate::diag::ErrorKind;

fn flush(tokens: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}

/// Split one raw source line into tokens.
///
/// `#` starts a comment, runs of whitespace and commas separate tokens, a
/// double-quoted span is one token with its quotes kept, and a parenthesized
/// group is glued into the surrounding token (so `(4*3+123)(x10)` survives as
/// a single operand for the expression evaluator to pick apart).
pub fn tokenize(line: &str) -> Result<Vec<String>, ErrorKind> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0u32;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '#' => break,
            '"' => {
                current.push('"');
                loop {
                    match chars.next() {
                        Some('"') => {
                            current.push('"');
                            break;
                        }
                        Some(inner) => current.push(inner),
                        None => return Err(ErrorKind::UnterminatedString),
                    }
                }
            }
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                if depth == 0 {
                    return Err(ErrorKind::UnbalancedParens);
                }
                depth -= 1;
                current.push(c);
            }
            c if depth > 0 => current.push(c),
            c if c.is_whitespace() || c == ',' => flush(&mut tokens, &mut current),
            c if c.is_ascii_alphanumeric() || "_.:+-*/".contains(c) => current.push(c),
            c => return Err(ErrorKind::IllegalCharacter(c)),
        }
    }
    if depth > 0 {
        return Err(ErrorKind::UnbalancedParens);
    }
    flush(&mut tokens, &mut current);
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(line: &str) -> Vec<String> {
        tokenize(line).unwrap()
    }

    #[test]
    fn whitespace_and_commas_separate() {
        assert_eq!(toks("addi a0, a0, 123"), ["addi", "a0", "a0", "123"]);
        assert_eq!(toks(".word 1, 2, 3 ,4"), [".word", "1", "2", "3", "4"]);
        assert_eq!(toks("  nop  "), ["nop"]);
    }

    #[test]
    fn comments_are_discarded() {
        assert_eq!(toks("addi a0 a0 123 # Hello world"), ["addi", "a0", "a0", "123"]);
        assert!(toks("# just a comment").is_empty());
    }

    #[test]
    fn quoted_strings_are_single_tokens() {
        assert_eq!(
            toks(".string \"hello world!\""),
            [".string", "\"hello world!\""]
        );
        assert_eq!(toks(".string \"1*2+(3/foo)\""), [".string", "\"1*2+(3/foo)\""]);
        // a '#' inside quotes is not a comment
        assert_eq!(toks(".string \"a # b\""), [".string", "\"a # b\""]);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert_eq!(
            tokenize(".string \"oops"),
            Err(ErrorKind::UnterminatedString)
        );
    }

    #[test]
    fn parenthesized_groups_glue() {
        assert_eq!(
            toks("lw x10, (123 + (4* 3))(x10)"),
            ["lw", "x10", "(123 + (4* 3))(x10)"]
        );
        assert_eq!(toks("sw x0, 24(sp)"), ["sw", "x0", "24(sp)"]);
    }

    #[test]
    fn unbalanced_parens_are_errors() {
        assert_eq!(tokenize("addi a0 a0 (a"), Err(ErrorKind::UnbalancedParens));
        assert_eq!(tokenize("addi a0 a0 1)"), Err(ErrorKind::UnbalancedParens));
    }

    #[test]
    fn labels_keep_their_colon() {
        assert_eq!(toks("B:nop"), ["B:nop"]);
        assert_eq!(toks("A: B: addi a0 a0 1"), ["A:", "B:", "addi", "a0", "a0", "1"]);
    }

    #[test]
    fn stray_characters_are_errors() {
        assert_eq!(tokenize("addi a0 a0 1;"), Err(ErrorKind::IllegalCharacter(';')));
        assert_eq!(tokenize("mov %eax"), Err(ErrorKind::IllegalCharacter('%')));
    }
}
