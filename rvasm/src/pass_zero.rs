use crate::diag::{Diagnostic, Diagnostics};
use crate::lexer;
use crate::line::SourceLine;

/// Walk the physical lines, tokenize each non-empty one, and record it with
/// its 1-based line number. Empty and comment-only lines contribute nothing.
pub fn pass_zero(source: &str) -> Result<Vec<SourceLine>, Diagnostics> {
    let mut program = Vec::new();
    let mut errors = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        match lexer::tokenize(trimmed) {
            Ok(tokens) if tokens.is_empty() => {}
            Ok(tokens) => program.push(SourceLine::new(line_no, tokens)),
            Err(kind) => errors.push(Diagnostic::new(line_no, kind)),
        }
    }
    if errors.is_empty() {
        Ok(program)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::ErrorKind;

    #[test]
    fn records_one_based_line_numbers() {
        let program = pass_zero("\n\nnop\n# comment\naddi a0 a0 1\n").unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(program[0].source_line, 3);
        assert_eq!(program[1].source_line, 5);
        assert_eq!(program[1].tokens, ["addi", "a0", "a0", "1"]);
    }

    #[test]
    fn collects_errors_across_lines() {
        let errors = pass_zero("nop\n.string \"a\nnop\n.string \"b\n").unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, 2);
        assert_eq!(errors[0].kind, ErrorKind::UnterminatedString);
        assert_eq!(errors[1].line, 4);
    }
}
