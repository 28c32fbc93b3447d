/// A tokenized line of the program between passes. `source_line` is the
/// 1-based physical line it originated from and survives pseudo expansion,
/// so diagnostics always point at user text.
#[derive(Debug, Clone)]
pub struct SourceLine {
    pub source_line: usize,
    pub tokens: Vec<String>,
    /// Labels split off the front of the line; empty until the symbol
    /// splitter has run.
    pub symbols: Vec<String>,
}

impl SourceLine {
    pub fn new(source_line: usize, tokens: Vec<String>) -> Self {
        SourceLine {
            source_line,
            tokens,
            symbols: Vec::new(),
        }
    }
}
