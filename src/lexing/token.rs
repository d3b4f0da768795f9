//! Positioned tokens produced by the lexer.

use serde::Serialize;

/// A classified fragment of input.
///
/// `offset` is a byte offset into the analysed input; `line` and `column` are 1-based,
/// columns counted in chars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token<K> {
    pub kind: K,
    pub text: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl<K> Token<K> {
    pub fn new(kind: K, text: impl Into<String>, offset: usize, line: usize, column: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            offset,
            line,
            column,
        }
    }

    /// Byte range of the token in the analysed input.
    pub fn span(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.text.len()
    }
}
