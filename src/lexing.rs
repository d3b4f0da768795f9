//! Lexer
//!
//!     Turns a character stream into a flat, randomly indexable token sequence using a
//!     [TokenTable]. The lexer knows nothing about any particular format: INI and any other
//!     format build their own table and hand it over.
//!
//! Matching
//!
//!     At every position the entries of the table are tried in order. A literal entry
//!     matches when the remaining input starts with its trigger; a regex entry matches when
//!     its anchored pattern produces a non-empty match. The first entry that matches wins,
//!     so registration order is the tie-break.
//!
//!     Characters no entry matches are gathered into a single [TokenKind::TEXT] token that
//!     is emitted right before the next separator (or at the end of input).
//!
//! Regex cache
//!
//!     Patterns are compiled the first time a table containing them is installed and kept
//!     in a cache keyed by the compiled pattern string, so swapping tables back and forth
//!     or analysing many inputs never recompiles. A bad pattern is reported when the table
//!     is installed, never while analysing. Installing a table also resolves each entry to
//!     its compiled regex once, so the scan itself does no lookups.

pub mod table;
pub mod token;

pub use table::{TokenDef, TokenFlags, TokenKind, TokenTable, WordKind, NON_WORD, WORD, WORD_SPLIT};
pub use token::Token;

use crate::error::LexError;
use regex::Regex;
use std::collections::HashMap;
use std::io::Read;

#[derive(Debug, Clone)]
pub struct Lexer<K> {
    separators: TokenTable<K>,
    /// One slot per table entry; `Some` for regex entries.
    compiled: Vec<Option<Regex>>,
    regex_cache: HashMap<String, Regex>,
}

/// Where the scan currently is in the input.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    offset: usize,
    line: usize,
    column: usize,
}

impl Cursor {
    fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn advance_over(&mut self, consumed: &str) {
        for ch in consumed.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset += consumed.len();
    }
}

impl<K: TokenKind> Lexer<K> {
    /// Builds a lexer, compiling every regex entry of the table.
    pub fn new(separators: TokenTable<K>) -> Result<Self, LexError> {
        let mut lexer = Self {
            separators: TokenTable::new(),
            compiled: Vec::new(),
            regex_cache: HashMap::new(),
        };
        lexer.set_separators(separators)?;
        Ok(lexer)
    }

    pub fn separators(&self) -> &TokenTable<K> {
        &self.separators
    }

    /// Replaces the token table. The regex cache survives, so patterns shared with the
    /// previous table are not compiled again.
    pub fn set_separators(&mut self, separators: TokenTable<K>) -> Result<&mut Self, LexError> {
        let mut compiled = Vec::with_capacity(separators.len());
        for def in separators.iter() {
            let regex = if def.is_regex() {
                Some(self.compile(def)?)
            } else {
                None
            };
            compiled.push(regex);
        }
        self.separators = separators;
        self.compiled = compiled;
        Ok(self)
    }

    /// Number of distinct compiled patterns held by this lexer.
    pub fn cached_patterns(&self) -> usize {
        self.regex_cache.len()
    }

    fn compile(&mut self, def: &TokenDef<K>) -> Result<Regex, LexError> {
        let pattern = def.anchored_pattern();
        if let Some(regex) = self.regex_cache.get(&pattern) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(&pattern).map_err(|source| LexError::InvalidPattern {
            name: def.name().to_string(),
            pattern: def.trigger().to_string(),
            source,
        })?;
        tracing::trace!(token = def.name(), pattern = %pattern, "compiled separator pattern");
        self.regex_cache.insert(pattern, regex.clone());
        Ok(regex)
    }

    /// Length in bytes of the match of `def` at the start of `rest`, if any.
    fn match_len(def: &TokenDef<K>, regex: Option<&Regex>, rest: &str) -> Option<usize> {
        if let Some(regex) = regex {
            return regex
                .find(rest)
                .map(|found| found.end())
                .filter(|len| *len > 0);
        }

        let trigger = def.trigger();
        if trigger.is_empty() {
            return None;
        }
        let candidate = rest.get(..trigger.len())?;
        let matched = if def.flags().contains(TokenFlags::CASE_INSENSITIVE) {
            candidate.eq_ignore_ascii_case(trigger)
        } else {
            candidate == trigger
        };
        matched.then_some(trigger.len())
    }

    fn first_match(&self, rest: &str) -> Option<(&TokenDef<K>, usize)> {
        self.separators
            .iter()
            .zip(&self.compiled)
            .find_map(|(def, regex)| {
                Self::match_len(def, regex.as_ref(), rest).map(|len| (def, len))
            })
    }

    /// Analyses `input` into a fresh token sequence.
    pub fn analyse(&self, input: &str) -> Vec<Token<K>> {
        let mut tokens = Vec::new();
        self.analyse_into(input, &mut tokens);
        tokens
    }

    /// Analyses `input`, appending to an existing sequence.
    pub fn analyse_into(&self, input: &str, tokens: &mut Vec<Token<K>>) {
        let before = tokens.len();
        let mut cursor = Cursor::start();
        let mut text_start: Option<Cursor> = None;

        while cursor.offset < input.len() {
            let rest = &input[cursor.offset..];
            match self.first_match(rest) {
                Some((def, len)) => {
                    if let Some(start) = text_start.take() {
                        tokens.push(text_token(input, start, cursor.offset));
                    }
                    let matched = &rest[..len];
                    tokens.push(Token::new(
                        def.kind(),
                        matched,
                        cursor.offset,
                        cursor.line,
                        cursor.column,
                    ));
                    cursor.advance_over(matched);
                }
                None => {
                    let Some(ch) = rest.chars().next() else {
                        break;
                    };
                    if text_start.is_none() {
                        text_start = Some(cursor);
                    }
                    cursor.advance_over(&rest[..ch.len_utf8()]);
                }
            }
        }
        if let Some(start) = text_start {
            tokens.push(text_token(input, start, input.len()));
        }

        tracing::debug!(tokens = tokens.len() - before, bytes = input.len(), "analysed input");
    }

    /// Reads the whole stream, then analyses it.
    pub fn analyse_reader<R: Read>(&self, mut reader: R) -> Result<Vec<Token<K>>, LexError> {
        let mut input = String::new();
        reader.read_to_string(&mut input)?;
        Ok(self.analyse(&input))
    }
}

fn text_token<K: TokenKind>(input: &str, start: Cursor, end: usize) -> Token<K> {
    Token::new(
        K::TEXT,
        &input[start.offset..end],
        start.offset,
        start.line,
        start.column,
    )
}

/// A lexer over the shared [WORD_SPLIT] table.
pub fn word_split_lexer() -> Result<Lexer<WordKind>, LexError> {
    Lexer::new(WORD_SPLIT.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Eq,
        EqEq,
        Number,
        Newline,
        Keyword,
        Text,
    }

    impl TokenKind for Kind {
        const TEXT: Self = Kind::Text;
        const ALL: &'static [Self] = &[
            Kind::Eq,
            Kind::EqEq,
            Kind::Number,
            Kind::Newline,
            Kind::Keyword,
            Kind::Text,
        ];
    }

    fn kinds(tokens: &[Token<Kind>]) -> Vec<(Kind, &str)> {
        tokens.iter().map(|t| (t.kind, t.text.as_str())).collect()
    }

    fn lexer() -> Lexer<Kind> {
        Lexer::new(TokenTable::from(vec![
            TokenDef::literal(Kind::Newline, "newline", "\n"),
            TokenDef::literal(Kind::EqEq, "eqeq", "=="),
            TokenDef::literal(Kind::Eq, "eq", "="),
            TokenDef::pattern(Kind::Number, "number", "[0-9]+"),
        ]))
        .unwrap()
    }

    #[test]
    fn test_text_is_emitted_before_separators() {
        let tokens = lexer().analyse("a = 12\nb");
        assert_eq!(
            kinds(&tokens),
            vec![
                (Kind::Text, "a "),
                (Kind::Eq, "="),
                (Kind::Text, " "),
                (Kind::Number, "12"),
                (Kind::Newline, "\n"),
                (Kind::Text, "b"),
            ]
        );
    }

    #[test]
    fn test_table_order_breaks_ties() {
        let tokens = lexer().analyse("==");
        assert_eq!(kinds(&tokens), vec![(Kind::EqEq, "==")]);

        let reversed = Lexer::new(TokenTable::from(vec![
            TokenDef::literal(Kind::Eq, "eq", "="),
            TokenDef::literal(Kind::EqEq, "eqeq", "=="),
        ]))
        .unwrap();
        assert_eq!(
            kinds(&reversed.analyse("==")),
            vec![(Kind::Eq, "="), (Kind::Eq, "=")]
        );
    }

    #[test]
    fn test_positions_track_lines_and_columns() {
        let tokens = lexer().analyse("ab\n  =\n");
        let eq = tokens.iter().find(|t| t.kind == Kind::Eq).unwrap();
        assert_eq!((eq.offset, eq.line, eq.column), (5, 2, 3));
        let indent = &tokens[2];
        assert_eq!(indent.text, "  ");
        assert_eq!((indent.offset, indent.line, indent.column), (3, 2, 1));
        assert_eq!(tokens.last().unwrap().line, 2);
    }

    #[test]
    fn test_columns_count_chars_not_bytes() {
        let tokens = lexer().analyse("é=1");
        let eq = &tokens[1];
        assert_eq!(eq.kind, Kind::Eq);
        assert_eq!((eq.offset, eq.column), (2, 2));
    }

    #[test]
    fn test_case_insensitive_literal() {
        let lexer = Lexer::new(TokenTable::from(vec![TokenDef::literal(
            Kind::Keyword,
            "true",
            "true",
        )
        .with_flags(TokenFlags::CASE_INSENSITIVE)]))
        .unwrap();
        assert_eq!(
            kinds(&lexer.analyse("TRUE x")),
            vec![(Kind::Keyword, "TRUE"), (Kind::Text, " x")]
        );
    }

    #[test]
    fn test_invalid_pattern_fails_construction() {
        let err = Lexer::new(TokenTable::from(vec![TokenDef::pattern(
            Kind::Number,
            "broken",
            "[0-9",
        )]))
        .unwrap_err();
        match err {
            LexError::InvalidPattern { name, pattern, .. } => {
                assert_eq!(name, "broken");
                assert_eq!(pattern, "[0-9");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_empty_regex_matches_are_ignored() {
        let lexer = Lexer::new(TokenTable::from(vec![TokenDef::pattern(
            Kind::Number,
            "maybe-number",
            "[0-9]*",
        )]))
        .unwrap();
        assert_eq!(
            kinds(&lexer.analyse("ab7")),
            vec![(Kind::Text, "ab"), (Kind::Number, "7")]
        );
    }

    #[test]
    fn test_patterns_are_cached_across_tables() {
        let mut lexer = lexer();
        assert_eq!(lexer.cached_patterns(), 1);
        lexer
            .set_separators(TokenTable::from(vec![TokenDef::pattern(
                Kind::Number,
                "digits",
                "[0-9]+",
            )]))
            .unwrap();
        assert_eq!(lexer.cached_patterns(), 1);
    }

    #[test]
    fn test_compiled_slots_follow_the_table() {
        let mut lexer = lexer();
        let slots: Vec<bool> = lexer.compiled.iter().map(Option::is_some).collect();
        assert_eq!(slots, vec![false, false, false, true]);

        lexer
            .set_separators(TokenTable::from(vec![
                TokenDef::pattern(Kind::Number, "digits", "[0-9]+"),
                TokenDef::literal(Kind::Eq, "eq", "="),
            ]))
            .unwrap();
        let slots: Vec<bool> = lexer.compiled.iter().map(Option::is_some).collect();
        assert_eq!(slots, vec![true, false]);
        assert_eq!(
            kinds(&lexer.analyse("12=3")),
            vec![(Kind::Number, "12"), (Kind::Eq, "="), (Kind::Number, "3")]
        );
    }

    #[test]
    fn test_failed_install_keeps_previous_table() {
        let mut lexer = lexer();
        assert!(lexer
            .set_separators(TokenTable::from(vec![TokenDef::pattern(
                Kind::Number,
                "broken",
                "[0-9",
            )]))
            .is_err());
        assert_eq!(lexer.separators().len(), 4);
        assert_eq!(lexer.compiled.len(), 4);
        assert_eq!(kinds(&lexer.analyse("7")), vec![(Kind::Number, "7")]);
    }

    #[test]
    fn test_analyse_into_appends() {
        let lexer = lexer();
        let mut tokens = lexer.analyse("a=");
        lexer.analyse_into("1", &mut tokens);
        assert_eq!(
            kinds(&tokens),
            vec![(Kind::Text, "a"), (Kind::Eq, "="), (Kind::Number, "1")]
        );
    }

    #[test]
    fn test_analyse_reader() {
        let tokens = lexer().analyse_reader("x=1".as_bytes()).unwrap();
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_empty_input() {
        assert!(lexer().analyse("").is_empty());
    }

    #[test]
    fn test_word_split() {
        let lexer = word_split_lexer().unwrap();
        let tokens = lexer.analyse("hello, world");
        let kinds: Vec<_> = tokens.iter().map(|t| (t.kind, t.text.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (WordKind::Word, "hello"),
                (WordKind::NonWord, ", "),
                (WordKind::Word, "world"),
            ]
        );
    }
}
