//! Token tables
//!
//!     A token table is the ordered list of separators a [Lexer](super::Lexer) looks for.
//!     Each entry pairs a token kind with a trigger, which is either a literal string or a
//!     regular expression. Order matters: when several entries match at the same position
//!     the one registered first wins.
//!
//!     Kinds are closed enums implementing [TokenKind]. The kind named by
//!     [TokenKind::TEXT] is reserved for runs of input no entry matched.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::hash::Hash;
use std::ops::BitOr;

/// A closed set of token kinds produced by one token table.
pub trait TokenKind: Copy + Eq + Hash + fmt::Debug + 'static {
    /// Kind given to unmatched text between separators.
    const TEXT: Self;

    /// Every kind of the enum, used to build dispatch tables.
    const ALL: &'static [Self];
}

/// Matching modifiers of a [TokenDef].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TokenFlags(u8);

impl TokenFlags {
    pub const NONE: TokenFlags = TokenFlags(0);
    /// The trigger is a regular expression rather than a literal.
    pub const REGEX: TokenFlags = TokenFlags(1);
    /// ASCII case folding for literals, `(?i)` for patterns.
    pub const CASE_INSENSITIVE: TokenFlags = TokenFlags(1 << 1);

    pub const fn contains(self, other: TokenFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: TokenFlags) -> TokenFlags {
        TokenFlags(self.0 | other.0)
    }
}

impl BitOr for TokenFlags {
    type Output = TokenFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// A named separator rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDef<K> {
    kind: K,
    name: Cow<'static, str>,
    trigger: Cow<'static, str>,
    flags: TokenFlags,
}

impl<K: TokenKind> TokenDef<K> {
    /// A literal separator usable in constants.
    pub const fn literal(kind: K, name: &'static str, trigger: &'static str) -> Self {
        Self {
            kind,
            name: Cow::Borrowed(name),
            trigger: Cow::Borrowed(trigger),
            flags: TokenFlags::NONE,
        }
    }

    /// A regular expression separator usable in constants.
    pub const fn pattern(kind: K, name: &'static str, trigger: &'static str) -> Self {
        Self {
            kind,
            name: Cow::Borrowed(name),
            trigger: Cow::Borrowed(trigger),
            flags: TokenFlags::REGEX,
        }
    }

    /// A separator built at runtime, e.g. from settings.
    pub fn new(
        kind: K,
        name: impl Into<String>,
        trigger: impl Into<String>,
        flags: TokenFlags,
    ) -> Self {
        Self {
            kind,
            name: Cow::Owned(name.into()),
            trigger: Cow::Owned(trigger.into()),
            flags,
        }
    }

    pub fn with_flags(mut self, flags: TokenFlags) -> Self {
        self.flags = self.flags.union(flags);
        self
    }

    pub fn kind(&self) -> K {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    pub fn flags(&self) -> TokenFlags {
        self.flags
    }

    pub fn is_regex(&self) -> bool {
        self.flags.contains(TokenFlags::REGEX)
    }

    /// The pattern actually compiled for regex entries: anchored at the scan position,
    /// with case folding applied when requested.
    pub(crate) fn anchored_pattern(&self) -> String {
        if self.flags.contains(TokenFlags::CASE_INSENSITIVE) {
            format!("^(?i:{})", self.trigger)
        } else {
            format!("^(?:{})", self.trigger)
        }
    }
}

/// Ordered set of token definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTable<K> {
    defs: Vec<TokenDef<K>>,
}

impl<K: TokenKind> TokenTable<K> {
    pub fn new() -> Self {
        Self { defs: Vec::new() }
    }

    /// Appends a definition; it loses ties against every earlier one.
    pub fn push(&mut self, def: TokenDef<K>) -> &mut Self {
        self.defs.push(def);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenDef<K>> {
        self.defs.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&TokenDef<K>> {
        self.defs.iter().find(|def| def.name() == name)
    }
}

impl<K: TokenKind> Default for TokenTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: TokenKind> From<Vec<TokenDef<K>>> for TokenTable<K> {
    fn from(defs: Vec<TokenDef<K>>) -> Self {
        Self { defs }
    }
}

impl<K: TokenKind> FromIterator<TokenDef<K>> for TokenTable<K> {
    fn from_iter<I: IntoIterator<Item = TokenDef<K>>>(iter: I) -> Self {
        Self {
            defs: iter.into_iter().collect(),
        }
    }
}

/// Kinds of the built-in word splitting table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WordKind {
    Word,
    NonWord,
    Text,
}

impl TokenKind for WordKind {
    const TEXT: Self = WordKind::Text;
    const ALL: &'static [Self] = &[WordKind::Word, WordKind::NonWord, WordKind::Text];
}

pub const WORD: TokenDef<WordKind> = TokenDef::pattern(WordKind::Word, "word", r"\w+");
pub const NON_WORD: TokenDef<WordKind> =
    TokenDef::pattern(WordKind::NonWord, "non-word", r"\W+");

/// Splits input into alternating runs of word and non-word characters.
pub static WORD_SPLIT: Lazy<TokenTable<WordKind>> =
    Lazy::new(|| TokenTable::from(vec![WORD, NON_WORD]));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine() {
        let flags = TokenFlags::REGEX | TokenFlags::CASE_INSENSITIVE;
        assert!(flags.contains(TokenFlags::REGEX));
        assert!(flags.contains(TokenFlags::CASE_INSENSITIVE));
        assert!(!TokenFlags::REGEX.contains(TokenFlags::CASE_INSENSITIVE));
    }

    #[test]
    fn anchored_pattern_applies_case_folding() {
        let def = WORD.with_flags(TokenFlags::CASE_INSENSITIVE);
        assert_eq!(def.anchored_pattern(), r"^(?i:\w+)");
        assert_eq!(NON_WORD.anchored_pattern(), r"^(?:\W+)");
    }

    fn kinds_of<K: TokenKind>() -> &'static [K] {
        K::ALL
    }

    #[test]
    fn kind_list_is_static_and_holds_text() {
        let all = kinds_of::<WordKind>();
        assert_eq!(all.len(), 3);
        assert!(all.contains(&WordKind::TEXT));
    }

    #[test]
    fn word_split_table_keeps_order() {
        let names: Vec<_> = WORD_SPLIT.iter().map(|def| def.name()).collect();
        assert_eq!(names, vec!["word", "non-word"]);
        assert_eq!(
            WORD_SPLIT.find_by_name("non-word").map(|d| d.kind()),
            Some(WordKind::NonWord)
        );
    }
}
