//! Parser dispatch engine
//!
//!     A table-driven parser for line-oriented microformats. Instead of a grammar, a parse
//!     state declares one handler per token kind; the engine replays a token sequence
//!     through those handlers in order and lets them mutate a shared output value.
//!
//!     Handlers are plain function pointers chosen by an exhaustive `match` over the closed
//!     kind enum (see [ParseState::handler]), so adding a token kind without deciding how to
//!     handle it is a compile error in the state implementation.
//!
//!     Handlers receive a [TokenCursor] rather than just the token: it carries the position
//!     in the sequence and gives access to neighbouring tokens for the few decisions that
//!     need lookahead or lookbehind.
//!
//! Reuse
//!
//!     Parse state (accumulators, cursors, flags) outlives a single call to
//!     [Parser::parse]. Call [Parser::reset] before feeding an unrelated input; a parser
//!     reused without a reset keeps going but logs a warning.

use crate::lexing::{Token, TokenKind};
use std::collections::HashMap;

/// A handler invoked for one token.
pub type Handler<S, K, O, E> = fn(&mut S, &TokenCursor<'_, K>, &mut O) -> Result<(), E>;

/// Position of the token being dispatched, with access to the whole sequence.
#[derive(Debug, Clone, Copy)]
pub struct TokenCursor<'t, K> {
    tokens: &'t [Token<K>],
    position: usize,
}

impl<'t, K> TokenCursor<'t, K> {
    /// Returns `None` when `position` is out of bounds.
    pub fn new(tokens: &'t [Token<K>], position: usize) -> Option<Self> {
        (position < tokens.len()).then_some(Self { tokens, position })
    }

    pub fn token(&self) -> &'t Token<K> {
        &self.tokens[self.position]
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn tokens(&self) -> &'t [Token<K>] {
        self.tokens
    }

    pub fn previous(&self) -> Option<&'t Token<K>> {
        self.position
            .checked_sub(1)
            .and_then(|index| self.tokens.get(index))
    }

    pub fn peek(&self) -> Option<&'t Token<K>> {
        self.tokens.get(self.position + 1)
    }

    pub fn is_last(&self) -> bool {
        self.position + 1 == self.tokens.len()
    }
}

/// The mutable side of a table-driven parser.
pub trait ParseState: Sized {
    type Kind: TokenKind;
    type Output;
    type Error;

    /// Handler for `kind`, or `None` to ignore tokens of that kind.
    fn handler(kind: Self::Kind) -> Option<Handler<Self, Self::Kind, Self::Output, Self::Error>>;

    /// Clears everything carried over from a previous parse.
    fn reset(&mut self);

    /// Runs once after the last token has been dispatched.
    fn finish(
        &mut self,
        _tokens: &[Token<Self::Kind>],
        _output: &mut Self::Output,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
}

pub struct Parser<S: ParseState> {
    handlers: HashMap<S::Kind, Handler<S, S::Kind, S::Output, S::Error>>,
    state: S,
    dirty: bool,
}

impl<S: ParseState> Parser<S> {
    pub fn new(state: S) -> Self {
        let handlers = S::Kind::ALL
            .iter()
            .filter_map(|kind| S::handler(*kind).map(|handler| (*kind, handler)))
            .collect();
        Self {
            handlers,
            state,
            dirty: false,
        }
    }

    /// Overrides the handler registered for `kind`.
    pub fn with_handler(
        mut self,
        kind: S::Kind,
        handler: Handler<S, S::Kind, S::Output, S::Error>,
    ) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn has_handler(&self, kind: S::Kind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn reset(&mut self) {
        self.state.reset();
        self.dirty = false;
    }

    /// Replays `tokens` through the handler table into `output`.
    ///
    /// The first handler error aborts the parse; `output` then holds whatever the
    /// handlers wrote before the failure.
    pub fn parse(
        &mut self,
        tokens: &[Token<S::Kind>],
        output: &mut S::Output,
    ) -> Result<(), S::Error> {
        if self.dirty {
            tracing::warn!("parser reused without reset, carrying state from the previous input");
        }
        self.dirty = true;

        for position in 0..tokens.len() {
            let cursor = TokenCursor { tokens, position };
            let kind = cursor.token().kind;
            match self.handlers.get(&kind) {
                Some(handler) => {
                    tracing::trace!(?kind, position, "dispatch");
                    handler(&mut self.state, &cursor, output)?;
                }
                None => tracing::trace!(?kind, position, "no handler, token skipped"),
            }
        }
        self.state.finish(tokens, output)
    }
}

impl<S: ParseState + Default> Default for Parser<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Plus,
        Number,
        Space,
        Text,
    }

    impl TokenKind for Kind {
        const TEXT: Self = Kind::Text;
        const ALL: &'static [Self] = &[Kind::Plus, Kind::Number, Kind::Space, Kind::Text];
    }

    /// Sums numbers, rejecting a trailing `+`.
    #[derive(Default)]
    struct Sum {
        seen: usize,
    }

    type SumHandler = Handler<Sum, Kind, i64, String>;

    impl Sum {
        fn number(
            state: &mut Sum,
            cursor: &TokenCursor<'_, Kind>,
            out: &mut i64,
        ) -> Result<(), String> {
            state.seen += 1;
            *out += cursor.token().text.parse::<i64>().map_err(|e| e.to_string())?;
            Ok(())
        }

        fn plus(_: &mut Sum, cursor: &TokenCursor<'_, Kind>, _: &mut i64) -> Result<(), String> {
            if cursor.is_last() {
                return Err(format!("dangling '+' at {}", cursor.position()));
            }
            Ok(())
        }

        fn text(_: &mut Sum, cursor: &TokenCursor<'_, Kind>, _: &mut i64) -> Result<(), String> {
            Err(format!("unexpected '{}'", cursor.token().text))
        }
    }

    impl ParseState for Sum {
        type Kind = Kind;
        type Output = i64;
        type Error = String;

        fn handler(kind: Kind) -> Option<SumHandler> {
            let handler: SumHandler = match kind {
                Kind::Plus => Sum::plus,
                Kind::Number => Sum::number,
                Kind::Text => Sum::text,
                Kind::Space => return None,
            };
            Some(handler)
        }

        fn reset(&mut self) {
            self.seen = 0;
        }
    }

    fn tok(kind: Kind, text: &str, offset: usize) -> Token<Kind> {
        Token::new(kind, text, offset, 1, offset + 1)
    }

    fn sample() -> Vec<Token<Kind>> {
        vec![
            tok(Kind::Number, "2", 0),
            tok(Kind::Space, " ", 1),
            tok(Kind::Plus, "+", 2),
            tok(Kind::Number, "40", 3),
        ]
    }

    #[test]
    fn test_dispatches_in_order() {
        let mut parser = Parser::<Sum>::default();
        let mut total = 0;
        parser.parse(&sample(), &mut total).unwrap();
        assert_eq!(total, 42);
        assert_eq!(parser.state().seen, 2);
        assert!(!parser.has_handler(Kind::Space));
    }

    #[test]
    fn test_handler_error_aborts() {
        let mut parser = Parser::<Sum>::default();
        let mut total = 0;
        let tokens = vec![tok(Kind::Number, "1", 0), tok(Kind::Plus, "+", 1)];
        assert_eq!(
            parser.parse(&tokens, &mut total),
            Err("dangling '+' at 1".to_string())
        );
        assert_eq!(total, 1);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut parser = Parser::<Sum>::default();
        let mut total = 0;
        parser.parse(&sample(), &mut total).unwrap();
        parser.reset();
        assert_eq!(parser.state().seen, 0);
    }

    #[test]
    fn test_handler_override() {
        fn ignore(_: &mut Sum, _: &TokenCursor<'_, Kind>, _: &mut i64) -> Result<(), String> {
            Ok(())
        }
        let mut parser = Parser::<Sum>::default().with_handler(Kind::Text, ignore);
        let mut total = 0;
        let tokens = vec![tok(Kind::Text, "x", 0), tok(Kind::Number, "5", 1)];
        parser.parse(&tokens, &mut total).unwrap();
        assert_eq!(total, 5);
    }

    #[test]
    fn test_cursor_neighbours() {
        let tokens = sample();
        let cursor = TokenCursor::new(&tokens, 2).unwrap();
        assert_eq!(cursor.previous().map(|t| t.kind), Some(Kind::Space));
        assert_eq!(cursor.peek().map(|t| t.kind), Some(Kind::Number));
        assert!(!cursor.is_last());
        assert!(TokenCursor::new(&tokens, 4).is_none());
        let first = TokenCursor::new(&tokens, 0).unwrap();
        assert!(first.previous().is_none());
    }
}
