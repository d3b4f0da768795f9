//! INI state machine
//!
//!     [IniState] is a [ParseState] for the dispatch engine: one handler per [IniToken],
//!     each mutating the output [ConfigTree] as the tokens stream by. Text is gathered in
//!     an accumulator until a structural token decides what it was: a section name, a
//!     property key or a property value.
//!
//!     Structural characters lose their meaning in a few places:
//!
//!     - inside quotes, everything except the closing quote is text;
//!     - after `key =`, `[`, `]` and further `=` belong to the value;
//!     - inside a section header, `=` is part of the name;
//!     - after a comment marker, everything up to the end of the line is ignored.
//!
//!     The quote character itself is kept in the value. A value is only taken at the end
//!     of a line without a comment: `k = v ; note` leaves `k` empty. Nothing but blanks
//!     and a comment may follow a section header on its line.
//!
//!     Errors carry the line and column of the token that triggered them. A failed parse
//!     leaves whatever was written so far in the tree.

use super::IniToken;
use crate::config::{ConfigTree, NodeId};
use crate::error::{Error, IniError, IniErrorKind, LexError};
use crate::lexing::{Lexer, Token};
use crate::parsing::{Handler, ParseState, Parser, TokenCursor};
use crate::settings::{IniSettings, SectionPolicy};
use std::io::Read;

type IniHandler = Handler<IniState, IniToken, ConfigTree, IniError>;

#[derive(Debug, Clone, Default)]
pub struct IniState {
    policy: SectionPolicy,
    in_comment: bool,
    in_section: bool,
    in_quote: bool,
    /// A header was closed on the current line.
    after_header: bool,
    accu: String,
    /// Property receiving the value at the end of the line.
    target: Option<(NodeId, String)>,
    /// Section receiving assignments; the root until a header is seen.
    section: Option<NodeId>,
}

fn error_at(token: &Token<IniToken>, kind: IniErrorKind) -> IniError {
    IniError::new(kind, token.line, token.column)
}

impl IniState {
    pub fn new(policy: SectionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> SectionPolicy {
        self.policy
    }

    /// Section assignments currently go to, if a header was seen.
    pub fn current_section(&self) -> Option<NodeId> {
        self.section
    }

    /// Anything structural after `]` on the same line.
    fn reject_after_header(&self, token: &Token<IniToken>) -> Result<(), IniError> {
        if self.after_header && !self.in_comment {
            return Err(error_at(token, IniErrorKind::SectionNotOnOwnLine));
        }
        Ok(())
    }

    /// True while the structural meaning of `[`, `]` and `=` is suspended.
    fn literal_mode(&self) -> bool {
        self.in_quote || self.target.is_some()
    }

    /// Hands the accumulated text of the line to the pending property.
    fn commit_value(
        &mut self,
        token: &Token<IniToken>,
        tree: &mut ConfigTree,
    ) -> Result<(), IniError> {
        let value = self.accu.trim();
        if value.is_empty() {
            self.accu.clear();
            return Ok(());
        }
        let Some((node, key)) = &self.target else {
            return Err(error_at(token, IniErrorKind::PropertyMissingKey));
        };
        if !tree.contains(*node) {
            return Err(error_at(token, IniErrorKind::PropertyInsertionFailed(key.clone())));
        }
        tree.data_mut(*node)
            .properties
            .insert(key.clone(), value.to_string());
        self.accu.clear();
        Ok(())
    }

    fn section_open(
        &mut self,
        cursor: &TokenCursor<'_, IniToken>,
        _tree: &mut ConfigTree,
    ) -> Result<(), IniError> {
        let token = cursor.token();
        if self.in_comment {
            return Ok(());
        }
        self.reject_after_header(token)?;
        if self.literal_mode() {
            self.accu.push_str(&token.text);
            return Ok(());
        }
        if !self.accu.trim().is_empty() {
            return Err(error_at(token, IniErrorKind::SectionNotOnOwnLine));
        }
        if self.in_section {
            return Err(error_at(token, IniErrorKind::UnexpectedSectionOpen));
        }
        self.in_section = true;
        self.accu.clear();
        Ok(())
    }

    fn section_close(
        &mut self,
        cursor: &TokenCursor<'_, IniToken>,
        tree: &mut ConfigTree,
    ) -> Result<(), IniError> {
        let token = cursor.token();
        if self.in_comment {
            return Ok(());
        }
        self.reject_after_header(token)?;
        if self.literal_mode() {
            self.accu.push_str(&token.text);
            return Ok(());
        }
        if !self.in_section {
            return Err(error_at(token, IniErrorKind::MissingSectionStart));
        }
        let name = self.accu.trim();
        if name.is_empty() {
            return Err(error_at(token, IniErrorKind::EmptySectionName));
        }

        let root = tree.root_id();
        let section = match tree.find_direct(root, name) {
            Some(_) if self.policy == SectionPolicy::Reject => {
                return Err(error_at(
                    token,
                    IniErrorKind::DuplicateSection(name.to_string()),
                ));
            }
            Some(existing) => existing,
            None => tree.new_child(root, name),
        };
        tracing::trace!(section = name, line = token.line, "section");
        self.section = Some(section);
        self.in_section = false;
        self.after_header = true;
        self.accu.clear();
        Ok(())
    }

    fn assign(
        &mut self,
        cursor: &TokenCursor<'_, IniToken>,
        tree: &mut ConfigTree,
    ) -> Result<(), IniError> {
        let token = cursor.token();
        if self.in_comment {
            return Ok(());
        }
        self.reject_after_header(token)?;
        if self.literal_mode() || self.in_section {
            self.accu.push_str(&token.text);
            return Ok(());
        }
        let key = self.accu.trim();
        if key.is_empty() {
            return Err(error_at(token, IniErrorKind::EmptyPropertyName));
        }
        let node = self.section.unwrap_or_else(|| tree.root_id());
        if !tree.contains(node) {
            return Err(error_at(
                token,
                IniErrorKind::PropertyInsertionFailed(key.to_string()),
            ));
        }
        tree.data_mut(node)
            .properties
            .entry(key.to_string())
            .or_default();
        self.target = Some((node, key.to_string()));
        self.accu.clear();
        Ok(())
    }

    fn comment(
        &mut self,
        cursor: &TokenCursor<'_, IniToken>,
        _tree: &mut ConfigTree,
    ) -> Result<(), IniError> {
        if self.in_comment {
            return Ok(());
        }
        if self.in_quote {
            self.accu.push_str(&cursor.token().text);
            return Ok(());
        }
        self.in_comment = true;
        Ok(())
    }

    fn quote(
        &mut self,
        cursor: &TokenCursor<'_, IniToken>,
        _tree: &mut ConfigTree,
    ) -> Result<(), IniError> {
        if !self.in_comment {
            self.reject_after_header(cursor.token())?;
            self.in_quote = !self.in_quote;
            self.accu.push_str(&cursor.token().text);
        }
        Ok(())
    }

    fn new_line(
        &mut self,
        cursor: &TokenCursor<'_, IniToken>,
        tree: &mut ConfigTree,
    ) -> Result<(), IniError> {
        let token = cursor.token();
        if self.in_section {
            return Err(error_at(token, IniErrorKind::UnterminatedSection));
        }
        if !self.in_comment {
            self.commit_value(token, tree)?;
        }
        self.end_line();
        Ok(())
    }

    fn text(
        &mut self,
        cursor: &TokenCursor<'_, IniToken>,
        _tree: &mut ConfigTree,
    ) -> Result<(), IniError> {
        let token = cursor.token();
        if self.in_comment {
            return Ok(());
        }
        if !token.text.trim().is_empty() {
            self.reject_after_header(token)?;
        }
        self.accu.push_str(&token.text);
        Ok(())
    }

    fn end_line(&mut self) {
        self.in_comment = false;
        self.in_section = false;
        self.in_quote = false;
        self.after_header = false;
        self.accu.clear();
        self.target = None;
    }
}

impl ParseState for IniState {
    type Kind = IniToken;
    type Output = ConfigTree;
    type Error = IniError;

    fn handler(kind: IniToken) -> Option<IniHandler> {
        let handler: IniHandler = match kind {
            IniToken::NewLine => IniState::new_line,
            IniToken::SectionOpen => IniState::section_open,
            IniToken::SectionClose => IniState::section_close,
            IniToken::Assign => IniState::assign,
            IniToken::Comment => IniState::comment,
            IniToken::Quote => IniState::quote,
            IniToken::Text => IniState::text,
        };
        Some(handler)
    }

    fn reset(&mut self) {
        self.end_line();
        self.section = None;
    }

    /// Input that doesn't end with a newline gets its last line closed here.
    fn finish(
        &mut self,
        tokens: &[Token<IniToken>],
        tree: &mut ConfigTree,
    ) -> Result<(), IniError> {
        let Some(last) = tokens.last() else {
            return Ok(());
        };
        if last.kind == IniToken::NewLine {
            return Ok(());
        }
        match TokenCursor::new(tokens, tokens.len() - 1) {
            Some(cursor) => self.new_line(&cursor, tree),
            None => Ok(()),
        }
    }
}

/// The INI lexer and state machine bundled together.
pub struct IniParser {
    lexer: Lexer<IniToken>,
    engine: Parser<IniState>,
}

impl IniParser {
    pub fn new() -> Result<Self, LexError> {
        Self::with_settings(&IniSettings::default())
    }

    pub fn with_settings(settings: &IniSettings) -> Result<Self, LexError> {
        Ok(Self {
            lexer: Lexer::new(super::token_table(settings))?,
            engine: Parser::new(IniState::new(settings.duplicate_sections)),
        })
    }

    pub fn lexer(&self) -> &Lexer<IniToken> {
        &self.lexer
    }

    pub fn state(&self) -> &IniState {
        self.engine.state()
    }

    pub fn tokenize(&self, text: &str) -> Vec<Token<IniToken>> {
        self.lexer.analyse(text)
    }

    pub fn tokenize_reader<R: Read>(&self, reader: R) -> Result<Vec<Token<IniToken>>, LexError> {
        self.lexer.analyse_reader(reader)
    }

    /// Feeds `tokens` into `tree`, continuing from the current state.
    pub fn parse_tokens(
        &mut self,
        tokens: &[Token<IniToken>],
        tree: &mut ConfigTree,
    ) -> Result<(), IniError> {
        self.engine.parse(tokens, tree)
    }

    /// Parses `text` into an existing tree, starting from a clean state.
    pub fn parse_into(&mut self, text: &str, tree: &mut ConfigTree) -> Result<(), IniError> {
        let tokens = self.tokenize(text);
        self.reset();
        self.parse_tokens(&tokens, tree)
    }

    /// Parses `text` into a new tree with an unnamed root.
    pub fn parse_str(&mut self, text: &str) -> Result<ConfigTree, IniError> {
        let mut tree = ConfigTree::new("");
        self.parse_into(text, &mut tree)?;
        Ok(tree)
    }

    pub fn reset(&mut self) {
        self.engine.reset();
    }
}

/// Parses `text` with the default settings.
pub fn parse_ini(text: &str) -> Result<ConfigTree, Error> {
    Ok(IniParser::new()?.parse_str(text)?)
}
