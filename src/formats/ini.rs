//! INI format
//!
//!     A line-oriented format made of section headers and `key = value` assignments:
//!
//!         ; global
//!         name = demo
//!
//!         [server]
//!         # whole-line comments only; a comment after a value drops the value
//!         host = "localhost"
//!         port = 8080
//!
//!     Assignments before the first header land on the root node; each `[name]` header
//!     selects (or creates) a direct child of the root that receives the assignments
//!     after it.
//!
//! Pieces
//!
//!     - The token table below feeds the generic [Lexer](crate::lexing::Lexer). Comment
//!       markers and the quote character come from [IniSettings].
//!     - [parser] holds the state machine plugged into the dispatch engine.
//!     - [writer] renders a tree back to INI text.

pub mod parser;
pub mod writer;

pub use parser::{parse_ini, IniParser, IniState};
pub use writer::{to_ini_string, to_ini_string_with, write_ini, write_ini_with};

use crate::lexing::{TokenDef, TokenFlags, TokenKind, TokenTable};
use crate::settings::IniSettings;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IniToken {
    NewLine,
    SectionOpen,
    SectionClose,
    Assign,
    Comment,
    Quote,
    Text,
}

impl TokenKind for IniToken {
    const TEXT: Self = IniToken::Text;
    const ALL: &'static [Self] = &[
        IniToken::NewLine,
        IniToken::SectionOpen,
        IniToken::SectionClose,
        IniToken::Assign,
        IniToken::Comment,
        IniToken::Quote,
        IniToken::Text,
    ];
}

const CRLF: TokenDef<IniToken> = TokenDef::literal(IniToken::NewLine, "crlf", "\r\n");
const LF: TokenDef<IniToken> = TokenDef::literal(IniToken::NewLine, "newline", "\n");
const SECTION_OPEN: TokenDef<IniToken> =
    TokenDef::literal(IniToken::SectionOpen, "section-open", "[");
const SECTION_CLOSE: TokenDef<IniToken> =
    TokenDef::literal(IniToken::SectionClose, "section-close", "]");
const ASSIGN: TokenDef<IniToken> = TokenDef::literal(IniToken::Assign, "assign", "=");

/// Token table for `settings`. Empty markers are skipped.
pub fn token_table(settings: &IniSettings) -> TokenTable<IniToken> {
    let mut table = TokenTable::from(vec![CRLF, LF, SECTION_OPEN, SECTION_CLOSE, ASSIGN]);
    for marker in settings.comment_markers.iter().filter(|m| !m.is_empty()) {
        table.push(TokenDef::new(
            IniToken::Comment,
            format!("comment {marker}"),
            marker.as_str(),
            TokenFlags::NONE,
        ));
    }
    if !settings.quote.is_empty() {
        table.push(TokenDef::new(
            IniToken::Quote,
            "quote",
            settings.quote.as_str(),
            TokenFlags::NONE,
        ));
    }
    table
}
