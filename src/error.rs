//! Error types shared across the crate.
//!
//! Each layer owns its error enum: [`ConfigError`] for the node tree and path
//! resolver, [`LexError`] for token tables, [`IniError`] for the INI state machine
//! and [`FormatError`] for output rendering. [`Error`] aggregates them for callers
//! that drive the whole pipeline.

use std::fmt;
use thiserror::Error;

/// A single schema mismatch reported by a validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Path of the node or property that failed.
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised by the configuration tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required child or property is absent.
    #[error("'{path}' not found in node '{context}'")]
    NotFound { path: String, context: String },

    /// A direct child or property with this name already exists.
    #[error("'{name}' already registered in node '{context}'")]
    DuplicateName { name: String, context: String },

    /// A scalar could not be converted to the requested type.
    #[error("cannot convert '{value}' to {target}")]
    ConversionFailed { value: String, target: &'static str },

    /// The node does not match its schema.
    #[error("validation failed: {}", join_violations(.violations))]
    ValidationFailed { violations: Vec<Violation> },

    /// The dotted path contains an empty segment where a name is required.
    #[error("invalid path '{0}'")]
    InvalidPath(String),

    /// A read-only walk was asked to create nodes.
    #[error("cannot create nodes while walking '{0}' read-only")]
    ReadOnlyAccess(String),
}

/// Errors raised while building or running a lexer.
#[derive(Debug, Error)]
pub enum LexError {
    #[error("token '{name}' has an invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        name: String,
        pattern: String,
        source: regex::Error,
    },

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/// Structural problems found by the INI parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IniErrorKind {
    #[error("section header must be alone on its line")]
    SectionNotOnOwnLine,
    #[error("unexpected '[' inside a section header")]
    UnexpectedSectionOpen,
    #[error("']' without a matching '['")]
    MissingSectionStart,
    #[error("section header without a closing ']'")]
    UnterminatedSection,
    #[error("empty section name")]
    EmptySectionName,
    #[error("section '{0}' is declared more than once")]
    DuplicateSection(String),
    #[error("empty property name")]
    EmptyPropertyName,
    #[error("cannot insert property '{0}'")]
    PropertyInsertionFailed(String),
    #[error("value without a property name")]
    PropertyMissingKey,
}

/// An INI structural error with the position of the token that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct IniError {
    pub kind: IniErrorKind,
    pub line: usize,
    pub column: usize,
}

impl IniError {
    pub fn new(kind: IniErrorKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}

/// Errors raised while rendering a tree.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unknown output format '{0}'")]
    UnknownFormat(String),
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot write '{path}' as INI: {reason}")]
    Unrepresentable { path: String, reason: &'static str },
}

/// Crate-level error for operations spanning several layers.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Ini(#[from] IniError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("invalid settings: {0}")]
    Settings(#[from] config::ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
