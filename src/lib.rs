//! # cfgtree
//!
//! Hierarchical configuration trees and the small toolkit used to parse text into them.
//!
//! - [lexing]: a generic lexer driven by an ordered table of literal or regex separators.
//! - [parsing]: a dispatch engine replaying a token sequence through per-kind handlers.
//! - [config]: the configuration node tree, dotted paths, typed values and validation.
//! - [formats]: the INI parser and writer, and output renderers.
//! - [settings]: layered settings for the INI parser and the `cfgtree` binary.
//!
//! ```rust-example
//! let tree = cfgtree::formats::ini::parse_ini("[server]\nport = 8080\n")?;
//! let port: u16 = tree.root().property_as("server.port")?;
//! ```

pub mod config;
pub mod error;
pub mod formats;
pub mod lexing;
pub mod parsing;
pub mod settings;
pub mod testing;

pub use crate::config::{ConfigDocument, ConfigTree, NodeMut, NodeRef};
pub use crate::error::{ConfigError, Error, Result};
pub use crate::formats::ini::{parse_ini, IniParser};
