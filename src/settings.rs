//! Settings for the INI parser and the command line tool.
//!
//! `defaults/cfgtree.default.toml` is embedded so the documented defaults and the
//! runtime defaults can't drift apart. User files are layered on top via [`Loader`]
//! before deserializing into [`Settings`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/cfgtree.default.toml");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub ini: IniSettings,
    pub output: OutputSettings,
}

/// Knobs of the INI lexer and parser.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IniSettings {
    pub comment_markers: Vec<String>,
    pub quote: String,
    pub duplicate_sections: SectionPolicy,
}

impl Default for IniSettings {
    fn default() -> Self {
        Self {
            comment_markers: vec![";".to_string(), "#".to_string()],
            quote: "\"".to_string(),
            duplicate_sections: SectionPolicy::Reuse,
        }
    }
}

/// What a repeated `[name]` header does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionPolicy {
    /// Later assignments go to the section declared first.
    #[default]
    Reuse,
    /// The parse fails with a duplicate section error.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputSettings {
    pub format: String,
    pub pretty: bool,
}

/// Builds [Settings] from `defaults/cfgtree.default.toml`, then settings files in the
/// order they are added, then single-key overrides. Later layers win per key.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Only the embedded defaults so far.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Adds a TOML file, e.g. the one passed with `--settings`; `build` fails if it
    /// can't be read.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Adds a TOML file that may not exist, such as a per-user `cfgtree.toml`.
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Overrides one dotted key, e.g. `ini.duplicate_sections`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<Settings, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_defaults() -> Result<Settings, ConfigError> {
    Loader::new().build()
}
