//! Output formats for configuration trees
//!
//! Each format implements [`Formatter`] and is looked up by name in a [`FormatRegistry`].
//! The defaults are:
//! - `json` / `yaml`: the serde shape of the node (`name`, `value`, `properties`, `children`)
//! - `ini`: INI text, see [`ini::writer`]
//! - `paths`: one `path = value` line per property of the subtree

pub mod ini;

use crate::config::NodeRef;
use crate::error::FormatError;
use crate::settings::IniSettings;
use std::collections::HashMap;

/// Renders a node and its subtree.
pub trait Formatter: Send + Sync {
    fn name(&self) -> &str;

    fn render(&self, node: NodeRef<'_>) -> Result<String, FormatError>;

    fn description(&self) -> &str {
        ""
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl Formatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn render(&self, node: NodeRef<'_>) -> Result<String, FormatError> {
        let text = if self.pretty {
            serde_json::to_string_pretty(&node)?
        } else {
            serde_json::to_string(&node)?
        };
        Ok(text)
    }

    fn description(&self) -> &str {
        "Node tree as JSON"
    }
}

pub struct YamlFormatter;

impl Formatter for YamlFormatter {
    fn name(&self) -> &str {
        "yaml"
    }

    fn render(&self, node: NodeRef<'_>) -> Result<String, FormatError> {
        Ok(serde_yaml::to_string(&node)?)
    }

    fn description(&self) -> &str {
        "Node tree as YAML"
    }
}

/// INI text checked against the markers and quote of `settings`, so the output
/// parses back with the same settings.
#[derive(Default)]
pub struct IniFormatter {
    settings: IniSettings,
}

impl IniFormatter {
    pub fn new(settings: IniSettings) -> Self {
        Self { settings }
    }
}

impl Formatter for IniFormatter {
    fn name(&self) -> &str {
        "ini"
    }

    fn render(&self, node: NodeRef<'_>) -> Result<String, FormatError> {
        ini::to_ini_string_with(node, &self.settings)
    }

    fn description(&self) -> &str {
        "INI text with dotted section names"
    }
}

pub struct PathsFormatter;

impl Formatter for PathsFormatter {
    fn name(&self) -> &str {
        "paths"
    }

    fn render(&self, node: NodeRef<'_>) -> Result<String, FormatError> {
        let mut out = String::new();
        for (path, value) in node.property_pairs_recursive() {
            out.push_str(&path);
            out.push_str(" = ");
            out.push_str(&value);
            out.push('\n');
        }
        Ok(out)
    }

    fn description(&self) -> &str {
        "One 'path = value' line per property"
    }
}

/// Formatters by name.
pub struct FormatRegistry {
    formatters: HashMap<String, Box<dyn Formatter>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        FormatRegistry {
            formatters: HashMap::new(),
        }
    }

    /// Registers `formatter`, replacing any formatter with the same name.
    pub fn register<F: Formatter + 'static>(&mut self, formatter: F) {
        self.formatters
            .insert(formatter.name().to_string(), Box::new(formatter));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Formatter> {
        self.formatters.get(name).map(|f| f.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.formatters.contains_key(name)
    }

    pub fn render(&self, node: NodeRef<'_>, format: &str) -> Result<String, FormatError> {
        let formatter = self
            .get(format)
            .ok_or_else(|| FormatError::UnknownFormat(format.to_string()))?;
        formatter.render(node)
    }

    /// Registered names, sorted.
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formatters.keys().cloned().collect();
        names.sort();
        names
    }

    /// The built-in formatters; `pretty` applies to JSON.
    pub fn with_defaults(pretty: bool) -> Self {
        let mut registry = Self::new();
        registry.register(JsonFormatter { pretty });
        registry.register(YamlFormatter);
        registry.register(IniFormatter::default());
        registry.register(PathsFormatter);
        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults(true)
    }
}
