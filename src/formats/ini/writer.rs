//! INI output
//!
//! The properties of the starting node come first, without a header. Every descendant
//! with properties then gets a `[section]` named by its path relative to the starting
//! node, so nested nodes produce dotted section names. Nodes without properties are
//! skipped; their descendants still appear under their own dotted names.
//!
//! Output is checked against the parser's reading of it before anything is written.
//! Names and values that would come back different (a value with a comment marker
//! outside quotes, a key holding `=`, surrounding blanks, line breaks, two nodes
//! flattening to the same section name) fail with [FormatError::Unrepresentable].

use crate::config::NodeRef;
use crate::error::FormatError;
use crate::settings::IniSettings;
use std::collections::HashSet;
use std::io::Write;

/// Writes with the default comment markers and quote.
pub fn write_ini<W: Write>(node: NodeRef<'_>, out: W) -> Result<(), FormatError> {
    write_ini_with(node, out, &IniSettings::default())
}

/// Writes text that [IniParser](super::IniParser) built from `settings` reads back to the
/// same property paths and values.
pub fn write_ini_with<W: Write>(
    node: NodeRef<'_>,
    mut out: W,
    settings: &IniSettings,
) -> Result<(), FormatError> {
    let rules = Rules { settings };
    let sections = rules.plan(node)?;

    let mut wrote_any = write_properties(node, &mut out)?;
    for (name, section) in sections {
        if wrote_any {
            writeln!(out)?;
        }
        writeln!(out, "[{name}]")?;
        write_properties(section, &mut out)?;
        wrote_any = true;
    }
    Ok(())
}

pub fn to_ini_string(node: NodeRef<'_>) -> Result<String, FormatError> {
    to_ini_string_with(node, &IniSettings::default())
}

pub fn to_ini_string_with(node: NodeRef<'_>, settings: &IniSettings) -> Result<String, FormatError> {
    let mut out = Vec::new();
    write_ini_with(node, &mut out, settings)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn write_properties<W: Write>(node: NodeRef<'_>, out: &mut W) -> Result<bool, FormatError> {
    for (key, value) in node.properties() {
        writeln!(out, "{key} = {value}")?;
    }
    Ok(node.has_properties())
}

struct Rules<'s> {
    settings: &'s IniSettings,
}

impl Rules<'_> {
    /// Section names in output order, after checking every name and value.
    fn plan<'a>(&self, node: NodeRef<'a>) -> Result<Vec<(String, NodeRef<'a>)>, FormatError> {
        self.check_properties(node, "")?;
        let mut seen = HashSet::new();
        let mut planned = Vec::new();
        for section in sections(node) {
            let name = relative_path(node, section);
            self.check_name(&name, &name)?;
            if !seen.insert(name.clone()) {
                return Err(unrepresentable(&name, "section name is written twice"));
            }
            self.check_properties(section, &name)?;
            planned.push((name, section));
        }
        Ok(planned)
    }

    fn check_properties(&self, node: NodeRef<'_>, section: &str) -> Result<(), FormatError> {
        for (key, value) in node.properties() {
            let path = if section.is_empty() {
                key.to_string()
            } else {
                format!("{section}.{key}")
            };
            self.check_name(key, &path)?;
            self.check_value(value, &path)?;
        }
        Ok(())
    }

    fn markers(&self) -> impl Iterator<Item = &str> + '_ {
        self.settings
            .comment_markers
            .iter()
            .map(String::as_str)
            .filter(|marker| !marker.is_empty())
    }

    fn check_common(&self, text: &str, path: &str) -> Result<(), FormatError> {
        if text.contains(['\n', '\r']) {
            return Err(unrepresentable(path, "contains a line break"));
        }
        if text.trim() != text {
            return Err(unrepresentable(path, "has leading or trailing whitespace"));
        }
        Ok(())
    }

    /// Keys and section names: no structural token at all.
    fn check_name(&self, name: &str, path: &str) -> Result<(), FormatError> {
        if name.is_empty() {
            return Err(unrepresentable(path, "name is empty"));
        }
        self.check_common(name, path)?;
        if name.contains(['[', ']', '=']) {
            return Err(unrepresentable(path, "name contains '[', ']' or '='"));
        }
        let quote = self.settings.quote.as_str();
        if self.markers().any(|marker| name.contains(marker))
            || (!quote.is_empty() && name.contains(quote))
        {
            return Err(unrepresentable(path, "name contains a comment marker or quote"));
        }
        Ok(())
    }

    /// Values: a comment marker only survives between quotes.
    fn check_value(&self, value: &str, path: &str) -> Result<(), FormatError> {
        self.check_common(value, path)?;
        let quote = self.settings.quote.as_str();
        let mut in_quote = false;
        let mut rest = value;
        while let Some(c) = rest.chars().next() {
            // `[`, `]` and `=` win ties in the token table.
            if matches!(c, '[' | ']' | '=') {
                rest = &rest[c.len_utf8()..];
                continue;
            }
            if let Some(marker) = self.markers().find(|marker| rest.starts_with(marker)) {
                if !in_quote {
                    return Err(unrepresentable(path, "value contains a comment marker"));
                }
                rest = &rest[marker.len()..];
                continue;
            }
            if !quote.is_empty() && rest.starts_with(quote) {
                in_quote = !in_quote;
                rest = &rest[quote.len()..];
                continue;
            }
            rest = &rest[c.len_utf8()..];
        }
        Ok(())
    }
}

fn unrepresentable(path: &str, reason: &'static str) -> FormatError {
    FormatError::Unrepresentable {
        path: path.to_string(),
        reason,
    }
}

/// Descendants with properties, depth first.
fn sections<'a>(node: NodeRef<'a>) -> Vec<NodeRef<'a>> {
    let mut found = Vec::new();
    let mut pending: Vec<NodeRef<'a>> = node.children().collect();
    pending.reverse();
    while let Some(next) = pending.pop() {
        if next.has_properties() {
            found.push(next);
        }
        let mut children: Vec<_> = next.children().collect();
        children.reverse();
        pending.extend(children);
    }
    found
}

fn relative_path(base: NodeRef<'_>, node: NodeRef<'_>) -> String {
    let mut names: Vec<&str> = node
        .ancestors()
        .into_iter()
        .skip_while(|ancestor| ancestor.id() != base.id())
        .skip(1)
        .map(|ancestor| ancestor.name())
        .collect();
    names.retain(|name| !name.is_empty());
    names.join(".")
}
