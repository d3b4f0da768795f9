//! Documents: a configuration tree plus where it came from.

use super::tree::ConfigTree;
use crate::error::{ConfigError, Error, FormatError};
use crate::formats::ini::{writer, IniParser};
use indexmap::IndexMap;
use std::io::{Read, Write};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Loaded from a file on disk.
    File,
    /// Built from a string or assembled in code.
    Inline,
}

/// Metadata about the origin of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: String,
    pub path: Option<PathBuf>,
    pub kind: ResourceKind,
    /// Free-form annotations, e.g. the settings file a document was loaded with.
    pub properties: IndexMap<String, String>,
}

impl Resource {
    pub fn inline(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            kind: ResourceKind::Inline,
            properties: IndexMap::new(),
        }
    }

    /// A file resource named after the file stem of `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            path: Some(path),
            kind: ResourceKind::File,
            properties: IndexMap::new(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// A [ConfigTree] whose root node is named after its [Resource].
///
/// Node operations are reached through `Deref` to the tree.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    resource: Resource,
    tree: ConfigTree,
}

impl ConfigDocument {
    pub fn new(resource: Resource) -> Self {
        let tree = ConfigTree::new(resource.name.clone());
        Self { resource, tree }
    }

    /// Reads `reader` to the end and parses it as INI into a fresh document.
    pub fn load<R: Read>(
        resource: Resource,
        reader: R,
        parser: &mut IniParser,
    ) -> Result<Self, Error> {
        let mut document = Self::new(resource);
        let tokens = parser.tokenize_reader(reader)?;
        parser.reset();
        parser.parse_tokens(&tokens, &mut document.tree)?;
        tracing::debug!(
            resource = %document.resource.name,
            nodes = document.tree.node_count(),
            "loaded document"
        );
        Ok(document)
    }

    pub fn from_ini_str(resource: Resource, text: &str) -> Result<Self, Error> {
        Self::load(resource, text.as_bytes(), &mut IniParser::new()?)
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn resource_mut(&mut self) -> &mut Resource {
        &mut self.resource
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    pub fn into_tree(self) -> ConfigTree {
        self.tree
    }

    /// Renames the resource and the root node together.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), ConfigError> {
        let name = name.into();
        self.tree.root_mut().set_name(name.clone())?;
        self.resource.name = name;
        Ok(())
    }

    pub fn write_ini<W: Write>(&self, out: W) -> Result<(), FormatError> {
        writer::write_ini(self.tree.root(), out)
    }
}

impl Deref for ConfigDocument {
    type Target = ConfigTree;

    fn deref(&self) -> &ConfigTree {
        &self.tree
    }
}

impl DerefMut for ConfigDocument {
    fn deref_mut(&mut self) -> &mut ConfigTree {
        &mut self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_resource_is_named_after_stem() {
        let resource = Resource::file("/etc/app/server.ini");
        assert_eq!(resource.name, "server");
        assert_eq!(resource.kind, ResourceKind::File);
        assert_eq!(resource.path(), Some(Path::new("/etc/app/server.ini")));
    }

    #[test]
    fn test_root_is_named_after_resource() {
        let document =
            ConfigDocument::from_ini_str(Resource::inline("app"), "[db]\nhost = x\n").unwrap();
        assert_eq!(document.root().name(), "app");
        assert_eq!(document.root().property("db.host"), Ok("x"));
        // fully qualified paths resolve too
        assert_eq!(document.root().property("app.db.host"), Ok("x"));
    }

    #[test]
    fn test_set_name_renames_both() {
        let mut document = ConfigDocument::new(Resource::inline("a"));
        document.root_mut().set_property("k", "v").unwrap();
        document.set_name("b").unwrap();
        assert_eq!(document.resource().name, "b");
        assert_eq!(document.root().name(), "b");
        assert_eq!(document.root().property("k"), Ok("v"));
    }

    #[test]
    fn test_write_ini() {
        let document =
            ConfigDocument::from_ini_str(Resource::inline("app"), "top = 1\n[s]\nk = v\n").unwrap();
        let mut out = Vec::new();
        document.write_ini(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "top = 1\n\n[s]\nk = v\n");
    }
}
