//! Dotted path resolution
//!
//!     `server.tls.cert` addresses the `cert` child (or property) of `tls`, itself a child of
//!     `server`. Paths may optionally start with the name of the node the walk starts from,
//!     so fully qualified paths produced by [NodeRef::path](super::NodeRef::path) resolve
//!     from the root they were computed against.
//!
//!     Every segment except the last must name a direct child. The last segment names a
//!     direct child in node mode, or a property key when [AccessFlags::NEED_PROPERTY] is set.
//!     With [AccessFlags::CREATE_NODES] missing nodes along the way, and the final node or
//!     property, are created empty.

use super::arena::NodeId;
use super::tree::ConfigTree;
use crate::error::ConfigError;
use std::ops::BitOr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccessFlags(u8);

impl AccessFlags {
    pub const NONE: AccessFlags = AccessFlags(0);
    /// Create missing nodes (and the final property) while walking.
    pub const CREATE_NODES: AccessFlags = AccessFlags(1);
    /// The final segment names a property rather than a child node.
    pub const NEED_PROPERTY: AccessFlags = AccessFlags(1 << 1);

    pub const fn contains(self, other: AccessFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for AccessFlags {
    type Output = AccessFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        AccessFlags(self.0 | rhs.0)
    }
}

/// Outcome of a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Node(NodeId),
    Property { node: NodeId, key: String },
    Missing,
}

#[derive(Debug, Clone, Copy)]
pub struct DotAccess<'p> {
    path: &'p str,
    flags: AccessFlags,
}

impl<'p> DotAccess<'p> {
    pub fn new(path: &'p str, flags: AccessFlags) -> Self {
        Self { path, flags }
    }

    pub fn path(&self) -> &'p str {
        self.path
    }

    fn segments(&self, start_name: &str) -> Vec<&'p str> {
        let mut parts: Vec<&'p str> = self.path.split('.').collect();
        if parts.first() == Some(&start_name) {
            parts.remove(0);
        }
        parts
    }

    /// Read-only walk. Fails with [ConfigError::ReadOnlyAccess] when asked to create.
    pub fn walk(&self, tree: &ConfigTree, from: NodeId) -> Result<Resolved, ConfigError> {
        if self.flags.contains(AccessFlags::CREATE_NODES) {
            return Err(ConfigError::ReadOnlyAccess(self.path.to_string()));
        }
        let parts = self.segments(&tree.data(from).name);
        let Some((last, intermediate)) = parts.split_last() else {
            return Ok(Resolved::Missing);
        };

        let mut at = from;
        for segment in intermediate {
            match tree.find_direct(at, segment) {
                Some(child) => at = child,
                None => return Ok(Resolved::Missing),
            }
        }

        if self.flags.contains(AccessFlags::NEED_PROPERTY) {
            if tree.data(at).properties.contains_key(*last) {
                return Ok(Resolved::Property {
                    node: at,
                    key: last.to_string(),
                });
            }
            return Ok(Resolved::Missing);
        }
        Ok(tree
            .find_direct(at, last)
            .map_or(Resolved::Missing, Resolved::Node))
    }

    /// Walk that may create missing nodes and properties.
    pub fn walk_mut(&self, tree: &mut ConfigTree, from: NodeId) -> Result<Resolved, ConfigError> {
        let create = self.flags.contains(AccessFlags::CREATE_NODES);
        if !create {
            return self.walk(tree, from);
        }
        let parts = self.segments(&tree.data(from).name);
        if parts.is_empty() || parts.iter().any(|segment| segment.is_empty()) {
            return Err(ConfigError::InvalidPath(self.path.to_string()));
        }
        let Some((last, intermediate)) = parts.split_last() else {
            return Ok(Resolved::Missing);
        };

        let mut at = from;
        for segment in intermediate {
            at = match tree.find_direct(at, segment) {
                Some(child) => child,
                None => tree.new_child(at, segment),
            };
        }

        if self.flags.contains(AccessFlags::NEED_PROPERTY) {
            tree.data_mut(at)
                .properties
                .entry(last.to_string())
                .or_default();
            return Ok(Resolved::Property {
                node: at,
                key: last.to_string(),
            });
        }
        let node = match tree.find_direct(at, last) {
            Some(child) => child,
            None => tree.new_child(at, last),
        };
        Ok(Resolved::Node(node))
    }
}
