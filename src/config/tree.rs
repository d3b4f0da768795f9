//! Configuration node tree
//!
//!     A [ConfigTree] owns every node of one tree in an arena. Nodes refer to their children
//!     and to their parent through [NodeId] handles, so the parent link is never an owning
//!     pointer and can't dangle: inserting a subtree that comes from another tree copies it
//!     node by node, handing out fresh handles and parent links as it goes.
//!
//!     [NodeRef] and [NodeMut] are cheap views pairing a tree with a handle. They carry the
//!     node API: lookups, listings, typed values, mutation and merging.
//!
//! Naming
//!
//!     Direct children have unique names, and so do the property keys of a node. Lookups
//!     accept dotted paths (see [DotAccess]); `direct_*` variants look at one level only.
//!     Names containing `.` can only be reached through the `direct_*` variants.

use super::access::{AccessFlags, DotAccess, Resolved};
use super::arena::{Arena, NodeId};
use super::schema::{StructuralValidator, ValidationFlags, Validator};
use super::value::ConfigValue;
use crate::error::ConfigError;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) name: String,
    pub(crate) value: String,
    pub(crate) children: Vec<NodeId>,
    pub(crate) properties: IndexMap<String, String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) schema: Option<Arc<ConfigTree>>,
}

impl NodeData {
    fn new(name: impl Into<String>, parent: Option<NodeId>) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            children: Vec::new(),
            properties: IndexMap::new(),
            parent,
            schema: None,
        }
    }
}

/// A tree of configuration nodes.
#[derive(Debug, Clone)]
pub struct ConfigTree {
    nodes: Arena<NodeData>,
    root: NodeId,
}

impl ConfigTree {
    pub fn new(name: impl Into<String>) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(NodeData::new(name, None));
        Self { nodes, root }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut tree = Self::new(name);
        tree.root_mut().set_raw_value(value);
        tree
    }

    /// Builds a tree from its parts. Duplicate child names or property keys fail with
    /// [ConfigError::DuplicateName].
    pub fn from_parts<K, V>(
        name: impl Into<String>,
        children: Vec<ConfigTree>,
        properties: impl IntoIterator<Item = (K, V)>,
        value: impl Into<String>,
    ) -> Result<Self, ConfigError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut tree = Self::with_value(name, value);
        {
            let mut root = tree.root_mut();
            for (key, value) in properties {
                root.add_property(key, value)?;
            }
            for child in children {
                root.add_direct_child(child)?;
            }
        }
        Ok(tree)
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            id: self.root,
        }
    }

    pub fn root_mut(&mut self) -> NodeMut<'_> {
        let id = self.root;
        NodeMut { tree: self, id }
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.contains(id).then_some(NodeRef { tree: self, id })
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<NodeMut<'_>> {
        if self.contains(id) {
            Some(NodeMut { tree: self, id })
        } else {
            None
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    /// Number of nodes in the tree, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deep copy of the subtree rooted at `id`, as a tree of its own.
    pub fn subtree(&self, id: NodeId) -> Option<ConfigTree> {
        self.contains(id).then(|| self.copy_subtree(id))
    }

    /// Merges `other` into the root; see [NodeMut::merge].
    pub fn merge(&mut self, other: &ConfigTree) -> Result<(), ConfigError> {
        self.root_mut().merge(other)
    }

    pub(crate) fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id]
    }

    pub(crate) fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id]
    }

    pub(crate) fn find_direct(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.data(id)
            .children
            .iter()
            .copied()
            .find(|child| self.data(*child).name == name)
    }

    /// Appends an empty child. The caller guarantees the name is free.
    pub(crate) fn new_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        let child = self.nodes.alloc(NodeData::new(name, Some(parent)));
        self.data_mut(parent).children.push(child);
        child
    }

    fn path_of(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let data = self.data(node);
            names.push(data.name.as_str());
            current = data.parent;
        }
        names.reverse();
        names
            .into_iter()
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(".")
    }

    fn copy_subtree(&self, id: NodeId) -> ConfigTree {
        let mut nodes = Arena::new();
        let root = nodes.alloc(NodeData::new(String::new(), None));
        let mut copy = ConfigTree { nodes, root };
        copy.fill_from(root, self, id);
        copy
    }

    /// Copies the content and descendants of `source_id` onto the existing node `into`,
    /// re-parenting every copied child under this tree's handles.
    fn fill_from(&mut self, into: NodeId, source: &ConfigTree, source_id: NodeId) {
        let data = source.data(source_id);
        {
            let target = self.data_mut(into);
            target.name = data.name.clone();
            target.value = data.value.clone();
            target.properties = data.properties.clone();
            target.schema = data.schema.clone();
        }
        for child in &data.children {
            let copied = self.nodes.alloc(NodeData::new(String::new(), Some(into)));
            self.data_mut(into).children.push(copied);
            self.fill_from(copied, source, *child);
        }
    }

    /// Copies `source_id` from `source` as a new last child of `parent`.
    fn import(&mut self, parent: NodeId, source: &ConfigTree, source_id: NodeId) -> NodeId {
        let copied = self.nodes.alloc(NodeData::new(String::new(), Some(parent)));
        self.data_mut(parent).children.push(copied);
        self.fill_from(copied, source, source_id);
        copied
    }

    fn release_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(node) = pending.pop() {
            if let Some(data) = self.nodes.release(node) {
                pending.extend(data.children);
            }
        }
    }

    /// Unlinks `id` from its parent and returns it as a standalone tree.
    fn detach(&mut self, id: NodeId) -> ConfigTree {
        if let Some(parent) = self.data(id).parent {
            self.data_mut(parent).children.retain(|child| *child != id);
        }
        let removed = self.copy_subtree(id);
        self.release_subtree(id);
        removed
    }

    /// Replaces the content and descendants of `id` with a copy of `source`, keeping the
    /// node's handle, name and position among its siblings.
    fn overwrite(&mut self, id: NodeId, source: &ConfigTree) {
        let name = self.data(id).name.clone();
        let old_children = std::mem::take(&mut self.data_mut(id).children);
        for child in old_children {
            self.release_subtree(child);
        }
        self.fill_from(id, source, source.root);
        self.data_mut(id).name = name;
    }

    fn resolve(&self, from: NodeId, path: &str, flags: AccessFlags) -> Resolved {
        DotAccess::new(path, flags)
            .walk(self, from)
            .unwrap_or(Resolved::Missing)
    }

    fn merge_node(
        &mut self,
        at: NodeId,
        source: &ConfigTree,
        source_id: NodeId,
    ) -> Result<(), ConfigError> {
        let data = source.data(source_id);
        if !data.name.is_empty() && data.name != self.data(at).name {
            self.rename(at, &data.name)?;
        }
        if !data.value.is_empty() {
            self.data_mut(at).value = data.value.clone();
        }
        for (key, value) in &data.properties {
            self.data_mut(at)
                .properties
                .insert(key.clone(), value.clone());
        }
        for child in &data.children {
            let name = &source.data(*child).name;
            match self.find_direct(at, name) {
                Some(existing) => self.merge_node(existing, source, *child)?,
                None => {
                    self.import(at, source, *child);
                }
            }
        }
        Ok(())
    }

    fn rename(&mut self, id: NodeId, name: &str) -> Result<(), ConfigError> {
        if let Some(parent) = self.data(id).parent {
            if let Some(existing) = self.find_direct(parent, name) {
                if existing != id {
                    return Err(ConfigError::DuplicateName {
                        name: name.to_string(),
                        context: self.path_of(parent),
                    });
                }
            }
        }
        self.data_mut(id).name = name.to_string();
        Ok(())
    }
}

impl PartialEq for ConfigTree {
    fn eq(&self, other: &Self) -> bool {
        self.root().structurally_eq(&other.root())
    }
}

/// Read-only view of one node.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a ConfigTree,
    id: NodeId,
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("path", &self.path())
            .finish()
    }
}

/// Two views are equal when they point at the same node of the same tree.
impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl<'a> NodeRef<'a> {
    fn data(&self) -> &'a NodeData {
        self.tree.data(self.id)
    }

    fn at(&self, id: NodeId) -> NodeRef<'a> {
        NodeRef {
            tree: self.tree,
            id,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a ConfigTree {
        self.tree
    }

    pub fn name(&self) -> &'a str {
        &self.data().name
    }

    pub fn value(&self) -> &'a str {
        &self.data().value
    }

    /// Dot-joined names from the tree root down to this node, skipping empty names.
    pub fn path(&self) -> String {
        self.tree.path_of(self.id)
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.data().parent.map(|id| self.at(id))
    }

    /// Every node from the root down to this one, both included.
    pub fn ancestors(&self) -> Vec<NodeRef<'a>> {
        let mut chain = vec![*self];
        let mut current = self.parent();
        while let Some(node) = current {
            chain.push(node);
            current = node.parent();
        }
        chain.reverse();
        chain
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.data()
            .children
            .iter()
            .map(move |id| NodeRef { tree, id: *id })
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    pub fn has_children(&self) -> bool {
        !self.data().children.is_empty()
    }

    pub fn first_child(&self) -> Option<NodeRef<'a>> {
        self.data().children.first().map(|id| self.at(*id))
    }

    pub fn last_child(&self) -> Option<NodeRef<'a>> {
        self.data().children.last().map(|id| self.at(*id))
    }

    pub fn properties(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.data()
            .properties
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn has_properties(&self) -> bool {
        !self.data().properties.is_empty()
    }

    /// No value, no properties and no children.
    pub fn is_empty(&self) -> bool {
        let data = self.data();
        data.value.is_empty() && data.properties.is_empty() && data.children.is_empty()
    }

    pub fn find_direct_child(&self, name: &str) -> Option<NodeRef<'a>> {
        self.tree.find_direct(self.id, name).map(|id| self.at(id))
    }

    pub fn direct_child(&self, name: &str) -> Result<NodeRef<'a>, ConfigError> {
        self.find_direct_child(name)
            .ok_or_else(|| self.not_found(name))
    }

    pub fn has_direct_child(&self, name: &str) -> bool {
        self.tree.find_direct(self.id, name).is_some()
    }

    pub fn find_child(&self, path: &str) -> Option<NodeRef<'a>> {
        match self.tree.resolve(self.id, path, AccessFlags::NONE) {
            Resolved::Node(id) => Some(self.at(id)),
            _ => None,
        }
    }

    /// Node at `path`, or [ConfigError::NotFound].
    pub fn child(&self, path: &str) -> Result<NodeRef<'a>, ConfigError> {
        self.find_child(path).ok_or_else(|| self.not_found(path))
    }

    pub fn has_child(&self, path: &str) -> bool {
        self.find_child(path).is_some()
    }

    pub fn direct_property(&self, key: &str) -> Option<&'a str> {
        self.data().properties.get(key).map(String::as_str)
    }

    pub fn has_direct_property(&self, key: &str) -> bool {
        self.data().properties.contains_key(key)
    }

    pub fn find_property(&self, path: &str) -> Option<&'a str> {
        match self.tree.resolve(self.id, path, AccessFlags::NEED_PROPERTY) {
            Resolved::Property { node, key } => self.at(node).direct_property(&key),
            _ => None,
        }
    }

    /// Property at `path`, or [ConfigError::NotFound].
    pub fn property(&self, path: &str) -> Result<&'a str, ConfigError> {
        self.find_property(path).ok_or_else(|| self.not_found(path))
    }

    pub fn has_property(&self, path: &str) -> bool {
        self.find_property(path).is_some()
    }

    pub fn value_as<T: ConfigValue>(&self) -> Result<T, ConfigError> {
        T::from_config_str(self.value())
    }

    pub fn property_as<T: ConfigValue>(&self, path: &str) -> Result<T, ConfigError> {
        T::from_config_str(self.property(path)?)
    }

    /// Names of the direct children, in order.
    pub fn child_names(&self) -> Vec<&'a str> {
        self.children().map(|child| child.name()).collect()
    }

    /// Keys of the direct properties.
    pub fn property_names(&self) -> Vec<&'a str> {
        self.properties().map(|(key, _)| key).collect()
    }

    /// Full paths of every descendant, depth first.
    pub fn child_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_child_paths(&mut paths);
        paths
    }

    fn collect_child_paths(&self, paths: &mut Vec<String>) {
        for child in self.children() {
            paths.push(child.path());
            child.collect_child_paths(paths);
        }
    }

    /// Full paths of every property in this subtree, depth first.
    pub fn property_paths(&self) -> Vec<String> {
        self.property_pairs_recursive().into_keys().collect()
    }

    pub fn property_pairs(&self) -> IndexMap<String, String> {
        self.data().properties.clone()
    }

    /// Every property of this subtree keyed by its full path.
    pub fn property_pairs_recursive(&self) -> IndexMap<String, String> {
        let mut pairs = IndexMap::new();
        self.collect_property_pairs(&mut pairs);
        pairs
    }

    fn collect_property_pairs(&self, pairs: &mut IndexMap<String, String>) {
        let prefix = self.path();
        for (key, value) in self.properties() {
            let path = if prefix.is_empty() {
                key.to_string()
            } else {
                format!("{prefix}.{key}")
            };
            pairs.insert(path, value.to_string());
        }
        for child in self.children() {
            child.collect_property_pairs(pairs);
        }
    }

    pub fn schema(&self) -> Option<&'a Arc<ConfigTree>> {
        self.data().schema.as_ref()
    }

    /// Validates against the attached schema with the default rule set. Nodes without a
    /// schema always pass.
    pub fn validate(&self, flags: ValidationFlags) -> Result<(), ConfigError> {
        self.validate_with(&StructuralValidator, flags)
    }

    pub fn validate_with(
        &self,
        validator: &dyn Validator,
        flags: ValidationFlags,
    ) -> Result<(), ConfigError> {
        match self.schema() {
            Some(schema) => validator.validate(*self, schema.root(), flags),
            None => Ok(()),
        }
    }

    /// Deep copy of this subtree.
    pub fn to_tree(&self) -> ConfigTree {
        self.tree.copy_subtree(self.id)
    }

    /// Copy of this subtree with `other` merged into it.
    pub fn merged(&self, other: &ConfigTree) -> Result<ConfigTree, ConfigError> {
        let mut copy = self.to_tree();
        copy.merge(other)?;
        Ok(copy)
    }

    /// Same names, values, property maps and (ordered) children.
    pub fn structurally_eq(&self, other: &NodeRef<'_>) -> bool {
        let (left, right) = (self.data(), other.data());
        left.name == right.name
            && left.value == right.value
            && left.properties == right.properties
            && left.children.len() == right.children.len()
            && self
                .children()
                .zip(other.children())
                .all(|(a, b)| a.structurally_eq(&b))
    }

    fn not_found(&self, path: &str) -> ConfigError {
        ConfigError::NotFound {
            path: path.to_string(),
            context: self.path(),
        }
    }
}

/// Mutable view of one node.
pub struct NodeMut<'a> {
    tree: &'a mut ConfigTree,
    id: NodeId,
}

impl fmt::Debug for NodeMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeMut")
            .field("id", &self.id)
            .field("path", &self.tree.path_of(self.id))
            .finish()
    }
}

impl<'a> NodeMut<'a> {
    fn at(&mut self, id: NodeId) -> NodeMut<'_> {
        NodeMut {
            tree: &mut *self.tree,
            id,
        }
    }

    fn data_mut(&mut self) -> &mut NodeData {
        self.tree.data_mut(self.id)
    }

    fn duplicate(&self, name: &str) -> ConfigError {
        ConfigError::DuplicateName {
            name: name.to_string(),
            context: self.tree.path_of(self.id),
        }
    }

    /// Read-only view of the same node.
    pub fn view(&self) -> NodeRef<'_> {
        NodeRef {
            tree: &*self.tree,
            id: self.id,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.tree.data(self.id).name
    }

    pub fn path(&self) -> String {
        self.tree.path_of(self.id)
    }

    /// Renames the node; fails if a sibling already uses `name`.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), ConfigError> {
        let name = name.into();
        self.tree.rename(self.id, &name)
    }

    pub fn set_raw_value(&mut self, value: impl Into<String>) {
        self.data_mut().value = value.into();
    }

    pub fn set_value<T: ConfigValue>(&mut self, value: &T) {
        self.data_mut().value = value.to_config_string();
    }

    pub fn set_schema(&mut self, schema: Option<Arc<ConfigTree>>) {
        self.data_mut().schema = schema;
    }

    /// Direct child named `name`, created empty when absent.
    pub fn create_child(&mut self, name: &str) -> NodeMut<'_> {
        let id = match self.tree.find_direct(self.id, name) {
            Some(existing) => existing,
            None => self.tree.new_child(self.id, name),
        };
        self.at(id)
    }

    /// Appends `child`; fails if a direct child has its name or the name resolves as a
    /// dotted path from this node.
    pub fn add_child(&mut self, child: ConfigTree) -> Result<NodeMut<'_>, ConfigError> {
        let name = child.root().name().to_string();
        if self.tree.find_direct(self.id, &name).is_some() || self.view().has_child(&name) {
            return Err(self.duplicate(&name));
        }
        let id = self.tree.import(self.id, &child, child.root);
        Ok(self.at(id))
    }

    /// Appends `child`; fails if a direct child already has its name.
    pub fn add_direct_child(&mut self, child: ConfigTree) -> Result<NodeMut<'_>, ConfigError> {
        let name = child.root().name().to_string();
        if self.tree.find_direct(self.id, &name).is_some() {
            return Err(self.duplicate(&name));
        }
        let id = self.tree.import(self.id, &child, child.root);
        Ok(self.at(id))
    }

    /// Puts a copy of `child` at `path`, creating missing intermediate nodes. An existing
    /// node at `path` is replaced in place. The inserted node takes the last path segment
    /// as its name.
    pub fn set_child(
        &mut self,
        path: &str,
        child: ConfigTree,
    ) -> Result<NodeMut<'_>, ConfigError> {
        let resolved =
            DotAccess::new(path, AccessFlags::CREATE_NODES).walk_mut(self.tree, self.id)?;
        let Resolved::Node(id) = resolved else {
            return Err(ConfigError::InvalidPath(path.to_string()));
        };
        self.tree.overwrite(id, &child);
        Ok(self.at(id))
    }

    pub fn set_direct_child(&mut self, name: &str, child: ConfigTree) -> NodeMut<'_> {
        let id = match self.tree.find_direct(self.id, name) {
            Some(existing) => existing,
            None => self.tree.new_child(self.id, name),
        };
        self.tree.overwrite(id, &child);
        self.at(id)
    }

    /// Removes the node at `path` with all its descendants and hands it back.
    pub fn remove_child(&mut self, path: &str) -> Option<ConfigTree> {
        let id = self.view().find_child(path)?.id();
        Some(self.tree.detach(id))
    }

    pub fn remove_direct_child(&mut self, name: &str) -> Option<ConfigTree> {
        let id = self.tree.find_direct(self.id, name)?;
        Some(self.tree.detach(id))
    }

    /// Inserts a direct property; fails if the key is taken.
    pub fn add_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ConfigError> {
        let key = key.into();
        if self.tree.data(self.id).properties.contains_key(&key) {
            return Err(self.duplicate(&key));
        }
        self.data_mut().properties.insert(key, value.into());
        Ok(())
    }

    /// Sets a direct property, overwriting any previous value.
    pub fn set_direct_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data_mut().properties.insert(key.into(), value.into());
    }

    /// Sets the property at `path`, creating intermediate nodes.
    pub fn set_property(
        &mut self,
        path: &str,
        value: impl Into<String>,
    ) -> Result<(), ConfigError> {
        let flags = AccessFlags::CREATE_NODES | AccessFlags::NEED_PROPERTY;
        match DotAccess::new(path, flags).walk_mut(self.tree, self.id)? {
            Resolved::Property { node, key } => {
                self.tree.data_mut(node).properties.insert(key, value.into());
                Ok(())
            }
            _ => Err(ConfigError::InvalidPath(path.to_string())),
        }
    }

    pub fn set_property_value<T: ConfigValue>(
        &mut self,
        path: &str,
        value: &T,
    ) -> Result<(), ConfigError> {
        self.set_property(path, value.to_config_string())
    }

    /// Removes the property at `path` and returns its value.
    pub fn remove_property(&mut self, path: &str) -> Option<String> {
        match self.tree.resolve(self.id, path, AccessFlags::NEED_PROPERTY) {
            Resolved::Property { node, key } => {
                self.tree.data_mut(node).properties.shift_remove(&key)
            }
            _ => None,
        }
    }

    pub fn remove_direct_property(&mut self, key: &str) -> Option<String> {
        self.data_mut().properties.shift_remove(key)
    }

    /// Right-biased recursive merge of `other`'s root into this node.
    ///
    /// A non-empty name or value of `other` overwrites this node's; every property of
    /// `other` is set here; every child of `other` is merged into the direct child with the
    /// same name, or copied in when there is none. Anything `other` doesn't mention is
    /// left alone.
    pub fn merge(&mut self, other: &ConfigTree) -> Result<(), ConfigError> {
        self.tree.merge_node(self.id, other, other.root)
    }

    pub fn child_mut(&mut self, path: &str) -> Result<NodeMut<'_>, ConfigError> {
        let id = self.view().child(path)?.id();
        Ok(self.at(id))
    }

    pub fn find_child_mut(&mut self, path: &str) -> Option<NodeMut<'_>> {
        let id = self.view().find_child(path)?.id();
        Some(self.at(id))
    }

    pub fn direct_child_mut(&mut self, name: &str) -> Option<NodeMut<'_>> {
        let id = self.tree.find_direct(self.id, name)?;
        Some(self.at(id))
    }

    pub fn into_parent(self) -> Option<NodeMut<'a>> {
        let parent = self.tree.data(self.id).parent?;
        Some(NodeMut {
            tree: self.tree,
            id: parent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_tree() -> ConfigTree {
        let mut tree = ConfigTree::new("");
        let mut root = tree.root_mut();
        root.set_property("server.host", "localhost").unwrap();
        root.set_property("server.port", "8080").unwrap();
        root.set_property("server.tls.cert", "/etc/cert.pem").unwrap();
        root.set_property("client.retries", "3").unwrap();
        tree
    }

    #[test]
    fn test_parent_links_follow_insertion() {
        let tree = server_tree();
        let tls = tree.root().child("server.tls").unwrap();
        assert_eq!(tls.parent().map(|p| p.name()), Some("server"));
        assert_eq!(tls.path(), "server.tls");
        let chain: Vec<_> = tls.ancestors().iter().map(|n| n.name()).collect();
        assert_eq!(chain, vec!["", "server", "tls"]);
    }

    #[test]
    fn test_imported_subtree_is_reparented() {
        let mut tree = ConfigTree::new("root");
        let source = server_tree();
        tree.root_mut().set_child("copy", source.clone()).unwrap();

        let tls = tree.root().child("copy.server.tls").unwrap();
        assert_eq!(tls.path(), "root.copy.server.tls");
        assert_eq!(tls.parent().unwrap().parent().unwrap().name(), "copy");
        // the source is untouched
        assert_eq!(source.root().child("server.tls").unwrap().path(), "server.tls");
    }

    #[test]
    fn test_add_direct_child_rejects_duplicates() {
        let mut tree = server_tree();
        let err = tree
            .root_mut()
            .add_direct_child(ConfigTree::new("server"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName { ref name, .. } if name == "server"));

        // same name deeper down is fine
        tree.root_mut()
            .child_mut("server")
            .unwrap()
            .add_direct_child(ConfigTree::new("client"))
            .unwrap();
    }

    #[test]
    fn test_add_child_named_like_parent_stays_unique() {
        let mut tree = ConfigTree::new("x");
        tree.root_mut().create_child("x");
        let err = tree.root_mut().add_child(ConfigTree::new("x")).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName { ref name, .. } if name == "x"));
        assert_eq!(tree.root().child_names(), vec!["x"]);
    }

    #[test]
    fn test_add_child_rejects_second_unnamed_child() {
        let mut tree = ConfigTree::new("");
        tree.root_mut().add_child(ConfigTree::new("")).unwrap();
        assert!(tree.root_mut().add_child(ConfigTree::new("")).is_err());
        assert_eq!(tree.root().child_count(), 1);
    }

    #[test]
    fn test_add_property_rejects_duplicates() {
        let mut tree = server_tree();
        let mut server = tree.root_mut();
        let mut server = server.child_mut("server").unwrap();
        assert!(server.add_property("host", "x").is_err());
        assert_eq!(server.view().direct_property("host"), Some("localhost"));
    }

    #[test]
    fn test_set_child_replaces_in_place() {
        let mut tree = server_tree();
        let replacement = ConfigTree::from_parts("ignored", vec![], [("host", "example.org")], "v")
            .unwrap();
        tree.root_mut().set_child("server", replacement).unwrap();

        let root = tree.root();
        assert_eq!(root.child_names(), vec!["server", "client"]);
        let server = root.child("server").unwrap();
        assert_eq!(server.value(), "v");
        assert_eq!(server.property_names(), vec!["host"]);
        assert!(!server.has_child("tls"));
    }

    #[test]
    fn test_remove_child_drops_descendants() {
        let mut tree = server_tree();
        let before = tree.node_count();
        let removed = tree.root_mut().remove_child("server").unwrap();
        assert_eq!(removed.root().name(), "server");
        assert!(removed.root().has_child("tls"));
        assert!(!tree.root().has_child("server.tls"));
        assert_eq!(tree.root().child_names(), vec!["client"]);
        assert_eq!(tree.node_count(), before - 2);
        assert!(tree.root_mut().remove_child("server").is_none());
    }

    #[test]
    fn test_property_listings() {
        let tree = server_tree();
        let root = tree.root();
        assert_eq!(
            root.property_paths(),
            vec!["server.host", "server.port", "server.tls.cert", "client.retries"]
        );
        assert_eq!(root.child_paths(), vec!["server", "server.tls", "client"]);
        let server = root.child("server").unwrap();
        assert_eq!(server.property_pairs().get("port").map(String::as_str), Some("8080"));
        assert_eq!(
            server.property_pairs_recursive().get("server.tls.cert").map(String::as_str),
            Some("/etc/cert.pem")
        );
    }

    #[test]
    fn test_required_lookup_reports_context() {
        let tree = server_tree();
        let server = tree.root().child("server").unwrap();
        assert_eq!(
            server.property("tls.key"),
            Err(ConfigError::NotFound {
                path: "tls.key".into(),
                context: "server".into(),
            })
        );
        assert_eq!(server.find_property("tls.key"), None);
    }

    #[test]
    fn test_remove_property() {
        let mut tree = server_tree();
        assert_eq!(
            tree.root_mut().remove_property("server.port"),
            Some("8080".to_string())
        );
        assert!(!tree.root().has_property("server.port"));
        assert_eq!(tree.root_mut().remove_property("server.port"), None);
    }

    #[test]
    fn test_merge_is_right_biased_and_recursive() {
        let mut base = server_tree();
        let mut overlay = ConfigTree::new("");
        overlay.root_mut().set_property("server.port", "9090").unwrap();
        overlay.root_mut().set_property("server.tls.key", "/etc/key.pem").unwrap();
        overlay.root_mut().set_property("logging.level", "debug").unwrap();

        base.merge(&overlay).unwrap();
        let root = base.root();
        assert_eq!(root.property("server.port"), Ok("9090"));
        assert_eq!(root.property("server.host"), Ok("localhost"));
        assert_eq!(root.property("server.tls.cert"), Ok("/etc/cert.pem"));
        assert_eq!(root.property("server.tls.key"), Ok("/etc/key.pem"));
        assert_eq!(root.child_names(), vec!["server", "client", "logging"]);

        let once = base.clone();
        base.merge(&overlay).unwrap();
        assert_eq!(base, once);
    }

    #[test]
    fn test_rename_collision() {
        let mut tree = server_tree();
        let mut root = tree.root_mut();
        let mut client = root.child_mut("client").unwrap();
        assert!(client.set_name("server").is_err());
        client.set_name("clients").unwrap();
        assert_eq!(tree.root().child_names(), vec!["server", "clients"]);
    }

    #[test]
    fn test_typed_values() {
        let mut tree = ConfigTree::new("cfg");
        let mut root = tree.root_mut();
        root.set_value(&true);
        root.set_property_value("limits.max", &42u32).unwrap();
        assert_eq!(tree.root().value(), "true");
        assert_eq!(tree.root().value_as::<bool>(), Ok(true));
        assert_eq!(tree.root().property_as::<u32>("limits.max"), Ok(42));
        assert!(tree.root().property_as::<bool>("limits.max").is_err());
    }

    #[test]
    fn test_into_parent() {
        let mut tree = server_tree();
        let mut root = tree.root_mut();
        let tls = root.child_mut("server.tls").unwrap();
        let server = tls.into_parent().unwrap();
        assert_eq!(server.name(), "server");
    }

    #[test]
    fn test_emptiness() {
        let tree = ConfigTree::new("x");
        assert!(tree.root().is_empty());
        assert!(!server_tree().root().is_empty());
    }
}
