//! Serde support for trees.
//!
//! A node serializes as `{ name, value, properties, children }`, properties as a map in
//! insertion order and children as a sequence of nodes.

use super::tree::{ConfigTree, NodeRef};
use serde::ser::{Serialize, SerializeStruct, Serializer};

struct Properties<'a>(NodeRef<'a>);

impl Serialize for Properties<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.properties())
    }
}

struct Children<'a>(NodeRef<'a>);

impl Serialize for Children<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.children())
    }
}

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut node = serializer.serialize_struct("ConfigNode", 4)?;
        node.serialize_field("name", self.name())?;
        node.serialize_field("value", self.value())?;
        node.serialize_field("properties", &Properties(*self))?;
        node.serialize_field("children", &Children(*self))?;
        node.end()
    }
}

impl Serialize for ConfigTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root().serialize(serializer)
    }
}
