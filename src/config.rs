//! Configuration trees
//!
//!     The in-memory model every parser in this crate writes into. A [ConfigTree] is a
//!     tree of named nodes; each node has a text value, string properties and ordered
//!     children. Nodes are addressed with dotted paths relative to any node:
//!
//!         let mut tree = ConfigTree::new("app");
//!         tree.root_mut().set_property("server.port", "8080")?;
//!         let port: u16 = tree.root().property_as("server.port")?;
//!
//! Layout
//!
//!     - [arena]: slot storage and node handles.
//!     - [tree]: the tree with its read and write views.
//!     - [access]: dotted path resolution.
//!     - [value]: typed conversion of values and properties.
//!     - [schema]: validation of a tree against a schema tree.
//!     - [document]: a tree bound to the resource it was loaded from.
//!     - [serialize]: serde support.

pub mod access;
pub mod arena;
pub mod document;
pub mod schema;
mod serialize;
pub mod tree;
pub mod value;

pub use access::{AccessFlags, DotAccess, Resolved};
pub use arena::NodeId;
pub use document::{ConfigDocument, Resource, ResourceKind};
pub use schema::{StructuralValidator, ValidationFlags, Validator};
pub use tree::{ConfigTree, NodeMut, NodeRef};
pub use value::ConfigValue;
