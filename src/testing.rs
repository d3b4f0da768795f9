//! Fluent assertions for configuration trees
//!
//! Checks read top-down and report the path of the node that failed:
//!
//! ```rust-example
//! assert_node(tree.root())
//!     .child_names(&["server", "client"])
//!     .child("server", |server| {
//!         server.property("host", "localhost").property_count(2);
//!     });
//! ```

use crate::config::NodeRef;

pub fn assert_node(node: NodeRef<'_>) -> NodeAssertion<'_> {
    let context = match node.path() {
        path if path.is_empty() => "<root>".to_string(),
        path => path,
    };
    NodeAssertion { node, context }
}

pub struct NodeAssertion<'a> {
    node: NodeRef<'a>,
    context: String,
}

impl<'a> NodeAssertion<'a> {
    pub fn node(&self) -> NodeRef<'a> {
        self.node
    }

    pub fn name(self, expected: &str) -> Self {
        assert_eq!(
            self.node.name(),
            expected,
            "{}: Expected name '{}', found '{}'",
            self.context,
            expected,
            self.node.name()
        );
        self
    }

    pub fn value(self, expected: &str) -> Self {
        assert_eq!(
            self.node.value(),
            expected,
            "{}: Expected value '{}', found '{}'",
            self.context,
            expected,
            self.node.value()
        );
        self
    }

    pub fn child_count(self, expected: usize) -> Self {
        let actual = self.node.child_count();
        assert_eq!(
            actual, expected,
            "{}: Expected {} children, found {} children",
            self.context, expected, actual
        );
        self
    }

    /// Direct children, in order.
    pub fn child_names(self, expected: &[&str]) -> Self {
        let actual = self.node.child_names();
        assert_eq!(
            actual, expected,
            "{}: Expected children {:?}, found {:?}",
            self.context, expected, actual
        );
        self
    }

    pub fn property(self, path: &str, expected: &str) -> Self {
        match self.node.find_property(path) {
            Some(actual) => assert_eq!(
                actual, expected,
                "{}: Expected property '{}' = '{}', found '{}'",
                self.context, path, expected, actual
            ),
            None => panic!(
                "{}: Expected property '{}', available: {:?}",
                self.context,
                path,
                self.node.property_paths()
            ),
        }
        self
    }

    pub fn no_property(self, path: &str) -> Self {
        assert!(
            !self.node.has_property(path),
            "{}: Expected no property '{}'",
            self.context,
            path
        );
        self
    }

    /// Number of direct properties.
    pub fn property_count(self, expected: usize) -> Self {
        let actual = self.node.property_names().len();
        assert_eq!(
            actual, expected,
            "{}: Expected {} properties, found {} properties",
            self.context, expected, actual
        );
        self
    }

    pub fn child<F>(self, path: &str, assertion: F) -> Self
    where
        F: FnOnce(NodeAssertion<'a>),
    {
        let Some(child) = self.node.find_child(path) else {
            panic!(
                "{}: Expected child '{}', available: {:?}",
                self.context,
                path,
                self.node.child_paths()
            );
        };
        assertion(NodeAssertion {
            node: child,
            context: format!("{}/{}", self.context, path),
        });
        self
    }

    pub fn no_child(self, path: &str) -> Self {
        assert!(
            !self.node.has_child(path),
            "{}: Expected no child '{}'",
            self.context,
            path
        );
        self
    }
}
