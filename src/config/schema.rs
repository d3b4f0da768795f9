//! Schema validation
//!
//!     A schema is an ordinary configuration tree read as a set of constraints on another
//!     tree. [Validator] is the extension point; [StructuralValidator] is the rule set used
//!     by [NodeRef::validate](super::NodeRef::validate).
//!
//! Schema shape
//!
//!     Each property of a schema node requires the same property on the validated node.
//!     Its value names the accepted scalar shape (`string`, `integer`, `float`, `boolean`
//!     or `any`); a trailing `?` makes the property optional:
//!
//!         [server]
//!         host = string
//!         port = integer
//!         tls = boolean?
//!
//!     Each child of a schema node requires a direct child of the same name, validated
//!     recursively. A schema child carrying `optional = true` may be absent. Anything the
//!     schema doesn't mention is reported unless [ValidationFlags::ALLOW_UNKNOWN] is set.

use super::tree::NodeRef;
use crate::error::{ConfigError, Violation};
use std::ops::BitOr;

/// Marker property making a schema child optional. It is not itself a constraint.
pub const OPTIONAL_MARKER: &str = "optional";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ValidationFlags(u8);

impl ValidationFlags {
    pub const NONE: ValidationFlags = ValidationFlags(0);
    /// Stop at the first violation.
    pub const FIRST_ONLY: ValidationFlags = ValidationFlags(1);
    /// Children and properties missing from the schema are accepted.
    pub const ALLOW_UNKNOWN: ValidationFlags = ValidationFlags(1 << 1);

    pub const fn contains(self, other: ValidationFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ValidationFlags {
    type Output = ValidationFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        ValidationFlags(self.0 | rhs.0)
    }
}

/// Checks a node against a schema node.
pub trait Validator {
    /// `Ok(())` when `node` satisfies `schema`, otherwise
    /// [ConfigError::ValidationFailed] listing the violations.
    fn validate(
        &self,
        node: NodeRef<'_>,
        schema: NodeRef<'_>,
        flags: ValidationFlags,
    ) -> Result<(), ConfigError>;
}

/// Scalar shapes a schema property can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    String,
    Integer,
    Float,
    Boolean,
    Any,
}

impl Shape {
    fn parse(name: &str) -> Option<Shape> {
        match name {
            "string" => Some(Shape::String),
            "integer" => Some(Shape::Integer),
            "float" => Some(Shape::Float),
            "boolean" => Some(Shape::Boolean),
            "any" => Some(Shape::Any),
            _ => None,
        }
    }

    fn accepts(self, value: &str) -> bool {
        let value = value.trim();
        match self {
            Shape::String | Shape::Any => true,
            Shape::Integer => value.parse::<i64>().is_ok(),
            Shape::Float => value.parse::<f64>().is_ok(),
            Shape::Boolean => matches!(value, "true" | "false"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralValidator;

struct Report {
    violations: Vec<Violation>,
    first_only: bool,
}

impl Report {
    fn push(&mut self, path: String, message: impl Into<String>) {
        if !self.done() {
            self.violations.push(Violation::new(path, message));
        }
    }

    fn done(&self) -> bool {
        self.first_only && !self.violations.is_empty()
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

impl StructuralValidator {
    fn check(
        &self,
        node: NodeRef<'_>,
        schema: NodeRef<'_>,
        flags: ValidationFlags,
        report: &mut Report,
    ) {
        let at = node.path();

        for (key, spec) in schema.properties() {
            if report.done() {
                return;
            }
            if key == OPTIONAL_MARKER {
                continue;
            }
            let spec = spec.trim();
            let (shape_name, optional) = match spec.strip_suffix('?') {
                Some(name) => (name.trim(), true),
                None => (spec, false),
            };
            let Some(shape) = Shape::parse(shape_name) else {
                report.push(join(&at, key), format!("schema names unknown type '{shape_name}'"));
                continue;
            };
            match node.direct_property(key) {
                Some(value) if !shape.accepts(value) => report.push(
                    join(&at, key),
                    format!("expected {shape_name}, found '{value}'"),
                ),
                Some(_) => {}
                None if optional => {}
                None => report.push(join(&at, key), "missing property"),
            }
        }

        for schema_child in schema.children() {
            if report.done() {
                return;
            }
            match node.find_direct_child(schema_child.name()) {
                Some(child) => self.check(child, schema_child, flags, report),
                None if schema_child.direct_property(OPTIONAL_MARKER) == Some("true") => {}
                None => report.push(join(&at, schema_child.name()), "missing node"),
            }
        }

        if flags.contains(ValidationFlags::ALLOW_UNKNOWN) {
            return;
        }
        for (key, _) in node.properties() {
            if !schema.has_direct_property(key) || key == OPTIONAL_MARKER {
                report.push(join(&at, key), "unexpected property");
            }
        }
        for child in node.children() {
            if !schema.has_direct_child(child.name()) {
                report.push(child.path(), "unexpected node");
            }
        }
    }
}

impl Validator for StructuralValidator {
    fn validate(
        &self,
        node: NodeRef<'_>,
        schema: NodeRef<'_>,
        flags: ValidationFlags,
    ) -> Result<(), ConfigError> {
        let mut report = Report {
            violations: Vec::new(),
            first_only: flags.contains(ValidationFlags::FIRST_ONLY),
        };
        self.check(node, schema, flags, &mut report);
        tracing::debug!(
            node = %node.path(),
            violations = report.violations.len(),
            "validated against schema"
        );
        if report.violations.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed {
                violations: report.violations,
            })
        }
    }
}
