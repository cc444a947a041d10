//! Schema type definitions
//!
//! Each schema struct carries:
//! - annotations: title, documentation, default and bound metadata
//! - type-specific fields: the structural rule the validator enforces

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Schema;

/// Metadata that can be attached to any schema node.
///
/// `title` only feeds error messages. The bound fields are enforced by the
/// validator on values of the matching kind; the rest is carried verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaAnnotations {
    /// Human-readable type label used in error messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// `Some(Value::Null)` when the default is an explicit `null`
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<serde_json::Value>,

    /// Free-form format hint (`uri`, `date-time`, ...); not enforced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

/// A key that is present yields `Some`, even when its value is `null`
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl SchemaAnnotations {
    /// Annotations carrying only a title
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Whether any bound the validator enforces is set
    pub fn has_bounds(&self) -> bool {
        self.minimum.is_some()
            || self.maximum.is_some()
            || self.min_length.is_some()
            || self.max_length.is_some()
            || self.pattern.is_some()
            || self.min_items.is_some()
            || self.max_items.is_some()
    }

    /// Overlay `other` onto `self`; fields set in `other` win
    pub fn merge(&mut self, other: &SchemaAnnotations) {
        fn take<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }
        take(&mut self.title, &other.title);
        take(&mut self.description, &other.description);
        take(&mut self.default, &other.default);
        take(&mut self.format, &other.format);
        take(&mut self.minimum, &other.minimum);
        take(&mut self.maximum, &other.maximum);
        take(&mut self.min_length, &other.min_length);
        take(&mut self.max_length, &other.max_length);
        take(&mut self.pattern, &other.pattern);
        take(&mut self.min_items, &other.min_items);
        take(&mut self.max_items, &other.max_items);
    }
}

/// Kind names a [`TypeConstraint`] can list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Integer => "integer",
            Kind::Boolean => "boolean",
            Kind::Object => "object",
            Kind::Array => "array",
            Kind::Null => "null",
        }
    }

    pub fn parse(name: &str) -> Option<Kind> {
        match name {
            "string" => Some(Kind::String),
            "number" => Some(Kind::Number),
            "integer" => Some(Kind::Integer),
            "boolean" => Some(Kind::Boolean),
            "object" => Some(Kind::Object),
            "array" => Some(Kind::Array),
            "null" => Some(Kind::Null),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Base-kind constraint, optionally narrowed to a set of literal values.
///
/// An empty `kinds` list places no kind restriction at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeConstraint {
    pub annotations: SchemaAnnotations,
    /// Allowed kinds, deduplicated, in first-seen order
    pub kinds: Vec<Kind>,
    /// Allowed literal values, checked after the kind
    pub enum_values: Option<Vec<serde_json::Value>>,
    /// Accept `null` even when `kinds` does not list it
    pub nullable: bool,
}

impl TypeConstraint {
    pub fn of(kind: Kind) -> Self {
        Self {
            kinds: vec![kind],
            ..Default::default()
        }
    }

    /// Accepts every value, `null` included
    pub fn permissive() -> Self {
        Self {
            nullable: true,
            ..Default::default()
        }
    }

    /// Add a kind unless already listed
    pub fn push_kind(&mut self, kind: Kind) {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
    }

    pub fn allows_null(&self) -> bool {
        self.nullable || self.kinds.is_empty() || self.kinds.contains(&Kind::Null)
    }
}

/// What to do with object fields that have no entry in `properties`
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AdditionalProperties {
    /// Silently accepted
    #[default]
    Unset,
    /// Each one is an error
    Disallowed,
    /// Each one is checked against the schema
    Schema(Box<Schema>),
}

impl AdditionalProperties {
    pub fn is_unset(&self) -> bool {
        matches!(self, AdditionalProperties::Unset)
    }
}

/// Object type schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    pub annotations: SchemaAnnotations,
    /// Known properties in declaration order
    pub properties: IndexMap<String, Schema>,
    /// Property names that must be present
    pub required: Vec<String>,
    pub additional_properties: AdditionalProperties,
}

/// Array type schema
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub annotations: SchemaAnnotations,
    pub items: Box<Schema>,
}

/// OneOf schema (valid if any alternative matches)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OneOfSchema {
    pub annotations: SchemaAnnotations,
    pub alternatives: Vec<Schema>,
}

/// AllOf schema (valid if every member matches)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllOfSchema {
    pub annotations: SchemaAnnotations,
    pub members: Vec<Schema>,
}

/// Reference to a named definition
#[derive(Debug, Clone, PartialEq)]
pub struct RefSchema {
    pub annotations: SchemaAnnotations,
    /// Definition name, without the `#/definitions/` prefix
    pub reference: String,
}
