//! Type graph input model
//!
//! A [`TypeNode`] is the structural description of a declared type, as
//! produced by an external extractor. The graph is a tree except for
//! [`TypeNode::Reference`] back-edges, which point at an
//! [`TypeNode::Object`] by its identity so recursive shapes stay finite.
//!
//! The serde form is adjacently tagged so extractors written in any language
//! can hand a graph over as JSON:
//!
//! ```json
//! { "kind": "object", "of": {
//!     "identity": "ServerConfig",
//!     "fields": {
//!         "host": { "type": { "kind": "primitive", "of": "string" } },
//!         "port": { "type": { "kind": "primitive", "of": "number" }, "optional": true }
//!     }
//! } }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Primitive leaf kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
    Null,
    Undefined,
    Any,
    Unknown,
}

impl PrimitiveKind {
    /// `null`, `undefined`, `any` and `unknown` place no hard constraint on a field
    pub fn is_unconstrained(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Null | PrimitiveKind::Undefined | PrimitiveKind::Any | PrimitiveKind::Unknown
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Null => "null",
            PrimitiveKind::Undefined => "undefined",
            PrimitiveKind::Any => "any",
            PrimitiveKind::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// A single concrete literal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Boolean(bool),
    Number(f64),
    String(String),
}

impl LiteralValue {
    /// The primitive kind this literal narrows
    pub fn base_kind(&self) -> PrimitiveKind {
        match self {
            LiteralValue::Boolean(_) => PrimitiveKind::Boolean,
            LiteralValue::Number(_) => PrimitiveKind::Number,
            LiteralValue::String(_) => PrimitiveKind::String,
        }
    }

    /// Convert to a JSON value for use in an `enum` list.
    ///
    /// Integral numbers become JSON integers so persisted enums read `1`, not `1.0`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            LiteralValue::Boolean(b) => serde_json::Value::Bool(*b),
            LiteralValue::String(s) => serde_json::Value::String(s.clone()),
            LiteralValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9.0e15 {
                    serde_json::Value::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n)
                        .map_or(serde_json::Value::Null, serde_json::Value::Number)
                }
            }
        }
    }
}

/// A declared field of an object type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(rename = "type")]
    pub ty: TypeNode,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl Field {
    pub fn new(ty: TypeNode) -> Self {
        Self {
            ty,
            optional: false,
        }
    }

    pub fn optional(ty: TypeNode) -> Self {
        Self { ty, optional: true }
    }
}

/// A named structural object type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectType {
    /// Stable name or structural hash; equal identities denote the same type
    pub identity: String,
    /// Fields in declaration order
    #[serde(default)]
    pub fields: IndexMap<String, Field>,
    /// Value type of an index signature (`{ [key: string]: T }`)
    #[serde(
        default,
        rename = "indexSignature",
        skip_serializing_if = "Option::is_none"
    )]
    pub index_signature: Option<Box<TypeNode>>,
}

impl ObjectType {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            fields: IndexMap::new(),
            index_signature: None,
        }
    }

    /// Builder-style field insertion
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Builder-style index signature
    pub fn index_signature(mut self, value: TypeNode) -> Self {
        self.index_signature = Some(Box::new(value));
        self
    }
}

/// One node of the type graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "camelCase")]
pub enum TypeNode {
    Primitive(PrimitiveKind),
    Literal(LiteralValue),
    Array(Box<TypeNode>),
    Object(ObjectType),
    Union {
        members: Vec<TypeNode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
    },
    Intersection {
        members: Vec<TypeNode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
    },
    /// Back-edge to an [`ObjectType`] by identity
    Reference(String),
    /// Built-in generic wrapper (`Partial`, `Pick`, `Record`, ...) left unexpanded
    MappedAlias(String),
    /// A shape the extractor could not express
    Unsupported(String),
}

impl TypeNode {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        TypeNode::Primitive(kind)
    }

    pub fn string() -> Self {
        TypeNode::Primitive(PrimitiveKind::String)
    }

    pub fn number() -> Self {
        TypeNode::Primitive(PrimitiveKind::Number)
    }

    pub fn boolean() -> Self {
        TypeNode::Primitive(PrimitiveKind::Boolean)
    }

    pub fn literal(value: impl Into<LiteralValue>) -> Self {
        TypeNode::Literal(value.into())
    }

    pub fn array(element: TypeNode) -> Self {
        TypeNode::Array(Box::new(element))
    }

    pub fn union(members: Vec<TypeNode>) -> Self {
        TypeNode::Union {
            members,
            alias: None,
        }
    }

    pub fn intersection(members: Vec<TypeNode>) -> Self {
        TypeNode::Intersection {
            members,
            alias: None,
        }
    }

    pub fn reference(identity: impl Into<String>) -> Self {
        TypeNode::Reference(identity.into())
    }

    /// True when the node admits `undefined` directly or places no hard
    /// constraint at all (`null`, `undefined`, `any`, `unknown`, or a union
    /// made only of those)
    pub fn admits_absence(&self) -> bool {
        match self {
            TypeNode::Primitive(kind) => kind.is_unconstrained(),
            TypeNode::Union { members, .. } => {
                members
                    .iter()
                    .any(|m| matches!(m, TypeNode::Primitive(PrimitiveKind::Undefined)))
                    || (!members.is_empty()
                        && members.iter().all(|m| {
                            matches!(m, TypeNode::Primitive(kind) if kind.is_unconstrained())
                        }))
            }
            _ => false,
        }
    }

    /// Index every reachable [`ObjectType`] by identity. The first
    /// occurrence of an identity wins.
    pub fn object_index(&self) -> HashMap<&str, &ObjectType> {
        let mut index = HashMap::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                TypeNode::Object(object) => {
                    if index.contains_key(object.identity.as_str()) {
                        continue;
                    }
                    index.insert(object.identity.as_str(), object);
                    // Reverse so the stack visits fields in declaration order
                    if let Some(signature) = &object.index_signature {
                        stack.push(signature);
                    }
                    for field in object.fields.values().rev() {
                        stack.push(&field.ty);
                    }
                }
                TypeNode::Array(element) => stack.push(element),
                TypeNode::Union { members, .. } | TypeNode::Intersection { members, .. } => {
                    stack.extend(members.iter().rev());
                }
                TypeNode::Primitive(_)
                | TypeNode::Literal(_)
                | TypeNode::Reference(_)
                | TypeNode::MappedAlias(_)
                | TypeNode::Unsupported(_) => {}
            }
        }
        index
    }
}

impl From<ObjectType> for TypeNode {
    fn from(object: ObjectType) -> Self {
        TypeNode::Object(object)
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        LiteralValue::String(value.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(value: String) -> Self {
        LiteralValue::String(value)
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        LiteralValue::Number(value)
    }
}

impl From<i32> for LiteralValue {
    fn from(value: i32) -> Self {
        LiteralValue::Number(f64::from(value))
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        LiteralValue::Boolean(value)
    }
}
