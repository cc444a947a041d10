// Error types for schema resolution, schema loading and validation

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that abort resolution of a type graph.
///
/// Only contract violations by the extractor end up here; every other
/// anomaly degrades to a permissive schema fragment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A `Reference` names an identity no `Object` in the graph carries
    #[error("Reference to '{identity}' has no matching object type in the graph")]
    DanglingReference { identity: String },
}

/// Result type for resolution
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors that can occur while loading a persisted schema
#[derive(Debug, Error)]
pub enum SchemaError {
    /// `type` names a kind the validator does not know
    #[error("Unknown schema kind '{0}'")]
    UnknownKind(String),

    /// `$ref` does not point into `#/definitions/`
    #[error("Malformed schema reference '{0}'")]
    MalformedReference(String),

    /// JSON syntax or shape error
    #[error("Malformed schema repository: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for schema loading
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Structured validation error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// Value kind not accepted by the schema (includes unexpected `null`)
    TypeMismatch,

    /// Required property absent
    MissingRequiredProperty,

    /// Value of the right kind but not one of the listed literals
    InvalidEnumValue,

    /// Property not declared and additional properties disallowed
    UnknownProperty,

    /// No alternative of a union matched
    NoMatchingAlternative,

    /// `Ref` without a definition, or a reference cycle
    UnresolvedReference,

    /// Numeric, length, pattern or item-count bound violated
    BoundViolation,
}

impl ValidationErrorKind {
    /// Short stable code for this kind
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationErrorKind::TypeMismatch => "TS-1-01",
            ValidationErrorKind::MissingRequiredProperty => "TS-1-02",
            ValidationErrorKind::InvalidEnumValue => "TS-1-03",
            ValidationErrorKind::UnknownProperty => "TS-1-04",
            ValidationErrorKind::NoMatchingAlternative => "TS-1-05",
            ValidationErrorKind::UnresolvedReference => "TS-1-06",
            ValidationErrorKind::BoundViolation => "TS-1-07",
        }
    }
}

/// One concrete mismatch between a value and a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    /// Where in the value the mismatch is (e.g. `servers[1].host`)
    pub path: InstancePath,
    /// The offending value; `None` when the value is absent
    pub value: Option<serde_json::Value>,
    /// Human-readable description of what was expected
    pub expected: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}: expected {}, got {}", self.path, self.expected, value),
            None => write!(f, "{}: expected {}", self.path, self.expected),
        }
    }
}

impl ValidationError {
    pub fn new(
        kind: ValidationErrorKind,
        path: InstancePath,
        value: Option<serde_json::Value>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            path,
            value,
            expected: expected.into(),
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }
}

/// Instance path (e.g., ["servers", 1, "host"])
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstancePath {
    segments: Vec<PathSegment>,
}

impl InstancePath {
    /// Create a new empty instance path
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Push a key segment onto the path
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(PathSegment::Key(key.into()));
    }

    /// Push an index segment onto the path
    pub fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    /// Push any segment onto the path
    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    /// Pop the last segment from the path
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    /// Copy of this path extended by one key
    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.push_key(key);
        child
    }

    /// Check if the path is empty
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get the length of the path
    pub fn len(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "(root)");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i > 0 => write!(f, ".{}", key)?,
                other => write!(f, "{}", other)?,
            }
        }
        Ok(())
    }
}

/// A segment in an instance path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object key
    Key(String),
    /// Array index
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}
