//! Structural type graphs compiled into JSON-Schema-like repositories, and
//! path-qualified validation of runtime values against them.
//!
//! The pipeline has two stages:
//!
//! 1. [`resolve`] turns a [`TypeNode`] graph (objects, unions, arrays,
//!    literals, references) into a [`SchemaRepository`]. Recursive types
//!    become named definitions connected by `Ref` nodes.
//! 2. [`validate`] walks a `serde_json::Value` against a repository and
//!    returns every [`ValidationError`] it finds, each carrying the path to
//!    the offending value.
//!
//! ```
//! use serde_json::json;
//! use typeshape::{resolve, validate, Field, ObjectType, TypeNode};
//!
//! let graph = TypeNode::from(
//!     ObjectType::new("Server")
//!         .field("host", Field::new(TypeNode::string()))
//!         .field("port", Field::new(TypeNode::number())),
//! );
//! let repository = resolve(&graph).unwrap();
//!
//! let errors = validate(&repository, &json!({ "host": true }));
//! let rendered: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
//! assert_eq!(rendered, ["port: expected required property", "host: expected string, got true"]);
//! ```

pub mod error;
pub mod resolver;
pub mod schema;
pub mod type_graph;
pub mod validator;

pub use error::{
    InstancePath, PathSegment, ResolveError, ResolveResult, SchemaError, SchemaResult,
    ValidationError, ValidationErrorKind,
};
pub use resolver::{resolve, Resolver};
pub use schema::{AnnotationOverlay, Schema, SchemaAnnotations, SchemaRepository};
pub use type_graph::{Field, LiteralValue, ObjectType, PrimitiveKind, TypeNode};
pub use validator::{validate, ValidationContext, Validator, ValueKind};
