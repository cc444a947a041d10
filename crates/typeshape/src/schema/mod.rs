//! Schema model
//!
//! A [`Schema`] is the resolved, self-contained description of valid shapes.
//! Recursive types are expressed as [`Schema::Ref`] nodes pointing into the
//! definitions of a [`SchemaRepository`], never as cyclic structures.

pub mod annotations;
mod raw;
mod repository;
mod types;

use serde::{Deserialize, Serialize};

pub use annotations::AnnotationOverlay;
pub use raw::DEFINITIONS_PREFIX;
pub use repository::SchemaRepository;
pub use types::{
    AdditionalProperties, AllOfSchema, ArraySchema, Kind, ObjectSchema, OneOfSchema, RefSchema,
    SchemaAnnotations, TypeConstraint,
};

/// A schema node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "raw::RawSchema", into = "raw::RawSchema")]
pub enum Schema {
    Constraint(TypeConstraint),
    Object(ObjectSchema),
    Array(ArraySchema),
    OneOf(OneOfSchema),
    AllOf(AllOfSchema),
    Ref(RefSchema),
}

impl Schema {
    /// Constraint accepting exactly one kind
    pub fn kind(kind: Kind) -> Self {
        Schema::Constraint(TypeConstraint::of(kind))
    }

    /// Constraint accepting anything
    pub fn permissive() -> Self {
        Schema::Constraint(TypeConstraint::permissive())
    }

    /// Constraint narrowed to the given literals
    pub fn enumeration(kind: Kind, values: Vec<serde_json::Value>) -> Self {
        Schema::Constraint(TypeConstraint {
            kinds: vec![kind],
            enum_values: Some(values),
            ..Default::default()
        })
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array(ArraySchema {
            annotations: SchemaAnnotations::default(),
            items: Box::new(items),
        })
    }

    pub fn one_of(alternatives: Vec<Schema>) -> Self {
        Schema::OneOf(OneOfSchema {
            annotations: SchemaAnnotations::default(),
            alternatives,
        })
    }

    pub fn all_of(members: Vec<Schema>) -> Self {
        Schema::AllOf(AllOfSchema {
            annotations: SchemaAnnotations::default(),
            members,
        })
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Schema::Ref(RefSchema {
            annotations: SchemaAnnotations::default(),
            reference: name.into(),
        })
    }

    pub fn annotations(&self) -> &SchemaAnnotations {
        match self {
            Schema::Constraint(s) => &s.annotations,
            Schema::Object(s) => &s.annotations,
            Schema::Array(s) => &s.annotations,
            Schema::OneOf(s) => &s.annotations,
            Schema::AllOf(s) => &s.annotations,
            Schema::Ref(s) => &s.annotations,
        }
    }

    pub fn annotations_mut(&mut self) -> &mut SchemaAnnotations {
        match self {
            Schema::Constraint(s) => &mut s.annotations,
            Schema::Object(s) => &mut s.annotations,
            Schema::Array(s) => &mut s.annotations,
            Schema::OneOf(s) => &mut s.annotations,
            Schema::AllOf(s) => &mut s.annotations,
            Schema::Ref(s) => &mut s.annotations,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.annotations().title.as_deref()
    }

    /// Builder-style title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.annotations_mut().title = Some(title.into());
        self
    }

    /// Name of the schema variant, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Schema::Constraint(_) => "constraint",
            Schema::Object(_) => "object",
            Schema::Array(_) => "array",
            Schema::OneOf(_) => "oneOf",
            Schema::AllOf(_) => "allOf",
            Schema::Ref(_) => "ref",
        }
    }

    /// Whether this node constrains values at all.
    ///
    /// A constraint with no kinds, no enum and no bounds accepts anything,
    /// and an object with no properties and no additional-properties rule
    /// accepts any object. Such members add nothing to a union.
    pub fn is_informative(&self) -> bool {
        match self {
            Schema::Constraint(c) => {
                !c.kinds.is_empty() || c.enum_values.is_some() || c.annotations.has_bounds()
            }
            Schema::Object(o) => !o.properties.is_empty() || !o.additional_properties.is_unset(),
            Schema::Array(_) | Schema::OneOf(_) | Schema::AllOf(_) | Schema::Ref(_) => true,
        }
    }

    /// Human-readable description of what this schema expects.
    ///
    /// Preference order: title, reference name, enum rendering, union,
    /// intersection, array, kind names, `object`.
    pub fn describe(&self) -> String {
        if let Some(title) = self.title() {
            return title.to_string();
        }
        match self {
            Schema::Ref(r) => r.reference.clone(),
            Schema::Constraint(TypeConstraint {
                enum_values: Some(values),
                ..
            }) => describe_enum(values),
            Schema::OneOf(o) => {
                if o.alternatives.is_empty() {
                    "union type".to_string()
                } else {
                    o.alternatives
                        .iter()
                        .map(Schema::describe)
                        .collect::<Vec<_>>()
                        .join(" | ")
                }
            }
            Schema::AllOf(_) => "intersection type".to_string(),
            Schema::Array(_) => "array".to_string(),
            Schema::Constraint(c) if !c.kinds.is_empty() => c
                .kinds
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(" | "),
            Schema::Constraint(_) | Schema::Object(_) => "object".to_string(),
        }
    }

    /// Visit every `Ref` name in this subtree
    pub(crate) fn for_each_ref<'a>(&'a self, visit: &mut impl FnMut(&'a str)) {
        match self {
            Schema::Ref(r) => visit(&r.reference),
            Schema::Constraint(_) => {}
            Schema::Object(o) => {
                for property in o.properties.values() {
                    property.for_each_ref(visit);
                }
                if let AdditionalProperties::Schema(additional) = &o.additional_properties {
                    additional.for_each_ref(visit);
                }
            }
            Schema::Array(a) => a.items.for_each_ref(visit),
            Schema::OneOf(o) => o.alternatives.iter().for_each(|s| s.for_each_ref(visit)),
            Schema::AllOf(a) => a.members.iter().for_each(|s| s.for_each_ref(visit)),
        }
    }
}

/// Render literal values as `one of [a, b, c]`
pub fn describe_enum(values: &[serde_json::Value]) -> String {
    let rendered: Vec<String> = values
        .iter()
        .map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    format!("one of [{}]", rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe_prefers_title() {
        let schema = Schema::kind(Kind::String).with_title("Hostname");
        assert_eq!(schema.describe(), "Hostname");
    }

    #[test]
    fn test_describe_ref_uses_target_name() {
        assert_eq!(Schema::reference("ServerConfig").describe(), "ServerConfig");
    }

    #[test]
    fn test_describe_enum() {
        let schema = Schema::enumeration(
            Kind::String,
            vec![json!("debug"), json!("info"), json!("warn"), json!("error")],
        );
        assert_eq!(schema.describe(), "one of [debug, info, warn, error]");

        let numbers = Schema::enumeration(Kind::Number, vec![json!(1), json!(2.5)]);
        assert_eq!(numbers.describe(), "one of [1, 2.5]");
    }

    #[test]
    fn test_describe_combinators_and_kinds() {
        let union = Schema::one_of(vec![Schema::kind(Kind::String), Schema::kind(Kind::Number)]);
        assert_eq!(union.describe(), "string | number");
        assert_eq!(Schema::one_of(vec![]).describe(), "union type");
        assert_eq!(Schema::all_of(vec![]).describe(), "intersection type");
        assert_eq!(Schema::array(Schema::kind(Kind::Number)).describe(), "array");

        let mut nullable = TypeConstraint::of(Kind::String);
        nullable.push_kind(Kind::Null);
        assert_eq!(Schema::Constraint(nullable).describe(), "string | null");

        assert_eq!(Schema::permissive().describe(), "object");
        assert_eq!(Schema::Object(ObjectSchema::default()).describe(), "object");
    }

    #[test]
    fn test_is_informative() {
        assert!(!Schema::permissive().is_informative());
        assert!(!Schema::Object(ObjectSchema::default()).is_informative());
        assert!(Schema::kind(Kind::Boolean).is_informative());
        assert!(Schema::reference("X").is_informative());

        let mut bounded = TypeConstraint::permissive();
        bounded.annotations.minimum = Some(0.0);
        assert!(Schema::Constraint(bounded).is_informative());

        let open_map = ObjectSchema {
            additional_properties: AdditionalProperties::Schema(Box::new(Schema::kind(
                Kind::String,
            ))),
            ..Default::default()
        };
        assert!(Schema::Object(open_map).is_informative());
    }
}
