//! Persisted schema form
//!
//! Schemas are written as a JSON-Schema-like object. [`RawSchema`] mirrors
//! that object field by field; [`Schema`] converts to and from it so the
//! persisted form round-trips losslessly.
//!
//! Shape decisions that keep the mapping unambiguous:
//! - an `ObjectSchema` always writes `properties`, even when empty, so a bare
//!   `{"type": "object"}` reads back as a kind constraint
//! - an `ArraySchema` always writes `items` for the same reason
//! - several kinds are written as a list, a single kind as a string

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::{
    AdditionalProperties, AllOfSchema, ArraySchema, Kind, ObjectSchema, OneOfSchema, RefSchema,
    SchemaAnnotations, TypeConstraint,
};
use super::Schema;
use crate::error::SchemaError;

/// Prefix of persisted `$ref` values
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawKinds {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawAdditional {
    Flag(bool),
    Schema(Box<RawSchema>),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSchema {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    reference: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kinds: Option<RawKinds>,

    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    enum_values: Option<Vec<serde_json::Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    nullable: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<IndexMap<String, RawSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    required: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    additional_properties: Option<RawAdditional>,

    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<Box<RawSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    one_of: Option<Vec<RawSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    all_of: Option<Vec<RawSchema>>,

    #[serde(flatten)]
    annotations: SchemaAnnotations,
}

fn parse_kinds(raw: Option<RawKinds>) -> Result<Vec<Kind>, SchemaError> {
    let names = match raw {
        None => return Ok(Vec::new()),
        Some(RawKinds::One(name)) => vec![name],
        Some(RawKinds::Many(names)) => names,
    };
    let mut kinds = Vec::with_capacity(names.len());
    for name in names {
        let kind = Kind::parse(&name).ok_or(SchemaError::UnknownKind(name))?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

fn parse_reference(reference: String) -> Result<String, SchemaError> {
    let name = match reference.strip_prefix(DEFINITIONS_PREFIX) {
        Some(name) => name.to_string(),
        None if reference.starts_with('#') => {
            return Err(SchemaError::MalformedReference(reference));
        }
        None => reference,
    };
    if name.is_empty() {
        return Err(SchemaError::MalformedReference(format!(
            "{}{}",
            DEFINITIONS_PREFIX, name
        )));
    }
    Ok(name)
}

fn convert_all(raws: Vec<RawSchema>) -> Result<Vec<Schema>, SchemaError> {
    raws.into_iter().map(Schema::try_from).collect()
}

impl TryFrom<RawSchema> for Schema {
    type Error = SchemaError;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        let annotations = raw.annotations;

        if let Some(reference) = raw.reference {
            return Ok(Schema::Ref(RefSchema {
                annotations,
                reference: parse_reference(reference)?,
            }));
        }
        if let Some(alternatives) = raw.one_of {
            return Ok(Schema::OneOf(OneOfSchema {
                annotations,
                alternatives: convert_all(alternatives)?,
            }));
        }
        if let Some(members) = raw.all_of {
            return Ok(Schema::AllOf(AllOfSchema {
                annotations,
                members: convert_all(members)?,
            }));
        }

        let kinds = parse_kinds(raw.kinds)?;

        if let Some(properties) = raw.properties {
            let properties = properties
                .into_iter()
                .map(|(name, raw)| Ok((name, Schema::try_from(raw)?)))
                .collect::<Result<IndexMap<_, _>, SchemaError>>()?;
            let additional_properties = match raw.additional_properties {
                None | Some(RawAdditional::Flag(true)) => AdditionalProperties::Unset,
                Some(RawAdditional::Flag(false)) => AdditionalProperties::Disallowed,
                Some(RawAdditional::Schema(schema)) => {
                    AdditionalProperties::Schema(Box::new(Schema::try_from(*schema)?))
                }
            };
            return Ok(Schema::Object(ObjectSchema {
                annotations,
                properties,
                required: raw.required.unwrap_or_default(),
                additional_properties,
            }));
        }

        if let Some(items) = raw.items {
            return Ok(Schema::Array(ArraySchema {
                annotations,
                items: Box::new(Schema::try_from(*items)?),
            }));
        }

        Ok(Schema::Constraint(TypeConstraint {
            annotations,
            kinds,
            enum_values: raw.enum_values,
            nullable: raw.nullable.unwrap_or(false),
        }))
    }
}

impl From<Schema> for RawSchema {
    fn from(schema: Schema) -> Self {
        match schema {
            Schema::Constraint(c) => RawSchema {
                kinds: match c.kinds.len() {
                    0 => None,
                    1 => Some(RawKinds::One(c.kinds[0].as_str().to_string())),
                    _ => Some(RawKinds::Many(
                        c.kinds.iter().map(|k| k.as_str().to_string()).collect(),
                    )),
                },
                enum_values: c.enum_values,
                nullable: c.nullable.then_some(true),
                annotations: c.annotations,
                ..Default::default()
            },
            Schema::Object(o) => RawSchema {
                kinds: Some(RawKinds::One(Kind::Object.as_str().to_string())),
                properties: Some(
                    o.properties
                        .into_iter()
                        .map(|(name, schema)| (name, RawSchema::from(schema)))
                        .collect(),
                ),
                required: (!o.required.is_empty()).then_some(o.required),
                additional_properties: match o.additional_properties {
                    AdditionalProperties::Unset => None,
                    AdditionalProperties::Disallowed => Some(RawAdditional::Flag(false)),
                    AdditionalProperties::Schema(schema) => {
                        Some(RawAdditional::Schema(Box::new(RawSchema::from(*schema))))
                    }
                },
                annotations: o.annotations,
                ..Default::default()
            },
            Schema::Array(a) => RawSchema {
                kinds: Some(RawKinds::One(Kind::Array.as_str().to_string())),
                items: Some(Box::new(RawSchema::from(*a.items))),
                annotations: a.annotations,
                ..Default::default()
            },
            Schema::OneOf(o) => RawSchema {
                one_of: Some(o.alternatives.into_iter().map(RawSchema::from).collect()),
                annotations: o.annotations,
                ..Default::default()
            },
            Schema::AllOf(a) => RawSchema {
                all_of: Some(a.members.into_iter().map(RawSchema::from).collect()),
                annotations: a.annotations,
                ..Default::default()
            },
            Schema::Ref(r) => RawSchema {
                reference: Some(format!("{}{}", DEFINITIONS_PREFIX, r.reference)),
                annotations: r.annotations,
                ..Default::default()
            },
        }
    }
}
