//! Schema resolver: type graph -> schema repository
//!
//! Every object type resolves to a [`Schema::Ref`] naming its identity. The
//! expanded [`ObjectSchema`] lives in the repository's definitions. Before
//! an object's fields are resolved a placeholder is cached under its
//! identity, so a field that recurses back into the object finds the
//! placeholder and stops at a `Ref` instead of unfolding forever.
//!
//! All resolution state lives in a [`ResolutionContext`] owned by a single
//! [`resolve`] call; nothing is shared between calls.

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::error::{ResolveError, ResolveResult};
use crate::schema::{
    AdditionalProperties, AnnotationOverlay, Kind, ObjectSchema, Schema, SchemaAnnotations,
    SchemaRepository, TypeConstraint,
};
use crate::type_graph::{LiteralValue, ObjectType, PrimitiveKind, TypeNode};

/// Resolve a type graph into a schema repository
pub fn resolve(root: &TypeNode) -> ResolveResult<SchemaRepository> {
    Resolver::new().resolve(root)
}

/// Reusable resolver configuration.
///
/// Holds only inputs that do not change between passes; each
/// [`Resolver::resolve`] call starts from an empty cache.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    annotations: AnnotationOverlay,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge extracted metadata onto resolved schemas by name
    pub fn with_annotations(annotations: AnnotationOverlay) -> Self {
        Self { annotations }
    }

    pub fn annotations(&self) -> &AnnotationOverlay {
        &self.annotations
    }

    /// Resolve `root` and assemble the repository.
    ///
    /// When the root is an object type, the repository root is a copy of
    /// that object's schema, so callers validate its fields directly rather
    /// than through one level of reference.
    pub fn resolve(&self, root: &TypeNode) -> ResolveResult<SchemaRepository> {
        let mut context = ResolutionContext::new(root, &self.annotations);
        let resolved = context.resolve_node(root)?;

        let root_schema = match root {
            TypeNode::Object(object) if matches!(resolved, Schema::Ref(_)) => context
                .cache
                .get(&object.identity)
                .cloned()
                .unwrap_or(resolved),
            _ => resolved,
        };

        tracing::debug!(
            definitions = context.cache.len(),
            root = root_schema.type_name(),
            "Resolved type graph"
        );
        Ok(SchemaRepository::new(root_schema, context.cache))
    }
}

/// State for one resolution pass
struct ResolutionContext<'g> {
    /// Every object type in the graph, by identity
    objects: HashMap<&'g str, &'g ObjectType>,
    /// Resolved (or in-progress) object schemas, by identity
    cache: IndexMap<String, Schema>,
    annotations: &'g AnnotationOverlay,
}

impl<'g> ResolutionContext<'g> {
    fn new(root: &'g TypeNode, annotations: &'g AnnotationOverlay) -> Self {
        Self {
            objects: root.object_index(),
            cache: IndexMap::new(),
            annotations,
        }
    }

    /// Main resolution dispatcher
    fn resolve_node(&mut self, node: &'g TypeNode) -> ResolveResult<Schema> {
        match node {
            TypeNode::Primitive(kind) => Ok(resolve_primitive(*kind)),
            TypeNode::Literal(literal) => Ok(resolve_literal(literal)),
            TypeNode::Array(element) => Ok(Schema::array(self.resolve_node(element)?)),
            TypeNode::Object(object) => self.resolve_object(object),
            TypeNode::Reference(identity) => self.resolve_reference(identity),
            TypeNode::Union { members, alias } => self.resolve_union(members, alias.as_deref()),
            TypeNode::Intersection { members, alias } => {
                let members = members
                    .iter()
                    .map(|member| self.resolve_node(member))
                    .collect::<ResolveResult<Vec<_>>>()?;
                let schema = Schema::all_of(members);
                Ok(match alias {
                    Some(alias) => schema.with_title(alias.clone()),
                    None => schema,
                })
            }
            TypeNode::MappedAlias(name) => Ok(Schema::Object(ObjectSchema {
                annotations: SchemaAnnotations {
                    title: Some(name.clone()),
                    description: Some(format!("{} type", name)),
                    ..Default::default()
                },
                ..Default::default()
            })),
            TypeNode::Unsupported(description) => {
                tracing::debug!(description = %description, "Unsupported type node, resolving permissively");
                Ok(Schema::permissive().with_title(format!("unsupported type: {}", description)))
            }
        }
    }

    fn resolve_reference(&mut self, identity: &str) -> ResolveResult<Schema> {
        if self.cache.contains_key(identity) {
            return Ok(Schema::reference(identity));
        }
        // Back-edge reached before its target was expanded (e.g. the target
        // sits in a later sibling). Expand it now.
        match self.objects.get(identity).copied() {
            Some(object) => self.resolve_object(object),
            None => Err(ResolveError::DanglingReference {
                identity: identity.to_string(),
            }),
        }
    }

    fn resolve_object(&mut self, object: &'g ObjectType) -> ResolveResult<Schema> {
        let identity = object.identity.as_str();
        if self.cache.contains_key(identity) {
            tracing::trace!(identity, "Object type already resolved");
            return Ok(Schema::reference(identity));
        }

        tracing::debug!(identity, fields = object.fields.len(), "Expanding object type");
        self.cache
            .insert(identity.to_string(), Schema::Object(ObjectSchema::default()));

        // Errors against the definition name the type; the overlay may rename it
        let mut schema = ObjectSchema {
            annotations: SchemaAnnotations::titled(identity),
            ..Default::default()
        };
        for (name, field) in &object.fields {
            let mut field_schema = self.resolve_node(&field.ty)?;
            if let Some(overlay) = self.annotations.field(identity, name) {
                field_schema.annotations_mut().merge(overlay);
            }
            if !field.optional && !field.ty.admits_absence() {
                schema.required.push(name.clone());
            }
            schema.properties.insert(name.clone(), field_schema);
        }

        if let Some(signature) = &object.index_signature {
            let value_schema = self.resolve_node(signature)?;
            if value_schema.is_informative() {
                schema.additional_properties = AdditionalProperties::Schema(Box::new(value_schema));
            }
        }

        if let Some(overlay) = self.annotations.definition(identity) {
            schema.annotations.merge(overlay);
        }

        // Fill the placeholder in place so its position in the definitions
        // order is the order objects were first entered.
        if let Some(slot) = self.cache.get_mut(identity) {
            *slot = Schema::Object(schema);
        }
        Ok(Schema::reference(identity))
    }

    fn resolve_union(
        &mut self,
        members: &'g [TypeNode],
        alias: Option<&str>,
    ) -> ResolveResult<Schema> {
        // `undefined` members only mark a field optional
        let members: Vec<&'g TypeNode> = members
            .iter()
            .filter(|m| !matches!(m, TypeNode::Primitive(PrimitiveKind::Undefined)))
            .collect();
        if members.is_empty() {
            return Ok(with_alias(resolve_primitive(PrimitiveKind::Undefined), alias));
        }

        if let Some(schema) = collapse_literals(&members) {
            tracing::debug!(alias = ?alias, "Collapsed literal union into enum");
            return Ok(with_alias(schema, alias));
        }

        let resolved = members
            .iter()
            .map(|member| self.resolve_node(member))
            .collect::<ResolveResult<Vec<_>>>()?;

        let informative: Vec<Schema> = resolved
            .iter()
            .filter(|schema| schema.is_informative())
            .cloned()
            .collect();
        let mut survivors = if informative.is_empty() {
            resolved
        } else {
            informative
        };
        tracing::trace!(alias = ?alias, survivors = survivors.len(), "Filtered union members");

        if survivors.len() == 1 {
            let single = survivors.remove(0);
            return Ok(with_alias(single, alias));
        }
        Ok(with_alias(Schema::one_of(survivors), alias))
    }
}

fn with_alias(schema: Schema, alias: Option<&str>) -> Schema {
    match alias {
        Some(alias) => schema.with_title(alias),
        None => schema,
    }
}

fn resolve_primitive(kind: PrimitiveKind) -> Schema {
    match kind {
        PrimitiveKind::String => Schema::kind(Kind::String),
        PrimitiveKind::Number => Schema::kind(Kind::Number),
        PrimitiveKind::Boolean => Schema::kind(Kind::Boolean),
        PrimitiveKind::Null | PrimitiveKind::Undefined => Schema::kind(Kind::Null),
        PrimitiveKind::Any | PrimitiveKind::Unknown => Schema::permissive(),
    }
}

fn literal_kind(literal: &LiteralValue) -> Kind {
    match literal {
        LiteralValue::String(_) => Kind::String,
        LiteralValue::Number(_) => Kind::Number,
        LiteralValue::Boolean(_) => Kind::Boolean,
    }
}

fn resolve_literal(literal: &LiteralValue) -> Schema {
    Schema::enumeration(literal_kind(literal), vec![literal.to_json()])
}

/// A union of only string/number literals (plus `null`) becomes one enum
/// constraint
fn collapse_literals(members: &[&TypeNode]) -> Option<Schema> {
    let mut constraint = TypeConstraint::default();
    let mut values: Vec<serde_json::Value> = Vec::new();
    let mut saw_null = false;

    for member in members {
        match member {
            TypeNode::Literal(literal @ (LiteralValue::String(_) | LiteralValue::Number(_))) => {
                constraint.push_kind(literal_kind(literal));
                let value = literal.to_json();
                if !values.contains(&value) {
                    values.push(value);
                }
            }
            TypeNode::Primitive(PrimitiveKind::Null) => saw_null = true,
            _ => return None,
        }
    }
    if values.is_empty() {
        return None;
    }
    if saw_null {
        constraint.push_kind(Kind::Null);
    }
    constraint.enum_values = Some(values);
    Some(Schema::Constraint(constraint))
}
