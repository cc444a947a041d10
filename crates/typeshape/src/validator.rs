// Validation engine: schema repository + runtime value -> error list

use regex::Regex;
use serde_json::Value;
use std::fmt;

use crate::error::{InstancePath, PathSegment, ValidationError, ValidationErrorKind};
use crate::schema::{
    describe_enum, AdditionalProperties, AllOfSchema, ArraySchema, Kind, ObjectSchema,
    OneOfSchema, RefSchema, Schema, SchemaAnnotations, SchemaRepository, TypeConstraint,
    DEFINITIONS_PREFIX,
};

/// Validate `value` against the root of `repository`.
///
/// Returns an empty list iff the value conforms. The list order is the
/// depth-first order in which mismatches were found, so it is stable for a
/// given repository and value.
pub fn validate(repository: &SchemaRepository, value: &Value) -> Vec<ValidationError> {
    Validator::new(repository).check(value)
}

/// Reusable validator bound to one repository
#[derive(Debug, Clone, Copy)]
pub struct Validator<'r> {
    repository: &'r SchemaRepository,
}

impl<'r> Validator<'r> {
    pub fn new(repository: &'r SchemaRepository) -> Self {
        Self { repository }
    }

    /// Check a value against the repository root
    pub fn check(&self, value: &Value) -> Vec<ValidationError> {
        self.check_against(self.repository.root(), value)
    }

    /// Check a value against an arbitrary schema, resolving refs through the
    /// repository
    pub fn check_against(&self, schema: &Schema, value: &Value) -> Vec<ValidationError> {
        let mut context = ValidationContext::new(self.repository);
        validate_generic(value, schema, &mut context);
        tracing::debug!(errors = context.errors.len(), "Validated value");
        context.errors
    }
}

/// Runtime kind of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl ValueKind {
    /// Inspect a value
    pub fn of(value: &Value) -> ValueKind {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Whether a value of this kind satisfies schema kind `kind`. Numbers
    /// satisfy `integer` when they have no fractional part.
    pub fn satisfies(self, kind: Kind, value: &Value) -> bool {
        match (kind, self) {
            (Kind::String, ValueKind::String)
            | (Kind::Number, ValueKind::Number)
            | (Kind::Boolean, ValueKind::Boolean)
            | (Kind::Array, ValueKind::Array)
            | (Kind::Object, ValueKind::Object)
            | (Kind::Null, ValueKind::Null) => true,
            (Kind::Integer, ValueKind::Number) => value.as_number().is_some_and(is_integral),
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Null => "null",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validation context tracks state during one validation pass
pub struct ValidationContext<'a> {
    /// Repository for ref resolution
    repository: &'a SchemaRepository,
    /// Current instance path (e.g., ["servers", 1, "host"])
    instance_path: InstancePath,
    /// Refs being followed, with the path depth they were entered at
    active_refs: Vec<(&'a str, usize)>,
    /// Collected validation errors
    errors: Vec<ValidationError>,
}

impl<'a> ValidationContext<'a> {
    /// Create a new validation context
    pub fn new(repository: &'a SchemaRepository) -> Self {
        Self {
            repository,
            instance_path: InstancePath::new(),
            active_refs: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Empty error buffer at the same position, for trying union alternatives
    fn sandbox(&self) -> Self {
        Self {
            repository: self.repository,
            instance_path: self.instance_path.clone(),
            active_refs: self.active_refs.clone(),
            errors: Vec::new(),
        }
    }

    /// Add an error at the current path
    pub fn add_error(
        &mut self,
        kind: ValidationErrorKind,
        value: Option<&Value>,
        expected: impl Into<String>,
    ) {
        self.errors.push(ValidationError::new(
            kind,
            self.instance_path.clone(),
            value.cloned(),
            expected,
        ));
    }

    /// Execute a function with a new instance path segment
    pub fn with_instance_path<F, R>(&mut self, segment: PathSegment, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.instance_path.push(segment);
        let result = f(self);
        self.instance_path.pop();
        result
    }

    /// Check if validation failed
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Main validation dispatcher
fn validate_generic<'a>(value: &Value, schema: &'a Schema, context: &mut ValidationContext<'a>) {
    match schema {
        // A null value stops at a ref or intersection that cannot be null.
        // Union alternatives decide for themselves.
        Schema::Ref(_) | Schema::AllOf(_)
            if ValueKind::of(value) == ValueKind::Null
                && !accepts_null(schema, context.repository, &mut Vec::new()) =>
        {
            context.add_error(ValidationErrorKind::TypeMismatch, Some(value), schema.describe());
        }
        Schema::Ref(s) => validate_ref(value, s, context),
        Schema::OneOf(s) => validate_one_of(value, schema, s, context),
        Schema::AllOf(s) => validate_all_of(value, s, context),
        Schema::Constraint(s) => validate_constraint(value, schema, s, context),
        Schema::Object(s) => validate_object(value, schema, s, context),
        Schema::Array(s) => validate_array(value, schema, s, context),
    }
}

/// Follow a reference into the repository definitions
fn validate_ref<'a>(value: &Value, schema: &'a RefSchema, context: &mut ValidationContext<'a>) {
    let name = schema.reference.as_str();
    let depth = context.instance_path.len();

    // Re-entering the same ref without descending into the value can only
    // happen through a ref cycle in the definitions.
    if context
        .active_refs
        .iter()
        .any(|(active, at)| *active == name && *at == depth)
    {
        context.add_error(
            ValidationErrorKind::UnresolvedReference,
            Some(value),
            format!("Reference \"{}{}\" is circular", DEFINITIONS_PREFIX, name),
        );
        return;
    }

    let Some(target) = context.repository.resolve(name) else {
        context.add_error(
            ValidationErrorKind::UnresolvedReference,
            Some(value),
            format!("Reference \"{}{}\" could not be resolved", DEFINITIONS_PREFIX, name),
        );
        return;
    };

    context.active_refs.push((name, depth));
    validate_generic(value, target, context);
    context.active_refs.pop();
}

/// Validate oneOf (first matching alternative wins)
fn validate_one_of<'a>(
    value: &Value,
    schema: &'a Schema,
    one_of: &'a OneOfSchema,
    context: &mut ValidationContext<'a>,
) {
    for alternative in &one_of.alternatives {
        let mut sandbox = context.sandbox();
        validate_generic(value, alternative, &mut sandbox);
        if !sandbox.has_errors() {
            return;
        }
    }

    // One aggregate error, however many alternatives failed
    context.add_error(
        ValidationErrorKind::NoMatchingAlternative,
        Some(value),
        schema.describe(),
    );
}

/// Validate allOf (every member contributes its own errors)
fn validate_all_of<'a>(value: &Value, schema: &'a AllOfSchema, context: &mut ValidationContext<'a>) {
    for member in &schema.members {
        validate_generic(value, member, context);
    }
}

/// Validate a kind constraint, its enum and its bounds
fn validate_constraint(
    value: &Value,
    schema: &Schema,
    constraint: &TypeConstraint,
    context: &mut ValidationContext,
) {
    let kind = ValueKind::of(value);
    if kind == ValueKind::Null {
        if !constraint.allows_null() {
            context.add_error(ValidationErrorKind::TypeMismatch, Some(value), schema.describe());
        }
        return;
    }

    if !constraint.kinds.is_empty()
        && !constraint.kinds.iter().any(|k| kind.satisfies(*k, value))
    {
        context.add_error(ValidationErrorKind::TypeMismatch, Some(value), schema.describe());
        return;
    }

    if let Some(allowed) = &constraint.enum_values {
        if !allowed.iter().any(|literal| literal_eq(literal, value)) {
            context.add_error(
                ValidationErrorKind::InvalidEnumValue,
                Some(value),
                describe_enum(allowed),
            );
            return;
        }
    }

    check_bounds(value, &constraint.annotations, context);
}

/// Validate an object value
fn validate_object<'a>(
    value: &Value,
    schema: &'a Schema,
    object: &'a ObjectSchema,
    context: &mut ValidationContext<'a>,
) {
    if !expect_kind(value, ValueKind::Object, schema, context) {
        return;
    }
    let Some(entries) = value.as_object() else {
        return;
    };

    // Required properties first, independent of per-field checks
    for required in &object.required {
        if !entries.contains_key(required) {
            context.with_instance_path(PathSegment::Key(required.clone()), |ctx| {
                ctx.add_error(
                    ValidationErrorKind::MissingRequiredProperty,
                    None,
                    "required property",
                );
            });
        }
    }

    for (key, entry) in entries {
        let segment = PathSegment::Key(key.clone());
        if let Some(property_schema) = object.properties.get(key) {
            context.with_instance_path(segment, |ctx| {
                validate_generic(entry, property_schema, ctx);
            });
            continue;
        }
        match &object.additional_properties {
            AdditionalProperties::Unset => {}
            AdditionalProperties::Disallowed => {
                context.with_instance_path(segment, |ctx| {
                    ctx.add_error(
                        ValidationErrorKind::UnknownProperty,
                        Some(entry),
                        "no additional properties allowed",
                    );
                });
            }
            AdditionalProperties::Schema(additional) => {
                context.with_instance_path(segment, |ctx| {
                    validate_generic(entry, additional, ctx);
                });
            }
        }
    }
}

/// Validate an array value
fn validate_array<'a>(
    value: &Value,
    schema: &'a Schema,
    array: &'a ArraySchema,
    context: &mut ValidationContext<'a>,
) {
    if !expect_kind(value, ValueKind::Array, schema, context) {
        return;
    }
    let Some(items) = value.as_array() else {
        return;
    };

    check_bounds(value, &array.annotations, context);

    for (index, item) in items.iter().enumerate() {
        context.with_instance_path(PathSegment::Index(index), |ctx| {
            validate_generic(item, &array.items, ctx);
        });
    }
}

/// Report a type mismatch unless the value has the `expected` kind
fn expect_kind(
    value: &Value,
    expected: ValueKind,
    schema: &Schema,
    context: &mut ValidationContext,
) -> bool {
    if ValueKind::of(value) == expected {
        return true;
    }
    context.add_error(ValidationErrorKind::TypeMismatch, Some(value), schema.describe());
    false
}

/// Whether `null` satisfies `schema`, following refs through the repository
fn accepts_null<'a>(
    schema: &'a Schema,
    repository: &'a SchemaRepository,
    following: &mut Vec<&'a str>,
) -> bool {
    match schema {
        Schema::Constraint(c) => c.allows_null(),
        Schema::Object(_) | Schema::Array(_) => false,
        Schema::OneOf(o) => o
            .alternatives
            .iter()
            .any(|alternative| accepts_null(alternative, repository, following)),
        Schema::AllOf(a) => a
            .members
            .iter()
            .all(|member| accepts_null(member, repository, following)),
        Schema::Ref(r) => {
            let name = r.reference.as_str();
            // Dangling and circular refs are reported by `validate_ref`
            if following.contains(&name) {
                return true;
            }
            let Some(target) = repository.resolve(name) else {
                return true;
            };
            following.push(name);
            let accepted = accepts_null(target, repository, following);
            following.pop();
            accepted
        }
    }
}

fn is_integral(number: &serde_json::Number) -> bool {
    number.is_i64()
        || number.is_u64()
        || number
            .as_f64()
            .is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

/// Literal equality; numbers compare by numeric value so `1` equals `1.0`
fn literal_eq(literal: &Value, value: &Value) -> bool {
    match (literal, value) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => literal == value,
    }
}

/// Enforce numeric, length, pattern and item-count bounds
fn check_bounds(value: &Value, annotations: &SchemaAnnotations, context: &mut ValidationContext) {
    if !annotations.has_bounds() {
        return;
    }

    match value {
        Value::Number(number) => {
            let Some(n) = number.as_f64() else {
                return;
            };
            if let Some(min) = annotations.minimum {
                if n < min {
                    context.add_error(
                        ValidationErrorKind::BoundViolation,
                        Some(value),
                        format!("number >= {}", min),
                    );
                }
            }
            if let Some(max) = annotations.maximum {
                if n > max {
                    context.add_error(
                        ValidationErrorKind::BoundViolation,
                        Some(value),
                        format!("number <= {}", max),
                    );
                }
            }
        }
        Value::String(s) => {
            let length = s.chars().count();
            if let Some(min) = annotations.min_length {
                if length < min {
                    context.add_error(
                        ValidationErrorKind::BoundViolation,
                        Some(value),
                        format!("string with at least {} characters", min),
                    );
                }
            }
            if let Some(max) = annotations.max_length {
                if length > max {
                    context.add_error(
                        ValidationErrorKind::BoundViolation,
                        Some(value),
                        format!("string with at most {} characters", max),
                    );
                }
            }
            if let Some(pattern) = &annotations.pattern {
                match Regex::new(pattern) {
                    Ok(re) if re.is_match(s) => {}
                    Ok(_) => context.add_error(
                        ValidationErrorKind::BoundViolation,
                        Some(value),
                        format!("string matching /{}/", pattern),
                    ),
                    Err(e) => {
                        // A broken pattern is a schema defect; report it
                        // against the value rather than accept silently.
                        tracing::warn!(pattern = %pattern, error = %e, "Invalid pattern in schema");
                        context.add_error(
                            ValidationErrorKind::BoundViolation,
                            Some(value),
                            format!("string matching /{}/ (invalid pattern)", pattern),
                        );
                    }
                }
            }
        }
        Value::Array(items) => {
            if let Some(min) = annotations.min_items {
                if items.len() < min {
                    context.add_error(
                        ValidationErrorKind::BoundViolation,
                        Some(value),
                        format!("array with at least {} items", min),
                    );
                }
            }
            if let Some(max) = annotations.max_items {
                if items.len() > max {
                    context.add_error(
                        ValidationErrorKind::BoundViolation,
                        Some(value),
                        format!("array with at most {} items", max),
                    );
                }
            }
        }
        Value::Null | Value::Bool(_) | Value::Object(_) => {}
    }
}
