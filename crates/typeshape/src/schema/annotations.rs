//! Annotation overlay
//!
//! Documentation, defaults and bounds are produced by an external extractor
//! and handed to the resolver as an overlay keyed by name. The resolver
//! merges an entry onto the schema it resolves for that name; overlay values
//! win over whatever the resolver produced.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::SchemaAnnotations;

/// Extracted metadata, keyed by definition identity and by field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationOverlay {
    /// Merged onto the definition of an object type
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub definitions: IndexMap<String, SchemaAnnotations>,

    /// Merged onto a field's schema: identity -> field name -> annotations
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, IndexMap<String, SchemaAnnotations>>,
}

impl AnnotationOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach annotations to the definition of `identity`
    pub fn annotate_definition(
        &mut self,
        identity: impl Into<String>,
        annotations: SchemaAnnotations,
    ) -> &mut Self {
        self.definitions.insert(identity.into(), annotations);
        self
    }

    /// Attach annotations to field `field` of `identity`
    pub fn annotate_field(
        &mut self,
        identity: impl Into<String>,
        field: impl Into<String>,
        annotations: SchemaAnnotations,
    ) -> &mut Self {
        self.fields
            .entry(identity.into())
            .or_default()
            .insert(field.into(), annotations);
        self
    }

    pub fn definition(&self, identity: &str) -> Option<&SchemaAnnotations> {
        self.definitions.get(identity)
    }

    pub fn field(&self, identity: &str, field: &str) -> Option<&SchemaAnnotations> {
        self.fields.get(identity).and_then(|fields| fields.get(field))
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty() && self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        let mut overlay = AnnotationOverlay::new();
        overlay
            .annotate_definition("ServerConfig", SchemaAnnotations::titled("Server"))
            .annotate_field(
                "ServerConfig",
                "port",
                SchemaAnnotations {
                    minimum: Some(1.0),
                    maximum: Some(65535.0),
                    ..Default::default()
                },
            );

        assert_eq!(
            overlay.definition("ServerConfig").and_then(|a| a.title.as_deref()),
            Some("Server")
        );
        assert_eq!(
            overlay.field("ServerConfig", "port").and_then(|a| a.maximum),
            Some(65535.0)
        );
        assert!(overlay.field("ServerConfig", "host").is_none());
        assert!(overlay.field("Other", "port").is_none());
    }

    #[test]
    fn test_merge_overlay_wins() {
        let mut base = SchemaAnnotations {
            title: Some("number".to_string()),
            description: Some("from resolver".to_string()),
            ..Default::default()
        };
        base.merge(&SchemaAnnotations {
            description: Some("Listening port".to_string()),
            default: Some(serde_json::json!(8080)),
            ..Default::default()
        });
        assert_eq!(base.title.as_deref(), Some("number"));
        assert_eq!(base.description.as_deref(), Some("Listening port"));
        assert_eq!(base.default, Some(serde_json::json!(8080)));
    }

    #[test]
    fn test_deserialize_overlay() {
        let overlay: AnnotationOverlay = serde_json::from_value(serde_json::json!({
            "fields": {
                "LoggingConfig": {
                    "level": { "description": "Minimum level", "default": "info" }
                }
            }
        }))
        .unwrap();
        assert!(overlay.definitions.is_empty());
        assert_eq!(
            overlay
                .field("LoggingConfig", "level")
                .and_then(|a| a.description.as_deref()),
            Some("Minimum level")
        );
    }
}
