//! Schema repository: a root schema plus named definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::Schema;
use crate::error::SchemaResult;

/// A root schema and the definitions its references point into.
///
/// Immutable once built; share it freely between validation calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRepository {
    root: Schema,
    #[serde(default)]
    definitions: IndexMap<String, Schema>,
}

impl SchemaRepository {
    pub fn new(root: Schema, definitions: IndexMap<String, Schema>) -> Self {
        Self { root, definitions }
    }

    /// Repository with no definitions
    pub fn from_root(root: Schema) -> Self {
        Self::new(root, IndexMap::new())
    }

    pub fn root(&self) -> &Schema {
        &self.root
    }

    pub fn definitions(&self) -> &IndexMap<String, Schema> {
        &self.definitions
    }

    /// Look up a definition by name
    pub fn resolve(&self, name: &str) -> Option<&Schema> {
        self.definitions.get(name)
    }

    /// Reference names (root and definitions) with no matching definition,
    /// deduplicated, in first-seen order
    pub fn dangling_refs(&self) -> Vec<String> {
        let mut dangling: Vec<String> = Vec::new();
        let mut visit = |name: &str| {
            if !self.definitions.contains_key(name) && !dangling.iter().any(|d| d == name) {
                dangling.push(name.to_string());
            }
        };
        self.root.for_each_ref(&mut visit);
        for schema in self.definitions.values() {
            schema.for_each_ref(&mut visit);
        }
        dangling
    }

    /// Load a repository from its persisted JSON text
    pub fn from_json_str(source: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Persist as pretty-printed JSON text
    pub fn to_json_string_pretty(&self) -> SchemaResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Kind, ObjectSchema};

    #[test]
    fn test_dangling_refs() {
        let mut definitions = IndexMap::new();
        definitions.insert(
            "Known".to_string(),
            Schema::Object(ObjectSchema {
                properties: [
                    ("self_ref".to_string(), Schema::reference("Known")),
                    ("missing".to_string(), Schema::reference("Missing")),
                ]
                .into_iter()
                .collect(),
                ..Default::default()
            }),
        );
        let root = Schema::one_of(vec![
            Schema::reference("Known"),
            Schema::array(Schema::reference("Missing")),
            Schema::reference("AlsoMissing"),
        ]);
        let repository = SchemaRepository::new(root, definitions);
        assert_eq!(repository.dangling_refs(), vec!["Missing", "AlsoMissing"]);
    }

    #[test]
    fn test_json_round_trip() {
        let repository = SchemaRepository::from_root(Schema::array(Schema::kind(Kind::Number)));
        let text = repository.to_json_string_pretty().unwrap();
        assert_eq!(SchemaRepository::from_json_str(&text).unwrap(), repository);
    }

    #[test]
    fn test_load_error() {
        let err = SchemaRepository::from_json_str("{ \"root\": { \"type\": 3 } }").unwrap_err();
        assert!(err.to_string().starts_with("Malformed schema repository"));
    }
}
