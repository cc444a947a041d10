use serde_json::json;
use typeshape::{
    resolve, validate, Field, ObjectType, PrimitiveKind, Schema, SchemaRepository, TypeNode,
};

/// TreeNode { value: number, label?: string, children: TreeNode[], meta: { [k: string]: string } }
fn tree_graph() -> TypeNode {
    TypeNode::from(
        ObjectType::new("TreeNode")
            .field("value", Field::new(TypeNode::number()))
            .field("label", Field::optional(TypeNode::string()))
            .field(
                "children",
                Field::new(TypeNode::array(TypeNode::reference("TreeNode"))),
            )
            .field(
                "meta",
                Field::new(
                    ObjectType::new("Meta")
                        .index_signature(TypeNode::string())
                        .into(),
                ),
            )
            .field(
                "kind",
                Field::new(TypeNode::union(vec![
                    TypeNode::literal("leaf"),
                    TypeNode::literal("branch"),
                    TypeNode::primitive(PrimitiveKind::Null),
                ])),
            ),
    )
}

fn samples() -> Vec<serde_json::Value> {
    vec![
        json!({ "value": 1, "children": [], "meta": {}, "kind": null }),
        json!({ "value": 1, "children": [{ "value": 2, "children": [], "meta": {}, "kind": "leaf" }],
                "meta": { "owner": "ops" }, "kind": "branch" }),
        json!({ "value": "1", "children": [{}], "meta": { "owner": 7 }, "kind": "root" }),
        json!({ "label": 3 }),
        json!(null),
        json!([1, 2]),
    ]
}

#[test]
fn test_reloaded_repository_validates_identically() {
    let repository = resolve(&tree_graph()).unwrap();
    let text = repository.to_json_string_pretty().unwrap();
    let reloaded = SchemaRepository::from_json_str(&text).unwrap();

    assert_eq!(reloaded, repository);
    for value in samples() {
        assert_eq!(
            validate(&reloaded, &value),
            validate(&repository, &value),
            "value {}",
            value
        );
    }
}

#[test]
fn test_self_reference_has_one_definition() {
    let repository = resolve(&tree_graph()).unwrap();
    assert_eq!(
        repository
            .definitions()
            .keys()
            .filter(|name| name.as_str() == "TreeNode")
            .count(),
        1
    );

    let Some(Schema::Object(tree)) = repository.resolve("TreeNode") else {
        panic!("Expected TreeNode object definition");
    };
    match tree.properties.get("children") {
        Some(Schema::Array(array)) => assert_eq!(*array.items, Schema::reference("TreeNode")),
        other => panic!("Expected array of refs, got {:?}", other),
    }
}

#[test]
fn test_persisted_form() {
    let repository = resolve(&tree_graph()).unwrap();
    let persisted = serde_json::to_value(&repository).unwrap();

    assert_eq!(
        persisted["definitions"]["TreeNode"]["properties"]["children"],
        json!({ "type": "array", "items": { "$ref": "#/definitions/TreeNode" } })
    );
    assert_eq!(
        persisted["definitions"]["TreeNode"]["required"],
        json!(["value", "children", "meta", "kind"])
    );
    assert_eq!(
        persisted["definitions"]["Meta"],
        json!({
            "type": "object",
            "title": "Meta",
            "properties": {},
            "additionalProperties": { "type": "string" }
        })
    );
    assert_eq!(
        persisted["root"]["properties"]["kind"],
        json!({ "type": ["string", "null"], "enum": ["leaf", "branch"] })
    );
}

#[test]
fn test_null_default_survives_reload() {
    let schema: Schema =
        serde_json::from_value(json!({ "type": "string", "default": null })).unwrap();
    assert_eq!(schema.annotations().default, Some(json!(null)));

    let repository = SchemaRepository::from_root(schema);
    let text = repository.to_json_string_pretty().unwrap();
    assert!(text.contains("\"default\": null"));
    assert_eq!(SchemaRepository::from_json_str(&text).unwrap(), repository);

    let without: Schema = serde_json::from_value(json!({ "type": "string" })).unwrap();
    assert_eq!(without.annotations().default, None);
}

#[test]
fn test_load_hand_written_repository() {
    let repository = SchemaRepository::from_json_str(
        r##"{
            "root": { "$ref": "#/definitions/Pair" },
            "definitions": {
                "Pair": {
                    "type": "object",
                    "properties": {
                        "left": { "type": "integer" },
                        "right": { "$ref": "#/definitions/Missing" }
                    },
                    "required": ["left"],
                    "additionalProperties": false
                }
            }
        }"##,
    )
    .unwrap();

    assert_eq!(repository.dangling_refs(), vec!["Missing"]);

    let rendered: Vec<String> = validate(&repository, &json!({ "left": 1.5, "right": 0, "extra": 1 }))
        .iter()
        .map(|e| e.to_string())
        .collect();
    assert_eq!(
        rendered,
        vec![
            "left: expected integer, got 1.5",
            "right: expected Reference \"#/definitions/Missing\" could not be resolved, got 0",
            "extra: expected no additional properties allowed, got 1",
        ]
    );
}
