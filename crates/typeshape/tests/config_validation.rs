use serde_json::{json, Value};
use typeshape::{
    resolve, validate, AnnotationOverlay, Field, ObjectType, Resolver, SchemaAnnotations,
    SchemaRepository, TypeNode, ValidationErrorKind,
};

/// AppConfig { server, logging, database: DatabaseConfig | null, tags: string[] }
fn app_config() -> TypeNode {
    let server = ObjectType::new("ServerConfig")
        .field("host", Field::new(TypeNode::string()))
        .field("port", Field::new(TypeNode::number()))
        .field("tls", Field::optional(TypeNode::boolean()));

    let log_level = TypeNode::Union {
        members: ["debug", "info", "warn", "error"]
            .into_iter()
            .map(TypeNode::literal)
            .collect(),
        alias: Some("LogLevel".to_string()),
    };
    let log_format = TypeNode::union(vec![
        TypeNode::literal("json"),
        TypeNode::literal("text"),
        TypeNode::primitive(typeshape::PrimitiveKind::Undefined),
    ]);
    let logging = ObjectType::new("LoggingConfig")
        .field("level", Field::new(log_level))
        .field("format", Field::new(log_format));

    let database = ObjectType::new("DatabaseConfig")
        .field("url", Field::new(TypeNode::string()))
        .field("pool_size", Field::optional(TypeNode::number()));

    TypeNode::from(
        ObjectType::new("AppConfig")
            .field("server", Field::new(server.into()))
            .field("logging", Field::new(logging.into()))
            .field(
                "database",
                Field::new(TypeNode::union(vec![
                    database.into(),
                    TypeNode::primitive(typeshape::PrimitiveKind::Null),
                ])),
            )
            .field("tags", Field::new(TypeNode::array(TypeNode::string()))),
    )
}

fn port_bounds() -> AnnotationOverlay {
    let mut overlay = AnnotationOverlay::new();
    overlay.annotate_field(
        "ServerConfig",
        "port",
        SchemaAnnotations {
            description: Some("Listening port".to_string()),
            minimum: Some(1.0),
            maximum: Some(65535.0),
            ..Default::default()
        },
    );
    overlay
}

fn render(repository: &SchemaRepository, value: &Value) -> String {
    validate(repository, value)
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn valid_config() -> Value {
    json!({
        "server": { "host": "localhost", "port": 8080 },
        "logging": { "level": "info" },
        "database": null,
        "tags": ["web"]
    })
}

#[test]
fn test_valid_config_has_no_errors() {
    let repository = resolve(&app_config()).unwrap();
    assert!(validate(&repository, &valid_config()).is_empty());

    let mut with_database = valid_config();
    with_database["database"] = json!({ "url": "postgres://localhost/app", "pool_size": 4 });
    with_database["logging"]["format"] = json!("json");
    assert!(validate(&repository, &with_database).is_empty());
}

#[test]
fn test_definitions_follow_first_expansion_order() {
    let repository = resolve(&app_config()).unwrap();
    let names: Vec<&str> = repository.definitions().keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec!["AppConfig", "ServerConfig", "LoggingConfig", "DatabaseConfig"]
    );
    assert!(repository.dangling_refs().is_empty());
}

#[test]
fn test_invalid_config_report() {
    let repository = resolve(&app_config()).unwrap();
    let value = json!({
        "server": { "host": "localhost", "port": "8080" },
        "logging": { "level": "trace", "format": "xml" },
        "database": { "pool_size": 4 },
        "tags": ["web", 3]
    });

    insta::assert_snapshot!(render(&repository, &value), @r#"
    server.port: expected number, got "8080"
    logging.level: expected one of [debug, info, warn, error], got "trace"
    logging.format: expected one of [json, text], got "xml"
    database: expected DatabaseConfig | null, got {"pool_size":4}
    tags[1]: expected string, got 3
    "#);
}

#[test]
fn test_missing_sections_report() {
    let repository = resolve(&app_config()).unwrap();
    let value = json!({ "server": { "port": 80 }, "tags": [] });

    insta::assert_snapshot!(render(&repository, &value), @r"
    logging: expected required property
    database: expected required property
    server.host: expected required property
    ");
}

#[test]
fn test_nested_object_errors_name_the_type() {
    let repository = resolve(&app_config()).unwrap();

    let mut value = valid_config();
    value["server"] = json!("oops");
    assert_eq!(
        render(&repository, &value),
        "server: expected ServerConfig, got \"oops\""
    );

    value["server"] = json!(null);
    let errors = validate(&repository, &value);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ValidationErrorKind::TypeMismatch);
    assert_eq!(errors[0].to_string(), "server: expected ServerConfig, got null");
}

#[test]
fn test_error_kinds() {
    let repository = resolve(&app_config()).unwrap();
    let value = json!({
        "server": { "host": 1, "port": 80 },
        "logging": { "level": "loud" },
        "database": 5,
        "tags": "web"
    });
    let kinds: Vec<ValidationErrorKind> =
        validate(&repository, &value).iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ValidationErrorKind::TypeMismatch,
            ValidationErrorKind::InvalidEnumValue,
            ValidationErrorKind::NoMatchingAlternative,
            ValidationErrorKind::TypeMismatch,
        ]
    );
}

#[test]
fn test_overlay_bounds_are_enforced() {
    let repository = Resolver::with_annotations(port_bounds())
        .resolve(&app_config())
        .unwrap();

    assert!(validate(&repository, &valid_config()).is_empty());

    let mut value = valid_config();
    value["server"]["port"] = json!(0);
    assert_eq!(
        render(&repository, &value),
        "server.port: expected number >= 1, got 0"
    );

    value["server"]["port"] = json!(70000);
    let errors = validate(&repository, &value);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ValidationErrorKind::BoundViolation);
    assert_eq!(errors[0].expected, "number <= 65535");
}

#[test]
fn test_errors_serialize_for_reports() {
    let repository = resolve(&app_config()).unwrap();
    let mut value = valid_config();
    value["tags"] = json!([true]);

    let report = serde_json::to_value(validate(&repository, &value)).unwrap();
    assert_eq!(
        report,
        json!([{
            "kind": "type_mismatch",
            "path": ["tags", 0],
            "value": true,
            "expected": "string"
        }])
    );
}
