//! Dialect detection, draft-specific keyword variants and vocabularies.

use std::sync::Arc;

use jsv::{BuildOptions, Draft, Schema, SchemaError, SchemaRegistry, SchemaBuilder};
use serde_json::{json, Value};

fn in_draft(draft: Draft, value: Value) -> Schema {
    let options = BuildOptions {
        default_draft: draft,
        ..Default::default()
    };
    Schema::from_json_with(&value, &options).unwrap_or_else(|e| panic!("{draft}: {e}"))
}

#[test]
fn schema_uri_selects_the_draft() {
    let cases = [
        ("http://json-schema.org/draft-04/schema#", Draft::Draft04),
        ("http://json-schema.org/draft-06/schema", Draft::Draft06),
        ("https://json-schema.org/draft-07/schema#", Draft::Draft07),
        ("https://json-schema.org/draft/2019-09/schema", Draft::Draft2019_09),
    ];
    for (uri, draft) in cases {
        let schema = Schema::from_json(&json!({"$schema": uri})).unwrap();
        assert_eq!(schema.draft(), draft, "{uri}");
    }
    let unknown = Schema::from_json(&json!({"$schema": "https://example.com/unknown"})).unwrap();
    assert_eq!(unknown.draft(), Draft::Draft2019_09);
}

#[test]
fn exclusive_bounds_change_shape_after_draft4() {
    let d4 = in_draft(Draft::Draft04, json!({"maximum": 10, "exclusiveMaximum": true}));
    assert!(d4.is_valid(&json!(9)).unwrap());
    assert!(!d4.is_valid(&json!(10)).unwrap());

    let d6 = in_draft(Draft::Draft06, json!({"exclusiveMaximum": 10}));
    assert!(d6.is_valid(&json!(9.5)).unwrap());
    assert!(!d6.is_valid(&json!(10)).unwrap());

    let options = BuildOptions {
        default_draft: Draft::Draft06,
        ..Default::default()
    };
    assert!(Schema::from_json_with(&json!({"exclusiveMaximum": true}), &options).is_err());
}

#[test]
fn dependencies_split_in_2019() {
    let schema = json!({"dependencies": {"card": ["billing"]}});
    assert!(!in_draft(Draft::Draft07, schema.clone()).is_valid(&json!({"card": 1})).unwrap());
    // Inert in 2019-09, where dependentRequired replaces it.
    assert!(in_draft(Draft::Draft2019_09, schema).is_valid(&json!({"card": 1})).unwrap());

    let split = json!({
        "dependentRequired": {"card": ["billing"]},
        "dependentSchemas": {"billing": {"required": ["address"]}}
    });
    let schema = in_draft(Draft::Draft2019_09, split.clone());
    assert!(!schema.is_valid(&json!({"card": 1})).unwrap());
    assert!(!schema.is_valid(&json!({"card": 1, "billing": 2})).unwrap());
    assert!(schema.is_valid(&json!({"card": 1, "billing": 2, "address": 3})).unwrap());
    assert!(in_draft(Draft::Draft07, split).is_valid(&json!({"card": 1})).unwrap());
}

#[test]
fn boolean_schemas_need_draft6() {
    assert!(Schema::from_json_with(
        &json!({"properties": {"a": false}}),
        &BuildOptions {
            default_draft: Draft::Draft04,
            ..Default::default()
        }
    )
    .is_err());
    let d6 = in_draft(Draft::Draft06, json!({"properties": {"a": false}}));
    assert!(!d6.is_valid(&json!({"a": 1})).unwrap());
    assert!(d6.is_valid(&json!({"b": 1})).unwrap());
    // additionalProperties always took booleans.
    let d4 = in_draft(Draft::Draft04, json!({"additionalProperties": false}));
    assert!(!d4.is_valid(&json!({"b": 1})).unwrap());
}

#[test]
fn keywords_outside_their_drafts_are_ignored() {
    let cases = [
        (Draft::Draft04, json!({"const": 1}), json!(2)),
        (Draft::Draft04, json!({"contains": {"type": "string"}}), json!([1])),
        (Draft::Draft06, json!({"if": false, "then": false}), json!(1)),
        (Draft::Draft07, json!({"unevaluatedProperties": false}), json!({"a": 1})),
        (Draft::Draft07, json!({"minContains": 2, "contains": true}), json!([1])),
    ];
    for (draft, schema, instance) in cases {
        let schema = in_draft(draft, schema);
        assert!(schema.is_valid(&instance).unwrap(), "{draft}: {}", schema.to_json());
    }
}

#[test]
fn ids_follow_the_draft_keyword() {
    let d4 = in_draft(Draft::Draft04, json!({"id": "http://example.com/a.json"}));
    assert_eq!(d4.id().map(|u| u.as_str()), Some("http://example.com/a.json"));
    let d7 = in_draft(Draft::Draft07, json!({"id": "http://example.com/a.json"}));
    assert!(d7.id().is_none());
    let d7 = in_draft(Draft::Draft07, json!({"$id": "http://example.com/b.json"}));
    assert_eq!(d7.id().map(|u| u.as_str()), Some("http://example.com/b.json"));
}

#[test]
fn custom_meta_schema_restricts_vocabularies() {
    let registry = Arc::new(SchemaRegistry::new());
    let meta = Schema::from_json(&json!({
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "$id": "https://example.com/meta/applicator-only",
        "$vocabulary": {
            "https://json-schema.org/draft/2019-09/vocab/core": true,
            "https://json-schema.org/draft/2019-09/vocab/applicator": true
        }
    }))
    .unwrap();
    registry.register(&meta).unwrap();
    let options = BuildOptions {
        registry: registry.clone(),
        ..Default::default()
    };
    let schema = Schema::from_json_with(
        &json!({
            "$schema": "https://example.com/meta/applicator-only",
            "properties": {"a": {"type": "string"}},
            "minProperties": 3
        }),
        &options,
    )
    .unwrap();
    assert_eq!(schema.draft(), Draft::Draft2019_09);
    assert!(schema.has_keyword("properties"));
    assert!(!schema.has_keyword("minProperties"));
    assert!(schema.is_valid(&json!({"a": 1})).unwrap());
}

#[test]
fn required_unknown_vocabulary_is_a_fault() {
    let registry = Arc::new(SchemaRegistry::new());
    let meta = Schema::from_json(&json!({
        "$id": "https://example.com/meta/exotic",
        "$vocabulary": {
            "https://json-schema.org/draft/2019-09/vocab/core": true,
            "https://example.com/vocab/exotic": true
        }
    }))
    .unwrap();
    registry.register(&meta).unwrap();
    let options = BuildOptions {
        registry,
        ..Default::default()
    };
    let err = Schema::from_json_with(&json!({"$schema": "https://example.com/meta/exotic"}), &options)
        .unwrap_err();
    assert_eq!(
        err,
        SchemaError::UnknownVocabulary("https://example.com/vocab/exotic".to_string())
    );
}

#[test]
fn formats_follow_their_drafts() {
    let d4 = in_draft(Draft::Draft04, json!({"format": "date"}));
    // `date` only asserts from draft 07 on.
    assert!(d4.is_valid(&json!("not a date")).unwrap());
    let d7 = in_draft(Draft::Draft07, json!({"format": "date"}));
    assert!(!d7.is_valid(&json!("not a date")).unwrap());
    assert!(d7.is_valid(&json!("2024-02-29")).unwrap());
}

#[test]
fn builder_documents_build_per_draft() {
    let builder = SchemaBuilder::new()
        .schema_uri("http://json-schema.org/draft-04/schema#")
        .type_("number")
        .maximum(3.0)
        .keyword("exclusiveMaximum", true);
    let schema = builder.build().unwrap();
    assert_eq!(schema.draft(), Draft::Draft04);
    assert!(schema.is_valid(&json!(2.5)).unwrap());
    assert!(!schema.is_valid(&json!(3)).unwrap());
    assert!(schema.validate_schema().unwrap().is_valid);
}
