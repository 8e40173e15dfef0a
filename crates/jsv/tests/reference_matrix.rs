//! Reference resolution across documents, registries and retrievers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use jsv::{BuildOptions, Draft, Retrieve, Schema, SchemaError, SchemaRegistry, ValidationOptions};
use serde_json::{json, Value};
use url::Url;

struct MapRetriever {
    documents: HashMap<String, Value>,
    calls: AtomicUsize,
}

impl MapRetriever {
    fn new(documents: &[(&str, Value)]) -> Self {
        Self {
            documents: documents
                .iter()
                .map(|(uri, doc)| (uri.to_string(), doc.clone()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Retrieve for MapRetriever {
    fn retrieve(&self, uri: &Url) -> Result<Value, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.documents
            .get(uri.as_str())
            .cloned()
            .ok_or_else(|| format!("no document at {uri}"))
    }
}

fn person() -> Schema {
    Schema::from_json(&json!({
        "$id": "https://example.com/person.json",
        "type": "object",
        "properties": {"name": {"$ref": "#/$defs/name"}},
        "required": ["name"],
        "$defs": {
            "name": {"$anchor": "nm", "type": "string", "minLength": 1},
            "age": {"$id": "age.json", "type": "integer", "minimum": 0}
        }
    }))
    .unwrap()
}

fn options_with(registry: &Arc<SchemaRegistry>) -> ValidationOptions {
    ValidationOptions::default().with_registry(registry.clone())
}

#[test]
fn registered_documents_resolve_by_uri() {
    let registry = Arc::new(SchemaRegistry::new());
    registry.register(&person()).unwrap();
    let options = options_with(&registry);

    let team = Schema::from_json(&json!({
        "type": "array",
        "items": {"$ref": "https://example.com/person.json"}
    }))
    .unwrap();
    assert!(team
        .validate_with(&json!([{"name": "ada"}, {"name": "bob"}]), &options)
        .unwrap()
        .is_valid);
    assert!(!team
        .validate_with(&json!([{"name": ""}]), &options)
        .unwrap()
        .is_valid);
}

#[test]
fn embedded_resources_and_anchors_resolve_remotely() {
    let registry = Arc::new(SchemaRegistry::new());
    registry.register(&person()).unwrap();
    let options = options_with(&registry);

    let age = Schema::from_json(&json!({"$ref": "https://example.com/age.json"})).unwrap();
    assert!(age.validate_with(&json!(30), &options).unwrap().is_valid);
    assert!(!age.validate_with(&json!(-1), &options).unwrap().is_valid);

    let name = Schema::from_json(&json!({"$ref": "https://example.com/person.json#nm"})).unwrap();
    assert!(name.validate_with(&json!("x"), &options).unwrap().is_valid);
    assert!(!name.validate_with(&json!(""), &options).unwrap().is_valid);
}

#[test]
fn relative_references_follow_id_scopes() {
    let schema = Schema::from_json(&json!({
        "$id": "https://example.com/root.json",
        "properties": {
            "item": {"$ref": "sub/item.json"}
        },
        "$defs": {
            "scoped": {
                "$id": "sub/",
                "$defs": {
                    "item": {"$id": "item.json", "type": "boolean"}
                }
            }
        }
    }))
    .unwrap();
    assert!(schema.is_valid(&json!({"item": true})).unwrap());
    assert!(!schema.is_valid(&json!({"item": 1})).unwrap());
}

#[test]
fn draft4_ids_declare_anchors() {
    let options = BuildOptions {
        default_draft: Draft::Draft04,
        ..Default::default()
    };
    let schema = Schema::from_json_with(
        &json!({
            "id": "http://example.com/root.json",
            "properties": {"x": {"$ref": "#foo"}},
            "definitions": {"a": {"id": "#foo", "type": "integer"}}
        }),
        &options,
    )
    .unwrap();
    assert!(schema.is_valid(&json!({"x": 1})).unwrap());
    assert!(!schema.is_valid(&json!({"x": "1"})).unwrap());
}

#[test]
fn retriever_loads_unknown_documents_once() {
    let retriever = Arc::new(MapRetriever::new(&[(
        "https://example.com/defs.json",
        json!({"$defs": {"count": {"type": "integer", "minimum": 0}}}),
    )]));
    let registry = Arc::new(SchemaRegistry::new());
    let options = options_with(&registry).with_retriever(retriever.clone());

    let schema = Schema::from_json(&json!({
        "$id": "https://example.com/root.json",
        "properties": {"n": {"$ref": "defs.json#/$defs/count"}}
    }))
    .unwrap();
    assert!(schema.validate_with(&json!({"n": 3}), &options).unwrap().is_valid);
    assert!(!schema.validate_with(&json!({"n": -3}), &options).unwrap().is_valid);
    assert_eq!(retriever.calls.load(Ordering::SeqCst), 1);
    assert!(registry.contains("https://example.com/defs.json"));
}

#[test]
fn retrieval_and_resolution_failures_are_faults() {
    let schema = Schema::from_json(&json!({"$ref": "https://example.com/missing.json"})).unwrap();
    let registry = Arc::new(SchemaRegistry::new());

    let err = schema.validate_with(&json!(1), &options_with(&registry)).unwrap_err();
    assert!(matches!(err, SchemaError::UnresolvableReference { .. }), "{err}");

    let options = options_with(&registry).with_retriever(Arc::new(MapRetriever::new(&[])));
    let err = schema.validate_with(&json!(1), &options).unwrap_err();
    assert_eq!(
        err,
        SchemaError::Retrieval {
            uri: "https://example.com/missing.json".to_string(),
            reason: "no document at https://example.com/missing.json".to_string(),
        }
    );
}

#[test]
fn unregistered_documents_stop_resolving() {
    let registry = Arc::new(SchemaRegistry::new());
    let doc = person();
    registry.register(&doc).unwrap();
    let options = options_with(&registry);
    let schema = Schema::from_json(&json!({"$ref": "https://example.com/person.json"})).unwrap();
    assert!(schema.validate_with(&json!({"name": "x"}), &options).unwrap().is_valid);

    assert!(registry.unregister(&doc));
    assert!(schema.validate_with(&json!({"name": "x"}), &options).is_err());
}

#[test]
fn bundled_meta_schemas_resolve_without_registration() {
    let registry = Arc::new(SchemaRegistry::new());
    let schema = Schema::from_json(&json!({
        "properties": {"schema": {"$ref": "http://json-schema.org/draft-07/schema#"}}
    }))
    .unwrap();
    let options = options_with(&registry);
    assert!(schema
        .validate_with(&json!({"schema": {"type": "string"}}), &options)
        .unwrap()
        .is_valid);
    assert!(!schema
        .validate_with(&json!({"schema": {"type": 12}}), &options)
        .unwrap()
        .is_valid);
    assert!(jsv::well_known_uris().count() >= Draft::ALL.len());
}

#[test]
fn registry_is_shared_across_threads() {
    let registry = Arc::new(SchemaRegistry::new());
    registry.register(&person()).unwrap();
    let schema = Schema::from_json(&json!({"$ref": "https://example.com/person.json"})).unwrap();

    std::thread::scope(|scope| {
        for i in 0..4 {
            let registry = registry.clone();
            let schema = schema.clone();
            scope.spawn(move || {
                let options = ValidationOptions::default().with_registry(registry);
                for _ in 0..50 {
                    let result = schema.validate_with(&json!({"name": format!("n{i}")}), &options);
                    assert!(result.unwrap().is_valid);
                }
            });
        }
        let registry = registry.clone();
        scope.spawn(move || {
            for n in 0..50 {
                let other = Schema::from_json(&json!({"$id": format!("https://example.com/other{n}.json")})).unwrap();
                registry.register(&other).unwrap();
                assert!(registry.unregister(&other));
            }
        });
    });
    assert_eq!(registry.len(), 2);
}
