//! Schemas: immutable, shared keyword sets built from JSON.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use jsv_pointer::JsonPointer;
use jsv_util::deep_equal;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use url::Url;

use crate::catalog::KeywordCatalog;
use crate::context::{CallState, ValidationContext};
use crate::dispatch;
use crate::draft::{Draft, DraftMask, Vocabulary};
use crate::keyword::Keyword;
use crate::meta;
use crate::options::{BuildOptions, ValidationOptions};
use crate::registry::SchemaRegistry;
use crate::result::ValidationResult;
use crate::uri;
use crate::SchemaError;

/// A keyword instance inside a schema, with the catalog data dispatch needs.
pub(crate) struct KeywordSlot {
    pub(crate) name: String,
    pub(crate) drafts: DraftMask,
    order: usize,
    pub(crate) keyword: Arc<dyn Keyword>,
}

pub(crate) struct SchemaNode {
    boolean: Option<bool>,
    draft: Draft,
    base_uri: Url,
    /// Location inside the resource identified by `base_uri`.
    location: JsonPointer,
    has_own_id: bool,
    anchor: Option<String>,
    recursive_anchor: bool,
    keywords: Vec<KeywordSlot>,
    unknown: Map<String, Value>,
    json: Value,
    /// Identifier and anchor keys of the resources inside this document,
    /// mapped to their path from here. Only document roots fill it.
    index: HashMap<String, JsonPointer>,
}

/// A JSON Schema.
///
/// Cloning is cheap: clones share one immutable node. Schemas built from
/// the same JSON compare equal regardless of member order.
#[derive(Clone)]
pub struct Schema(Arc<SchemaNode>);

/// A non-owning handle, used to cache reference targets without keeping
/// cyclic documents alive.
#[derive(Clone, Debug)]
pub(crate) struct WeakSchema(Weak<SchemaNode>);

impl WeakSchema {
    pub(crate) fn upgrade(&self) -> Option<Schema> {
        self.0.upgrade().map(Schema)
    }
}

/// The dialect, base URI and location a schema object is built under.
#[derive(Clone)]
struct Scope {
    draft: Draft,
    base_uri: Url,
    location: JsonPointer,
    vocabularies: Option<Arc<[Vocabulary]>>,
}

/// What keyword factories see while a schema object is being built.
pub struct BuildContext<'a> {
    pub draft: Draft,
    pub base_uri: &'a Url,
    /// Location of the schema object holding the keyword.
    pub location: &'a JsonPointer,
    /// Every member of that schema object, for keywords whose meaning
    /// depends on a sibling (`additionalItems` on `items`, draft-04
    /// `maximum` on `exclusiveMaximum`).
    pub siblings: &'a Map<String, Value>,
    catalog: &'a KeywordCatalog,
    registry: &'a SchemaRegistry,
    vocabularies: Option<&'a Arc<[Vocabulary]>>,
}

impl BuildContext<'_> {
    pub fn sibling(&self, name: &str) -> Option<&Value> {
        self.siblings.get(name)
    }

    /// Builds the subschema at `path` below the current schema object.
    pub fn subschema(&self, value: &Value, path: &[&str]) -> Result<Schema, SchemaError> {
        self.build_child(value, path, false)
    }

    /// Like [`Self::subschema`], but `true`/`false` are accepted in every
    /// draft (`additionalProperties`, `additionalItems`).
    pub fn subschema_or_bool(&self, value: &Value, path: &[&str]) -> Result<Schema, SchemaError> {
        self.build_child(value, path, true)
    }

    fn build_child(&self, value: &Value, path: &[&str], allow_bool: bool) -> Result<Schema, SchemaError> {
        let mut location = self.location.clone();
        for token in path {
            location = location.with(*token);
        }
        let scope = Scope {
            draft: self.draft,
            base_uri: self.base_uri.clone(),
            location,
            vocabularies: self.vocabularies.cloned(),
        };
        let node = build_node(value, scope, self.catalog, self.registry, allow_bool)?;
        Ok(Schema(Arc::new(node)))
    }
}

fn location_name(location: &JsonPointer) -> String {
    location.last().unwrap_or("schema").to_string()
}

fn build_node(
    value: &Value,
    mut scope: Scope,
    catalog: &KeywordCatalog,
    registry: &SchemaRegistry,
    allow_bool: bool,
) -> Result<SchemaNode, SchemaError> {
    let map = match value {
        Value::Bool(b) if allow_bool || scope.draft.supports_boolean_schemas() => {
            return Ok(SchemaNode::boolean(*b, scope));
        }
        Value::Object(map) => map,
        other => {
            let expected = if scope.draft.supports_boolean_schemas() {
                "an object or boolean schema"
            } else {
                "an object schema"
            };
            return Err(SchemaError::invalid_keyword(
                &location_name(&scope.location),
                expected,
                other,
            ));
        }
    };

    if let Some(Value::String(dialect)) = map.get("$schema") {
        apply_dialect(dialect, &mut scope, registry)?;
    }

    let mut anchor = None;
    let mut has_own_id = false;
    let id_ignored = scope.draft.ref_overrides_siblings() && map.contains_key("$ref");
    if !id_ignored {
        if let Some(Value::String(id)) = map.get(scope.draft.id_keyword()) {
            match id.strip_prefix('#') {
                Some(name) => {
                    if !name.is_empty() {
                        anchor = Some(name.to_string());
                    }
                }
                None => {
                    let mut resolved = uri::resolve(&scope.base_uri, id)?;
                    if let Some(fragment) = resolved.fragment().filter(|f| !f.is_empty()) {
                        anchor = Some(fragment.to_string());
                    }
                    resolved.set_fragment(None);
                    scope.base_uri = resolved;
                    scope.location = JsonPointer::root();
                    has_own_id = true;
                }
            }
        }
    }
    let mut recursive_anchor = false;
    if scope.draft >= Draft::Draft2019_09 {
        if let Some(Value::String(name)) = map.get("$anchor") {
            anchor = Some(name.clone());
        }
        recursive_anchor = map.get("$recursiveAnchor") == Some(&Value::Bool(true));
    }

    let ctx = BuildContext {
        draft: scope.draft,
        base_uri: &scope.base_uri,
        location: &scope.location,
        siblings: map,
        catalog,
        registry,
        vocabularies: scope.vocabularies.as_ref(),
    };
    let mut keywords = Vec::new();
    let mut unknown = Map::new();
    for (name, payload) in map {
        let definition = catalog.resolve(name, scope.draft).filter(|def| {
            match (def.vocabulary, scope.vocabularies.as_deref()) {
                (Some(vocabulary), Some(allowed)) => {
                    vocabulary == Vocabulary::Core || allowed.contains(&vocabulary)
                }
                _ => true,
            }
        });
        match definition {
            Some(def) => {
                let keyword = (def.factory)(name, payload, &ctx)?;
                keywords.push(KeywordSlot {
                    name: name.clone(),
                    drafts: def.drafts,
                    order: def.order,
                    keyword,
                });
            }
            None => {
                unknown.insert(name.clone(), payload.clone());
            }
        }
    }
    keywords.sort_by_key(|slot| (slot.keyword.sequence(), slot.order));

    Ok(SchemaNode {
        boolean: None,
        draft: scope.draft,
        base_uri: scope.base_uri,
        location: scope.location,
        has_own_id,
        anchor,
        recursive_anchor,
        keywords,
        unknown,
        json: value.clone(),
        index: HashMap::new(),
    })
}

/// Switches `scope` to the dialect named by `$schema`.
///
/// Known meta-schema URIs select their draft. Any other URI is looked up in
/// the registry; a custom meta-schema lends its draft and, through its
/// `$vocabulary`, the vocabularies whose keywords get built.
fn apply_dialect(dialect: &str, scope: &mut Scope, registry: &SchemaRegistry) -> Result<(), SchemaError> {
    if let Some(draft) = Draft::from_schema_uri(dialect) {
        scope.draft = draft;
        scope.vocabularies = None;
        return Ok(());
    }
    let Some(meta) = registry.get(dialect) else {
        tracing::debug!(dialect, draft = %scope.draft, "unrecognized $schema, keeping the current draft");
        return Ok(());
    };
    scope.draft = meta.draft();
    scope.vocabularies = declared_vocabularies(meta.to_json())?;
    Ok(())
}

fn declared_vocabularies(meta: &Value) -> Result<Option<Arc<[Vocabulary]>>, SchemaError> {
    let Some(declared) = meta.get("$vocabulary").and_then(Value::as_object) else {
        return Ok(None);
    };
    let mut vocabularies = Vec::new();
    for (uri, required) in declared {
        match Vocabulary::from_uri(uri) {
            Some(vocabulary) => vocabularies.push(vocabulary),
            None if required == &Value::Bool(true) => {
                return Err(SchemaError::UnknownVocabulary(uri.clone()));
            }
            None => {}
        }
    }
    Ok(Some(vocabularies.into()))
}

impl SchemaNode {
    fn boolean(value: bool, scope: Scope) -> Self {
        Self {
            boolean: Some(value),
            draft: scope.draft,
            base_uri: scope.base_uri,
            location: scope.location,
            has_own_id: false,
            anchor: None,
            recursive_anchor: false,
            keywords: Vec::new(),
            unknown: Map::new(),
            json: Value::Bool(value),
            index: HashMap::new(),
        }
    }
}

fn index_subschemas(keywords: &[KeywordSlot], path: &JsonPointer, index: &mut HashMap<String, JsonPointer>) {
    for slot in keywords {
        let keyword_path = path.with(slot.name.as_str());
        for (relative, child) in slot.keyword.subschemas() {
            let child_path = keyword_path.join(&relative);
            let node = &child.0;
            if node.has_own_id {
                index
                    .entry(uri::document_key(&node.base_uri))
                    .or_insert_with(|| child_path.clone());
            }
            if let Some(anchor) = &node.anchor {
                index
                    .entry(uri::anchor_key(&node.base_uri, anchor))
                    .or_insert_with(|| child_path.clone());
            }
            index_subschemas(&node.keywords, &child_path, index);
        }
    }
}

impl Schema {
    /// Builds a schema with default options (draft 2019-09 unless `$schema`
    /// says otherwise).
    ///
    /// ```
    /// use jsv::Schema;
    /// use serde_json::json;
    ///
    /// let schema = Schema::from_json(&json!({"type": "string", "minLength": 2})).unwrap();
    /// assert!(schema.validate(&json!("ab")).unwrap().is_valid);
    /// assert!(!schema.validate(&json!("a")).unwrap().is_valid);
    /// ```
    pub fn from_json(value: &Value) -> Result<Schema, SchemaError> {
        Self::from_json_with(value, &BuildOptions::default())
    }

    /// Builds a schema document.
    ///
    /// # Errors
    ///
    /// A [`SchemaError`] for a keyword with a malformed payload, an invalid
    /// `$id`, a bad regular expression or an unsupported required
    /// vocabulary. Unknown members are kept, not rejected.
    pub fn from_json_with(value: &Value, options: &BuildOptions) -> Result<Schema, SchemaError> {
        let base_uri = match &options.base_uri {
            Some(base) => Url::parse(base).map_err(|e| SchemaError::InvalidUri {
                uri: base.clone(),
                reason: e.to_string(),
            })?,
            None => uri::default_base()?,
        };
        let scope = Scope {
            draft: options.default_draft,
            base_uri,
            location: JsonPointer::root(),
            vocabularies: None,
        };
        let mut node = build_node(value, scope, &options.catalog, &options.registry, true)?;
        let mut index = HashMap::new();
        let root = JsonPointer::root();
        index.insert(uri::document_key(&node.base_uri), root.clone());
        if let Some(anchor) = &node.anchor {
            index.insert(uri::anchor_key(&node.base_uri, anchor), root.clone());
        }
        index_subschemas(&node.keywords, &root, &mut index);
        node.index = index;
        Ok(Schema(Arc::new(node)))
    }

    /// Rebuilds the value at `tokens` below this schema's JSON as a
    /// standalone schema in this schema's scope. Used for reference targets
    /// that no keyword built, e.g. under an unknown member.
    pub(crate) fn rebuild_at(
        &self,
        tokens: &[String],
        catalog: &KeywordCatalog,
        registry: &SchemaRegistry,
    ) -> Result<Option<Schema>, SchemaError> {
        let Some(value) = jsv_pointer::get(&self.0.json, tokens) else {
            return Ok(None);
        };
        let scope = Scope {
            draft: self.0.draft,
            base_uri: self.0.base_uri.clone(),
            location: self
                .0
                .location
                .join(&JsonPointer::from_tokens(tokens.iter().cloned())),
            vocabularies: None,
        };
        let node = build_node(value, scope, catalog, registry, false)?;
        Ok(Some(Schema(Arc::new(node))))
    }

    pub fn draft(&self) -> Draft {
        self.0.draft
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.0.boolean
    }

    /// Base URI keywords of this schema resolve references against.
    pub fn base_uri(&self) -> &Url {
        &self.0.base_uri
    }

    /// The URI this schema declares with `$id` (`id` in draft 04).
    pub fn id(&self) -> Option<&Url> {
        self.0.has_own_id.then_some(&self.0.base_uri)
    }

    /// Location of this schema inside the resource named by
    /// [`Self::base_uri`].
    pub fn location(&self) -> &JsonPointer {
        &self.0.location
    }

    pub fn anchor(&self) -> Option<&str> {
        self.0.anchor.as_deref()
    }

    pub fn has_recursive_anchor(&self) -> bool {
        self.0.recursive_anchor
    }

    /// Names of the recognized keywords, in evaluation order.
    pub fn keyword_names(&self) -> impl Iterator<Item = &str> {
        self.0.keywords.iter().map(|slot| slot.name.as_str())
    }

    pub fn has_keyword(&self, name: &str) -> bool {
        self.0.keywords.iter().any(|slot| slot.name == name)
    }

    pub fn get_keyword(&self, name: &str) -> Option<&Arc<dyn Keyword>> {
        self.0
            .keywords
            .iter()
            .find(|slot| slot.name == name)
            .map(|slot| &slot.keyword)
    }

    /// Members no keyword of this draft claimed.
    pub fn unknown_members(&self) -> &Map<String, Value> {
        &self.0.unknown
    }

    pub fn to_json(&self) -> &Value {
        &self.0.json
    }

    pub(crate) fn slots(&self) -> &[KeywordSlot] {
        &self.0.keywords
    }

    pub(crate) fn downgrade(&self) -> WeakSchema {
        WeakSchema(Arc::downgrade(&self.0))
    }

    pub(crate) fn ptr_eq(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub(crate) fn index_lookup(&self, key: &str) -> Option<&JsonPointer> {
        self.0.index.get(key)
    }

    /// Keys of the resources identified inside this document.
    pub(crate) fn resource_keys(&self) -> impl Iterator<Item = (&String, &JsonPointer)> {
        self.0.index.iter().filter(|(key, _)| !key.contains('#'))
    }

    /// Walks keyword subschemas along `tokens`.
    pub(crate) fn find(&self, tokens: &[String]) -> Option<Schema> {
        if tokens.is_empty() {
            return Some(self.clone());
        }
        for slot in &self.0.keywords {
            if tokens[0] != slot.name {
                continue;
            }
            let rest = &tokens[1..];
            for (relative, child) in slot.keyword.subschemas() {
                if let Some(tail) = rest.strip_prefix(relative.tokens()) {
                    if let Some(found) = child.find(tail) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    /// `base#pointer` of this schema or one of its keywords; `None` for
    /// documents without an absolute identifier.
    pub fn absolute_location(&self, keyword: Option<&str>) -> Option<String> {
        if uri::is_default_document(&self.0.base_uri) {
            return None;
        }
        let location = match keyword {
            Some(name) => self.0.location.with(name),
            None => self.0.location.clone(),
        };
        Some(format!(
            "{}{}",
            uri::document_key(&self.0.base_uri),
            location.to_uri_fragment()
        ))
    }

    /// Validates `instance` with default options.
    pub fn validate(&self, instance: &Value) -> Result<ValidationResult, SchemaError> {
        self.validate_with(instance, &ValidationOptions::default())
    }

    pub fn validate_with(
        &self,
        instance: &Value,
        options: &ValidationOptions,
    ) -> Result<ValidationResult, SchemaError> {
        self.validate_within(instance, self, options)
    }

    /// Validates `instance` against this schema as part of `root`: plain
    /// fragment references resolve inside `root`.
    pub fn validate_within(
        &self,
        instance: &Value,
        root: &Schema,
        options: &ValidationOptions,
    ) -> Result<ValidationResult, SchemaError> {
        let call = CallState::new(options);
        let mut ctx = ValidationContext::new(&call, instance, root.clone(), self.clone());
        let result = dispatch::validate(self, &mut ctx)?;
        result.to_output(&options.output_format, &options.postprocessors)
    }

    /// Shorthand for a flag-format validation.
    pub fn is_valid(&self, instance: &Value) -> Result<bool, SchemaError> {
        let options = ValidationOptions::default().with_output(crate::OutputFormat::Flag);
        Ok(self.validate_with(instance, &options)?.is_valid)
    }

    /// Validates this schema's JSON against its meta-schema.
    pub fn validate_schema(&self) -> Result<ValidationResult, SchemaError> {
        self.validate_schema_with(&ValidationOptions::default())
    }

    pub fn validate_schema_with(&self, options: &ValidationOptions) -> Result<ValidationResult, SchemaError> {
        let declared = self.0.json.get("$schema").and_then(Value::as_str);
        let meta = match declared {
            Some(uri) if Draft::from_schema_uri(uri).is_none() => options.registry.get(uri),
            _ => meta::well_known(self.draft().meta_schema_uri()),
        };
        let meta = meta.ok_or_else(|| SchemaError::UnresolvableReference {
            reference: declared.unwrap_or(self.draft().meta_schema_uri()).to_string(),
            base: self.0.base_uri.to_string(),
        })?;
        meta.validate_with(&self.0.json, options)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || deep_equal(&self.0.json, &other.0.json)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Schema({}, {})", self.0.draft, self.0.json)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.json)
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.json.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keywords_are_ordered_by_sequence() {
        let schema = Schema::from_json(&json!({
            "unevaluatedProperties": false,
            "additionalProperties": true,
            "properties": {},
            "$id": "http://example.com/s"
        }))
        .unwrap();
        let names: Vec<&str> = schema.keyword_names().collect();
        assert_eq!(
            names,
            vec!["$id", "properties", "additionalProperties", "unevaluatedProperties"]
        );
    }

    #[test]
    fn test_unknown_members_are_kept() {
        let schema = Schema::from_json(&json!({"x-note": 1, "type": "string"})).unwrap();
        assert_eq!(schema.unknown_members().get("x-note"), Some(&json!(1)));
        assert!(schema.has_keyword("type"));
        assert!(!schema.has_keyword("x-note"));
    }

    #[test]
    fn test_draft_variants_follow_schema_uri() {
        let schema = Schema::from_json(&json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "unevaluatedProperties": false
        }))
        .unwrap();
        assert_eq!(schema.draft(), Draft::Draft07);
        assert!(schema.unknown_members().contains_key("unevaluatedProperties"));
    }

    #[test]
    fn test_ids_and_anchors() {
        let schema = Schema::from_json(&json!({
            "$id": "http://example.com/root.json",
            "$defs": {
                "a": {"$id": "item.json", "$anchor": "thing"},
                "b": {"$anchor": "local"}
            }
        }))
        .unwrap();
        assert_eq!(schema.id().map(Url::as_str), Some("http://example.com/root.json"));
        let a = schema.find(&["$defs".to_string(), "a".to_string()]).unwrap();
        assert_eq!(a.base_uri().as_str(), "http://example.com/item.json");
        assert!(a.location().is_root());
        assert_eq!(
            schema.index_lookup("http://example.com/item.json#thing").map(|p| p.to_string()),
            Some("/$defs/a".to_string())
        );
        assert_eq!(
            schema.index_lookup("http://example.com/root.json#local").map(|p| p.to_string()),
            Some("/$defs/b".to_string())
        );
    }

    #[test]
    fn test_boolean_schemas_by_draft() {
        assert!(Schema::from_json(&json!({"items": true})).is_ok());
        let draft4 = BuildOptions {
            default_draft: Draft::Draft04,
            ..Default::default()
        };
        let err = Schema::from_json_with(&json!({"items": true}), &draft4).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidKeyword { .. }));
        assert!(Schema::from_json_with(&json!({"additionalProperties": false}), &draft4).is_ok());
    }

    #[test]
    fn test_equality_ignores_member_order() {
        let a = Schema::from_json(&json!({"type": "string", "minLength": 1})).unwrap();
        let b = Schema::from_json(&json!({"minLength": 1, "type": "string"})).unwrap();
        let c = Schema::from_json(&json!({"minLength": 2, "type": "string"})).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_wrong_payload_is_a_fault() {
        let err = Schema::from_json(&json!({"minLength": "three"})).unwrap_err();
        assert_eq!(
            err,
            SchemaError::InvalidKeyword {
                keyword: "minLength".into(),
                expected: "a non-negative integer",
                found: "\"three\"".into(),
            }
        );
    }
}
