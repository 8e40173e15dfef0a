//! Per-call validation state.
//!
//! A [`ValidationContext`] is created for every schema a value is checked
//! against and for every keyword of that schema. Keyword contexts start from
//! a copy of their schema's evaluated sets; what a keyword adds is merged
//! back only when the keyword passes. Under `anyOf` and `oneOf` branches
//! failing keywords count too, and every branch feeds the parent.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};

use jsv_pointer::JsonPointer;
use serde_json::{Map, Value};

use crate::dispatch;
use crate::draft::Draft;
use crate::options::ValidationOptions;
use crate::result::ValidationResult;
use crate::schema::Schema;
use crate::SchemaError;

/// Instance members accounted for by some keyword, consumed by
/// `unevaluatedProperties` and `unevaluatedItems`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluated {
    pub properties: BTreeSet<String>,
    pub items: BTreeSet<usize>,
}

impl Evaluated {
    pub fn extend(&mut self, other: Evaluated) {
        self.properties.extend(other.properties);
        self.items.extend(other.items);
    }
}

/// A reference keyword being applied: its document, its location in that
/// document and the instance location. Stable across targets rebuilt by
/// reference resolution.
type ActiveReference = (usize, JsonPointer, JsonPointer);

/// State shared by every context of one `validate` call.
pub(crate) struct CallState {
    pub(crate) options: ValidationOptions,
    active_references: RefCell<HashSet<ActiveReference>>,
}

impl CallState {
    pub(crate) fn new(options: &ValidationOptions) -> Self {
        Self {
            options: options.clone(),
            active_references: RefCell::new(HashSet::new()),
        }
    }
}

pub struct ValidationContext<'a> {
    call: &'a CallState,
    instance: &'a Value,
    instance_location: JsonPointer,
    /// Keyword location from the validation root, through references.
    relative_location: JsonPointer,
    /// Root of the document the current schema belongs to.
    document: Schema,
    /// Document `validate` was called on.
    root_document: Schema,
    schema: Schema,
    keyword: Option<String>,
    /// `(document, schema)` for every entered `$recursiveAnchor: true`
    /// schema, outermost first.
    recursive_anchors: Vec<(Schema, Schema)>,
    evaluated: Evaluated,
    /// Set inside `anyOf`/`oneOf` branches at the branch's instance level.
    keep_failed: bool,
    misc: HashMap<String, Value>,
}

impl<'a> ValidationContext<'a> {
    pub(crate) fn new(call: &'a CallState, instance: &'a Value, document: Schema, schema: Schema) -> Self {
        Self {
            call,
            instance,
            instance_location: JsonPointer::root(),
            relative_location: JsonPointer::root(),
            root_document: document.clone(),
            document,
            schema,
            keyword: None,
            recursive_anchors: Vec::new(),
            evaluated: Evaluated::default(),
            keep_failed: false,
            misc: HashMap::new(),
        }
    }

    pub fn instance(&self) -> &'a Value {
        self.instance
    }

    pub fn instance_location(&self) -> &JsonPointer {
        &self.instance_location
    }

    pub fn keyword_location(&self) -> &JsonPointer {
        &self.relative_location
    }

    /// The keyword being applied, `None` at schema level.
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    /// Draft of the document being validated against.
    pub fn draft(&self) -> Draft {
        self.document.draft()
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.call.options
    }

    /// True when only the verdict is wanted, so keywords may stop early.
    /// Never inside `anyOf`/`oneOf` branches, which must mark everything.
    pub fn is_flag(&self) -> bool {
        !self.keep_failed && self.call.options.output_format == crate::OutputFormat::Flag
    }

    pub fn evaluated(&self) -> &Evaluated {
        &self.evaluated
    }

    pub fn mark_property(&mut self, name: &str) {
        self.evaluated.properties.insert(name.to_string());
    }

    pub fn mark_item(&mut self, index: usize) {
        self.evaluated.items.insert(index);
    }

    /// Values shared between the keywords of one schema (`contains` match
    /// count, `if` outcome).
    pub fn misc(&self, key: &str) -> Option<&Value> {
        self.misc.get(key)
    }

    pub fn set_misc(&mut self, key: impl Into<String>, value: Value) {
        self.misc.insert(key.into(), value);
    }

    pub(crate) fn document(&self) -> &Schema {
        &self.document
    }

    pub(crate) fn root_document(&self) -> &Schema {
        &self.root_document
    }

    pub(crate) fn recursive_anchors(&self) -> &[(Schema, Schema)] {
        &self.recursive_anchors
    }

    pub(crate) fn push_recursive_anchor(&mut self, schema: &Schema) {
        self.recursive_anchors
            .push((self.document.clone(), schema.clone()));
    }

    // ------------------------------------------------------------------
    // Results

    fn leaf(&self, valid: bool, instance_location: JsonPointer) -> ValidationResult {
        let mut result =
            ValidationResult::new(valid, self.relative_location.clone(), instance_location);
        result.keyword = self.keyword.clone();
        result.absolute_location = self.schema.absolute_location(self.keyword.as_deref());
        result
    }

    /// A passing node for the current keyword.
    pub fn pass(&self) -> ValidationResult {
        self.leaf(true, self.instance_location.clone())
    }

    /// A failing node whose message is rendered from `tokens`.
    pub fn fail(&self, tokens: Value) -> ValidationResult {
        self.fail_at(self.instance_location.clone(), tokens)
    }

    /// A failing node reported at another instance location, for keywords
    /// that reject members without descending into them.
    pub fn fail_at(&self, instance_location: JsonPointer, tokens: Value) -> ValidationResult {
        let tokens = match tokens {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let mut result = self.leaf(false, instance_location);
        let keyword = self.keyword.as_deref().unwrap_or_default();
        result.error = Some(
            self.call
                .options
                .messages
                .render(keyword, &tokens, self.instance),
        );
        result.additional_info = tokens;
        result
    }

    pub fn outcome(&self, valid: bool, tokens: Value) -> ValidationResult {
        if valid {
            self.pass()
        } else {
            self.fail(tokens)
        }
    }

    /// A node whose verdict is explained by `nested`; it carries no message.
    pub fn node(&self, valid: bool, nested: Vec<ValidationResult>) -> ValidationResult {
        let mut result = self.leaf(valid, self.instance_location.clone());
        result.nested = nested;
        result
    }

    pub(crate) fn schema_result(&self) -> ValidationResult {
        let mut result = ValidationResult::new(
            true,
            self.relative_location.clone(),
            self.instance_location.clone(),
        );
        result.absolute_location = self.schema.absolute_location(None);
        result
    }

    pub(crate) fn render(&self, keyword: &str) -> String {
        self.call
            .options
            .messages
            .render(keyword, &Map::new(), self.instance)
    }

    // ------------------------------------------------------------------
    // Descent

    fn child_location(&self, path: &[&str]) -> JsonPointer {
        let mut location = self.relative_location.clone();
        for token in path {
            location = location.with(*token);
        }
        location
    }

    fn subcontext<'b>(
        &self,
        schema: &Schema,
        relative_location: JsonPointer,
        instance: &'b Value,
        instance_location: JsonPointer,
    ) -> ValidationContext<'b>
    where
        'a: 'b,
    {
        ValidationContext {
            call: self.call,
            instance,
            instance_location,
            relative_location,
            document: self.document.clone(),
            root_document: self.root_document.clone(),
            schema: schema.clone(),
            keyword: None,
            recursive_anchors: self.recursive_anchors.clone(),
            evaluated: Evaluated::default(),
            keep_failed: self.keep_failed,
            misc: HashMap::new(),
        }
    }

    /// Validates `value` against `schema`. `path` extends the keyword
    /// location; `instance_location` is where `value` sits in the instance.
    pub fn validate_value<'b>(
        &self,
        schema: &Schema,
        path: &[&str],
        instance_location: JsonPointer,
        value: &'b Value,
    ) -> Result<ValidationResult, SchemaError>
    where
        'a: 'b,
    {
        let mut child = self.subcontext(schema, self.child_location(path), value, instance_location);
        child.keep_failed = false;
        dispatch::validate(schema, &mut child)
    }

    /// Validates the member `name` of the current object.
    pub fn validate_property<'b>(
        &self,
        schema: &Schema,
        path: &[&str],
        name: &str,
        value: &'b Value,
    ) -> Result<ValidationResult, SchemaError>
    where
        'a: 'b,
    {
        self.validate_value(schema, path, self.instance_location.with(name), value)
    }

    /// Validates item `index` of the current array.
    pub fn validate_item<'b>(
        &self,
        schema: &Schema,
        path: &[&str],
        index: usize,
        value: &'b Value,
    ) -> Result<ValidationResult, SchemaError>
    where
        'a: 'b,
    {
        self.validate_value(schema, path, self.instance_location.with_index(index), value)
    }

    /// Validates the current instance against `schema`. When it passes,
    /// what it evaluated counts as evaluated here too.
    pub fn validate_in_place(
        &mut self,
        schema: &Schema,
        path: &[&str],
    ) -> Result<ValidationResult, SchemaError> {
        let mut child = self.subcontext(
            schema,
            self.child_location(path),
            self.instance,
            self.instance_location.clone(),
        );
        let result = dispatch::validate(schema, &mut child)?;
        if result.is_valid || self.keep_failed {
            self.evaluated.extend(child.evaluated);
        }
        Ok(result)
    }

    /// Validates the current instance against one `anyOf`/`oneOf` branch.
    /// What the branch evaluated counts here whatever its verdict, failing
    /// keywords inside it included.
    pub fn validate_branch(
        &mut self,
        schema: &Schema,
        path: &[&str],
    ) -> Result<ValidationResult, SchemaError> {
        let mut child = self.subcontext(
            schema,
            self.child_location(path),
            self.instance,
            self.instance_location.clone(),
        );
        child.keep_failed = true;
        let result = dispatch::validate(schema, &mut child)?;
        self.evaluated.extend(child.evaluated);
        Ok(result)
    }

    /// Like [`Self::validate_in_place`], but `target` lives in `document`.
    pub(crate) fn validate_reference(
        &mut self,
        document: Schema,
        target: &Schema,
    ) -> Result<ValidationResult, SchemaError> {
        let mut child = self.subcontext(
            target,
            self.relative_location.clone(),
            self.instance,
            self.instance_location.clone(),
        );
        child.document = document;
        let result = dispatch::validate(target, &mut child)?;
        if result.is_valid || self.keep_failed {
            self.evaluated.extend(child.evaluated);
        }
        Ok(result)
    }

    /// Context for one keyword of the current schema.
    pub(crate) fn for_keyword(&self, name: &str) -> ValidationContext<'a> {
        ValidationContext {
            call: self.call,
            instance: self.instance,
            instance_location: self.instance_location.clone(),
            relative_location: self.relative_location.with(name),
            document: self.document.clone(),
            root_document: self.root_document.clone(),
            schema: self.schema.clone(),
            keyword: Some(name.to_string()),
            recursive_anchors: self.recursive_anchors.clone(),
            evaluated: self.evaluated.clone(),
            keep_failed: self.keep_failed,
            misc: self.misc.clone(),
        }
    }

    /// Takes back a finished keyword context.
    pub(crate) fn absorb(&mut self, keyword: ValidationContext<'_>, valid: bool) {
        if valid || self.keep_failed {
            self.evaluated.extend(keyword.evaluated);
        }
        self.misc.extend(keyword.misc);
    }

    fn active_reference(&self) -> ActiveReference {
        let keyword = self.keyword.as_deref().unwrap_or_default();
        (
            self.document.addr(),
            self.schema.location().with(keyword),
            self.instance_location.clone(),
        )
    }

    /// Marks the current reference keyword as applied at the current
    /// instance location. Returns false when it already was, i.e. the
    /// reference loops without consuming the instance.
    pub(crate) fn enter_reference(&self) -> bool {
        self.call
            .active_references
            .borrow_mut()
            .insert(self.active_reference())
    }

    pub(crate) fn leave_reference(&self) {
        self.call
            .active_references
            .borrow_mut()
            .remove(&self.active_reference());
    }
}
