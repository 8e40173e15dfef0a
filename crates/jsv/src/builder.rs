//! Fluent construction of schema documents.
//!
//! ```
//! use jsv::SchemaBuilder;
//! use serde_json::json;
//!
//! let schema = SchemaBuilder::new()
//!     .type_("object")
//!     .property("name", SchemaBuilder::new().type_("string").min_length(1))
//!     .required(["name"])
//!     .build()
//!     .unwrap();
//! assert!(schema.validate(&json!({"name": "x"})).unwrap().is_valid);
//! assert!(!schema.validate(&json!({})).unwrap().is_valid);
//! ```

use serde_json::{Map, Number, Value};

use crate::options::BuildOptions;
use crate::schema::Schema;
use crate::SchemaError;

/// Anything usable as a subschema in a [`SchemaBuilder`].
pub trait IntoSchemaValue {
    fn into_schema_value(self) -> Value;
}

impl IntoSchemaValue for Value {
    fn into_schema_value(self) -> Value {
        self
    }
}

impl IntoSchemaValue for bool {
    fn into_schema_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoSchemaValue for SchemaBuilder {
    fn into_schema_value(self) -> Value {
        self.to_json()
    }
}

impl IntoSchemaValue for Schema {
    fn into_schema_value(self) -> Value {
        self.to_json().clone()
    }
}

impl IntoSchemaValue for &Schema {
    fn into_schema_value(self) -> Value {
        self.to_json().clone()
    }
}

/// Builder for schema documents. Each method sets one keyword; setting a
/// keyword twice keeps the last payload, except for `property` and
/// `required` which accumulate.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    members: Map<String, Value>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets any keyword, including ones registered by the caller.
    pub fn keyword(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.members.insert(name.to_string(), value.into());
        self
    }

    fn subschema(self, name: &str, schema: impl IntoSchemaValue) -> Self {
        self.keyword(name, schema.into_schema_value())
    }

    fn subschemas<I>(self, name: &str, schemas: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoSchemaValue,
    {
        let list: Vec<Value> = schemas.into_iter().map(IntoSchemaValue::into_schema_value).collect();
        self.keyword(name, list)
    }

    fn number(self, name: &str, value: f64) -> Self {
        match number_value(value) {
            Some(number) => self.keyword(name, number),
            None => self,
        }
    }

    pub fn schema_uri(self, uri: &str) -> Self {
        self.keyword("$schema", uri)
    }

    pub fn id(self, id: &str) -> Self {
        self.keyword("$id", id)
    }

    pub fn anchor(self, anchor: &str) -> Self {
        self.keyword("$anchor", anchor)
    }

    pub fn definition(mut self, name: &str, schema: impl IntoSchemaValue) -> Self {
        let defs = self
            .members
            .entry("$defs")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(defs) = defs {
            defs.insert(name.to_string(), schema.into_schema_value());
        }
        self
    }

    pub fn reference(self, reference: &str) -> Self {
        self.keyword("$ref", reference)
    }

    pub fn title(self, title: &str) -> Self {
        self.keyword("title", title)
    }

    pub fn description(self, description: &str) -> Self {
        self.keyword("description", description)
    }

    /// `type` with a single name.
    pub fn type_(self, name: &str) -> Self {
        self.keyword("type", name)
    }

    /// `type` with several names.
    pub fn types<'a>(self, names: impl IntoIterator<Item = &'a str>) -> Self {
        let names: Vec<Value> = names.into_iter().map(Value::from).collect();
        self.keyword("type", names)
    }

    pub fn enum_(self, values: impl IntoIterator<Item = Value>) -> Self {
        self.keyword("enum", values.into_iter().collect::<Vec<_>>())
    }

    pub fn const_(self, value: impl Into<Value>) -> Self {
        self.keyword("const", value)
    }

    pub fn property(mut self, name: &str, schema: impl IntoSchemaValue) -> Self {
        let properties = self
            .members
            .entry("properties")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(properties) = properties {
            properties.insert(name.to_string(), schema.into_schema_value());
        }
        self
    }

    pub fn pattern_property(mut self, pattern: &str, schema: impl IntoSchemaValue) -> Self {
        let properties = self
            .members
            .entry("patternProperties")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(properties) = properties {
            properties.insert(pattern.to_string(), schema.into_schema_value());
        }
        self
    }

    pub fn additional_properties(self, schema: impl IntoSchemaValue) -> Self {
        self.subschema("additionalProperties", schema)
    }

    pub fn unevaluated_properties(self, schema: impl IntoSchemaValue) -> Self {
        self.subschema("unevaluatedProperties", schema)
    }

    /// Adds names to `required`, skipping ones already listed.
    pub fn required<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        let required = self
            .members
            .entry("required")
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(list) = required {
            for name in names {
                if !list.iter().any(|v| v.as_str() == Some(name)) {
                    list.push(Value::from(name));
                }
            }
        }
        self
    }

    pub fn min_properties(self, count: u64) -> Self {
        self.keyword("minProperties", count)
    }

    pub fn max_properties(self, count: u64) -> Self {
        self.keyword("maxProperties", count)
    }

    /// `items` applying one schema to every element.
    pub fn items(self, schema: impl IntoSchemaValue) -> Self {
        self.subschema("items", schema)
    }

    /// `items` as a positional tuple.
    pub fn tuple<I>(self, schemas: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoSchemaValue,
    {
        self.subschemas("items", schemas)
    }

    pub fn additional_items(self, schema: impl IntoSchemaValue) -> Self {
        self.subschema("additionalItems", schema)
    }

    pub fn unevaluated_items(self, schema: impl IntoSchemaValue) -> Self {
        self.subschema("unevaluatedItems", schema)
    }

    pub fn contains(self, schema: impl IntoSchemaValue) -> Self {
        self.subschema("contains", schema)
    }

    pub fn min_items(self, count: u64) -> Self {
        self.keyword("minItems", count)
    }

    pub fn max_items(self, count: u64) -> Self {
        self.keyword("maxItems", count)
    }

    pub fn unique_items(self, unique: bool) -> Self {
        self.keyword("uniqueItems", unique)
    }

    pub fn min_length(self, length: u64) -> Self {
        self.keyword("minLength", length)
    }

    pub fn max_length(self, length: u64) -> Self {
        self.keyword("maxLength", length)
    }

    pub fn pattern(self, pattern: &str) -> Self {
        self.keyword("pattern", pattern)
    }

    pub fn format(self, format: &str) -> Self {
        self.keyword("format", format)
    }

    /// Non-finite values are ignored.
    pub fn minimum(self, limit: f64) -> Self {
        self.number("minimum", limit)
    }

    pub fn maximum(self, limit: f64) -> Self {
        self.number("maximum", limit)
    }

    pub fn exclusive_minimum(self, limit: f64) -> Self {
        self.number("exclusiveMinimum", limit)
    }

    pub fn exclusive_maximum(self, limit: f64) -> Self {
        self.number("exclusiveMaximum", limit)
    }

    pub fn multiple_of(self, factor: f64) -> Self {
        self.number("multipleOf", factor)
    }

    pub fn all_of<I>(self, schemas: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoSchemaValue,
    {
        self.subschemas("allOf", schemas)
    }

    pub fn any_of<I>(self, schemas: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoSchemaValue,
    {
        self.subschemas("anyOf", schemas)
    }

    pub fn one_of<I>(self, schemas: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoSchemaValue,
    {
        self.subschemas("oneOf", schemas)
    }

    pub fn not(self, schema: impl IntoSchemaValue) -> Self {
        self.subschema("not", schema)
    }

    pub fn if_then_else(
        self,
        condition: impl IntoSchemaValue,
        then: Option<SchemaBuilder>,
        otherwise: Option<SchemaBuilder>,
    ) -> Self {
        let mut builder = self.subschema("if", condition);
        if let Some(then) = then {
            builder = builder.subschema("then", then);
        }
        if let Some(otherwise) = otherwise {
            builder = builder.subschema("else", otherwise);
        }
        builder
    }

    /// The document built so far.
    pub fn to_json(&self) -> Value {
        Value::Object(self.members.clone())
    }

    /// Builds the schema with default options.
    pub fn build(&self) -> Result<Schema, SchemaError> {
        self.build_with(&BuildOptions::default())
    }

    pub fn build_with(&self, options: &BuildOptions) -> Result<Schema, SchemaError> {
        Schema::from_json_with(&self.to_json(), options)
    }
}

/// Integral values are stored as integers so `"minimum": 3` reads as
/// written.
fn number_value(value: f64) -> Option<Number> {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        return Some(Number::from(value as i64));
    }
    Number::from_f64(value)
}
