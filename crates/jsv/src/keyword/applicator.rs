//! In-place applicators: `allOf`, `anyOf`, `oneOf`, `not`, `if`/`then`/`else`,
//! `dependentSchemas` and draft 04-07 `dependencies`.

use std::sync::Arc;

use indexmap::IndexMap;
use jsv_pointer::JsonPointer;
use serde_json::{json, Value};

use super::{entry, expect_object, expect_string_array, pointer, schema_list, Keyword, KeywordEntry};
use crate::context::ValidationContext;
use crate::draft::{Draft, DraftMask, Vocabulary};
use crate::result::ValidationResult;
use crate::schema::{BuildContext, Schema};
use crate::SchemaError;

fn indexed(schemas: &[Schema]) -> Vec<(JsonPointer, Schema)> {
    schemas
        .iter()
        .enumerate()
        .map(|(i, schema)| (JsonPointer::root().with_index(i), schema.clone()))
        .collect()
}

/// A failing node with its own message that also keeps the outcomes
/// explaining it.
fn fail_with(ctx: &ValidationContext<'_>, tokens: Value, nested: Vec<ValidationResult>) -> ValidationResult {
    let mut result = ctx.fail(tokens);
    result.nested = nested;
    result
}

#[derive(Debug)]
pub struct AllOfKeyword {
    pub schemas: Vec<Schema>,
}

impl Keyword for AllOfKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let mut nested = Vec::with_capacity(self.schemas.len());
        let mut failed = 0;
        for (i, schema) in self.schemas.iter().enumerate() {
            let result = ctx.validate_in_place(schema, &[i.to_string().as_str()])?;
            if !result.is_valid {
                failed += 1;
            }
            nested.push(result);
            if failed > 0 && ctx.is_flag() {
                break;
            }
        }
        if failed == 0 {
            return Ok(ctx.node(true, nested));
        }
        let tokens = json!({"failed": failed, "total": self.schemas.len()});
        Ok(fail_with(ctx, tokens, nested))
    }

    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        indexed(&self.schemas)
    }
}

fn build_all_of(name: &str, value: &Value, ctx: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(AllOfKeyword {
        schemas: schema_list(name, value, ctx, false)?,
    }))
}

/// `anyOf` evaluates every branch: what each branch evaluated counts,
/// so it cannot stop at the first match.
#[derive(Debug)]
pub struct AnyOfKeyword {
    pub schemas: Vec<Schema>,
}

impl Keyword for AnyOfKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let mut nested = Vec::with_capacity(self.schemas.len());
        for (i, schema) in self.schemas.iter().enumerate() {
            nested.push(ctx.validate_branch(schema, &[i.to_string().as_str()])?);
        }
        let matched = nested.iter().filter(|r| r.is_valid).count();
        if matched > 0 {
            return Ok(ctx.node(true, nested));
        }
        let tokens = json!({"matched": 0, "total": self.schemas.len()});
        Ok(fail_with(ctx, tokens, nested))
    }

    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        indexed(&self.schemas)
    }
}

fn build_any_of(name: &str, value: &Value, ctx: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(AnyOfKeyword {
        schemas: schema_list(name, value, ctx, false)?,
    }))
}

#[derive(Debug)]
pub struct OneOfKeyword {
    pub schemas: Vec<Schema>,
}

impl Keyword for OneOfKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let mut nested = Vec::with_capacity(self.schemas.len());
        for (i, schema) in self.schemas.iter().enumerate() {
            nested.push(ctx.validate_branch(schema, &[i.to_string().as_str()])?);
        }
        let matched = nested.iter().filter(|r| r.is_valid).count();
        if matched == 1 {
            return Ok(ctx.node(true, nested));
        }
        let tokens = json!({"matched": matched, "total": self.schemas.len()});
        Ok(fail_with(ctx, tokens, nested))
    }

    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        indexed(&self.schemas)
    }
}

fn build_one_of(name: &str, value: &Value, ctx: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(OneOfKeyword {
        schemas: schema_list(name, value, ctx, false)?,
    }))
}

#[derive(Debug)]
pub struct NotKeyword {
    pub schema: Schema,
}

impl Keyword for NotKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let inner = ctx.validate_value(&self.schema, &[], ctx.instance_location().clone(), ctx.instance())?;
        if inner.is_valid {
            Ok(fail_with(ctx, json!({}), vec![inner]))
        } else {
            Ok(ctx.node(true, vec![inner]))
        }
    }

    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        vec![(JsonPointer::root(), self.schema.clone())]
    }
}

fn build_not(_: &str, value: &Value, ctx: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    Ok(Arc::new(NotKeyword {
        schema: ctx.subschema(value, &["not"])?,
    }))
}

/// `if` never fails; it records its outcome for `then` and `else`.
#[derive(Debug)]
pub struct IfKeyword {
    pub schema: Schema,
}

impl Keyword for IfKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let outcome = ctx.validate_in_place(&self.schema, &[])?;
        ctx.set_misc("if", Value::Bool(outcome.is_valid));
        Ok(ctx.node(true, vec![outcome]))
    }

    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        vec![(JsonPointer::root(), self.schema.clone())]
    }
}

/// `then` (`branch == true`) or `else` (`branch == false`).
#[derive(Debug)]
pub struct BranchKeyword {
    pub schema: Schema,
    pub branch: bool,
}

impl Keyword for BranchKeyword {
    fn sequence(&self) -> i32 {
        2
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        if ctx.misc("if").and_then(Value::as_bool) != Some(self.branch) {
            return Ok(ctx.pass());
        }
        let outcome = ctx.validate_in_place(&self.schema, &[])?;
        if outcome.is_valid {
            Ok(ctx.node(true, vec![outcome]))
        } else {
            Ok(fail_with(ctx, json!({}), vec![outcome]))
        }
    }

    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        vec![(JsonPointer::root(), self.schema.clone())]
    }
}

fn build_conditional(name: &str, value: &Value, ctx: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    let schema = ctx.subschema(value, &[name])?;
    Ok(match name {
        "if" => Arc::new(IfKeyword { schema }),
        "then" => Arc::new(BranchKeyword { schema, branch: true }),
        _ => Arc::new(BranchKeyword { schema, branch: false }),
    })
}

/// What a present property demands of the object.
#[derive(Debug)]
pub enum Dependency {
    Properties(Vec<String>),
    Schema(Schema),
}

/// `dependentSchemas` and the draft 04-07 `dependencies`, which mixes
/// property lists and schemas.
#[derive(Debug)]
pub struct DependenciesKeyword {
    pub dependencies: IndexMap<String, Dependency>,
}

impl Keyword for DependenciesKeyword {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, SchemaError> {
        let Some(object) = ctx.instance().as_object() else {
            return Ok(ctx.pass());
        };
        let mut nested = Vec::new();
        let mut valid = true;
        for (property, dependency) in &self.dependencies {
            if !object.contains_key(property) {
                continue;
            }
            match dependency {
                Dependency::Properties(required) => {
                    let missing: Vec<&String> =
                        required.iter().filter(|name| !object.contains_key(*name)).collect();
                    if !missing.is_empty() {
                        valid = false;
                        nested.push(ctx.fail(json!({"property": property, "dependency": missing})));
                    }
                }
                Dependency::Schema(schema) => {
                    let outcome = ctx.validate_in_place(schema, &[property.as_str()])?;
                    if outcome.is_valid {
                        nested.push(outcome);
                    } else {
                        valid = false;
                        let tokens = json!({"property": property, "dependency": "its schema"});
                        nested.push(fail_with(ctx, tokens, vec![outcome]));
                    }
                }
            }
            if !valid && ctx.is_flag() {
                break;
            }
        }
        Ok(ctx.node(valid, nested))
    }

    fn subschemas(&self) -> Vec<(JsonPointer, Schema)> {
        self.dependencies
            .iter()
            .filter_map(|(name, dependency)| match dependency {
                Dependency::Schema(schema) => Some((pointer(&[name.as_str()]), schema.clone())),
                Dependency::Properties(_) => None,
            })
            .collect()
    }
}

fn build_dependencies(name: &str, value: &Value, ctx: &BuildContext<'_>) -> Result<Arc<dyn Keyword>, SchemaError> {
    let mut dependencies = IndexMap::new();
    for (property, member) in expect_object(name, value)? {
        let dependency = match member {
            Value::Array(_) if name == "dependencies" => {
                Dependency::Properties(expect_string_array(name, member)?)
            }
            _ => Dependency::Schema(ctx.subschema(member, &[name, property.as_str()])?),
        };
        dependencies.insert(property.clone(), dependency);
    }
    Ok(Arc::new(DependenciesKeyword { dependencies }))
}

pub fn keywords() -> Vec<KeywordEntry> {
    let vocab = Some(Vocabulary::Applicator);
    vec![
        entry("allOf", DraftMask::ALL, vocab, build_all_of),
        entry("anyOf", DraftMask::ALL, vocab, build_any_of),
        entry("oneOf", DraftMask::ALL, vocab, build_one_of),
        entry("not", DraftMask::ALL, vocab, build_not),
        entry("if", DraftMask::since(Draft::Draft07), vocab, build_conditional),
        entry("then", DraftMask::since(Draft::Draft07), vocab, build_conditional),
        entry("else", DraftMask::since(Draft::Draft07), vocab, build_conditional),
        entry("dependentSchemas", DraftMask::DRAFT2019_09, vocab, build_dependencies),
        entry("dependencies", DraftMask::until(Draft::Draft07), None, build_dependencies),
    ]
}
