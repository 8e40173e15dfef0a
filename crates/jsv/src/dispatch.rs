//! Applies a schema's keywords to the instance in its context.

use crate::context::ValidationContext;
use crate::draft::Draft;
use crate::result::ValidationResult;
use crate::schema::Schema;
use crate::SchemaError;

/// Validates the context's instance against `schema`.
///
/// Keywords run in the schema's evaluation order, skipping those the
/// document's draft doesn't define; up to draft 07 a `$ref` hides its
/// siblings. Each keyword gets its own context; what it evaluated is kept
/// only if it passed. Flag output stops at the first failing keyword.
pub(crate) fn validate(
    schema: &Schema,
    ctx: &mut ValidationContext<'_>,
) -> Result<ValidationResult, SchemaError> {
    let mut result = ctx.schema_result();
    if let Some(value) = schema.as_bool() {
        if !value {
            result.is_valid = false;
            result.error = Some(ctx.render("false"));
        }
        return Ok(result);
    }

    let draft = ctx.draft();
    if draft >= Draft::Draft2019_09 && schema.has_recursive_anchor() {
        ctx.push_recursive_anchor(schema);
    }
    let ref_only = draft.ref_overrides_siblings() && schema.has_keyword("$ref");
    let flag = ctx.is_flag();

    for slot in schema.slots() {
        if !slot.drafts.contains(draft) || (ref_only && slot.name != "$ref") {
            continue;
        }
        let mut keyword_ctx = ctx.for_keyword(&slot.name);
        let outcome = slot.keyword.validate(&mut keyword_ctx)?;
        ctx.absorb(keyword_ctx, outcome.is_valid);
        result.is_valid &= outcome.is_valid;
        result.nested.push(outcome);
        if flag && !result.is_valid {
            break;
        }
    }
    Ok(result)
}
