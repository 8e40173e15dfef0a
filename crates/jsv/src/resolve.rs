//! Reference resolution.
//!
//! A reference splits at `#` into a document address and a fragment. The
//! address is looked up in the current document, the document validation
//! started from, the registry, the bundled meta-schemas and finally the
//! configured retriever. The fragment is then either an anchor, looked up
//! in the document's index, or a JSON Pointer walked from the resource.

use url::Url;

use crate::context::ValidationContext;
use crate::meta;
use crate::options::BuildOptions;
use crate::schema::Schema;
use crate::uri;
use crate::SchemaError;

pub(crate) struct Resolved {
    pub(crate) document: Schema,
    pub(crate) target: Schema,
    /// True when `target` was rebuilt from JSON rather than found in the
    /// document's keyword tree.
    pub(crate) detached: bool,
}

fn unresolvable(reference: &str, base: &Url) -> SchemaError {
    SchemaError::UnresolvableReference {
        reference: reference.to_string(),
        base: base.to_string(),
    }
}

pub(crate) fn resolve(
    reference: &str,
    base: &Url,
    ctx: &ValidationContext<'_>,
) -> Result<Resolved, SchemaError> {
    let full = uri::resolve(base, reference)?;
    let key = uri::document_key(&full);
    tracing::trace!(reference, resolved = %full, "resolving reference");

    let (document, resource) =
        locate(&key, ctx)?.ok_or_else(|| unresolvable(reference, base))?;

    let fragment = full.fragment().unwrap_or_default();
    if fragment.is_empty() {
        return Ok(Resolved {
            document,
            target: resource,
            detached: false,
        });
    }
    if uri::is_plain_name(fragment) {
        let target = document
            .index_lookup(&uri::anchor_key(&full, fragment))
            .and_then(|path| document.find(path.tokens()))
            .ok_or_else(|| unresolvable(reference, base))?;
        return Ok(Resolved {
            document,
            target,
            detached: false,
        });
    }

    let tokens = jsv_pointer::parse_uri_fragment_pointer(fragment)?;
    if let Some(target) = resource.find(&tokens) {
        return Ok(Resolved {
            document,
            target,
            detached: false,
        });
    }
    let options = ctx.options();
    let target = resource
        .rebuild_at(&tokens, &options.catalog, &options.registry)?
        .ok_or_else(|| unresolvable(reference, base))?;
    Ok(Resolved {
        document,
        target,
        detached: true,
    })
}

/// `(document, resource)` for a document key.
fn locate(key: &str, ctx: &ValidationContext<'_>) -> Result<Option<(Schema, Schema)>, SchemaError> {
    for document in [ctx.document(), ctx.root_document()] {
        if let Some(resource) = document
            .index_lookup(key)
            .and_then(|path| document.find(path.tokens()))
        {
            return Ok(Some((document.clone(), resource)));
        }
    }
    let options = ctx.options();
    if let Some(found) = options.registry.lookup(key) {
        return Ok(Some(found));
    }
    if let Some(meta) = meta::well_known(key) {
        return Ok(Some((meta.clone(), meta)));
    }
    let Some(retriever) = &options.retriever else {
        return Ok(None);
    };
    let url = Url::parse(key).map_err(|e| SchemaError::InvalidUri {
        uri: key.to_string(),
        reason: e.to_string(),
    })?;
    let value = retriever
        .retrieve(&url)
        .map_err(|reason| SchemaError::Retrieval {
            uri: key.to_string(),
            reason,
        })?;
    let build = BuildOptions {
        default_draft: ctx.draft(),
        base_uri: Some(key.to_string()),
        catalog: options.catalog.clone(),
        registry: options.registry.clone(),
    };
    let schema = Schema::from_json_with(&value, &build)?;
    options.registry.register_as(key, &schema)?;
    tracing::debug!(uri = key, "retrieved schema document");
    Ok(Some((schema.clone(), schema)))
}
