//! JSON-LD context URLs and `@context` helpers.

use serde_json::{Map, Value};

pub const SECURITY_CONTEXT_V1_URL: &str = "https://w3id.org/security/v1";
pub const SECURITY_CONTEXT_V2_URL: &str = "https://w3id.org/security/v2";
pub const SECURITY_CONTEXT_URL: &str = SECURITY_CONTEXT_V2_URL;
pub const SECURITY_PROOF_URL: &str = "https://w3id.org/security#proof";
pub const SECURITY_SIGNATURE_URL: &str = "https://w3id.org/security#signature";

pub const DID_CONTEXT_V1_URL: &str = "https://www.w3.org/ns/did/v1";
pub const DATA_INTEGRITY_CONTEXT_V1_URL: &str = "https://w3id.org/security/data-integrity/v1";
pub const ED25519_2020_CONTEXT_URL: &str = "https://w3id.org/security/suites/ed25519-2020/v1";

const CONTEXT: &str = "@context";

/// Tests whether `document` declares `context_url` in its `@context`, either
/// as the whole value or as one entry of a context array.
pub fn includes_context(document: &Map<String, Value>, context_url: &str) -> bool {
    match document.get(CONTEXT) {
        Some(Value::String(s)) => s == context_url,
        Some(Value::Array(contexts)) => contexts
            .iter()
            .any(|c| c.as_str() == Some(context_url)),
        _ => false,
    }
}

/// Appends `context_url` to the document's `@context`.
///
/// A missing context becomes a one-element array; a single context is
/// promoted to a two-element array.
pub fn add_context(document: &mut Map<String, Value>, context_url: &str) {
    let url = Value::String(context_url.to_owned());
    let context = match document.remove(CONTEXT) {
        None | Some(Value::Null) => vec![url],
        Some(Value::Array(mut contexts)) => {
            contexts.push(url);
            contexts
        }
        Some(existing) => vec![existing, url],
    };
    document.insert(CONTEXT.to_owned(), Value::Array(context));
}

/// Returns the document's first context entry, or the context itself when
/// it is a single value.
pub fn first_context(document: &Value) -> Option<&Value> {
    match document.get(CONTEXT)? {
        Value::Array(contexts) => contexts.first(),
        context => Some(context),
    }
}
