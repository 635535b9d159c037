//! Canonicalization and framing capabilities.
//!
//! RDF dataset canonicalization and JSON-LD framing are provided by the
//! caller. [`JcsCanonicalizer`] is bundled for suites that canonicalize with
//! the JSON Canonicalization Scheme instead.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Error;
use crate::loader::DocumentLoader;

pub struct CanonicalizeOptions<'a> {
    pub document_loader: &'a dyn DocumentLoader,
    /// Set when the input is already in expanded form.
    pub skip_expansion: bool,
}

impl<'a> CanonicalizeOptions<'a> {
    pub fn new(document_loader: &'a dyn DocumentLoader) -> Self {
        Self {
            document_loader,
            skip_expansion: false,
        }
    }
}

/// Deterministic serialization of a document.
///
/// Implementations must fail, rather than drop data, when a term definition
/// or a remote context cannot be resolved. Loader failures should be
/// returned as [`Error::Loader`] so that unresolvable URLs stay
/// recognizable.
#[async_trait]
pub trait Canonicalizer: Send + Sync {
    async fn canonicalize(
        &self,
        input: &Value,
        options: CanonicalizeOptions<'_>,
    ) -> Result<String, Error>;
}

pub struct FrameOptions<'a> {
    pub document_loader: &'a dyn DocumentLoader,
    pub compact_to_relative: bool,
}

/// JSON-LD framing.
///
/// When `input` is a string it is a URL to be dereferenced with the
/// document loader first. Returns `None` when nothing matches the frame.
#[async_trait]
pub trait Framer: Send + Sync {
    async fn frame(
        &self,
        input: &Value,
        frame: &Value,
        options: FrameOptions<'_>,
    ) -> Result<Option<Value>, Error>;
}

/// JSON Canonicalization Scheme (RFC 8785).
#[derive(Debug, Default, Clone, Copy)]
pub struct JcsCanonicalizer;

#[async_trait]
impl Canonicalizer for JcsCanonicalizer {
    async fn canonicalize(
        &self,
        input: &Value,
        _options: CanonicalizeOptions<'_>,
    ) -> Result<String, Error> {
        serde_jcs::to_string(input).map_err(|e| Error::Canonicalization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::DisabledLoader;
    use serde_json::json;

    #[async_std::test]
    async fn jcs_is_stable_under_reordering() {
        let a = json!({ "b": 1, "a": { "d": [1, 2], "c": "x" } });
        let b = json!({ "a": { "c": "x", "d": [1, 2] }, "b": 1 });
        let ca = JcsCanonicalizer
            .canonicalize(&a, CanonicalizeOptions::new(&DisabledLoader))
            .await
            .unwrap();
        let cb = JcsCanonicalizer
            .canonicalize(&b, CanonicalizeOptions::new(&DisabledLoader))
            .await
            .unwrap();
        assert_eq!(ca, cb);
        assert_eq!(ca, r#"{"a":{"c":"x","d":[1,2]},"b":1}"#);
    }
}
