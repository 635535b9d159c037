//! Document loaders.
//!
//! A [`DocumentLoader`] dereferences the URLs met while signing and
//! verifying: verification methods, controller documents and remote
//! contexts.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoaderError {
    /// The URL cannot be dereferenced locally and fetching is disabled.
    #[error("URL \"{0}\" could not be dereferenced; loading documents is disabled.")]
    InvalidUrl(String),
    #[error("Document \"{0}\" not found.")]
    NotFound(String),
    #[error("Document \"{0}\" could not be parsed: {1}")]
    Parse(String, String),
    #[error("Loading \"{0}\" failed: {1}")]
    Other(String, String),
}

/// A dereferenced document.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    pub document: Value,
    pub document_url: Option<String>,
    pub context_url: Option<String>,
}

impl RemoteDocument {
    pub fn new(url: &str, document: Value) -> Self {
        Self {
            document,
            document_url: Some(url.to_owned()),
            context_url: None,
        }
    }

    /// Returns the document, parsing it first when the loader handed back a
    /// JSON string.
    pub fn into_json(self) -> Result<Value, LoaderError> {
        match self.document {
            Value::String(s) => serde_json::from_str(&s).map_err(|e| {
                LoaderError::Parse(self.document_url.unwrap_or_default(), e.to_string())
            }),
            document => Ok(document),
        }
    }
}

#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError>;
}

#[async_trait]
impl<T: DocumentLoader + ?Sized> DocumentLoader for &T {
    async fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        T::load(*self, url).await
    }
}

#[async_trait]
impl<T: DocumentLoader + ?Sized> DocumentLoader for std::sync::Arc<T> {
    async fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        T::load(self, url).await
    }
}

/// Loader used when the caller does not provide one. Every URL fails with
/// [`LoaderError::InvalidUrl`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledLoader;

#[async_trait]
impl DocumentLoader for DisabledLoader {
    async fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        Err(LoaderError::InvalidUrl(url.to_owned()))
    }
}

/// An in-memory loader.
///
/// URLs with a fragment that are not registered directly are dereferenced
/// by loading the base document and looking up the node whose `id` is the
/// full URL or the bare `#fragment`.
#[derive(Debug, Default, Clone)]
pub struct StaticDocumentLoader {
    map: HashMap<String, Value>,
}

impl StaticDocumentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn insert(&mut self, url: impl Into<String>, document: Value) -> Option<Value> {
        self.map.insert(url.into(), document)
    }

    pub fn with_document(mut self, url: impl Into<String>, document: Value) -> Self {
        self.insert(url, document);
        self
    }

    fn dereference(&self, url: &str) -> Option<Value> {
        if let Some(document) = self.map.get(url) {
            return Some(document.clone());
        }
        let (base, fragment) = url.split_once('#')?;
        let document = self.map.get(base)?;
        let relative = format!("#{fragment}");
        find_node(document, &[url, &relative]).cloned()
    }
}

#[async_trait]
impl DocumentLoader for StaticDocumentLoader {
    async fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        match self.dereference(url) {
            Some(document) => Ok(RemoteDocument::new(url, document)),
            None => Err(LoaderError::NotFound(url.to_owned())),
        }
    }
}

fn find_node<'a>(value: &'a Value, ids: &[&str]) -> Option<&'a Value> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(id)) = map.get("id") {
                if ids.contains(&id.as_str()) {
                    return Some(value);
                }
            }
            map.values().find_map(|v| find_node(v, ids))
        }
        Value::Array(values) => values.iter().find_map(|v| find_node(v, ids)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn did_document() -> Value {
        json!({
            "@context": "https://www.w3.org/ns/did/v1",
            "id": "did:example:alice",
            "verificationMethod": [{
                "id": "did:example:alice#key-1",
                "type": "Multikey",
                "controller": "did:example:alice"
            }, {
                "id": "#key-2",
                "type": "Multikey",
                "controller": "did:example:alice"
            }],
            "assertionMethod": ["did:example:alice#key-1"]
        })
    }

    #[async_std::test]
    async fn static_loader_dereferences_fragments() {
        let loader = StaticDocumentLoader::new().with_document("did:example:alice", did_document());

        let doc = loader.load("did:example:alice").await.unwrap();
        assert_eq!(doc.document["id"], "did:example:alice");

        let vm = loader.load("did:example:alice#key-1").await.unwrap();
        assert_eq!(vm.document["type"], "Multikey");
        assert_eq!(vm.document_url.as_deref(), Some("did:example:alice#key-1"));

        let vm = loader.load("did:example:alice#key-2").await.unwrap();
        assert_eq!(vm.document["id"], "#key-2");

        assert_eq!(
            loader.load("did:example:alice#key-3").await,
            Err(LoaderError::NotFound("did:example:alice#key-3".into()))
        );
    }

    #[async_std::test]
    async fn disabled_loader() {
        assert_eq!(
            DisabledLoader.load("https://example.com/").await,
            Err(LoaderError::InvalidUrl("https://example.com/".into()))
        );
    }

    #[test]
    fn string_documents_are_parsed() {
        let remote = RemoteDocument::new("ex:doc", Value::String(r#"{"id":"ex:doc"}"#.into()));
        assert_eq!(remote.into_json().unwrap(), json!({ "id": "ex:doc" }));

        let remote = RemoteDocument::new("ex:doc", Value::String("{".into()));
        assert!(matches!(remote.into_json(), Err(LoaderError::Parse(..))));
    }
}
