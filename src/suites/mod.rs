//! Signature suites.
//!
//! A suite turns a document and a proof into the bytes that get signed:
//! both are canonicalized and hashed independently, and the two digests are
//! concatenated, proof options first.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::canonicalize::{CanonicalizeOptions, Canonicalizer};
use crate::context::{add_context, includes_context};
use crate::error::Error;
use crate::hash::{sha256_digest, DigestFn};
use crate::loader::DocumentLoader;
use crate::proof::{Proof, VerificationResult};
use crate::purposes::ProofPurpose;
use crate::util::concat;

mod data_integrity;
mod linked_data_signature;

pub use data_integrity::{Cryptosuite, DataIntegrityProof, DATA_INTEGRITY_PROOF};
pub use linked_data_signature::LinkedDataSignature;

#[async_trait]
pub trait LinkedDataProofSuite: Send + Sync {
    /// Proof type produced and accepted by this suite.
    fn type_(&self) -> &str;

    /// Context a signed document must declare.
    fn context_url(&self) -> &str;

    fn match_proof(&self, proof: &Proof) -> bool {
        proof.type_ == self.type_()
    }

    /// Makes sure `document` declares [`context_url`](Self::context_url).
    /// Adds it when `add_suite_context` is set, fails without touching the
    /// document otherwise.
    fn ensure_suite_context(
        &self,
        document: &mut Map<String, Value>,
        add_suite_context: bool,
    ) -> Result<(), Error> {
        ensure_context(document, self.context_url(), add_suite_context)
    }

    async fn create_proof(
        &self,
        document: &Value,
        purpose: &dyn ProofPurpose,
        document_loader: &dyn DocumentLoader,
    ) -> Result<Proof, Error>;

    /// Checks the signature of `proof` over `document`. Every failure is
    /// reported through the returned [`VerificationResult`].
    async fn verify_proof(
        &self,
        proof: &Proof,
        document: &Value,
        document_loader: &dyn DocumentLoader,
    ) -> VerificationResult;
}

pub(crate) fn ensure_context(
    document: &mut Map<String, Value>,
    context_url: &str,
    add_suite_context: bool,
) -> Result<(), Error> {
    if includes_context(document, context_url) {
        return Ok(());
    }
    if !add_suite_context {
        return Err(Error::MissingSuiteContext(context_url.to_owned()));
    }
    add_context(document, context_url);
    Ok(())
}

/// Copy of the suite's proof template, or an empty proof, typed for the suite.
pub(crate) fn start_proof(template: Option<&Proof>, type_: &str) -> Proof {
    let mut proof = template.cloned().unwrap_or_default();
    proof.type_ = type_.to_owned();
    proof
}

/// Canonicalize-and-hash stage shared by every suite.
///
/// The digest of the last document seen is kept, so that checking several
/// proofs over the same document canonicalizes it once.
pub(crate) struct VerifyData {
    canonicalizer: Arc<dyn Canonicalizer>,
    digest: DigestFn,
    cache: Mutex<Option<(Value, Vec<u8>)>>,
}

impl VerifyData {
    pub fn new(canonicalizer: Arc<dyn Canonicalizer>) -> Self {
        Self {
            canonicalizer,
            digest: sha256_digest,
            cache: Mutex::new(None),
        }
    }

    pub fn set_digest(&mut self, digest: DigestFn) {
        self.digest = digest;
        self.cache = Mutex::new(None);
    }

    fn cached(&self, document: &Value) -> Option<Vec<u8>> {
        let cache = self.cache.lock().ok()?;
        match cache.as_ref() {
            Some((cached, hash)) if cached == document => Some(hash.clone()),
            _ => None,
        }
    }

    fn store(&self, document: &Value, hash: &[u8]) {
        if let Ok(mut cache) = self.cache.lock() {
            *cache = Some((document.clone(), hash.to_vec()));
        }
    }

    async fn document_hash(
        &self,
        document: &Value,
        document_loader: &dyn DocumentLoader,
    ) -> Result<Vec<u8>, Error> {
        if let Some(hash) = self.cached(document) {
            log::debug!("document hash cache hit");
            return Ok(hash);
        }
        let canonical = self
            .canonicalizer
            .canonicalize(document, CanonicalizeOptions::new(document_loader))
            .await?;
        let hash = (self.digest)(canonical.as_bytes());
        self.store(document, &hash);
        Ok(hash)
    }

    async fn proof_hash(
        &self,
        proof_options: &Value,
        document_loader: &dyn DocumentLoader,
    ) -> Result<Vec<u8>, Error> {
        let options = CanonicalizeOptions {
            document_loader,
            skip_expansion: false,
        };
        let canonical = self.canonicalizer.canonicalize(proof_options, options).await?;
        Ok((self.digest)(canonical.as_bytes()))
    }

    /// Bytes to sign: digest of the proof options, then digest of the
    /// document. `proof_context` is the `@context` given to proof options
    /// that do not declare one.
    pub async fn create(
        &self,
        document: &Value,
        proof: &Proof,
        proof_context: Value,
        document_loader: &dyn DocumentLoader,
    ) -> Result<Vec<u8>, Error> {
        let proof_options = proof.to_options(proof_context)?;
        let (proof_hash, document_hash) = futures::try_join!(
            self.proof_hash(&proof_options, document_loader),
            self.document_hash(document, document_loader)
        )?;
        Ok(concat(&proof_hash, &document_hash))
    }
}
