use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use multibase::Base;
use serde_json::{json, Value};

use super::{start_proof, LinkedDataProofSuite, VerifyData};
use crate::canonicalize::{Canonicalizer, FrameOptions, Framer};
use crate::context::SECURITY_CONTEXT_URL;
use crate::error::Error;
use crate::hash::DigestFn;
use crate::loader::DocumentLoader;
use crate::proof::{Proof, VerificationMethod, VerificationResult};
use crate::purposes::ProofPurpose;
use crate::signature::{check_algorithm, KeyPair, Signer, Verifier, VerifierFactory};
use crate::util::w3c_date;

/// A legacy Linked Data Signature suite, such as `Ed25519Signature2020`.
///
/// Documents and proof options are canonicalized with full expansion. The
/// signature is written to `proofValue` as base58btc multibase. Verification
/// methods are dereferenced by framing them through the document loader,
/// and revoked methods are rejected.
pub struct LinkedDataSignature {
    type_: String,
    context_url: String,
    framer: Arc<dyn Framer>,
    signer: Option<Arc<dyn Signer>>,
    verifier: Option<Arc<dyn Verifier>>,
    verifier_factory: Option<Arc<dyn VerifierFactory>>,
    required_algorithm: Option<String>,
    verification_method: Option<String>,
    date: Option<DateTime<Utc>>,
    proof: Option<Proof>,
    verify_data: VerifyData,
}

impl LinkedDataSignature {
    pub fn new(
        type_: impl Into<String>,
        context_url: impl Into<String>,
        canonicalizer: Arc<dyn Canonicalizer>,
        framer: Arc<dyn Framer>,
    ) -> Self {
        Self {
            type_: type_.into(),
            context_url: context_url.into(),
            framer,
            signer: None,
            verifier: None,
            verifier_factory: None,
            required_algorithm: None,
            verification_method: None,
            date: None,
            proof: None,
            verify_data: VerifyData::new(canonicalizer),
        }
    }

    /// Uses the signer and verifier of `key`, and its id as verification
    /// method. Fails if the key provides neither.
    pub fn with_key(mut self, key: Arc<dyn KeyPair>) -> Result<Self, Error> {
        let signer = key.signer();
        let verifier = key.verifier();
        if signer.is_none() && verifier.is_none() {
            return Err(Error::KeyWithoutCapability);
        }
        self.verification_method = Some(key.id().to_owned());
        self.signer = signer;
        self.verifier = verifier;
        Ok(self)
    }

    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.verification_method = Some(signer.id().to_owned());
        self.signer = Some(signer);
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn Verifier>) -> Self {
        if self.verification_method.is_none() {
            self.verification_method = Some(verifier.id().to_owned());
        }
        self.verifier = Some(verifier);
        self
    }

    /// Builds verifiers from the resolved verification method when no
    /// verifier is configured.
    pub fn with_verifier_factory(mut self, factory: Arc<dyn VerifierFactory>) -> Self {
        self.verifier_factory = Some(factory);
        self
    }

    pub fn with_required_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.required_algorithm = Some(algorithm.into());
        self
    }

    /// Overrides `created`. Without it, the template's `created` is kept
    /// and the current time is used when there is none.
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_proof(mut self, proof: Proof) -> Self {
        self.proof = Some(proof);
        self
    }

    pub fn with_digest(mut self, digest: DigestFn) -> Self {
        self.verify_data.set_digest(digest);
        self
    }

    pub fn verification_method(&self) -> Option<&str> {
        self.verification_method.as_deref()
    }

    async fn create_verify_data(
        &self,
        document: &Value,
        proof: &Proof,
        document_loader: &dyn DocumentLoader,
    ) -> Result<Vec<u8>, Error> {
        let proof_context = document
            .get("@context")
            .cloned()
            .unwrap_or_else(|| Value::String(SECURITY_CONTEXT_URL.to_owned()));
        self.verify_data
            .create(document, proof, proof_context, document_loader)
            .await
    }

    async fn sign(&self, verify_data: &[u8], mut proof: Proof) -> Result<Proof, Error> {
        let signer = self.signer.as_ref().ok_or(Error::MissingSigner)?;
        check_algorithm(
            signer.algorithm(),
            self.required_algorithm.as_deref(),
            |found, required| Error::SignerAlgorithmMismatch { found, required },
        )?;
        let signature = signer.sign(verify_data).await?;
        proof.proof_value = Some(multibase::encode(Base::Base58Btc, signature));
        Ok(proof)
    }

    async fn verifier_for(
        &self,
        verification_method: &VerificationMethod,
    ) -> Result<Arc<dyn Verifier>, Error> {
        if let Some(verifier) = &self.verifier {
            return Ok(verifier.clone());
        }
        match &self.verifier_factory {
            Some(factory) => factory.create_verifier(verification_method).await,
            None => Err(Error::MissingVerifier(verification_method.id.clone())),
        }
    }

    async fn verify_signature(
        &self,
        verify_data: &[u8],
        verification_method: &VerificationMethod,
        proof: &Proof,
    ) -> Result<bool, Error> {
        let verifier = self.verifier_for(verification_method).await?;
        check_algorithm(
            verifier.algorithm(),
            self.required_algorithm.as_deref(),
            |found, required| Error::VerifierAlgorithmMismatch { found, required },
        )?;
        let proof_value = proof.proof_value.as_deref().ok_or(Error::MissingProofValue)?;
        let (base, signature) =
            multibase::decode(proof_value).map_err(|e| Error::MalformedEncoding(e.to_string()))?;
        if base != Base::Base58Btc {
            return Err(Error::UnsupportedEncoding);
        }
        verifier.verify(verify_data, &signature).await
    }

    async fn get_verification_method(
        &self,
        proof: &Proof,
        document_loader: &dyn DocumentLoader,
    ) -> Result<VerificationMethod, Error> {
        let id = proof
            .verification_method_id()
            .filter(|id| !id.is_empty())
            .ok_or(Error::MissingVerificationMethod)?;
        let frame = json!({
            "@context": SECURITY_CONTEXT_URL,
            "@embed": "@always",
            "id": id,
        });
        let options = FrameOptions {
            document_loader,
            compact_to_relative: false,
        };
        let framed = self
            .framer
            .frame(&Value::String(id.to_owned()), &frame, options)
            .await?
            .ok_or_else(|| Error::VerificationMethodNotFound(id.to_owned()))?;
        let verification_method = VerificationMethod::from_value(framed)?;
        if verification_method.revoked.is_some() {
            return Err(Error::RevokedVerificationMethod);
        }
        Ok(verification_method)
    }

    async fn verify(
        &self,
        proof: &Proof,
        document: &Value,
        document_loader: &dyn DocumentLoader,
    ) -> Result<VerificationMethod, Error> {
        let verify_data = self
            .create_verify_data(document, proof, document_loader)
            .await?;
        let verification_method = self
            .get_verification_method(proof, document_loader)
            .await?;
        if !self
            .verify_signature(&verify_data, &verification_method, proof)
            .await?
        {
            return Err(Error::InvalidSignature);
        }
        Ok(verification_method)
    }
}

#[async_trait]
impl LinkedDataProofSuite for LinkedDataSignature {
    fn type_(&self) -> &str {
        &self.type_
    }

    fn context_url(&self) -> &str {
        &self.context_url
    }

    async fn create_proof(
        &self,
        document: &Value,
        purpose: &dyn ProofPurpose,
        document_loader: &dyn DocumentLoader,
    ) -> Result<Proof, Error> {
        let mut proof = start_proof(self.proof.as_ref(), &self.type_);
        match self.date {
            Some(date) => proof.created = Some(w3c_date(&date)),
            None if proof.created.is_none() => proof.created = Some(w3c_date(&Utc::now())),
            None => {}
        }
        proof.verification_method = self.verification_method.clone().map(Into::into);

        let proof = purpose.update(proof, document, document_loader).await?;
        let verify_data = self
            .create_verify_data(document, &proof, document_loader)
            .await?;
        let proof = self.sign(&verify_data, proof).await?;
        log::debug!("created {} proof", self.type_);
        Ok(proof)
    }

    async fn verify_proof(
        &self,
        proof: &Proof,
        document: &Value,
        document_loader: &dyn DocumentLoader,
    ) -> VerificationResult {
        self.verify(proof, document, document_loader).await.into()
    }
}
