use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{start_proof, LinkedDataProofSuite, VerifyData};
use crate::canonicalize::Canonicalizer;
use crate::context::DATA_INTEGRITY_CONTEXT_V1_URL;
use crate::error::Error;
use crate::hash::DigestFn;
use crate::loader::DocumentLoader;
use crate::proof::{Proof, VerificationMethod, VerificationResult};
use crate::purposes::ProofPurpose;
use crate::signature::{check_algorithm, Signer, VerifierFactory};
use crate::util::w3c_date;

pub const DATA_INTEGRITY_PROOF: &str = "DataIntegrityProof";

/// Multibase prefix of base58btc.
const MULTIBASE_BASE58BTC_HEADER: char = 'z';

/// Everything a Data Integrity cryptosuite contributes to a
/// [`DataIntegrityProof`].
#[derive(Clone)]
pub struct Cryptosuite {
    /// Written to the proof's `cryptosuite` property.
    pub name: String,
    pub required_algorithm: String,
    pub canonicalizer: Arc<dyn Canonicalizer>,
    pub verifier_factory: Arc<dyn VerifierFactory>,
}

impl Cryptosuite {
    pub fn new(
        name: impl Into<String>,
        required_algorithm: impl Into<String>,
        canonicalizer: Arc<dyn Canonicalizer>,
        verifier_factory: Arc<dyn VerifierFactory>,
    ) -> Self {
        Self {
            name: name.into(),
            required_algorithm: required_algorithm.into(),
            canonicalizer,
            verifier_factory,
        }
    }
}

/// The `DataIntegrityProof` suite: one proof type, specialized by a
/// [`Cryptosuite`].
pub struct DataIntegrityProof {
    cryptosuite: Cryptosuite,
    signer: Option<Arc<dyn Signer>>,
    date: DateTime<Utc>,
    proof: Option<Proof>,
    verify_data: VerifyData,
}

impl DataIntegrityProof {
    /// Fails when `signer` does not use the cryptosuite's algorithm. A suite
    /// built without a signer can only verify.
    pub fn new(cryptosuite: Cryptosuite, signer: Option<Arc<dyn Signer>>) -> Result<Self, Error> {
        if let Some(signer) = &signer {
            check_algorithm(
                signer.algorithm(),
                Some(cryptosuite.required_algorithm.as_str()),
                |found, required| Error::SignerAlgorithmMismatch { found, required },
            )?;
        }
        let verify_data = VerifyData::new(cryptosuite.canonicalizer.clone());
        Ok(Self {
            cryptosuite,
            signer,
            date: Utc::now(),
            proof: None,
            verify_data,
        })
    }

    /// Date used for `created` when the proof template has none.
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
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

    pub fn cryptosuite(&self) -> &Cryptosuite {
        &self.cryptosuite
    }

    pub fn verification_method(&self) -> Option<&str> {
        self.signer.as_ref().map(|signer| signer.id())
    }

    async fn create_verify_data(
        &self,
        document: &Value,
        proof: &Proof,
        document_loader: &dyn DocumentLoader,
    ) -> Result<Vec<u8>, Error> {
        self.verify_data
            .create(
                document,
                proof,
                Value::String(DATA_INTEGRITY_CONTEXT_V1_URL.to_owned()),
                document_loader,
            )
            .await
    }

    async fn sign(&self, verify_data: &[u8], mut proof: Proof) -> Result<Proof, Error> {
        let signer = self.signer.as_ref().ok_or(Error::MissingSigner)?;
        let signature = signer.sign(verify_data).await?;
        proof.proof_value = Some(format!(
            "{MULTIBASE_BASE58BTC_HEADER}{}",
            bs58::encode(signature).into_string()
        ));
        Ok(proof)
    }

    async fn verify_signature(
        &self,
        verify_data: &[u8],
        verification_method: &VerificationMethod,
        proof: &Proof,
    ) -> Result<bool, Error> {
        let verifier = self
            .cryptosuite
            .verifier_factory
            .create_verifier(verification_method)
            .await?;
        check_algorithm(
            verifier.algorithm(),
            Some(self.cryptosuite.required_algorithm.as_str()),
            |found, required| Error::VerifierAlgorithmMismatch { found, required },
        )?;

        let proof_value = proof.proof_value.as_deref().ok_or(Error::MissingProofValue)?;
        let encoded = proof_value
            .strip_prefix(MULTIBASE_BASE58BTC_HEADER)
            .ok_or(Error::UnsupportedEncoding)?;
        let signature = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| Error::MalformedEncoding(e.to_string()))?;

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
        let document = document_loader.load(id).await?.into_json()?;
        VerificationMethod::from_value(document)
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
impl LinkedDataProofSuite for DataIntegrityProof {
    fn type_(&self) -> &str {
        DATA_INTEGRITY_PROOF
    }

    fn context_url(&self) -> &str {
        DATA_INTEGRITY_CONTEXT_V1_URL
    }

    async fn create_proof(
        &self,
        document: &Value,
        purpose: &dyn ProofPurpose,
        document_loader: &dyn DocumentLoader,
    ) -> Result<Proof, Error> {
        let mut proof = start_proof(self.proof.as_ref(), DATA_INTEGRITY_PROOF);
        if proof.created.is_none() {
            proof.created = Some(w3c_date(&self.date));
        }
        proof.verification_method = self.verification_method().map(Into::into);
        proof.cryptosuite = Some(self.cryptosuite.name.clone());

        let proof = purpose.update(proof, document, document_loader).await?;
        let verify_data = self
            .create_verify_data(document, &proof, document_loader)
            .await?;
        let proof = self.sign(&verify_data, proof).await?;
        log::debug!(
            "created {} proof with cryptosuite {}",
            DATA_INTEGRITY_PROOF,
            self.cryptosuite.name
        );
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
