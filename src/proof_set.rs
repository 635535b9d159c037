//! Attaching proofs to documents and verifying them.

use futures::future::join_all;
use serde_json::{Map, Value};

use crate::error::{Error, VerificationError};
use crate::loader::{DisabledLoader, DocumentLoader};
use crate::proof::{Proof, ValidationResult, VerificationMethod, PROOF_PROPERTY};
use crate::purposes::ProofPurpose;
use crate::suites::LinkedDataProofSuite;

/// Options of [`ProofSet::add`] and [`sign`](crate::sign).
pub struct SignOptions<'a> {
    pub suite: &'a dyn LinkedDataProofSuite,
    pub purpose: &'a dyn ProofPurpose,
    /// When absent, every URL fails to resolve.
    pub document_loader: Option<&'a dyn DocumentLoader>,
    /// Add the suite's context to the document when it is missing, instead
    /// of failing. Defaults to `true`.
    pub add_suite_context: bool,
}

impl<'a> SignOptions<'a> {
    pub fn new(suite: &'a dyn LinkedDataProofSuite, purpose: &'a dyn ProofPurpose) -> Self {
        Self {
            suite,
            purpose,
            document_loader: None,
            add_suite_context: true,
        }
    }

    pub fn with_document_loader(mut self, document_loader: &'a dyn DocumentLoader) -> Self {
        self.document_loader = Some(document_loader);
        self
    }

    pub fn with_add_suite_context(mut self, add_suite_context: bool) -> Self {
        self.add_suite_context = add_suite_context;
        self
    }

    fn document_loader(&self) -> &'a dyn DocumentLoader {
        self.document_loader.unwrap_or(&DisabledLoader)
    }
}

/// Options of [`ProofSet::verify`] and [`verify`](crate::verify).
pub struct VerifyOptions<'a> {
    /// Accepted suites. A proof is checked by the first suite matching its
    /// type.
    pub suites: Vec<&'a dyn LinkedDataProofSuite>,
    pub purpose: &'a dyn ProofPurpose,
    pub document_loader: Option<&'a dyn DocumentLoader>,
}

impl<'a> VerifyOptions<'a> {
    pub fn new(suite: &'a dyn LinkedDataProofSuite, purpose: &'a dyn ProofPurpose) -> Self {
        Self {
            suites: vec![suite],
            purpose,
            document_loader: None,
        }
    }

    pub fn with_suite(mut self, suite: &'a dyn LinkedDataProofSuite) -> Self {
        self.suites.push(suite);
        self
    }

    pub fn with_document_loader(mut self, document_loader: &'a dyn DocumentLoader) -> Self {
        self.document_loader = Some(document_loader);
        self
    }

    fn document_loader(&self) -> &'a dyn DocumentLoader {
        self.document_loader.unwrap_or(&DisabledLoader)
    }
}

/// Outcome of one proof.
#[derive(Debug, Clone, PartialEq)]
pub struct ProofResult {
    pub proof: Proof,
    pub verified: bool,
    pub verification_method: Option<VerificationMethod>,
    /// Absent when the signature did not verify.
    pub purpose_result: Option<ValidationResult>,
    pub error: Option<Error>,
}

/// Outcome of a whole document.
#[derive(Debug, Clone, PartialEq)]
pub struct ProofSetResult {
    /// At least one proof verified.
    pub verified: bool,
    /// One entry per matching proof, in document order.
    pub results: Vec<ProofResult>,
    pub error: Option<VerificationError>,
}

impl ProofSetResult {
    pub(crate) fn failure(error: Error) -> Self {
        Self {
            verified: false,
            results: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The proofs attached to a document under `proof`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProofSet;

impl ProofSet {
    /// Signs `document` and returns a copy with the new proof appended to its
    /// existing proofs. Existing proofs are not part of the signed data.
    pub async fn add(&self, document: &Value, options: &SignOptions<'_>) -> Result<Value, Error> {
        let mut document = match document {
            Value::Object(map) => map.clone(),
            _ => return Err(Error::DocumentNotObject),
        };
        options
            .suite
            .ensure_suite_context(&mut document, options.add_suite_context)?;

        let existing = document.remove(PROOF_PROPERTY);
        let input = Value::Object(document.clone());
        let proof = options
            .suite
            .create_proof(&input, options.purpose, options.document_loader())
            .await?
            .to_value()?;

        let proofs = match existing {
            None | Some(Value::Null) => proof,
            Some(Value::Array(mut proofs)) => {
                proofs.push(proof);
                Value::Array(proofs)
            }
            Some(single) => Value::Array(vec![single, proof]),
        };
        document.insert(PROOF_PROPERTY.to_owned(), proofs);
        Ok(Value::Object(document))
    }

    /// Verifies every proof of `document` matching the purpose and one of the
    /// suites. Proofs are checked concurrently; failures are reported in the
    /// result.
    pub async fn verify(&self, document: &Value, options: &VerifyOptions<'_>) -> ProofSetResult {
        let mut document = match document {
            Value::Object(map) => map.clone(),
            _ => return ProofSetResult::failure(Error::DocumentNotObject),
        };
        let proofs = extract_proofs(&mut document);
        let document = Value::Object(document);

        let candidates: Vec<_> = proofs
            .into_iter()
            .filter_map(|proof| {
                let suite = matching_suite(&proof, options)?;
                Some((proof, suite))
            })
            .collect();
        if candidates.is_empty() {
            return ProofSetResult::failure(Error::NoMatchingProofs);
        }

        let document_loader = options.document_loader();
        let results = join_all(candidates.into_iter().map(|(proof, suite)| {
            verify_proof(proof, suite, options.purpose, &document, document_loader)
        }))
        .await;

        let verified = results.iter().any(|result| result.verified);
        let error = if verified {
            None
        } else {
            let errors = results
                .iter()
                .filter_map(|result| result.error.clone())
                .collect();
            Some(VerificationError::new(errors))
        };
        ProofSetResult {
            verified,
            results,
            error,
        }
    }
}

/// Removes the proof collection from `document`, as a list. Entries that
/// are not proofs are dropped.
fn extract_proofs(document: &mut Map<String, Value>) -> Vec<Proof> {
    let proofs = match document.remove(PROOF_PROPERTY) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(proofs)) => proofs,
        Some(proof) => vec![proof],
    };
    proofs
        .into_iter()
        .filter_map(|value| match Proof::from_value(value) {
            Ok(proof) => Some(proof),
            Err(e) => {
                log::warn!("skipping malformed proof: {e}");
                None
            }
        })
        .collect()
}

fn matching_suite<'a>(
    proof: &Proof,
    options: &VerifyOptions<'a>,
) -> Option<&'a dyn LinkedDataProofSuite> {
    if !options.purpose.matches(proof) {
        log::debug!(
            "skipping {} proof with purpose {:?}",
            proof.type_,
            proof.proof_purpose
        );
        return None;
    }
    let suite = options
        .suites
        .iter()
        .copied()
        .find(|suite| suite.match_proof(proof));
    if suite.is_none() {
        log::debug!("no suite for {} proof", proof.type_);
    }
    suite
}

async fn verify_proof(
    proof: Proof,
    suite: &dyn LinkedDataProofSuite,
    purpose: &dyn ProofPurpose,
    document: &Value,
    document_loader: &dyn DocumentLoader,
) -> ProofResult {
    let result = suite.verify_proof(&proof, document, document_loader).await;
    let verification_method = match (result.verified, result.verification_method) {
        (true, Some(verification_method)) => verification_method,
        _ => {
            return ProofResult {
                proof,
                verified: false,
                verification_method: None,
                purpose_result: None,
                error: Some(result.error.unwrap_or(Error::InvalidSignature)),
            }
        }
    };

    let purpose_result = purpose
        .validate(&proof, &verification_method, document_loader)
        .await;
    let error = if purpose_result.valid {
        None
    } else {
        Some(
            purpose_result
                .error
                .clone()
                .unwrap_or_else(|| Error::NotAuthorized {
                    method: verification_method.id.clone(),
                    purpose: purpose.term().to_owned(),
                }),
        )
    };
    ProofResult {
        proof,
        verified: purpose_result.valid,
        verification_method: Some(verification_method),
        purpose_result: Some(purpose_result),
        error,
    }
}
