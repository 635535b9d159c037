use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use super::{ControllerProofPurpose, ProofPurpose, AUTHENTICATION};
use crate::canonicalize::Framer;
use crate::error::Error;
use crate::loader::DocumentLoader;
use crate::proof::{Proof, ValidationResult, VerificationMethod};

/// Purpose of proofs authenticating their signer, typically a presentation
/// answering a verifier's challenge.
#[derive(Clone)]
pub struct AuthenticationProofPurpose {
    controller: ControllerProofPurpose,
    challenge: String,
    domain: Option<String>,
}

impl AuthenticationProofPurpose {
    pub fn new(challenge: impl Into<String>) -> Self {
        Self {
            controller: ControllerProofPurpose::new(AUTHENTICATION),
            challenge: challenge.into(),
            domain: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_controller(mut self, controller: Value) -> Self {
        self.controller = self.controller.with_controller(controller);
        self
    }

    pub fn with_framer(mut self, framer: Arc<dyn Framer>) -> Self {
        self.controller = self.controller.with_framer(framer);
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.controller = self.controller.with_date(date);
        self
    }

    pub fn with_max_timestamp_delta(mut self, delta: Duration) -> Self {
        self.controller = self.controller.with_max_timestamp_delta(delta);
        self
    }

    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    async fn validate_authentication(
        &self,
        proof: &Proof,
        verification_method: &VerificationMethod,
        document_loader: &dyn DocumentLoader,
    ) -> Result<ValidationResult, Error> {
        if proof.challenge.as_deref() != Some(self.challenge.as_str()) {
            return Err(Error::ChallengeMismatch {
                found: as_written(proof, "challenge"),
                expected: self.challenge.clone(),
            });
        }
        if let Some(domain) = &self.domain {
            if proof.domain.as_ref() != Some(domain) {
                return Err(Error::DomainMismatch {
                    found: as_written(proof, "domain"),
                    expected: domain.clone(),
                });
            }
        }
        self.controller
            .validate_controller(proof, verification_method, document_loader)
            .await
    }
}

#[async_trait]
impl ProofPurpose for AuthenticationProofPurpose {
    fn term(&self) -> &str {
        self.controller.term()
    }

    async fn update(
        &self,
        proof: Proof,
        document: &Value,
        document_loader: &dyn DocumentLoader,
    ) -> Result<Proof, Error> {
        let mut proof = self
            .controller
            .update(proof, document, document_loader)
            .await?;
        proof.challenge = Some(self.challenge.clone());
        if let Some(domain) = &self.domain {
            proof.domain = Some(domain.clone());
        }
        Ok(proof)
    }

    async fn validate(
        &self,
        proof: &Proof,
        verification_method: &VerificationMethod,
        document_loader: &dyn DocumentLoader,
    ) -> ValidationResult {
        self.validate_authentication(proof, verification_method, document_loader)
            .await
            .into()
    }
}

/// `name` as found on the proof: a string as is, anything else as JSON,
/// nothing as the empty string.
fn as_written(proof: &Proof, name: &str) -> String {
    match proof.property(name) {
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
