use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use super::{ControllerProofPurpose, ProofPurpose, ASSERTION_METHOD};
use crate::canonicalize::Framer;
use crate::error::Error;
use crate::loader::DocumentLoader;
use crate::proof::{Proof, ValidationResult, VerificationMethod};

/// Purpose of proofs asserting a claim, such as a credential issuer's.
#[derive(Clone)]
pub struct AssertionProofPurpose(ControllerProofPurpose);

impl AssertionProofPurpose {
    pub fn new() -> Self {
        Self(ControllerProofPurpose::new(ASSERTION_METHOD))
    }

    pub fn with_controller(self, controller: Value) -> Self {
        Self(self.0.with_controller(controller))
    }

    pub fn with_framer(self, framer: Arc<dyn Framer>) -> Self {
        Self(self.0.with_framer(framer))
    }

    pub fn with_date(self, date: DateTime<Utc>) -> Self {
        Self(self.0.with_date(date))
    }

    pub fn with_max_timestamp_delta(self, delta: Duration) -> Self {
        Self(self.0.with_max_timestamp_delta(delta))
    }
}

impl Default for AssertionProofPurpose {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProofPurpose for AssertionProofPurpose {
    fn term(&self) -> &str {
        self.0.term()
    }

    async fn update(
        &self,
        proof: Proof,
        document: &Value,
        document_loader: &dyn DocumentLoader,
    ) -> Result<Proof, Error> {
        self.0.update(proof, document, document_loader).await
    }

    async fn validate(
        &self,
        proof: &Proof,
        verification_method: &VerificationMethod,
        document_loader: &dyn DocumentLoader,
    ) -> ValidationResult {
        self.0
            .validate(proof, verification_method, document_loader)
            .await
    }
}
