//! Proof purposes.
//!
//! A proof purpose states why a proof exists. It stamps its own fields into
//! new proofs and, at verification time, checks that the signer was
//! authorized to produce a proof for that purpose.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::error::Error;
use crate::loader::DocumentLoader;
use crate::proof::{Proof, ValidationResult, VerificationMethod};
use crate::util::parse_date;

mod assertion;
mod authentication;
mod controller;

pub use assertion::AssertionProofPurpose;
pub use authentication::AuthenticationProofPurpose;
pub use controller::ControllerProofPurpose;

pub const ASSERTION_METHOD: &str = "assertionMethod";
pub const AUTHENTICATION: &str = "authentication";
pub const CAPABILITY_INVOCATION: &str = "capabilityInvocation";
pub const CAPABILITY_DELEGATION: &str = "capabilityDelegation";
pub const KEY_AGREEMENT: &str = "keyAgreement";
pub const VERIFICATION_METHOD: &str = "verificationMethod";

/// Verification relationships defined by the DID v1 context.
pub const DID_VERIFICATION_RELATIONSHIPS: [&str; 6] = [
    ASSERTION_METHOD,
    AUTHENTICATION,
    CAPABILITY_INVOCATION,
    CAPABILITY_DELEGATION,
    KEY_AGREEMENT,
    VERIFICATION_METHOD,
];

#[async_trait]
pub trait ProofPurpose: Send + Sync {
    fn term(&self) -> &str;

    /// Tests whether `proof` claims this purpose.
    fn matches(&self, proof: &Proof) -> bool {
        proof.proof_purpose.as_deref() == Some(self.term())
    }

    /// Stamps the purpose's fields into a proof being created.
    async fn update(
        &self,
        proof: Proof,
        document: &Value,
        document_loader: &dyn DocumentLoader,
    ) -> Result<Proof, Error>;

    /// Checks a proof whose signature already verified. Every failure is
    /// reported through the returned [`ValidationResult`].
    async fn validate(
        &self,
        proof: &Proof,
        verification_method: &VerificationMethod,
        document_loader: &dyn DocumentLoader,
    ) -> ValidationResult;
}

/// A purpose that only checks the proof's `created` timestamp.
#[derive(Debug, Clone)]
pub struct BasicProofPurpose {
    term: String,
    date: DateTime<Utc>,
    max_timestamp_delta: Option<Duration>,
}

impl BasicProofPurpose {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            date: Utc::now(),
            max_timestamp_delta: None,
        }
    }

    /// Reference date for the timestamp window. Defaults to the time the
    /// purpose was built.
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    /// Bounds the distance between `created` and the reference date.
    /// Unbounded by default, in which case `created` is not inspected.
    pub fn with_max_timestamp_delta(mut self, delta: Duration) -> Self {
        self.max_timestamp_delta = Some(delta);
        self
    }

    pub fn date(&self) -> &DateTime<Utc> {
        &self.date
    }

    pub fn max_timestamp_delta(&self) -> Option<Duration> {
        self.max_timestamp_delta
    }

    pub(crate) fn stamp(&self, mut proof: Proof) -> Proof {
        proof.proof_purpose = Some(self.term.clone());
        proof
    }

    pub(crate) fn validate_timestamp(&self, proof: &Proof) -> Result<(), Error> {
        let delta = match self.max_timestamp_delta {
            Some(delta) => delta,
            None => return Ok(()),
        };
        let created = proof
            .created
            .as_deref()
            .and_then(parse_date)
            .ok_or(Error::TimestampOutOfRange)?;
        // An overflowing bound leaves that side of the window open.
        let too_early = self
            .date
            .checked_sub_signed(delta)
            .map_or(false, |min| created < min);
        let too_late = self
            .date
            .checked_add_signed(delta)
            .map_or(false, |max| created > max);
        if too_early || too_late {
            return Err(Error::TimestampOutOfRange);
        }
        Ok(())
    }
}

#[async_trait]
impl ProofPurpose for BasicProofPurpose {
    fn term(&self) -> &str {
        &self.term
    }

    async fn update(
        &self,
        proof: Proof,
        _document: &Value,
        _document_loader: &dyn DocumentLoader,
    ) -> Result<Proof, Error> {
        Ok(self.stamp(proof))
    }

    async fn validate(
        &self,
        proof: &Proof,
        _verification_method: &VerificationMethod,
        _document_loader: &dyn DocumentLoader,
    ) -> ValidationResult {
        match self.validate_timestamp(proof) {
            Ok(()) => ValidationResult::valid(),
            Err(e) => ValidationResult::invalid(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::DisabledLoader;
    use chrono::TimeZone;
    use serde_json::json;

    fn proof_created(created: Option<&str>) -> Proof {
        let mut proof = Proof::new("DataIntegrityProof");
        proof.proof_purpose = Some(ASSERTION_METHOD.into());
        proof.created = created.map(str::to_owned);
        proof
    }

    fn purpose() -> BasicProofPurpose {
        BasicProofPurpose::new(ASSERTION_METHOD)
            .with_date(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn matches_on_term() {
        let p = purpose();
        assert!(p.matches(&proof_created(None)));
        let mut other = proof_created(None);
        other.proof_purpose = Some(AUTHENTICATION.into());
        assert!(!p.matches(&other));
        other.proof_purpose = None;
        assert!(!p.matches(&other));
    }

    #[async_std::test]
    async fn update_stamps_term() {
        let proof = purpose()
            .update(Proof::new("X"), &json!({}), &DisabledLoader)
            .await
            .unwrap();
        assert_eq!(proof.proof_purpose.as_deref(), Some(ASSERTION_METHOD));
    }

    #[async_std::test]
    async fn timestamp_window() {
        let vm = VerificationMethod::new("did:example:alice#key-1");
        let p = purpose().with_max_timestamp_delta(Duration::seconds(60));

        let inside = proof_created(Some("2024-01-01T12:00:59Z"));
        assert!(p.validate(&inside, &vm, &DisabledLoader).await.valid);
        let without_offset = proof_created(Some("2024-01-01T12:00:30"));
        assert!(p.validate(&without_offset, &vm, &DisabledLoader).await.valid);

        let late = proof_created(Some("2024-01-01T12:01:01Z"));
        let result = p.validate(&late, &vm, &DisabledLoader).await;
        assert!(!result.valid);
        assert_eq!(result.error, Some(Error::TimestampOutOfRange));

        let early = proof_created(Some("2024-01-01T11:58:59Z"));
        assert!(!p.validate(&early, &vm, &DisabledLoader).await.valid);

        let garbage = proof_created(Some("not a date"));
        assert!(!p.validate(&garbage, &vm, &DisabledLoader).await.valid);

        let missing = proof_created(None);
        assert!(!p.validate(&missing, &vm, &DisabledLoader).await.valid);
    }

    #[async_std::test]
    async fn unbounded_window_ignores_created() {
        let vm = VerificationMethod::new("did:example:alice#key-1");
        let garbage = proof_created(Some("not a date"));
        assert!(purpose().validate(&garbage, &vm, &DisabledLoader).await.valid);
    }
}
