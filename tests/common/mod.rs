#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use linked_data_proofs::{
    context::{DID_CONTEXT_V1_URL, ED25519_2020_CONTEXT_URL},
    eddsa_jcs_2022, DataIntegrityProof, Ed25519KeyPair, Ed25519VerifierFactory, Error,
    FrameOptions, Framer, JcsCanonicalizer, LinkedDataSignature, LoaderError,
    StaticDocumentLoader,
};
use serde_json::{json, Value};

pub const ALICE: &str = "did:example:alice";
pub const ALICE_KEY: &str = "did:example:alice#key-1";
pub const BOB: &str = "did:example:bob";
pub const BOB_KEY: &str = "did:example:bob#key-1";

pub fn alice_key() -> Ed25519KeyPair {
    Ed25519KeyPair::from_secret_bytes(ALICE_KEY, &[0x11; 32]).with_controller(ALICE)
}

pub fn bob_key() -> Ed25519KeyPair {
    Ed25519KeyPair::from_secret_bytes(BOB_KEY, &[0x22; 32]).with_controller(BOB)
}

pub fn signing_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 6, 1, 9, 30, 0).unwrap()
}

/// A DID document listing `key` under each of `relationships`.
pub fn did_document(did: &str, key: &Ed25519KeyPair, relationships: &[&str]) -> Value {
    let mut document = json!({
        "@context": [DID_CONTEXT_V1_URL, ED25519_2020_CONTEXT_URL],
        "id": did,
        "verificationMethod": [key.to_verification_method()],
    });
    for relationship in relationships {
        document[*relationship] = json!([linked_data_proofs::KeyPair::id(key)]);
    }
    document
}

/// Alice may assert and authenticate; Bob's key is listed for authentication
/// only.
pub fn loader() -> StaticDocumentLoader {
    StaticDocumentLoader::new()
        .with_document(
            ALICE,
            did_document(ALICE, &alice_key(), &["assertionMethod", "authentication"]),
        )
        .with_document(BOB, did_document(BOB, &bob_key(), &["authentication"]))
}

pub fn data_integrity(key: Ed25519KeyPair) -> DataIntegrityProof {
    DataIntegrityProof::new(eddsa_jcs_2022(), Some(Arc::new(key)))
        .unwrap()
        .with_date(signing_date())
}

pub fn ed25519_signature_2020(key: Ed25519KeyPair) -> LinkedDataSignature {
    LinkedDataSignature::new(
        "Ed25519Signature2020",
        ED25519_2020_CONTEXT_URL,
        Arc::new(JcsCanonicalizer),
        Arc::new(LoadingFramer),
    )
    .with_key(Arc::new(key))
    .unwrap()
    .with_verifier_factory(Arc::new(Ed25519VerifierFactory))
    .with_required_algorithm("Ed25519")
    .with_date(signing_date())
}

/// An `Ed25519Signature2020` suite that can only verify, building verifiers
/// from the resolved verification methods.
pub fn ed25519_signature_2020_verifier() -> LinkedDataSignature {
    LinkedDataSignature::new(
        "Ed25519Signature2020",
        ED25519_2020_CONTEXT_URL,
        Arc::new(JcsCanonicalizer),
        Arc::new(LoadingFramer),
    )
    .with_verifier_factory(Arc::new(Ed25519VerifierFactory))
    .with_required_algorithm("Ed25519")
}

pub fn credential() -> Value {
    json!({
        "@context": ["https://www.w3.org/2018/credentials/v1"],
        "type": ["VerifiableCredential"],
        "issuer": ALICE,
        "issuanceDate": "2022-06-01T09:09:48Z",
        "credentialSubject": {
            "id": "did:example:subject",
            "name": "Subject"
        }
    })
}

/// Returns documents as given, dereferencing URLs first. Enough for the flat
/// documents of these tests.
pub struct LoadingFramer;

#[async_trait]
impl Framer for LoadingFramer {
    async fn frame(
        &self,
        input: &Value,
        _frame: &Value,
        options: FrameOptions<'_>,
    ) -> Result<Option<Value>, Error> {
        let url = match input {
            Value::String(url) => url,
            other => return Ok(Some(other.clone())),
        };
        match options.document_loader.load(url).await {
            Ok(remote) => Ok(Some(remote.into_json()?)),
            Err(LoaderError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Re-encodes `proof.proofValue` with one signature bit flipped.
pub fn tamper_proof_value(proof: &mut Value) {
    let encoded = proof["proofValue"].as_str().unwrap();
    let mut signature = bs58::decode(&encoded[1..]).into_vec().unwrap();
    signature[0] ^= 0x01;
    proof["proofValue"] = json!(format!("z{}", bs58::encode(signature).into_string()));
}
