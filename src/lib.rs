//! Linked Data Proofs for JSON-LD documents.
//!
//! This library attaches one or more cryptographic proofs to a document and
//! verifies them later against a set of accepted signature suites and a
//! required [proof purpose][proof-purposes].
//!
//! Signing canonicalizes the document and the proof options, hashes both,
//! and signs the concatenated digests. Verification derives the same bytes,
//! checks the signature, then checks that the signing key was authorized by
//! its controller for the proof's purpose.
//!
//! Two suite families are provided:
//! - [`DataIntegrityProof`], parameterized by a [`Cryptosuite`] such as
//!   [`eddsa_jcs_2022`] (requires the `ed25519` feature); and
//! - [`LinkedDataSignature`], the legacy model where the proof type names
//!   the algorithm (e.g. `Ed25519Signature2020`).
//!
//! Canonicalization, framing, document loading and key operations are
//! capabilities supplied by the caller through the [`Canonicalizer`],
//! [`Framer`], [`DocumentLoader`], [`Signer`] and [`Verifier`] traits.
//!
//! # Basic Usage
//!
//! ```
//! # #[cfg(feature = "ed25519")]
//! # async_std::task::block_on(async {
//! use std::sync::Arc;
//! use linked_data_proofs::{
//!     eddsa_jcs_2022, sign, verify, AssertionProofPurpose, DataIntegrityProof,
//!     Ed25519KeyPair, SignOptions, StaticDocumentLoader, VerifyOptions,
//! };
//! use serde_json::json;
//!
//! let key = Ed25519KeyPair::from_secret_bytes("did:example:alice#key-1", &[1; 32])
//!     .with_controller("did:example:alice");
//!
//! // Resolves the controller DID document and the key it lists.
//! let loader = StaticDocumentLoader::new().with_document(
//!     "did:example:alice",
//!     json!({
//!         "@context": "https://www.w3.org/ns/did/v1",
//!         "id": "did:example:alice",
//!         "verificationMethod": [key.to_verification_method()],
//!         "assertionMethod": ["did:example:alice#key-1"]
//!     }),
//! );
//!
//! let suite = DataIntegrityProof::new(eddsa_jcs_2022(), Some(Arc::new(key))).unwrap();
//! let purpose = AssertionProofPurpose::new();
//!
//! let signed = sign(
//!     &json!({ "hello": "world" }),
//!     SignOptions::new(&suite, &purpose).with_document_loader(&loader),
//! )
//! .await
//! .unwrap();
//!
//! let result = verify(
//!     &signed,
//!     VerifyOptions::new(&suite, &purpose).with_document_loader(&loader),
//! )
//! .await;
//! assert!(result.verified);
//! # });
//! ```
//!
//! [proof-purposes]: <https://w3c-ccg.github.io/ld-proofs/#proof-purpose>

pub mod canonicalize;
pub mod context;
#[cfg(feature = "ed25519")]
pub mod ed25519;
pub mod error;
pub mod hash;
pub mod ldp;
pub mod loader;
pub mod proof;
pub mod proof_set;
pub mod purposes;
pub mod signature;
pub mod suites;
pub mod util;

pub use canonicalize::{CanonicalizeOptions, Canonicalizer, FrameOptions, Framer, JcsCanonicalizer};
#[cfg(feature = "ed25519")]
pub use ed25519::{eddsa_jcs_2022, Ed25519KeyPair, Ed25519VerifierFactory};
pub use error::{Error, ErrorKind, VerificationError};
pub use ldp::{sign, verify};
pub use loader::{DisabledLoader, DocumentLoader, LoaderError, RemoteDocument, StaticDocumentLoader};
pub use proof::{
    ControllerRef, Proof, ValidationResult, VerificationMethod, VerificationMethodRef,
    VerificationResult,
};
pub use proof_set::{ProofResult, ProofSet, ProofSetResult, SignOptions, VerifyOptions};
pub use purposes::{
    AssertionProofPurpose, AuthenticationProofPurpose, BasicProofPurpose, ControllerProofPurpose,
    ProofPurpose,
};
pub use signature::{KeyPair, Signer, Verifier, VerifierFactory};
pub use suites::{Cryptosuite, DataIntegrityProof, LinkedDataProofSuite, LinkedDataSignature};
