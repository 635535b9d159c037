//! Ed25519 signing and verification, and the `eddsa-jcs-2022` cryptosuite.

use std::sync::Arc;

use async_trait::async_trait;
use ed25519_dalek::{Signer as _, Verifier as _};
use multibase::Base;

use crate::canonicalize::JcsCanonicalizer;
use crate::error::Error;
use crate::proof::VerificationMethod;
use crate::signature::{KeyPair, Signer, Verifier, VerifierFactory};
use crate::suites::Cryptosuite;

pub const ED25519: &str = "Ed25519";
pub const EDDSA_JCS_2022: &str = "eddsa-jcs-2022";

/// Multicodec prefix of an Ed25519 public key.
const ED25519_PUB_MULTICODEC: [u8; 2] = [0xed, 0x01];

/// An Ed25519 key bound to a verification method.
#[derive(Clone)]
pub struct Ed25519KeyPair {
    id: String,
    controller: Option<String>,
    signing_key: Option<ed25519_dalek::SigningKey>,
    verifying_key: ed25519_dalek::VerifyingKey,
}

impl Ed25519KeyPair {
    pub fn from_secret_bytes(id: impl Into<String>, secret: &[u8; 32]) -> Self {
        let signing_key = ed25519_dalek::SigningKey::from_bytes(secret);
        Self {
            id: id.into(),
            controller: None,
            verifying_key: signing_key.verifying_key(),
            signing_key: Some(signing_key),
        }
    }

    /// A verify-only key.
    pub fn from_public_bytes(id: impl Into<String>, public: &[u8; 32]) -> Result<Self, Error> {
        let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(public)
            .map_err(|e| Error::Key(e.to_string()))?;
        Ok(Self {
            id: id.into(),
            controller: None,
            signing_key: None,
            verifying_key,
        })
    }

    /// Decodes a `z`-multibase Ed25519 multikey.
    pub fn from_public_key_multibase(id: impl Into<String>, encoded: &str) -> Result<Self, Error> {
        let (base, bytes) =
            multibase::decode(encoded).map_err(|e| Error::MalformedEncoding(e.to_string()))?;
        if base != Base::Base58Btc {
            return Err(Error::UnsupportedEncoding);
        }
        let key = bytes
            .strip_prefix(&ED25519_PUB_MULTICODEC[..])
            .ok_or_else(|| Error::Key("not an Ed25519 public key".to_owned()))?;
        Self::from_public_bytes(id, &public_key_bytes(key)?)
    }

    pub fn with_controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    pub fn controller(&self) -> Option<&str> {
        self.controller.as_deref()
    }

    pub fn public_key_multibase(&self) -> String {
        let bytes = [&ED25519_PUB_MULTICODEC[..], self.verifying_key.as_bytes()].concat();
        multibase::encode(Base::Base58Btc, bytes)
    }

    /// The `Multikey` verification method document of this key.
    pub fn to_verification_method(&self) -> serde_json::Value {
        let mut vm = serde_json::json!({
            "id": self.id,
            "type": "Multikey",
            "publicKeyMultibase": self.public_key_multibase(),
        });
        if let Some(controller) = &self.controller {
            vm["controller"] = serde_json::Value::String(controller.clone());
        }
        vm
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519KeyPair")
            .field("id", &self.id)
            .field("public_key_multibase", &self.public_key_multibase())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Signer for Ed25519KeyPair {
    fn id(&self) -> &str {
        &self.id
    }

    fn algorithm(&self) -> Option<&str> {
        Some(ED25519)
    }

    async fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        let signing_key = self
            .signing_key
            .as_ref()
            .ok_or_else(|| Error::Signing(format!("key {} cannot sign", self.id)))?;
        Ok(signing_key.sign(data).to_bytes().to_vec())
    }
}

#[async_trait]
impl Verifier for Ed25519KeyPair {
    fn id(&self) -> &str {
        &self.id
    }

    fn algorithm(&self) -> Option<&str> {
        Some(ED25519)
    }

    async fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool, Error> {
        let signature = ed25519_dalek::Signature::from_slice(signature)
            .map_err(|e| Error::MalformedEncoding(e.to_string()))?;
        Ok(self.verifying_key.verify(data, &signature).is_ok())
    }
}

impl KeyPair for Ed25519KeyPair {
    fn id(&self) -> &str {
        &self.id
    }

    fn signer(&self) -> Option<Arc<dyn Signer>> {
        match self.signing_key {
            Some(_) => Some(Arc::new(self.clone())),
            None => None,
        }
    }

    fn verifier(&self) -> Option<Arc<dyn Verifier>> {
        Some(Arc::new(self.clone()))
    }
}

/// Builds Ed25519 verifiers from `Multikey` (`publicKeyMultibase`) or
/// `Ed25519VerificationKey2018` (`publicKeyBase58`) verification methods.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519VerifierFactory;

#[async_trait]
impl VerifierFactory for Ed25519VerifierFactory {
    async fn create_verifier(
        &self,
        verification_method: &VerificationMethod,
    ) -> Result<Arc<dyn Verifier>, Error> {
        let id = verification_method.id.clone();
        if let Some(encoded) = verification_method
            .property("publicKeyMultibase")
            .and_then(|v| v.as_str())
        {
            return Ok(Arc::new(Ed25519KeyPair::from_public_key_multibase(
                id, encoded,
            )?));
        }
        if let Some(encoded) = verification_method
            .property("publicKeyBase58")
            .and_then(|v| v.as_str())
        {
            let bytes = bs58::decode(encoded)
                .into_vec()
                .map_err(|e| Error::MalformedEncoding(e.to_string()))?;
            return Ok(Arc::new(Ed25519KeyPair::from_public_bytes(
                id,
                &public_key_bytes(&bytes)?,
            )?));
        }
        Err(Error::MissingVerifier(id))
    }
}

/// The `eddsa-jcs-2022` cryptosuite: JCS canonicalization and Ed25519.
pub fn eddsa_jcs_2022() -> Cryptosuite {
    Cryptosuite::new(
        EDDSA_JCS_2022,
        ED25519,
        Arc::new(JcsCanonicalizer),
        Arc::new(Ed25519VerifierFactory),
    )
}

fn public_key_bytes(bytes: &[u8]) -> Result<[u8; 32], Error> {
    bytes
        .try_into()
        .map_err(|_| Error::Key(format!("expected 32 bytes, found {}", bytes.len())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: [u8; 32] = [7; 32];

    fn key() -> Ed25519KeyPair {
        Ed25519KeyPair::from_secret_bytes("did:example:alice#key-1", &SECRET)
            .with_controller("did:example:alice")
    }

    #[async_std::test]
    async fn sign_verify() {
        let key = key();
        let signature = Signer::sign(&key, b"hello").await.unwrap();
        assert_eq!(signature.len(), 64);
        assert!(Verifier::verify(&key, b"hello", &signature).await.unwrap());
        assert!(!Verifier::verify(&key, b"hellO", &signature).await.unwrap());
        assert!(Verifier::verify(&key, b"hello", &signature[1..]).await.is_err());
    }

    #[test]
    fn public_key_multibase_round_trip() {
        let key = key();
        let encoded = key.public_key_multibase();
        assert!(encoded.starts_with("z6Mk"));
        let public = Ed25519KeyPair::from_public_key_multibase("x", &encoded).unwrap();
        assert_eq!(public.public_key_multibase(), encoded);
        assert!(KeyPair::signer(&public).is_none());
        assert!(KeyPair::verifier(&public).is_some());
    }

    #[async_std::test]
    async fn factory_reads_verification_method() {
        let key = key();
        let signature = Signer::sign(&key, b"data").await.unwrap();

        let vm = VerificationMethod::from_value(key.to_verification_method()).unwrap();
        assert_eq!(vm.controller_id(), Some("did:example:alice"));
        let verifier = Ed25519VerifierFactory.create_verifier(&vm).await.unwrap();
        assert_eq!(verifier.algorithm(), Some(ED25519));
        assert!(verifier.verify(b"data", &signature).await.unwrap());

        let vm = VerificationMethod::from_value(json!({
            "id": "did:example:alice#key-1",
            "type": "Ed25519VerificationKey2018",
            "publicKeyBase58": bs58::encode(key.verifying_key.as_bytes()).into_string()
        }))
        .unwrap();
        let verifier = Ed25519VerifierFactory.create_verifier(&vm).await.unwrap();
        assert!(verifier.verify(b"data", &signature).await.unwrap());

        let vm = VerificationMethod::new("did:example:alice#key-1");
        assert!(matches!(
            Ed25519VerifierFactory.create_verifier(&vm).await,
            Err(Error::MissingVerifier(_))
        ));
    }
}
