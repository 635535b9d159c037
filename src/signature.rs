//! Signing and verification capabilities.
//!
//! Suites never touch key material directly. They sign through a [`Signer`]
//! and check signatures through a [`Verifier`], both of which may be backed
//! by a local key, a hardware module or a remote service.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Error;
use crate::proof::VerificationMethod;

#[async_trait]
pub trait Signer: Send + Sync {
    /// Verification method id written into the proof.
    fn id(&self) -> &str;

    /// Signature algorithm, compared against a cryptosuite's required
    /// algorithm when one is set.
    fn algorithm(&self) -> Option<&str> {
        None
    }

    async fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error>;
}

#[async_trait]
pub trait Verifier: Send + Sync {
    fn id(&self) -> &str;

    fn algorithm(&self) -> Option<&str> {
        None
    }

    /// Returns `Ok(false)` for a well-formed signature that does not match.
    async fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool, Error>;
}

/// A key exposing a signer, a verifier, or both.
pub trait KeyPair: Send + Sync {
    fn id(&self) -> &str;

    fn signer(&self) -> Option<Arc<dyn Signer>>;

    fn verifier(&self) -> Option<Arc<dyn Verifier>>;
}

/// Builds a verifier from a resolved verification method.
#[async_trait]
pub trait VerifierFactory: Send + Sync {
    async fn create_verifier(
        &self,
        verification_method: &VerificationMethod,
    ) -> Result<Arc<dyn Verifier>, Error>;
}

#[async_trait]
impl<T: Signer + ?Sized> Signer for Arc<T> {
    fn id(&self) -> &str {
        T::id(self)
    }

    fn algorithm(&self) -> Option<&str> {
        T::algorithm(self)
    }

    async fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        T::sign(self, data).await
    }
}

#[async_trait]
impl<T: Verifier + ?Sized> Verifier for Arc<T> {
    fn id(&self) -> &str {
        T::id(self)
    }

    fn algorithm(&self) -> Option<&str> {
        T::algorithm(self)
    }

    async fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool, Error> {
        T::verify(self, data, signature).await
    }
}

/// Checks that `found` satisfies the `required` algorithm, if any.
pub(crate) fn check_algorithm(
    found: Option<&str>,
    required: Option<&str>,
    mismatch: impl FnOnce(String, String) -> Error,
) -> Result<(), Error> {
    match required {
        Some(required) if found != Some(required) => Err(mismatch(
            found.unwrap_or_default().to_owned(),
            required.to_owned(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_check() {
        let mismatch = |found, required| Error::SignerAlgorithmMismatch { found, required };
        assert_eq!(check_algorithm(Some("Ed25519"), Some("Ed25519"), mismatch), Ok(()));
        assert_eq!(check_algorithm(None, None, mismatch), Ok(()));
        assert_eq!(check_algorithm(Some("ES256"), None, mismatch), Ok(()));
        assert_eq!(
            check_algorithm(Some("ES256"), Some("Ed25519"), mismatch),
            Err(Error::SignerAlgorithmMismatch {
                found: "ES256".into(),
                required: "Ed25519".into()
            })
        );
        assert_eq!(
            check_algorithm(None, Some("Ed25519"), mismatch),
            Err(Error::SignerAlgorithmMismatch {
                found: "".into(),
                required: "Ed25519".into()
            })
        );
    }
}
