//! Digest functions used to hash canonical forms.

use sha2::Digest;

/// A digest function applied to canonicalized documents and proof options.
pub type DigestFn = fn(&[u8]) -> Vec<u8>;

/// SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = sha2::Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// [`sha256`] as a [`DigestFn`].
pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    sha256(data).to_vec()
}
