use serde_json::Value;

use crate::error::{Error, VerificationError};
use crate::proof_set::{ProofSet, ProofSetResult, SignOptions, VerifyOptions};

/// Signs `document`, returning a copy with the new proof attached.
///
/// When no document loader is given, a URL that could not be dereferenced
/// is reported as [`Error::UrlNotFetched`].
// https://w3c-ccg.github.io/ld-proofs/#proof-algorithm
pub async fn sign(document: &Value, options: SignOptions<'_>) -> Result<Value, Error> {
    if !document.is_object() {
        return Err(Error::DocumentNotObject);
    }
    let loader_supplied = options.document_loader.is_some();
    ProofSet.add(document, &options).await.map_err(|e| {
        if loader_supplied {
            e
        } else {
            e.clarify_invalid_url("sign")
        }
    })
}

/// Verifies the proofs of `document`. Never fails: the outcome, including
/// every error met, is in the returned [`ProofSetResult`].
// https://w3c-ccg.github.io/ld-proofs/#proof-verification-algorithm
pub async fn verify(document: &Value, options: VerifyOptions<'_>) -> ProofSetResult {
    let mut result = ProofSet.verify(document, &options).await;
    if options.document_loader.is_some() {
        return result;
    }
    let clarify = |e: Error| e.clarify_invalid_url("verify");
    for proof_result in &mut result.results {
        proof_result.error = proof_result.error.take().map(clarify);
        if let Some(purpose_result) = &mut proof_result.purpose_result {
            purpose_result.error = purpose_result.error.take().map(clarify);
        }
    }
    result.error = result
        .error
        .map(|error| VerificationError::new(error.errors.into_iter().map(clarify).collect()));
    result
}
