use std::fmt;

use crate::loader::LoaderError;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed call shape.
    Argument,
    /// Suite or purpose misconfiguration.
    Configuration,
    /// A URL could not be resolved.
    Resolution,
    /// The verification method is not authorized for the purpose.
    Authorization,
    /// The proof does not check out.
    Integrity,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("The \"document\" parameter must be an object.")]
    DocumentNotObject,
    #[error("The document to be signed must contain this suite's @context, \"{0}\".")]
    MissingSuiteContext(String),
    #[error("A signer API has not been specified.")]
    MissingSigner,
    #[error("The \"key\" parameter must contain a \"signer\" or \"verifier\" method.")]
    KeyWithoutCapability,
    #[error("No verifier could be created for verification method \"{0}\".")]
    MissingVerifier(String),
    #[error("The signer's algorithm \"{found}\" does not match the required algorithm for the cryptosuite \"{required}\".")]
    SignerAlgorithmMismatch { found: String, required: String },
    #[error("The verifier's algorithm \"{found}\" does not match the required algorithm for the cryptosuite \"{required}\".")]
    VerifierAlgorithmMismatch { found: String, required: String },
    #[error("A framer is required to check the controller document \"{0}\".")]
    MissingFramer(String),
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error("A URL \"{url}\" could not be fetched; you need to pass \"documentLoader\" or resolve the URL before calling \"{operation}\".")]
    UrlNotFetched { url: String, operation: &'static str },
    #[error("No \"verificationMethod\" found in proof.")]
    MissingVerificationMethod,
    #[error("Verification method {0} not found.")]
    VerificationMethodNotFound(String),
    #[error("Verification method \"{0}\" has no controller.")]
    MissingController(String),
    #[error("The verification method has been revoked.")]
    RevokedVerificationMethod,
    #[error("Verification method \"{method}\" not authorized by controller for proof purpose \"{purpose}\".")]
    NotAuthorized { method: String, purpose: String },
    #[error("Invalid signature.")]
    InvalidSignature,
    #[error("The proof does not include a valid \"proofValue\" property.")]
    MissingProofValue,
    #[error("Only base58btc multibase encoding is supported.")]
    UnsupportedEncoding,
    #[error("Malformed signature encoding: {0}")]
    MalformedEncoding(String),
    #[error("The proof's created timestamp is out of range.")]
    TimestampOutOfRange,
    #[error("The challenge is not as expected; challenge=\"{found}\", expected=\"{expected}\"")]
    ChallengeMismatch { found: String, expected: String },
    #[error("The domain is not as expected; domain=\"{found}\", expected=\"{expected}\"")]
    DomainMismatch { found: String, expected: String },
    #[error("No matching proofs found in the given document.")]
    NoMatchingProofs,
    #[error("Canonicalization failed: {0}")]
    Canonicalization(String),
    #[error("Framing failed: {0}")]
    Framing(String),
    #[error("Signing failed: {0}")]
    Signing(String),
    #[error("Invalid key material: {0}")]
    Key(String),
    #[error("JSON error: {0}")]
    Json(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DocumentNotObject => ErrorKind::Argument,
            Self::MissingSuiteContext(_)
            | Self::MissingSigner
            | Self::KeyWithoutCapability
            | Self::MissingVerifier(_)
            | Self::SignerAlgorithmMismatch { .. }
            | Self::MissingFramer(_) => ErrorKind::Configuration,
            Self::Loader(_)
            | Self::UrlNotFetched { .. }
            | Self::MissingVerificationMethod
            | Self::VerificationMethodNotFound(_)
            | Self::MissingController(_)
            | Self::Framing(_) => ErrorKind::Resolution,
            Self::RevokedVerificationMethod | Self::NotAuthorized { .. } => {
                ErrorKind::Authorization
            }
            Self::VerifierAlgorithmMismatch { .. }
            | Self::InvalidSignature
            | Self::MissingProofValue
            | Self::UnsupportedEncoding
            | Self::MalformedEncoding(_)
            | Self::TimestampOutOfRange
            | Self::ChallengeMismatch { .. }
            | Self::DomainMismatch { .. }
            | Self::NoMatchingProofs
            | Self::Canonicalization(_)
            | Self::Signing(_)
            | Self::Key(_)
            | Self::Json(_) => ErrorKind::Integrity,
        }
    }

    /// Returns the URL if this error reports a URL that could not be
    /// resolved because fetching is disabled.
    pub fn invalid_url(&self) -> Option<&str> {
        match self {
            Self::Loader(LoaderError::InvalidUrl(url)) => Some(url),
            _ => None,
        }
    }

    pub fn is_invalid_url(&self) -> bool {
        self.invalid_url().is_some()
    }

    /// Rewrites an unresolvable-URL error into guidance for the caller of
    /// `operation`. Other errors are returned unchanged.
    pub(crate) fn clarify_invalid_url(self, operation: &'static str) -> Self {
        match self.invalid_url() {
            Some(url) => Self::UrlNotFetched {
                url: url.to_owned(),
                operation,
            },
            None => self,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

/// Umbrella error around every error met while verifying a document.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationError {
    pub errors: Vec<Error>,
}

impl VerificationError {
    pub fn new(errors: Vec<Error>) -> Self {
        Self { errors }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn contains(&self, error: &Error) -> bool {
        self.errors.contains(error)
    }
}

impl From<Error> for VerificationError {
    fn from(e: Error) -> Self {
        Self::new(vec![e])
    }
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Verification error(s).")
    }
}

impl std::error::Error for VerificationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors
            .first()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
