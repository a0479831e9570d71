use thiserror::Error;

/// Why a bearer token was not accepted
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Unable to find appropriate key")]
    KeyNotFound(Option<String>),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid audience")]
    InvalidAudience,

    #[error("Invalid issuer")]
    InvalidIssuer,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token has no subject")]
    MissingSubject,

    /// The key set could not be fetched or decoded
    #[error("Key set unavailable: {0}")]
    KeySetUnavailable(String),
}

impl VerifyError {
    /// True when the identity provider, not the token, is at fault
    pub fn is_upstream(&self) -> bool {
        matches!(self, VerifyError::KeySetUnavailable(_))
    }
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => VerifyError::TokenExpired,
            ErrorKind::InvalidAudience => VerifyError::InvalidAudience,
            ErrorKind::InvalidIssuer => VerifyError::InvalidIssuer,
            ErrorKind::InvalidSignature => VerifyError::InvalidSignature,
            ErrorKind::InvalidAlgorithm => {
                VerifyError::UnsupportedAlgorithm("key does not match token algorithm".to_string())
            }
            ErrorKind::MissingRequiredClaim(claim) => {
                VerifyError::Malformed(format!("missing required claim: {}", claim))
            }
            _ => VerifyError::Malformed(err.to_string()),
        }
    }
}
