use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenLensError {
    #[error("application listing unavailable: {0}")]
    ResolverUnavailable(String),

    #[error("unable to encode tokens: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Why a single token string could not be turned into a [`Token`](crate::token::Token).
///
/// Decode failures are local to one input; the batch keeps going.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unrecognized token prefix")]
    UnknownPrefix,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid token body: {0}")]
    Body(String),
}
