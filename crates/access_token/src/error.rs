use thiserror::Error;

/// Token validation failure taxonomy.
///
/// `Malformed`, `BadSignature` and `Expired` are the only outcomes of
/// [`crate::TokenCodec::decode`]; `UnsupportedAlgorithm` can only occur when
/// constructing a codec.
#[derive(Debug, Error)]
pub enum Error {
    /// The string does not parse into the expected token structure.
    #[error("malformed token")]
    Malformed,

    /// The signature does not match: tampered input, or a token signed with
    /// a different secret or algorithm.
    #[error("invalid signature")]
    BadSignature,

    /// The current time is at or past the embedded expiry.
    #[error("token expired")]
    Expired,

    /// Construction-time only: the configured algorithm identifier is not
    /// supported.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}
