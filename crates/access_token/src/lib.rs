//! Signed bearer token issuance and validation.
//!
//! This crate is intentionally decoupled from HTTP and storage: a
//! [`TokenCodec`] is a pure function of its immutable configuration (shared
//! secret, algorithm identifier, token lifetime) and the clock. Tokens are
//! compact HS256 JWTs carrying a subject, an issued-at and an expiry claim.
//!
//! Tokens are stateless by design: nothing is persisted server-side, and a
//! token dies at its embedded expiry. There is no revocation mechanism; the
//! small configured lifetime bounds the exposure window.

mod error;
mod jwt;

pub use error::Error;
pub use jwt::{Claims, SignedToken, TokenCodec, ALGORITHM_HS256};
