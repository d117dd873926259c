//! Authentication and authorization.
//!
//! This module coordinates credential verification, bearer token issuance
//! and the guards that gate user vs. admin access.
//!
//! ## Token model
//!
//! Login verifies the submitted password against the stored Argon2id hash
//! and mints a short-lived HS256 token whose subject is the account's
//! username. Tokens are stateless: nothing is stored server-side, nothing is
//! revoked early, and the configured lifetime (minutes) bounds exposure.
//!
//! ## Failure policy
//!
//! Guards collapse every authentication-stage failure (bad signature,
//! expired token, unknown subject) into a uniform `401`; only a
//! successfully authenticated admin lacking the super-admin flag receives a
//! distinct `403`. Callers never learn *why* a token was rejected.

pub(crate) mod password;
pub(crate) mod principal;
mod state;
pub(crate) mod storage;
pub(crate) mod types;

pub use principal::{
    require_admin, require_elevated_admin, require_user, AuthError, Directory,
};
pub use state::{AuthConfig, AuthState, BootstrapAdmin};

#[cfg(test)]
mod tests;
