//! # Anagrafe (User Management API with Admin Panel)
//!
//! `anagrafe` is a small user-management service: a CRUD API over two
//! account tables (`users` and `admins`) guarded by password hashing and
//! signed bearer tokens.
//!
//! ## Authentication
//!
//! Passwords are stored as salted Argon2id PHC strings and never leave the
//! database layer. A successful login mints a short-lived HS256 bearer token
//! whose subject is the account's username; tokens are stateless and die at
//! their embedded expiry (no revocation list).
//!
//! ## Authorization
//!
//! Three guards gate every protected route:
//!
//! - `require_user` — any authenticated user.
//! - `require_admin` — any authenticated admin, super or not.
//! - `require_elevated_admin` — an admin with the super-admin flag; a plain
//!   admin receives `403 Forbidden` while authentication failures of any
//!   kind collapse to a uniform `401`.
//!
//! Principals are resolved fresh on every request, so a deleted account
//! loses access on its very next call even if its token has not expired.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
