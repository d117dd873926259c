//! Principal resolution and authorization guards.
//!
//! Flow Overview: extract the bearer token, decode it through the codec,
//! resolve the subject against the directory, and authorize the specific
//! operation. Each request is evaluated independently; there is no caching,
//! so a deleted or demoted principal takes effect on the very next request.

use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use sqlx::PgPool;
use std::fmt;
use thiserror::Error;
use tracing::error;

use super::state::AuthState;
use super::storage::PgDirectory;

/// A user account row.
#[derive(Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// An admin account row.
#[derive(Clone)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_super_admin: bool,
}

// Stored hashes stay out of logs, so Debug is written by hand.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

impl fmt::Debug for Admin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Admin")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("is_super_admin", &self.is_super_admin)
            .finish()
    }
}

/// Shared capability of anything that can present credentials.
///
/// Keeps password checking principal-agnostic: login flows for users and
/// admins run through the same code.
pub trait Credentials {
    fn username(&self) -> &str;
    fn password_hash(&self) -> &str;
}

impl Credentials for User {
    fn username(&self) -> &str {
        &self.username
    }

    fn password_hash(&self) -> &str {
        &self.password_hash
    }
}

impl Credentials for Admin {
    fn username(&self) -> &str {
        &self.username
    }

    fn password_hash(&self) -> &str {
        &self.password_hash
    }
}

/// Check a plaintext password against a principal's stored hash.
pub(crate) fn check_password<P: Credentials>(principal: &P, password: &str) -> bool {
    super::password::verify(password, principal.password_hash())
}

/// Lookup seam over the principal store.
///
/// `Ok(None)` is the normal not-found outcome; `Err` means the lookup itself
/// failed (connection, query) and surfaces as a 500, never as a 401.
#[allow(async_fn_in_trait)]
pub trait Directory: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_admin_by_username(&self, username: &str) -> anyhow::Result<Option<Admin>>;
}

/// Authorization failure taxonomy.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The bearer token failed decoding or validation.
    #[error("invalid bearer token")]
    InvalidToken(#[source] access_token::Error),

    /// The token was valid but its subject no longer exists.
    #[error("principal not found")]
    PrincipalNotFound,

    /// Authentication failed; the caller learns nothing more specific.
    #[error("authentication required")]
    Unauthenticated,

    /// Authenticated, but the principal lacks the required privileges.
    #[error("insufficient privileges")]
    Forbidden,

    /// The principal lookup itself failed.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidToken(_) | Self::PrincipalNotFound | Self::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Invalid authentication credentials",
            )
                .into_response(),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Insufficient privileges").into_response(),
            Self::Internal(err) => {
                error!("Failed to resolve principal: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Decode a bearer token and load the matching user.
///
/// Exactly one directory lookup per call.
///
/// # Errors
///
/// `InvalidToken` for codec failures, `PrincipalNotFound` when the subject
/// no longer exists (for example deleted after issuance), `Internal` when
/// the lookup fails.
pub async fn resolve_user<D: Directory>(
    directory: &D,
    state: &AuthState,
    token: &str,
) -> Result<User, AuthError> {
    let claims = state
        .codec()
        .decode(token)
        .map_err(AuthError::InvalidToken)?;
    directory
        .find_user_by_username(&claims.sub)
        .await?
        .ok_or(AuthError::PrincipalNotFound)
}

/// Decode a bearer token and load the matching admin.
///
/// # Errors
///
/// Identical shape to [`resolve_user`], against the admins collection.
pub async fn resolve_admin<D: Directory>(
    directory: &D,
    state: &AuthState,
    token: &str,
) -> Result<Admin, AuthError> {
    let claims = state
        .codec()
        .decode(token)
        .map_err(AuthError::InvalidToken)?;
    directory
        .find_admin_by_username(&claims.sub)
        .await?
        .ok_or(AuthError::PrincipalNotFound)
}

/// Collapse authentication-stage failures into a uniform outcome so callers
/// cannot distinguish a forged token from a deleted account.
fn collapse(err: AuthError) -> AuthError {
    match err {
        AuthError::InvalidToken(_) | AuthError::PrincipalNotFound => AuthError::Unauthenticated,
        other => other,
    }
}

/// Require an authenticated user.
///
/// # Errors
///
/// `Unauthenticated` for any authentication-stage failure.
pub async fn require_user<D: Directory>(
    directory: &D,
    state: &AuthState,
    token: &str,
) -> Result<User, AuthError> {
    resolve_user(directory, state, token).await.map_err(collapse)
}

/// Require an authenticated admin. The super-admin flag is not consulted.
///
/// # Errors
///
/// `Unauthenticated` for any authentication-stage failure.
pub async fn require_admin<D: Directory>(
    directory: &D,
    state: &AuthState,
    token: &str,
) -> Result<Admin, AuthError> {
    resolve_admin(directory, state, token)
        .await
        .map_err(collapse)
}

/// Require an authenticated admin with the super-admin flag set.
///
/// # Errors
///
/// `Unauthenticated` when authentication fails; `Forbidden` when the admin
/// authenticated but is not a super admin.
pub async fn require_elevated_admin<D: Directory>(
    directory: &D,
    state: &AuthState,
    token: &str,
) -> Result<Admin, AuthError> {
    let admin = require_admin(directory, state, token).await?;
    if admin.is_super_admin {
        Ok(admin)
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Extract the bearer token from the Authorization header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Resolve the request's bearer token into a user, or fail closed.
///
/// # Errors
///
/// `Unauthenticated` when the header is missing or authentication fails.
pub(crate) async fn current_user(
    headers: &HeaderMap,
    pool: &PgPool,
    state: &AuthState,
) -> Result<User, AuthError> {
    let Some(token) = bearer_token(headers) else {
        return Err(AuthError::Unauthenticated);
    };
    require_user(&PgDirectory::new(pool), state, token).await
}

/// Resolve the request's bearer token into an admin, or fail closed.
///
/// # Errors
///
/// `Unauthenticated` when the header is missing or authentication fails.
pub(crate) async fn current_admin(
    headers: &HeaderMap,
    pool: &PgPool,
    state: &AuthState,
) -> Result<Admin, AuthError> {
    let Some(token) = bearer_token(headers) else {
        return Err(AuthError::Unauthenticated);
    };
    require_admin(&PgDirectory::new(pool), state, token).await
}

/// Resolve the request's bearer token into a super admin, or fail closed.
///
/// # Errors
///
/// `Unauthenticated` when authentication fails; `Forbidden` for a plain
/// admin.
pub(crate) async fn current_elevated_admin(
    headers: &HeaderMap,
    pool: &PgPool,
    state: &AuthState,
) -> Result<Admin, AuthError> {
    let Some(token) = bearer_token(headers) else {
        return Err(AuthError::Unauthenticated);
    };
    require_elevated_admin(&PgDirectory::new(pool), state, token).await
}
