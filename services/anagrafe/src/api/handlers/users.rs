//! Self-service user endpoints.
//!
//! Flow Overview:
//! 1) Authenticate the request via bearer token.
//! 2) Enforce that callers only touch their own account.
//! 3) Apply allow-listed updates or delete the account.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::auth::password;
use super::auth::principal::current_user;
use super::auth::storage::{self, Duplicate, UserWrite};
use super::auth::types::{DetailResponse, UserResponse, UserUpdateRequest};
use super::auth::AuthState;
use super::{valid_email, EMAIL_RULE};

#[utoipa::path(
    put,
    path = "/users/{user_id}",
    request_body = UserUpdateRequest,
    params(
        ("user_id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Not the caller's own profile"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn update_user(
    Path(user_id): Path<i64>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<UserUpdateRequest>>,
) -> Response {
    let current = match current_user(&headers, &pool, &auth_state).await {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    // Users can only update their own profile.
    if current.id != user_id {
        return (
            StatusCode::FORBIDDEN,
            "You can only update your own profile",
        )
            .into_response();
    }

    let Some(Json(update)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    if let Some(email) = update.email.as_deref() {
        if !valid_email(email) {
            return (StatusCode::BAD_REQUEST, EMAIL_RULE).into_response();
        }
    }

    let password_hash = match update.password.as_deref() {
        Some(password) => match password::hash(password) {
            Ok(hash) => Some(hash),
            Err(err) => {
                error!("Failed to hash password: {err}");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        },
        None => None,
    };

    // A caller cannot change their own admin flag; any submitted value is
    // pinned to the current one.
    let is_admin = update.is_admin.map(|_| current.is_admin);

    let written = storage::update_user(
        &pool,
        user_id,
        update.username.as_deref(),
        update.email.as_deref(),
        password_hash.as_deref(),
        is_admin,
    )
    .await;

    match written {
        Ok(Some(UserWrite::Written(user))) => {
            (StatusCode::OK, Json(UserResponse::from(user))).into_response()
        }
        Ok(Some(UserWrite::Duplicate(Duplicate::Username))) => {
            (StatusCode::BAD_REQUEST, "Username already exists").into_response()
        }
        Ok(Some(UserWrite::Duplicate(Duplicate::Email))) => {
            (StatusCode::BAD_REQUEST, "Email already exists").into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(err) => {
            error!("Failed to update user: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    params(
        ("user_id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Account deleted", body = DetailResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Not the caller's own account"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn delete_user(
    Path(user_id): Path<i64>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Response {
    let current = match current_user(&headers, &pool, &auth_state).await {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    // Users can only delete their own account.
    if current.id != user_id {
        return (
            StatusCode::FORBIDDEN,
            "You can only delete your own account",
        )
            .into_response();
    }

    match storage::delete_user(&pool, user_id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(DetailResponse::new("User deleted successfully")),
        )
            .into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(err) => {
            error!("Failed to delete user: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
