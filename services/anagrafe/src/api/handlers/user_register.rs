//! Self-service user registration.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sqlx::PgPool;
use tracing::{debug, error};

use super::auth::storage::{self, Duplicate, UserWrite};
use super::auth::types::{UserCreateRequest, UserResponse};
use super::auth::password;
use super::{valid_email, EMAIL_RULE};

#[utoipa::path(
    post,
    path = "/users",
    request_body = UserCreateRequest,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid email or username/email already exists"),
    ),
    tag = "users"
)]
pub async fn register(
    pool: Extension<PgPool>,
    payload: Option<Json<UserCreateRequest>>,
) -> impl IntoResponse {
    let Some(Json(user)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    if !valid_email(&user.email) {
        return (StatusCode::BAD_REQUEST, EMAIL_RULE).into_response();
    }

    // Defensive availability check; the unique index is authoritative.
    match storage::find_user_by_username(&pool, &user.username).await {
        Ok(Some(_)) => {
            return (StatusCode::BAD_REQUEST, "Username already exists").into_response();
        }
        Ok(None) => {}
        Err(err) => {
            error!("Failed to check username availability: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let password_hash = match password::hash(&user.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // Self-registration never grants the admin flag.
    match storage::insert_user(&pool, &user.username, &user.email, &password_hash, false).await {
        Ok(UserWrite::Written(created)) => {
            debug!("User created: {}", created.username);
            (StatusCode::OK, Json(UserResponse::from(created))).into_response()
        }
        Ok(UserWrite::Duplicate(Duplicate::Username)) => {
            (StatusCode::BAD_REQUEST, "Username already exists").into_response()
        }
        Ok(UserWrite::Duplicate(Duplicate::Email)) => {
            (StatusCode::BAD_REQUEST, "Email already exists").into_response()
        }
        Err(err) => {
            error!("Failed to create user: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
