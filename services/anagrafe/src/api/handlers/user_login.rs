//! User login: verify credentials, mint a bearer token.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error};

use super::auth::principal::check_password;
use super::auth::types::{LoginRequest, TokenResponse};
use super::auth::{storage, AuthState};

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Unknown username or wrong password"),
    ),
    tag = "users"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(login)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    let user = match storage::find_user_by_username(&pool, &login.username).await {
        Ok(user) => user,
        Err(err) => {
            error!("Failed to lookup user for login: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // Unknown usernames and wrong passwords are indistinguishable to callers.
    let Some(user) = user else {
        return (StatusCode::UNAUTHORIZED, "Invalid Username or Password").into_response();
    };
    if !check_password(&user, &login.password) {
        return (StatusCode::UNAUTHORIZED, "Invalid Username or Password").into_response();
    }

    match auth_state.codec().issue(&user.username) {
        Ok(signed) => {
            debug!("Login successful: {}", user.username);
            (StatusCode::OK, Json(TokenResponse::bearer(signed.token))).into_response()
        }
        Err(err) => {
            error!("Failed to issue token: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
