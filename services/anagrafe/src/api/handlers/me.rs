//! Authenticated self-service profile.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;

use super::auth::principal::current_user;
use super::auth::types::UserResponse;
use super::auth::AuthState;

#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Return the authenticated user profile", body = UserResponse),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
    tag = "users"
)]
pub async fn me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    match current_user(&headers, &pool, &auth_state).await {
        Ok(user) => (StatusCode::OK, Json(UserResponse::from(user))).into_response(),
        Err(err) => err.into_response(),
    }
}
