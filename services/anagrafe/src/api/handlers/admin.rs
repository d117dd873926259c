//! Admin panel endpoints.
//!
//! Flow Overview:
//! 1) Authenticate against the admins table via bearer token.
//! 2) User-management routes additionally require the super-admin flag; a
//!    plain admin authenticates fine but receives 403.
//! 3) Perform the requested read or write against the users table.

use axum::{
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::IntoParams;

use super::auth::password;
use super::auth::principal::{check_password, current_admin, current_elevated_admin};
use super::auth::storage::{self, AdminWrite, Duplicate, UserWrite};
use super::auth::types::{
    AdminCreateRequest, AdminResponse, DetailResponse, LoginRequest, TokenResponse,
    UserCreateRequest, UserResponse, UserUpdateRequest,
};
use super::auth::AuthState;
use super::{valid_email, EMAIL_RULE};

const DEFAULT_LIST_LIMIT: i64 = 100;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    /// Rows to skip before the first result.
    pub skip: Option<i64>,
    /// Maximum rows to return (default 100).
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Admin dashboard info page"),
    ),
    tag = "admin"
)]
pub async fn dashboard() -> impl IntoResponse {
    Json(json!({
        "message": "Admin Dashboard",
        "available_endpoints": {
            "admin_login": "POST /admin/login",
            "admin_create_user": "POST /admin/users",
            "admin_get_all_users": "GET /admin/users",
            "admin_get_user": "GET /admin/users/{user_id}",
            "admin_update_user": "PUT /admin/users/{user_id}",
            "admin_delete_user": "DELETE /admin/users/{user_id}",
            "admin_create_admin": "POST /admin/admins",
            "admin_profile": "GET /admin/me"
        },
        "note": "Use POST /admin/login to authenticate and get access token"
    }))
}

#[utoipa::path(
    post,
    path = "/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Unknown admin or wrong password"),
    ),
    tag = "admin"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(login)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    let admin = match storage::find_admin_by_username(&pool, &login.username).await {
        Ok(admin) => admin,
        Err(err) => {
            error!("Failed to lookup admin for login: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let Some(admin) = admin else {
        return (
            StatusCode::UNAUTHORIZED,
            "Invalid Admin Username or Password",
        )
            .into_response();
    };
    if !check_password(&admin, &login.password) {
        return (
            StatusCode::UNAUTHORIZED,
            "Invalid Admin Username or Password",
        )
            .into_response();
    }

    match auth_state.codec().issue(&admin.username) {
        Ok(signed) => {
            debug!("Admin login successful: {}", admin.username);
            (StatusCode::OK, Json(TokenResponse::bearer(signed.token))).into_response()
        }
        Err(err) => {
            error!("Failed to issue admin token: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/admin/me",
    responses(
        (status = 200, description = "Return the authenticated admin profile", body = AdminResponse),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
    tag = "admin"
)]
pub async fn me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    match current_admin(&headers, &pool, &auth_state).await {
        Ok(admin) => (StatusCode::OK, Json(AdminResponse::from(admin))).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/admin/users",
    request_body = UserCreateRequest,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid email or username/email already exists"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Admin lacks the super-admin flag"),
    ),
    tag = "admin"
)]
pub async fn create_user(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<UserCreateRequest>>,
) -> Response {
    let admin = match current_elevated_admin(&headers, &pool, &auth_state).await {
        Ok(admin) => admin,
        Err(err) => return err.into_response(),
    };
    debug!("Admin create user requested by {}", admin.username);

    let Some(Json(user)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    if !valid_email(&user.email) {
        return (StatusCode::BAD_REQUEST, EMAIL_RULE).into_response();
    }

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

    // Unlike self-registration, the admin panel may grant the admin flag.
    match storage::insert_user(
        &pool,
        &user.username,
        &user.email,
        &password_hash,
        user.is_admin,
    )
    .await
    {
        Ok(UserWrite::Written(created)) => {
            debug!("User created by admin: {}", created.username);
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

#[utoipa::path(
    get,
    path = "/admin/users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "List users", body = [UserResponse]),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Admin lacks the super-admin flag"),
    ),
    tag = "admin"
)]
pub async fn list_users(
    headers: HeaderMap,
    Query(query): Query<ListUsersQuery>,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Response {
    if let Err(err) = current_elevated_admin(&headers, &pool, &auth_state).await {
        return err.into_response();
    }

    let skip = query.skip.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).max(0);

    match storage::list_users(&pool, skip, limit).await {
        Ok(users) => {
            let list: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
            (StatusCode::OK, Json(list)).into_response()
        }
        Err(err) => {
            error!("Failed to list users: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/admin/users/{user_id}",
    params(
        ("user_id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User detail", body = UserResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Admin lacks the super-admin flag"),
        (status = 404, description = "User not found"),
    ),
    tag = "admin"
)]
pub async fn get_user(
    Path(user_id): Path<i64>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Response {
    if let Err(err) = current_elevated_admin(&headers, &pool, &auth_state).await {
        return err.into_response();
    }

    match storage::find_user_by_id(&pool, user_id).await {
        Ok(Some(user)) => (StatusCode::OK, Json(UserResponse::from(user))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(err) => {
            error!("Failed to fetch user: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/admin/users/{user_id}",
    request_body = UserUpdateRequest,
    params(
        ("user_id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Admin lacks the super-admin flag"),
        (status = 404, description = "User not found"),
    ),
    tag = "admin"
)]
pub async fn update_user(
    Path(user_id): Path<i64>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<UserUpdateRequest>>,
) -> Response {
    if let Err(err) = current_elevated_admin(&headers, &pool, &auth_state).await {
        return err.into_response();
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

    // The admin panel may toggle the target's admin flag freely.
    let written = storage::update_user(
        &pool,
        user_id,
        update.username.as_deref(),
        update.email.as_deref(),
        password_hash.as_deref(),
        update.is_admin,
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
    path = "/admin/users/{user_id}",
    params(
        ("user_id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User deleted", body = DetailResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Admin lacks the super-admin flag"),
        (status = 404, description = "User not found"),
    ),
    tag = "admin"
)]
pub async fn delete_user(
    Path(user_id): Path<i64>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Response {
    if let Err(err) = current_elevated_admin(&headers, &pool, &auth_state).await {
        return err.into_response();
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

#[utoipa::path(
    post,
    path = "/admin/admins",
    request_body = AdminCreateRequest,
    responses(
        (status = 200, description = "Admin created", body = AdminResponse),
        (status = 400, description = "Invalid email or username/email already exists"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Admin lacks the super-admin flag"),
    ),
    tag = "admin"
)]
pub async fn create_admin(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<AdminCreateRequest>>,
) -> Response {
    let actor = match current_elevated_admin(&headers, &pool, &auth_state).await {
        Ok(admin) => admin,
        Err(err) => return err.into_response(),
    };

    let Some(Json(admin)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    if !valid_email(&admin.email) {
        return (StatusCode::BAD_REQUEST, EMAIL_RULE).into_response();
    }

    let password_hash = match password::hash(&admin.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let written = storage::insert_admin(
        &pool,
        &admin.username,
        &admin.email,
        &password_hash,
        admin.is_super_admin,
    )
    .await;

    match written {
        Ok(AdminWrite::Written(created)) => {
            debug!(
                "Admin account {} created by {}",
                created.username, actor.username
            );
            (StatusCode::OK, Json(AdminResponse::from(created))).into_response()
        }
        Ok(AdminWrite::Duplicate(Duplicate::Username)) => {
            (StatusCode::BAD_REQUEST, "Username already exists").into_response()
        }
        Ok(AdminWrite::Duplicate(Duplicate::Email)) => {
            (StatusCode::BAD_REQUEST, "Email already exists").into_response()
        }
        Err(err) => {
            error!("Failed to create admin: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
