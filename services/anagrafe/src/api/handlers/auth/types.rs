//! Request/response types for the user and admin APIs.
//!
//! Responses are separate types from the database rows so a stored password
//! hash can never serialize onto the wire.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::principal::{Admin, User};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserCreateRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserUpdateRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub(crate) fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AdminCreateRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_super_admin: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AdminResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_super_admin: bool,
}

impl From<Admin> for AdminResponse {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username,
            email: admin.email,
            is_super_admin: admin.is_super_admin,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct DetailResponse {
    pub detail: String,
}

impl DetailResponse {
    pub(crate) fn new(detail: &str) -> Self {
        Self {
            detail: detail.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn user_create_request_round_trips() -> Result<()> {
        let request = UserCreateRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "wonderland".to_string(),
            is_admin: false,
        };
        let value = serde_json::to_value(&request)?;
        let username = value
            .get("username")
            .and_then(serde_json::Value::as_str)
            .context("missing username")?;
        assert_eq!(username, "alice");
        let decoded: UserCreateRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.email, "alice@example.com");
        Ok(())
    }

    #[test]
    fn user_create_request_defaults_is_admin() -> Result<()> {
        let decoded: UserCreateRequest = serde_json::from_str(
            r#"{"username":"bob","email":"bob@example.com","password":"builder"}"#,
        )?;
        assert!(!decoded.is_admin);
        Ok(())
    }

    #[test]
    fn token_response_is_bearer() -> Result<()> {
        let response = TokenResponse::bearer("token".to_string());
        let value = serde_json::to_value(&response)?;
        assert_eq!(
            value.get("token_type").and_then(serde_json::Value::as_str),
            Some("bearer")
        );
        Ok(())
    }

    #[test]
    fn user_response_drops_password_hash() -> Result<()> {
        let user = super::super::principal::User {
            id: 7,
            username: "carol".to_string(),
            email: "carol@example.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            is_admin: true,
        };
        let value = serde_json::to_value(UserResponse::from(user))?;
        assert!(value.get("password_hash").is_none());
        assert_eq!(
            value.get("is_admin").and_then(serde_json::Value::as_bool),
            Some(true)
        );
        Ok(())
    }

    #[test]
    fn admin_response_round_trips() -> Result<()> {
        let admin = super::super::principal::Admin {
            id: 1,
            username: "root".to_string(),
            email: "root@example.com".to_string(),
            password_hash: "hash".to_string(),
            is_super_admin: true,
        };
        let value = serde_json::to_value(AdminResponse::from(admin))?;
        let decoded: AdminResponse = serde_json::from_value(value)?;
        assert!(decoded.is_super_admin);
        assert!(serde_json::to_string(&decoded)?.contains("root@example.com"));
        Ok(())
    }
}
