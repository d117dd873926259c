//! Auth module tests.

use std::collections::HashMap;

use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::SecretString;

use super::password;
use super::principal::{
    self, bearer_token, check_password, Admin, AuthError, Credentials, Directory, User,
};
use super::state::{AuthConfig, AuthState};

/// In-memory stand-in for the Postgres-backed directory.
#[derive(Default)]
struct MemoryDirectory {
    users: HashMap<String, User>,
    admins: HashMap<String, Admin>,
}

impl MemoryDirectory {
    fn with_user(mut self, user: User) -> Self {
        self.users.insert(user.username.clone(), user);
        self
    }

    fn with_admin(mut self, admin: Admin) -> Self {
        self.admins.insert(admin.username.clone(), admin);
        self
    }
}

impl Directory for MemoryDirectory {
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self.users.get(username).cloned())
    }

    async fn find_admin_by_username(&self, username: &str) -> anyhow::Result<Option<Admin>> {
        Ok(self.admins.get(username).cloned())
    }
}

fn auth_state() -> AuthState {
    let secret = SecretString::from("at-least-32-bytes-of-testing-secret".to_string());
    AuthState::new(AuthConfig::new(secret)).expect("auth state")
}

fn user(username: &str, password: &str, is_admin: bool) -> User {
    User {
        id: 1,
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: password::hash(password).expect("hash"),
        is_admin,
    }
}

fn admin(username: &str, password: &str, is_super_admin: bool) -> Admin {
    Admin {
        id: 1,
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: password::hash(password).expect("hash"),
        is_super_admin,
    }
}

#[test]
fn hash_verifies_original_password() {
    let stored = password::hash("wonderland").expect("hash");
    assert!(password::verify("wonderland", &stored));
}

#[test]
fn hash_rejects_other_password() {
    let stored = password::hash("wonderland").expect("hash");
    assert!(!password::verify("looking-glass", &stored));
}

#[test]
fn hashing_twice_salts_differently() {
    let first = password::hash("wonderland").expect("hash");
    let second = password::hash("wonderland").expect("hash");
    assert_ne!(first, second);
    assert!(password::verify("wonderland", &first));
    assert!(password::verify("wonderland", &second));
}

#[test]
fn verify_tolerates_malformed_stored_value() {
    assert!(!password::verify("anything", ""));
    assert!(!password::verify("anything", "not-a-phc-string"));
    assert!(!password::verify("anything", "$argon2id$truncated"));
}

#[test]
fn check_password_is_principal_agnostic() {
    let user = user("alice", "wonderland", false);
    let admin = admin("root", "toor", true);
    assert!(check_password(&user, "wonderland"));
    assert!(check_password(&admin, "toor"));
    assert!(!check_password(&user, "toor"));
    assert_eq!(user.username(), "alice");
    assert_eq!(admin.username(), "root");
}

#[tokio::test]
async fn resolve_user_finds_token_subject() {
    let state = auth_state();
    let directory = MemoryDirectory::default().with_user(user("alice", "wonderland", false));

    let signed = state.codec().issue("alice").expect("token");
    let resolved = principal::resolve_user(&directory, &state, &signed.token)
        .await
        .expect("resolved user");
    assert_eq!(resolved.username, "alice");
    assert_eq!(resolved.email, "alice@example.com");
}

#[tokio::test]
async fn resolve_user_after_deletion_is_principal_not_found() {
    let state = auth_state();
    // Token issued while the account existed; the directory no longer has it.
    let signed = state.codec().issue("alice").expect("token");
    let directory = MemoryDirectory::default();

    let result = principal::resolve_user(&directory, &state, &signed.token).await;
    assert!(matches!(result, Err(AuthError::PrincipalNotFound)));
}

#[tokio::test]
async fn resolve_admin_uses_admin_collection() {
    let state = auth_state();
    // Same subject on both sides; each resolver only sees its own table.
    let directory = MemoryDirectory::default()
        .with_user(user("alex", "password-a", false))
        .with_admin(admin("alex", "password-b", false));

    let signed = state.codec().issue("alex").expect("token");
    let resolved = principal::resolve_admin(&directory, &state, &signed.token)
        .await
        .expect("resolved admin");
    assert!(!resolved.is_super_admin);
}

#[tokio::test]
async fn require_user_collapses_unknown_subject() {
    let state = auth_state();
    let directory = MemoryDirectory::default();
    let signed = state.codec().issue("ghost").expect("token");

    let result = principal::require_user(&directory, &state, &signed.token).await;
    assert!(matches!(result, Err(AuthError::Unauthenticated)));
}

#[tokio::test]
async fn require_user_collapses_tampered_token() {
    let state = auth_state();
    let directory = MemoryDirectory::default().with_user(user("alice", "wonderland", false));
    let signed = state.codec().issue("alice").expect("token");
    let tampered = format!("{}x", signed.token);

    let result = principal::require_user(&directory, &state, &tampered).await;
    assert!(matches!(result, Err(AuthError::Unauthenticated)));
}

#[tokio::test]
async fn token_from_other_secret_is_rejected() {
    let state = auth_state();
    let other = AuthState::new(AuthConfig::new(SecretString::from(
        "a-completely-different-signing-key".to_string(),
    )))
    .expect("auth state");
    let directory = MemoryDirectory::default().with_user(user("alice", "wonderland", false));

    let foreign = other.codec().issue("alice").expect("token");
    let result = principal::require_user(&directory, &state, &foreign.token).await;
    assert!(matches!(result, Err(AuthError::Unauthenticated)));
}

#[tokio::test]
async fn require_admin_ignores_super_flag() {
    let state = auth_state();
    let directory = MemoryDirectory::default().with_admin(admin("ops", "password", false));
    let signed = state.codec().issue("ops").expect("token");

    let resolved = principal::require_admin(&directory, &state, &signed.token)
        .await
        .expect("admin");
    assert!(!resolved.is_super_admin);
}

#[tokio::test]
async fn require_elevated_admin_forbids_plain_admin() {
    let state = auth_state();
    let directory = MemoryDirectory::default().with_admin(admin("ops", "password", false));
    let signed = state.codec().issue("ops").expect("token");

    let result = principal::require_elevated_admin(&directory, &state, &signed.token).await;
    assert!(matches!(result, Err(AuthError::Forbidden)));
}

#[tokio::test]
async fn require_elevated_admin_accepts_super_admin() {
    let state = auth_state();
    let directory = MemoryDirectory::default().with_admin(admin("root", "toor", true));
    let signed = state.codec().issue("root").expect("token");

    let resolved = principal::require_elevated_admin(&directory, &state, &signed.token)
        .await
        .expect("super admin");
    assert!(resolved.is_super_admin);
}

#[test]
fn debug_output_redacts_password_hash() {
    let user = user("alice", "wonderland", false);
    let rendered = format!("{user:?}");
    assert!(rendered.contains("[REDACTED]"));
    assert!(!rendered.contains(&user.password_hash));

    let admin = admin("root", "toor", true);
    let rendered = format!("{admin:?}");
    assert!(!rendered.contains(&admin.password_hash));
}

#[test]
fn bearer_token_extracts_value() {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
    assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
}

#[test]
fn bearer_token_rejects_other_schemes() {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
    assert_eq!(bearer_token(&headers), None);

    headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
    assert_eq!(bearer_token(&headers), None);

    let empty = HeaderMap::new();
    assert_eq!(bearer_token(&empty), None);
}
