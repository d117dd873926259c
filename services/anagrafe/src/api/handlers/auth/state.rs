//! Auth state and immutable token configuration.

use access_token::TokenCodec;
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use time::Duration;

const DEFAULT_TOKEN_LIFETIME_MINUTES: i64 = 30;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    token_secret: SecretString,
    token_algorithm: String,
    token_lifetime_minutes: i64,
    cors_origin: Option<String>,
}

impl AuthConfig {
    #[must_use]
    pub fn new(token_secret: SecretString) -> Self {
        Self {
            token_secret,
            token_algorithm: access_token::ALGORITHM_HS256.to_string(),
            token_lifetime_minutes: DEFAULT_TOKEN_LIFETIME_MINUTES,
            cors_origin: None,
        }
    }

    #[must_use]
    pub fn with_token_algorithm(mut self, algorithm: String) -> Self {
        self.token_algorithm = algorithm;
        self
    }

    #[must_use]
    pub fn with_token_lifetime_minutes(mut self, minutes: i64) -> Self {
        self.token_lifetime_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_cors_origin(mut self, origin: Option<String>) -> Self {
        self.cors_origin = origin;
        self
    }

    #[must_use]
    pub fn token_algorithm(&self) -> &str {
        &self.token_algorithm
    }

    #[must_use]
    pub fn token_lifetime_minutes(&self) -> i64 {
        self.token_lifetime_minutes
    }

    #[must_use]
    pub fn cors_origin(&self) -> Option<&str> {
        self.cors_origin.as_deref()
    }
}

/// Bootstrap super admin created at startup when the admins table is empty.
#[derive(Debug)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: SecretString,
}

/// Process-wide auth state: the configuration and the token codec built from
/// it, both immutable after construction.
pub struct AuthState {
    config: AuthConfig,
    codec: TokenCodec,
}

impl AuthState {
    /// Build the state, constructing the token codec once.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured algorithm is unsupported.
    pub fn new(config: AuthConfig) -> Result<Self> {
        let codec = TokenCodec::new(
            config.token_secret.expose_secret().as_bytes(),
            config.token_algorithm(),
            Duration::minutes(config.token_lifetime_minutes()),
        )
        .context("failed to build token codec")?;

        Ok(Self { config, codec })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthConfig, AuthState};
    use secrecy::SecretString;

    fn secret() -> SecretString {
        SecretString::from("at-least-32-bytes-of-testing-secret".to_string())
    }

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new(secret());

        assert_eq!(config.token_algorithm(), "HS256");
        assert_eq!(
            config.token_lifetime_minutes(),
            super::DEFAULT_TOKEN_LIFETIME_MINUTES
        );
        assert!(config.cors_origin().is_none());

        let config = config
            .with_token_lifetime_minutes(5)
            .with_cors_origin(Some("http://localhost:8502".to_string()));

        assert_eq!(config.token_lifetime_minutes(), 5);
        assert_eq!(config.cors_origin(), Some("http://localhost:8502"));
    }

    #[test]
    fn auth_config_debug_redacts_secret() {
        let config = AuthConfig::new(secret());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("testing-secret"));
    }

    #[test]
    fn auth_state_rejects_unknown_algorithm() {
        let config = AuthConfig::new(secret()).with_token_algorithm("none".to_string());
        assert!(AuthState::new(config).is_err());
    }

    #[test]
    fn auth_state_builds_working_codec() {
        let state = AuthState::new(AuthConfig::new(secret())).expect("state");
        let signed = state.codec().issue("alice").expect("token");
        let claims = state.codec().decode(&signed.token).expect("claims");
        assert_eq!(claims.sub, "alice");
    }
}
