//! Authorization configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth]
//! validator = "jwt"
//! leeway = "30s"
//! unknown_scope_policy = "drop"
//! known_scopes = ["Study:9B2C3F48-2941-2F8F-4D35-7D117D5C6F72"]
//!
//! [auth.jwt]
//! secret = "change-me"
//!
//! [auth.roles]
//! editor = ["WdrStoreAccess"]
//! ```

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::scopes::UnknownScopePolicy;

/// Root authorization configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Which credential-validation collaborator to use.
    pub validator: ValidatorKind,

    /// Settings for the JWT validator.
    pub jwt: JwtConfig,

    /// Bearer tokens accepted by the static validator.
    pub static_tokens: Vec<StaticTokenConfig>,

    /// Capability tokens granted per role.
    pub roles: HashMap<String, Vec<String>>,

    /// Clock skew tolerated on `not_before` and `expires_at`.
    #[serde(with = "humantime_serde")]
    pub leeway: Duration,

    /// Handling of granted scopes that are not in `known_scopes`.
    pub unknown_scope_policy: UnknownScopePolicy,

    /// Known data scopes, consulted when the policy is `drop`.
    pub known_scopes: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            validator: ValidatorKind::Static,
            jwt: JwtConfig::default(),
            static_tokens: Vec::new(),
            roles: HashMap::new(),
            leeway: Duration::ZERO,
            unknown_scope_policy: UnknownScopePolicy::PassThrough,
            known_scopes: Vec::new(),
        }
    }
}

/// Available credential validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorKind {
    /// Opaque bearer tokens listed in `static_tokens`.
    #[default]
    Static,
    /// HS256-signed JSON Web Tokens.
    Jwt,
}

/// JWT validator configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Shared HMAC secret.
    pub secret: String,

    /// Expected `iss` claim. Not checked when unset.
    pub issuer: Option<String>,

    /// Expected `aud` claim. Not checked when unset.
    pub audience: Option<String>,
}

/// One statically configured bearer token.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticTokenConfig {
    pub token: String,
    pub subject: String,
    pub roles: Vec<String>,
    pub capabilities: Vec<String>,
    pub scopes: Vec<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub not_before: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    pub disabled: bool,
}

/// Errors found while validating [`AuthConfig`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the JWT validator is selected without
    /// a secret, and `ConfigError::InvalidValue` if static tokens are empty or
    /// duplicated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validator == ValidatorKind::Jwt && self.jwt.secret.is_empty() {
            return Err(ConfigError::Missing("auth.jwt.secret".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for entry in &self.static_tokens {
            if entry.token.is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "static token for subject '{}' is empty",
                    entry.subject
                )));
            }
            if !seen.insert(entry.token.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "static token for subject '{}' is configured twice",
                    entry.subject
                )));
            }
        }

        for (role, capabilities) in &self.roles {
            if role.is_empty() {
                return Err(ConfigError::InvalidValue("role name cannot be empty".to_string()));
            }
            if capabilities.iter().any(String::is_empty) {
                return Err(ConfigError::InvalidValue(format!(
                    "role '{role}' grants an empty capability"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AuthConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.unknown_scope_policy, UnknownScopePolicy::PassThrough);
    }

    #[test]
    fn test_jwt_requires_secret() {
        let config = AuthConfig {
            validator: ValidatorKind::Jwt,
            ..AuthConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_duplicate_static_tokens_rejected() {
        let token = StaticTokenConfig {
            token: "abc".to_string(),
            subject: "alice".to_string(),
            ..StaticTokenConfig::default()
        };
        let config = AuthConfig {
            static_tokens: vec![token.clone(), token],
            ..AuthConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_deserialize_from_json() {
        let config: AuthConfig = serde_json::from_value(serde_json::json!({
            "validator": "jwt",
            "leeway": "30s",
            "unknown_scope_policy": "drop",
            "jwt": { "secret": "s3cret" },
            "roles": { "editor": ["WdrStoreAccess"] },
            "static_tokens": [{
                "token": "t1",
                "subject": "svc",
                "expires_at": "2030-01-01T00:00:00Z"
            }]
        }))
        .unwrap();

        assert_eq!(config.validator, ValidatorKind::Jwt);
        assert_eq!(config.leeway, Duration::from_secs(30));
        assert_eq!(config.unknown_scope_policy, UnknownScopePolicy::Drop);
        assert_eq!(config.roles["editor"], vec!["WdrStoreAccess"]);
        assert!(config.static_tokens[0].expires_at.is_some());
        assert!(config.validate().is_ok());
    }
}
