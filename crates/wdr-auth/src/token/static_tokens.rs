//! Opaque bearer tokens configured up front.

use std::collections::HashMap;

use crate::config::StaticTokenConfig;
use crate::credential::Credential;
use crate::error::AuthError;

use super::CredentialValidator;

/// Validator for a fixed table of opaque bearer tokens.
///
/// Unknown tokens are rejected (an `AuthInvalid` outcome); tokens containing
/// whitespace or control characters cannot be bearer tokens at all and are
/// reported as a format error.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenValidator {
    tokens: HashMap<String, Credential>,
}

impl StaticTokenValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(entries: &[StaticTokenConfig]) -> Self {
        let mut validator = Self::new();
        for entry in entries {
            let mut credential = Credential::new(entry.subject.clone());
            credential.roles = entry.roles.clone();
            credential.capabilities = entry.capabilities.clone();
            credential.scopes = entry.scopes.clone();
            credential.not_before = entry.not_before;
            credential.expires_at = entry.expires_at;
            if entry.disabled {
                credential = credential.disabled();
            }
            validator.insert(entry.token.clone(), credential);
        }
        validator
    }

    pub fn insert(&mut self, token: impl Into<String>, credential: Credential) {
        self.tokens.insert(token.into(), credential);
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, credential: Credential) -> Self {
        self.insert(token, credential);
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl CredentialValidator for StaticTokenValidator {
    fn validate(&self, raw: &str) -> Result<Credential, AuthError> {
        if raw.is_empty() {
            return Err(AuthError::credential_format("empty bearer token"));
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(AuthError::credential_format(
                "bearer token contains whitespace or control characters",
            ));
        }

        Ok(self
            .tokens
            .get(raw)
            .cloned()
            .unwrap_or_else(|| Credential::rejected("unknown token")))
    }
}
