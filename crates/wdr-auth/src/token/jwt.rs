//! HS256 JSON Web Token validator.
//!
//! The signature (and `iss`/`aud` when configured) is verified here; the
//! validity window is copied into the [`Credential`] unchecked so the
//! authorizer can report `AuthExpired` instead of a generic failure.
//!
//! ## Claims
//!
//! | claim          | meaning                                             |
//! |----------------|-----------------------------------------------------|
//! | `sub`          | subject                                             |
//! | `exp` / `nbf`  | validity window (unix seconds)                      |
//! | `roles`        | role names                                          |
//! | `capabilities` | direct capability grants                            |
//! | `scope(s)`     | data scopes, space-separated string or string array |
//! | `disabled`     | explicit kill switch                                |

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use crate::config::JwtConfig;
use crate::credential::Credential;
use crate::error::AuthError;

use super::CredentialValidator;

/// Claims carried by a WDR access token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    #[serde(default)]
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,

    #[serde(
        default,
        alias = "scope",
        deserialize_with = "deserialize_scopes",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub scopes: Vec<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

/// Accepts either an OAuth-style space-separated string or an array.
fn deserialize_scopes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scopes {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match Scopes::deserialize(deserializer)? {
        Scopes::Joined(s) => s.split_whitespace().map(ToString::to_string).collect(),
        Scopes::List(list) => list,
    })
}

/// Validator for HS256-signed JWT bearer tokens.
pub struct JwtCredentialValidator {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
}

impl JwtCredentialValidator {
    /// Builds a validator from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the secret is empty.
    pub fn new(config: &JwtConfig) -> Result<Self, AuthError> {
        if config.secret.is_empty() {
            return Err(AuthError::configuration("JWT secret cannot be empty"));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // The window is judged by the authorizer, not here.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();
        validation.validate_aud = false;
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        if let Some(audience) = &config.audience {
            validation.set_audience(&[audience]);
            validation.validate_aud = true;
        }

        Ok(Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            validation,
        })
    }

    /// Signs claims with the configured secret. Used for issuing test and
    /// service tokens.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if encoding fails.
    pub fn issue(&self, claims: &CredentialClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::configuration(format!("failed to sign token: {e}")))
    }
}

impl std::fmt::Debug for JwtCredentialValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtCredentialValidator")
            .field("iss", &self.validation.iss)
            .finish_non_exhaustive()
    }
}

impl CredentialValidator for JwtCredentialValidator {
    fn validate(&self, raw: &str) -> Result<Credential, AuthError> {
        let claims = match decode::<CredentialClaims>(raw, &self.decoding_key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                return match e.kind() {
                    ErrorKind::InvalidToken
                    | ErrorKind::Base64(_)
                    | ErrorKind::Json(_)
                    | ErrorKind::Utf8(_) => Err(AuthError::credential_format(e.to_string())),
                    _ => Ok(Credential::rejected(e.to_string())),
                };
            }
        };

        let not_before = match claims.nbf.map(OffsetDateTime::from_unix_timestamp).transpose() {
            Ok(at) => at,
            Err(_) => return Ok(Credential::rejected("nbf out of range")),
        };
        let expires_at = match claims.exp.map(OffsetDateTime::from_unix_timestamp).transpose() {
            Ok(at) => at,
            Err(_) => return Ok(Credential::rejected("exp out of range")),
        };

        let mut credential = Credential::new(claims.sub);
        credential.roles = claims.roles;
        credential.capabilities = claims.capabilities;
        credential.scopes = claims.scopes;
        credential.not_before = not_before;
        credential.expires_at = expires_at;
        if claims.disabled {
            credential = credential.disabled();
        }
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::CredentialStatus;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            ..JwtConfig::default()
        }
    }

    #[test]
    fn test_valid_token_roundtrip() {
        let validator = JwtCredentialValidator::new(&config("s3cret")).unwrap();
        let token = validator
            .issue(&CredentialClaims {
                sub: "alice".to_string(),
                exp: Some(1_900_000_000),
                roles: vec!["editor".to_string()],
                scopes: vec!["Study:A".to_string()],
                ..CredentialClaims::default()
            })
            .unwrap();

        let credential = validator.validate(&token).unwrap();
        assert_eq!(credential.subject, "alice");
        assert_eq!(credential.roles, vec!["editor"]);
        assert_eq!(credential.scopes, vec!["Study:A"]);
        assert_eq!(
            credential.expires_at.map(OffsetDateTime::unix_timestamp),
            Some(1_900_000_000)
        );
        assert_eq!(credential.status, CredentialStatus::Active);
    }

    #[test]
    fn test_expired_token_still_parses() {
        let validator = JwtCredentialValidator::new(&config("s3cret")).unwrap();
        let token = validator
            .issue(&CredentialClaims {
                sub: "alice".to_string(),
                exp: Some(1_000),
                ..CredentialClaims::default()
            })
            .unwrap();

        let credential = validator.validate(&token).unwrap();
        assert_eq!(credential.status, CredentialStatus::Active);
        assert_eq!(
            credential.expires_at.map(OffsetDateTime::unix_timestamp),
            Some(1_000)
        );
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = JwtCredentialValidator::new(&config("one")).unwrap();
        let verifier = JwtCredentialValidator::new(&config("two")).unwrap();
        let token = issuer
            .issue(&CredentialClaims {
                sub: "alice".to_string(),
                ..CredentialClaims::default()
            })
            .unwrap();

        let credential = verifier.validate(&token).unwrap();
        assert!(matches!(credential.status, CredentialStatus::Rejected { .. }));
    }

    #[test]
    fn test_garbage_is_format_error() {
        let validator = JwtCredentialValidator::new(&config("s3cret")).unwrap();
        let err = validator.validate("not-a-jwt").unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_disabled_claim() {
        let validator = JwtCredentialValidator::new(&config("s3cret")).unwrap();
        let token = validator
            .issue(&CredentialClaims {
                sub: "bob".to_string(),
                disabled: true,
                ..CredentialClaims::default()
            })
            .unwrap();
        assert_eq!(
            validator.validate(&token).unwrap().status,
            CredentialStatus::Disabled
        );
    }

    #[test]
    fn test_space_separated_scope_claim() {
        let claims: CredentialClaims = serde_json::from_value(serde_json::json!({
            "sub": "alice",
            "scope": "Study:A Study:B"
        }))
        .unwrap();
        assert_eq!(claims.scopes, vec!["Study:A", "Study:B"]);
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(JwtCredentialValidator::new(&config("")).is_err());
    }
}
