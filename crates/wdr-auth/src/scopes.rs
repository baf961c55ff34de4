//! Permitted capability/scope token lists.
//!
//! Capability and scope tokens share one list on the wire. They are told
//! apart by prefix convention only:
//!
//! - `API:WorkflowConsume` or a bare `WdrStoreAccess` is a capability
//! - `Study:9B2C3F48-2941-2F8F-4D35-7D117D5C6F72` is a study data scope
//! - any other `Kind:value` token is a data scope of that kind
//!
//! # Examples
//!
//! ```
//! use wdr_auth::scopes::PermittedToken;
//!
//! assert_eq!(
//!     PermittedToken::classify("Study:9B2C"),
//!     PermittedToken::Study("9B2C")
//! );
//! assert_eq!(
//!     PermittedToken::classify("WdrStoreAccess"),
//!     PermittedToken::Capability("WdrStoreAccess")
//! );
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use wdr_core::AuthState;

/// Prefix for capability tokens written in qualified form.
pub const API_PREFIX: &str = "API";

/// Prefix for study data scopes.
pub const STUDY_PREFIX: &str = "Study";

// ============================================================================
// Evaluation result
// ============================================================================

/// Result of a scope evaluation: the permitted tokens together with the
/// authentication state they were derived under.
///
/// A negative or `AuthRequired` state always comes with an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermittedScopes {
    pub tokens: Vec<String>,
    pub auth_state: AuthState,
}

impl PermittedScopes {
    /// A credential-independent empty result for a non-authenticated state.
    pub fn denied(auth_state: AuthState) -> Self {
        Self {
            tokens: Vec::new(),
            auth_state,
        }
    }

    pub fn authenticated(tokens: Vec<String>) -> Self {
        Self {
            tokens,
            auth_state: AuthState::Authenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_state.is_authenticated()
    }

    /// Returns `true` if `token` is in the permitted list (exact match).
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Returns `true` if the capability is permitted in bare or `API:` form.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.tokens
            .iter()
            .any(|t| PermittedToken::classify(t) == PermittedToken::Capability(capability))
    }

    /// Iterates the study identifiers among the permitted tokens.
    pub fn studies(&self) -> impl Iterator<Item = &str> {
        self.tokens
            .iter()
            .filter_map(|t| match PermittedToken::classify(t) {
                PermittedToken::Study(id) => Some(id),
                _ => None,
            })
    }
}

// ============================================================================
// Token classification
// ============================================================================

/// A permitted token, classified by prefix convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermittedToken<'a> {
    /// A capability, with any `API:` prefix stripped.
    Capability(&'a str),
    /// A `Study:` data scope, with the prefix stripped.
    Study(&'a str),
    /// Some other `Kind:value` data scope.
    Scope { kind: &'a str, value: &'a str },
}

impl<'a> PermittedToken<'a> {
    pub fn classify(token: &'a str) -> Self {
        match token.split_once(':') {
            Some((API_PREFIX, capability)) => Self::Capability(capability),
            Some((STUDY_PREFIX, study)) => Self::Study(study),
            Some((kind, value)) if !kind.is_empty() => Self::Scope { kind, value },
            _ => Self::Capability(token),
        }
    }

    pub fn is_capability(&self) -> bool {
        matches!(self, Self::Capability(_))
    }
}

// ============================================================================
// Unknown scope handling
// ============================================================================

/// What to do with granted scope tokens the scope directory does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownScopePolicy {
    /// Report every explicitly granted scope.
    #[default]
    PassThrough,
    /// Drop scopes the directory does not recognize, like unknown capabilities.
    Drop,
}

/// Lookup of known data scopes (e.g. the study catalog).
pub trait ScopeDirectory: Send + Sync {
    fn contains(&self, scope: &str) -> bool;
}

/// Scope directory backed by a fixed set, typically from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticScopeDirectory {
    scopes: HashSet<String>,
}

impl StaticScopeDirectory {
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl ScopeDirectory for StaticScopeDirectory {
    fn contains(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            PermittedToken::classify("API:WorkflowConsume"),
            PermittedToken::Capability("WorkflowConsume")
        );
        assert_eq!(
            PermittedToken::classify("Site:Berlin"),
            PermittedToken::Scope {
                kind: "Site",
                value: "Berlin"
            }
        );
        assert_eq!(
            PermittedToken::classify(":odd"),
            PermittedToken::Capability(":odd")
        );
    }

    #[test]
    fn test_permitted_scopes_queries() {
        let permitted = PermittedScopes::authenticated(vec![
            "WdrStoreAccess".to_string(),
            "API:FhirQuestionaireStoreAccess".to_string(),
            "Study:A".to_string(),
            "Study:B".to_string(),
        ]);

        assert!(permitted.has_capability("WdrStoreAccess"));
        assert!(permitted.has_capability("FhirQuestionaireStoreAccess"));
        assert!(!permitted.has_capability("Study"));
        assert_eq!(permitted.studies().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_denied_is_empty() {
        let denied = PermittedScopes::denied(AuthState::AuthExpired);
        assert!(denied.tokens.is_empty());
        assert!(!denied.is_authenticated());
    }

    #[test]
    fn test_wire_shape() {
        let permitted = PermittedScopes::authenticated(vec!["WdrStoreAccess".to_string()]);
        let json = serde_json::to_value(&permitted).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "tokens": ["WdrStoreAccess"], "authState": 1 })
        );
    }

    #[test]
    fn test_static_scope_directory() {
        let directory = StaticScopeDirectory::new(["Study:A"]);
        assert!(directory.contains("Study:A"));
        assert!(!directory.contains("Study:B"));
    }
}
