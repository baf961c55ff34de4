//! Authentication error types.
//!
//! Negative authentication outcomes (no credential, expired, invalid) are not
//! errors; they are reported as an [`AuthState`](wdr_core::AuthState). The
//! errors here cover credential material that cannot be parsed at all and
//! broken authorizer configuration.

use std::fmt;

/// Errors that can occur while evaluating a credential.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The credential material cannot be parsed. This indicates a client bug,
    /// not a legitimate negative decision.
    #[error("Malformed credential: {message}")]
    CredentialFormat {
        /// Description of why the credential could not be parsed.
        message: String,
    },

    /// The auth configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `CredentialFormat` error.
    #[must_use]
    pub fn credential_format(message: impl Into<String>) -> Self {
        Self::CredentialFormat {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::CredentialFormat { .. })
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::CredentialFormat { .. } => ErrorCategory::Credential,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }
}

/// Categories of authentication errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Credential material could not be parsed.
    Credential,
    /// Configuration errors.
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credential => write!(f, "credential"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::credential_format("not a JWS");
        assert_eq!(err.to_string(), "Malformed credential: not a JWS");

        let err = AuthError::configuration("missing jwt secret");
        assert_eq!(err.to_string(), "Configuration error: missing jwt secret");
    }

    #[test]
    fn test_error_predicates() {
        let err = AuthError::credential_format("x");
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
        assert_eq!(err.category(), ErrorCategory::Credential);

        let err = AuthError::configuration("x");
        assert!(!err.is_client_error());
        assert!(err.is_server_error());
        assert_eq!(err.category().to_string(), "configuration");
    }
}
