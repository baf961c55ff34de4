//! Structured credentials produced by a [`CredentialValidator`].
//!
//! A credential describes *what* the caller presented; whether it is
//! currently acceptable is decided by the [`ScopeAuthorizer`] at evaluation
//! time, so the same credential can move from authenticated to expired
//! without being touched.
//!
//! [`CredentialValidator`]: crate::token::CredentialValidator
//! [`ScopeAuthorizer`]: crate::authorizer::ScopeAuthorizer

use time::OffsetDateTime;

/// Validation status established by the credential-validation collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CredentialStatus {
    /// Signature and structure check out.
    #[default]
    Active,
    /// The account or token was explicitly disabled.
    Disabled,
    /// Cryptographic or structural verification failed.
    Rejected {
        /// Why the credential was rejected (never contains the raw material).
        reason: String,
    },
}

/// A parsed caller credential.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credential {
    /// Subject the credential was issued to.
    pub subject: String,

    /// Roles whose capability grants apply.
    pub roles: Vec<String>,

    /// Capability tokens granted directly, in addition to role grants.
    pub capabilities: Vec<String>,

    /// Data-scope tokens granted explicitly, in assignment order.
    pub scopes: Vec<String>,

    /// Start of the validity window.
    pub not_before: Option<OffsetDateTime>,

    /// End of the validity window (exclusive).
    pub expires_at: Option<OffsetDateTime>,

    pub status: CredentialStatus,
}

impl Credential {
    /// Creates an active credential for `subject` with no grants.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }

    /// Creates a credential that failed verification.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            status: CredentialStatus::Rejected {
                reason: reason.into(),
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    #[must_use]
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    #[must_use]
    pub fn with_not_before(mut self, at: OffsetDateTime) -> Self {
        self.not_before = Some(at);
        self
    }

    #[must_use]
    pub fn with_expires_at(mut self, at: OffsetDateTime) -> Self {
        self.expires_at = Some(at);
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.status = CredentialStatus::Disabled;
        self
    }

    /// Returns `true` if verification failed or the credential is disabled.
    pub fn is_unusable(&self) -> bool {
        !matches!(self.status, CredentialStatus::Active)
    }
}
