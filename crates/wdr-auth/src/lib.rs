//! # wdr-auth
//!
//! Credential evaluation and scope authorization for the WDR discovery
//! protocol.
//!
//! ## Modules
//!
//! - [`authorizer`] - [`ScopeAuthorizer`], the single place authorization
//!   decisions are made
//! - [`credential`] - structured credentials
//! - [`token`] - credential-validation collaborators (static table, JWT)
//! - [`scopes`] - permitted token lists and the prefix convention
//! - [`audit`] - audit sink for evaluation outcomes
//! - [`config`] - authorization configuration

pub mod audit;
pub mod authorizer;
pub mod config;
pub mod credential;
pub mod error;
pub mod scopes;
pub mod token;

pub use audit::{AuditSink, AuthorizationEvent, NoopAuditSink, TracingAuditSink};
pub use authorizer::ScopeAuthorizer;
pub use config::{AuthConfig, ConfigError, JwtConfig, StaticTokenConfig, ValidatorKind};
pub use credential::{Credential, CredentialStatus};
pub use error::{AuthError, ErrorCategory};
pub use scopes::{
    PermittedScopes, PermittedToken, ScopeDirectory, StaticScopeDirectory, UnknownScopePolicy,
};
pub use token::{
    CredentialClaims, CredentialValidator, JwtCredentialValidator, StaticTokenValidator,
};
