//! Credential-validation collaborators.
//!
//! A validator turns raw credential material (the bearer token extracted by
//! the transport) into a structured [`Credential`]. It never decides the
//! [`AuthState`](wdr_core::AuthState); that is the authorizer's job.
//!
//! - [`StaticTokenValidator`] - opaque tokens listed in configuration
//! - [`JwtCredentialValidator`] - HS256 JSON Web Tokens

pub mod jwt;
pub mod static_tokens;

pub use jwt::{CredentialClaims, JwtCredentialValidator};
pub use static_tokens::StaticTokenValidator;

use crate::credential::Credential;
use crate::error::AuthError;

/// Parses raw credential material into a [`Credential`].
///
/// Implementations must be cheap and non-blocking: they are called
/// synchronously on every inbound call.
pub trait CredentialValidator: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AuthError::CredentialFormat`] only when the material cannot
    /// be parsed at all. Material that parses but fails verification yields
    /// a [`Credential::rejected`] credential instead.
    fn validate(&self, raw: &str) -> Result<Credential, AuthError>;
}
