//! Scope authorizer.
//!
//! Turns an optional caller credential into a [`PermittedScopes`] result.
//!
//! | credential                           | auth state      | tokens |
//! |--------------------------------------|-----------------|--------|
//! | none                                 | `AuthRequired`  | empty  |
//! | rejected, disabled, not yet valid    | `AuthInvalid`   | empty  |
//! | validity window elapsed              | `AuthExpired`   | empty  |
//! | otherwise                            | `Authenticated` | grants |
//!
//! Granted capabilities (from roles, direct grants, and scope tokens that
//! classify as capabilities, e.g. `API:WdrStoreAccess`) are filtered through
//! the [`CapabilityRegistry`] (unknown ones are dropped silently) and emitted
//! in registry order, followed by the remaining granted scopes in assignment
//! order, without duplicates.
//!
//! Evaluation holds no mutable state and is safe to call concurrently.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use wdr_core::{AuthState, CapabilityId, CapabilityRegistry};

use crate::audit::{AuditSink, AuthorizationEvent, TracingAuditSink};
use crate::config::{AuthConfig, ValidatorKind};
use crate::credential::{Credential, CredentialStatus};
use crate::error::AuthError;
use crate::scopes::{
    API_PREFIX, PermittedScopes, PermittedToken, ScopeDirectory, StaticScopeDirectory,
    UnknownScopePolicy,
};
use crate::token::{CredentialValidator, JwtCredentialValidator, StaticTokenValidator};

pub struct ScopeAuthorizer {
    capabilities: Arc<CapabilityRegistry>,
    validator: Arc<dyn CredentialValidator>,
    roles: HashMap<String, Vec<CapabilityId>>,
    unknown_scope_policy: UnknownScopePolicy,
    scope_directory: Arc<dyn ScopeDirectory>,
    audit: Arc<dyn AuditSink>,
    leeway: time::Duration,
}

impl ScopeAuthorizer {
    /// Creates an authorizer with no role grants, pass-through scopes and
    /// tracing audit output.
    pub fn new(
        capabilities: Arc<CapabilityRegistry>,
        validator: Arc<dyn CredentialValidator>,
    ) -> Self {
        Self {
            capabilities,
            validator,
            roles: HashMap::new(),
            unknown_scope_policy: UnknownScopePolicy::PassThrough,
            scope_directory: Arc::new(StaticScopeDirectory::default()),
            audit: Arc::new(TracingAuditSink),
            leeway: time::Duration::ZERO,
        }
    }

    /// Builds an authorizer (validator, roles, scope policy) from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the configuration is invalid.
    pub fn from_config(
        config: &AuthConfig,
        capabilities: Arc<CapabilityRegistry>,
    ) -> Result<Self, AuthError> {
        config
            .validate()
            .map_err(|e| AuthError::configuration(e.to_string()))?;

        let validator: Arc<dyn CredentialValidator> = match config.validator {
            ValidatorKind::Static => Arc::new(StaticTokenValidator::from_config(
                &config.static_tokens,
            )),
            ValidatorKind::Jwt => Arc::new(JwtCredentialValidator::new(&config.jwt)?),
        };

        let mut authorizer = Self::new(capabilities, validator)
            .with_leeway(config.leeway)
            .with_unknown_scope_policy(
                config.unknown_scope_policy,
                Arc::new(StaticScopeDirectory::new(config.known_scopes.iter().cloned())),
            );
        for (role, grants) in &config.roles {
            authorizer = authorizer.with_role(role.clone(), grants.iter().cloned());
        }

        tracing::debug!(
            validator = ?config.validator,
            roles = config.roles.len(),
            unknown_scope_policy = ?config.unknown_scope_policy,
            "Scope authorizer configured"
        );

        Ok(authorizer)
    }

    /// Grants `capabilities` to every credential carrying `role`.
    #[must_use]
    pub fn with_role<I, S>(mut self, role: impl Into<String>, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CapabilityId>,
    {
        self.roles
            .entry(role.into())
            .or_default()
            .extend(capabilities.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_unknown_scope_policy(
        mut self,
        policy: UnknownScopePolicy,
        directory: Arc<dyn ScopeDirectory>,
    ) -> Self {
        self.unknown_scope_policy = policy;
        self.scope_directory = directory;
        self
    }

    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = time::Duration::try_from(leeway).unwrap_or(time::Duration::MAX);
        self
    }

    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    /// Evaluates raw credential material (e.g. a bearer token).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::CredentialFormat`] if the material cannot be
    /// parsed. Refused credentials are not errors.
    pub fn evaluate(&self, raw: Option<&str>) -> Result<PermittedScopes, AuthError> {
        let credential = match raw {
            Some(raw) => Some(self.validator.validate(raw).inspect_err(|e| {
                tracing::debug!(error = %e, "Credential could not be parsed");
            })?),
            None => None,
        };
        Ok(self.evaluate_credential(credential.as_ref()))
    }

    /// Evaluates an already parsed credential against the current time.
    pub fn evaluate_credential(&self, credential: Option<&Credential>) -> PermittedScopes {
        self.evaluate_credential_at(credential, OffsetDateTime::now_utc())
    }

    /// Evaluates an already parsed credential against `now`.
    pub fn evaluate_credential_at(
        &self,
        credential: Option<&Credential>,
        now: OffsetDateTime,
    ) -> PermittedScopes {
        let Some(credential) = credential else {
            let result = PermittedScopes::denied(AuthState::AuthRequired);
            self.audit.record(&AuthorizationEvent {
                subject: None,
                auth_state: result.auth_state,
                permitted: 0,
                dropped: 0,
            });
            return result;
        };

        let state = self.auth_state(credential, now);
        let (result, dropped) = if state.is_authenticated() {
            let (tokens, dropped) = self.collect_tokens(credential);
            (PermittedScopes::authenticated(tokens), dropped)
        } else {
            (PermittedScopes::denied(state), 0)
        };

        self.audit.record(&AuthorizationEvent {
            subject: Some(credential.subject.as_str()),
            auth_state: result.auth_state,
            permitted: result.tokens.len(),
            dropped,
        });

        result
    }

    /// Derives the auth state. Verification failures win over the window check.
    fn auth_state(&self, credential: &Credential, now: OffsetDateTime) -> AuthState {
        match &credential.status {
            CredentialStatus::Active => {}
            CredentialStatus::Disabled | CredentialStatus::Rejected { .. } => {
                return AuthState::AuthInvalid;
            }
        }

        // Out-of-range sums count as "already valid" and "not yet elapsed".
        if let Some(not_before) = credential.not_before
            && now
                .checked_add(self.leeway)
                .is_some_and(|latest| not_before > latest)
        {
            return AuthState::AuthInvalid;
        }

        if let Some(expires_at) = credential.expires_at
            && expires_at
                .checked_add(self.leeway)
                .is_some_and(|end| end <= now)
        {
            return AuthState::AuthExpired;
        }

        AuthState::Authenticated
    }

    /// Collects permitted tokens; returns them with the number of dropped grants.
    fn collect_tokens(&self, credential: &Credential) -> (Vec<String>, usize) {
        let mut granted: HashSet<&str> = HashSet::new();
        for role in &credential.roles {
            if let Some(grants) = self.roles.get(role) {
                granted.extend(grants.iter().map(CapabilityId::as_str));
            }
        }
        // Scope grants following the capability convention are gated like
        // role grants.
        let mut scopes = Vec::new();
        for scope in &credential.scopes {
            match PermittedToken::classify(scope) {
                PermittedToken::Capability(capability) => {
                    granted.insert(capability);
                }
                _ => scopes.push(scope),
            }
        }
        for capability in &credential.capabilities {
            let bare = capability
                .strip_prefix(API_PREFIX)
                .and_then(|rest| rest.strip_prefix(':'))
                .unwrap_or(capability);
            granted.insert(bare);
        }

        let mut tokens: Vec<String> = self
            .capabilities
            .list_all()
            .filter(|id| granted.contains(id.as_str()))
            .map(|id| id.as_str().to_string())
            .collect();
        let mut dropped = granted.len() - tokens.len();

        let mut seen: HashSet<String> = tokens.iter().cloned().collect();
        for scope in scopes {
            if self.unknown_scope_policy == UnknownScopePolicy::Drop
                && !self.scope_directory.contains(scope)
            {
                dropped += 1;
                continue;
            }
            if seen.insert(scope.clone()) {
                tokens.push(scope.clone());
            }
        }

        if dropped > 0 {
            tracing::debug!(
                subject = %credential.subject,
                dropped,
                "Dropped unknown grants"
            );
        }

        (tokens, dropped)
    }
}

impl std::fmt::Debug for ScopeAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeAuthorizer")
            .field("capabilities", &self.capabilities.len())
            .field("roles", &self.roles.len())
            .field("unknown_scope_policy", &self.unknown_scope_policy)
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}
