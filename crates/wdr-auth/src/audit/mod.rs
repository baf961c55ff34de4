//! Authorization audit logging.
//!
//! The authorizer reports every evaluation to an injected [`AuditSink`].
//! Events carry the subject and outcome, never the raw credential.

use wdr_core::AuthState;

/// One scope evaluation, as seen by the audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationEvent<'a> {
    /// Subject of the evaluated credential, if one was presented.
    pub subject: Option<&'a str>,
    pub auth_state: AuthState,
    /// Number of tokens permitted.
    pub permitted: usize,
    /// Granted tokens dropped as unknown.
    pub dropped: usize,
}

/// Receives authorization audit events. Must not block.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuthorizationEvent<'_>);
}

/// Emits audit events as structured `tracing` events under target `wdr::audit`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuthorizationEvent<'_>) {
        let subject = event.subject.unwrap_or("-");
        match event.auth_state {
            AuthState::Authenticated => tracing::info!(
                target: "wdr::audit",
                subject,
                auth_state = %event.auth_state,
                permitted = event.permitted,
                dropped = event.dropped,
                "Scope evaluation"
            ),
            AuthState::AuthRequired => tracing::debug!(
                target: "wdr::audit",
                auth_state = %event.auth_state,
                "Scope evaluation without credential"
            ),
            AuthState::AuthExpired | AuthState::AuthInvalid => tracing::warn!(
                target: "wdr::audit",
                subject,
                auth_state = %event.auth_state,
                "Credential refused"
            ),
        }
    }
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &AuthorizationEvent<'_>) {}
}
