//! The discovery contract (`IWdrApiInfoService`).
//!
//! Clients call it first to learn the protocol version, which capabilities
//! this deployment serves, what their credential permits, and where to
//! obtain a token.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use wdr_auth::{AuthError, PermittedScopes};
use wdr_core::{ApiVersionInfo, CapabilityId, Result, RoutePrefix};

use crate::contract::{ContractFault, ContractHandler};
use crate::envelope::CallResponse;
use crate::registry::{ContractDispatchRegistry, ContractRegistration};

pub const DISCOVERY_CONTRACT: &str = "IWdrApiInfoService";

/// Route segment appended to the API base for the discovery contract.
pub const DISCOVERY_ROUTE: &str = "WdrApiInfo";

pub mod operations {
    pub const GET_API_VERSION: &str = "GetApiVersion";
    pub const GET_CAPABILITIES: &str = "GetCapabilities";
    pub const GET_PERMITTED_AUTH_SCOPES: &str = "GetPermittedAuthScopes";
    pub const GET_OAUTH_TOKEN_REQUEST_URL: &str = "GetOAuthTokenRequestUrl";

    pub const ALL: [&str; 4] = [
        GET_API_VERSION,
        GET_CAPABILITIES,
        GET_PERMITTED_AUTH_SCOPES,
        GET_OAUTH_TOKEN_REQUEST_URL,
    ];
}

/// Out-argument name carrying the auth state of `GetPermittedAuthScopes`.
pub const AUTH_STATE_OUT_ARG: &str = "authState";

/// The discovery surface.
pub trait ApiInfoService: Send + Sync {
    fn get_api_version(&self) -> &ApiVersionInfo;

    /// Capabilities this deployment serves, in registry order.
    fn get_capabilities(&self) -> &[CapabilityId];

    /// Evaluates the caller's credential material.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::CredentialFormat`] for unparseable material.
    /// Missing, expired or invalid credentials are reported through the
    /// returned auth state instead.
    fn get_permitted_auth_scopes(
        &self,
        credential: Option<&str>,
    ) -> std::result::Result<PermittedScopes, AuthError>;

    /// Browser login URL for token-based authentication, if applicable.
    fn get_oauth_token_request_url(&self) -> Option<&str>;
}

impl ApiInfoService for ContractDispatchRegistry {
    fn get_api_version(&self) -> &ApiVersionInfo {
        self.api_version()
    }

    fn get_capabilities(&self) -> &[CapabilityId] {
        self.advertised_capabilities()
    }

    fn get_permitted_auth_scopes(
        &self,
        credential: Option<&str>,
    ) -> std::result::Result<PermittedScopes, AuthError> {
        self.permitted_scopes(credential)
    }

    fn get_oauth_token_request_url(&self) -> Option<&str> {
        self.settings().oauth_token_request_url.as_deref()
    }
}

/// Registration for the discovery contract under `<route_base>/WdrApiInfo`.
///
/// The discovery contract is public: it must be callable without a
/// credential so clients can find out how to obtain one.
///
/// # Errors
///
/// Returns `InvalidRoute` if `route_base` is not a valid prefix.
pub fn discovery_registration(route_base: &str) -> Result<ContractRegistration> {
    let base = RoutePrefix::parse(route_base)?;
    let route = RoutePrefix::parse(&format!("{base}/{DISCOVERY_ROUTE}"))?;
    Ok(ContractRegistration::new(DISCOVERY_CONTRACT, route).with_operations(operations::ALL))
}

/// Serves the discovery operations over the call envelope.
#[derive(Clone)]
pub struct DiscoveryHandler {
    info: Arc<dyn ApiInfoService>,
}

impl DiscoveryHandler {
    pub fn new(info: Arc<dyn ApiInfoService>) -> Self {
        Self { info }
    }
}

#[async_trait]
impl ContractHandler for DiscoveryHandler {
    async fn invoke(
        &self,
        operation: &str,
        _args: Value,
        caller: &PermittedScopes,
    ) -> std::result::Result<CallResponse, ContractFault> {
        match operation {
            operations::GET_API_VERSION => {
                Ok(CallResponse::new(self.info.get_api_version().to_string()))
            }
            operations::GET_CAPABILITIES => {
                let capabilities: Vec<&str> = self
                    .info
                    .get_capabilities()
                    .iter()
                    .map(CapabilityId::as_str)
                    .collect();
                Ok(CallResponse::new(capabilities))
            }
            // The dispatcher evaluates the credential once per call; the
            // result it gates on is the one reported here.
            operations::GET_PERMITTED_AUTH_SCOPES => Ok(CallResponse::new(caller.tokens.clone())
                .with_out_arg(AUTH_STATE_OUT_ARG, caller.auth_state.code())),
            operations::GET_OAUTH_TOKEN_REQUEST_URL => Ok(CallResponse::new(
                self.info.get_oauth_token_request_url().map(str::to_string),
            )),
            other => Err(ContractFault::unknown_operation(other)),
        }
    }
}

impl std::fmt::Debug for DiscoveryHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryHandler").finish_non_exhaustive()
    }
}
