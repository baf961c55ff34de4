//! Call dispatch.
//!
//! Turns `<prefix>/<Operation>` calls into handler invocations: resolve the
//! route, evaluate the caller once, gate on the contract's capabilities, then
//! invoke the contract's handler.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use wdr_core::ContractId;

use crate::contract::ContractHandler;
use crate::discovery::{DISCOVERY_CONTRACT, DiscoveryHandler};
use crate::envelope::CallResponse;
use crate::error::ApiError;
use crate::registry::{CallDecision, ContractDispatchRegistry};

pub struct DispatcherBuilder {
    registry: Arc<ContractDispatchRegistry>,
    handlers: HashMap<ContractId, Arc<dyn ContractHandler>>,
}

impl DispatcherBuilder {
    /// Attaches the handler serving `contract`, replacing any previous one.
    #[must_use]
    pub fn handler(
        mut self,
        contract: impl Into<ContractId>,
        handler: Arc<dyn ContractHandler>,
    ) -> Self {
        self.handlers.insert(contract.into(), handler);
        self
    }

    /// Finishes the dispatcher.
    ///
    /// The discovery contract gets its handler automatically when it is
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingHandler`] if a registered contract has no
    /// handler, or a handler was attached for an unregistered contract.
    pub fn build(mut self) -> Result<Dispatcher, ApiError> {
        let discovery = ContractId::new(DISCOVERY_CONTRACT);
        if self
            .registry
            .registrations()
            .any(|r| r.contract == discovery)
            && !self.handlers.contains_key(&discovery)
        {
            let handler = DiscoveryHandler::new(self.registry.clone());
            self.handlers.insert(discovery, Arc::new(handler));
        }

        if let Some(missing) = self
            .registry
            .registrations()
            .find(|r| !self.handlers.contains_key(&r.contract))
        {
            return Err(ApiError::MissingHandler(missing.contract.to_string()));
        }
        if let Some(orphan) = self
            .handlers
            .keys()
            .find(|c| !self.registry.registrations().any(|r| &r.contract == *c))
        {
            return Err(ApiError::MissingHandler(format!(
                "{orphan} (handler attached but contract not registered)"
            )));
        }

        tracing::info!(contracts = self.handlers.len(), "Dispatcher ready");

        Ok(Dispatcher {
            registry: self.registry,
            handlers: self.handlers,
        })
    }
}

/// Routes calls to contract handlers. Cheap to share behind an `Arc`.
pub struct Dispatcher {
    registry: Arc<ContractDispatchRegistry>,
    handlers: HashMap<ContractId, Arc<dyn ContractHandler>>,
}

impl Dispatcher {
    pub fn builder(registry: Arc<ContractDispatchRegistry>) -> DispatcherBuilder {
        DispatcherBuilder {
            registry,
            handlers: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ContractDispatchRegistry> {
        &self.registry
    }

    /// Dispatches one call.
    ///
    /// `credential` is the raw credential material, if the caller sent any.
    /// `args` is the request object; `null` is treated as no arguments.
    ///
    /// # Errors
    ///
    /// Fails for unknown routes or operations, unparseable credentials,
    /// refused calls, malformed arguments and handler faults. Every error
    /// maps to a fault envelope through [`ApiError`]'s `IntoResponse`.
    pub async fn dispatch(
        &self,
        path: &str,
        credential: Option<&str>,
        args: Value,
    ) -> Result<CallResponse, ApiError> {
        let (registration, operation) = self.registry.resolve_call(path)?;
        if !registration.accepts_operation(operation) {
            return Err(ApiError::unknown_operation(
                registration.contract.as_str(),
                operation,
            ));
        }

        let args = match args {
            Value::Null => Value::Object(serde_json::Map::new()),
            Value::Object(_) => args,
            _ => {
                return Err(ApiError::invalid_request(
                    "request body must be a JSON object of named arguments",
                ));
            }
        };

        let caller = self.registry.permitted_scopes(credential)?;
        match self.registry.authorize_call(registration, &caller) {
            CallDecision::Allowed => {}
            CallDecision::Unauthenticated(state) => {
                return Err(ApiError::Unauthenticated(state));
            }
            CallDecision::Forbidden => {
                return Err(ApiError::forbidden(registration.contract.as_str()));
            }
        }

        let handler = self
            .handlers
            .get(&registration.contract)
            .ok_or_else(|| ApiError::MissingHandler(registration.contract.to_string()))?;

        tracing::debug!(
            contract = %registration.contract,
            operation,
            auth_state = %caller.auth_state,
            "Dispatching call"
        );

        Ok(handler.invoke(operation, args, &caller).await?)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
