//! Contract handler seam.
//!
//! Business contracts plug into the dispatcher by implementing
//! [`ContractHandler`]. The dispatcher has already resolved the route,
//! evaluated the caller and checked the contract's capability gate by the
//! time `invoke` runs.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use wdr_auth::PermittedScopes;

use crate::envelope::CallResponse;

/// Failure reported by a contract handler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContractFault {
    /// The call's arguments could not be bound.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The operation does not exist on this contract.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// The operation ran and failed.
    #[error("{0}")]
    Failed(String),
}

impl ContractFault {
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    pub fn unknown_operation(operation: impl Into<String>) -> Self {
        Self::UnknownOperation(operation.into())
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

#[async_trait]
pub trait ContractHandler: Send + Sync {
    /// Invokes `operation` with the call's named arguments.
    async fn invoke(
        &self,
        operation: &str,
        args: Value,
        caller: &PermittedScopes,
    ) -> Result<CallResponse, ContractFault>;
}
