use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;
use wdr_auth::AuthError;
use wdr_core::{AuthState, RegistryError};

use crate::contract::ContractFault;
use crate::envelope::FaultResponse;

/// Errors surfaced by the call-dispatch layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Unknown operation '{operation}' on contract '{contract}'")]
    UnknownOperation { contract: String, operation: String },

    #[error("Authentication required ({0})")]
    Unauthenticated(AuthState),

    #[error("Not permitted to call contract '{0}'")]
    Forbidden(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Contract(#[from] ContractFault),

    #[error("No handler attached for contract '{0}'")]
    MissingHandler(String),
}

impl ApiError {
    pub fn unknown_operation(contract: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::UnknownOperation {
            contract: contract.into(),
            operation: operation.into(),
        }
    }

    pub fn forbidden(contract: impl Into<String>) -> Self {
        Self::Forbidden(contract.into())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Registry(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UnknownOperation { .. } => StatusCode::NOT_FOUND,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Contract(ContractFault::InvalidArguments(_)) => StatusCode::BAD_REQUEST,
            ApiError::Contract(ContractFault::UnknownOperation(_)) => StatusCode::NOT_FOUND,
            ApiError::Contract(ContractFault::Failed(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MissingHandler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_fault(&self) -> FaultResponse {
        let fault = FaultResponse::new(self.to_string());
        match self {
            ApiError::Unauthenticated(state) => fault.with_auth_state(*state),
            _ => fault,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Call failed");
        }
        (status, Json(self.to_fault())).into_response()
    }
}
