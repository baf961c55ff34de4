use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::Value;
use wdr_api::{ApiError, CallResponse};
use wdr_auth::AuthError;

use crate::server::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// `POST /{prefix}/{Operation}`: one call-envelope request.
pub async fn call(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CallResponse>, ApiError> {
    let credential = bearer_token(&headers)?;
    let args = parse_args(&body)?;
    let response = state.dispatcher.dispatch(&path, credential, args).await?;
    Ok(Json(response))
}

/// Extracts the bearer credential. A missing header means "no credential";
/// any other scheme is a format error rather than an anonymous call.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AuthError::credential_format("Authorization header is not valid ASCII"))?;
    let (scheme, token) = value.split_once(' ').ok_or_else(|| {
        AuthError::credential_format("Authorization header is not a Bearer credential")
    })?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::credential_format(format!(
            "Unsupported authorization scheme '{scheme}'"
        ))
        .into());
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::credential_format("Bearer credential is empty").into());
    }
    Ok(Some(token))
}

/// An empty body means "no arguments".
fn parse_args(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::invalid_request(format!("malformed JSON body: {e}")))
}
