//! Call envelopes.
//!
//! A successful call returns `{"return": <value>, <outArg>: <value>, ...}`.
//! A failed call returns `{"fault": <message>}`, with `authState` added when
//! the failure was an authentication refusal.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wdr_core::AuthState;

/// Successful call result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResponse {
    #[serde(rename = "return")]
    pub return_value: Value,
    /// Out-arguments, serialized next to `return` in insertion order.
    #[serde(flatten)]
    pub out_args: IndexMap<String, Value>,
}

impl CallResponse {
    pub fn new(return_value: impl Into<Value>) -> Self {
        Self {
            return_value: return_value.into(),
            out_args: IndexMap::new(),
        }
    }

    /// A call with no return value (`"return": null`).
    pub fn void() -> Self {
        Self::new(Value::Null)
    }

    #[must_use]
    pub fn with_out_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.out_args.insert(name.into(), value.into());
        self
    }

    pub fn out_arg(&self, name: &str) -> Option<&Value> {
        self.out_args.get(name)
    }
}

/// Failed call result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultResponse {
    pub fault: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_state: Option<AuthState>,
}

impl FaultResponse {
    pub fn new(fault: impl Into<String>) -> Self {
        Self {
            fault: fault.into(),
            auth_state: None,
        }
    }

    #[must_use]
    pub fn with_auth_state(mut self, state: AuthState) -> Self {
        self.auth_state = Some(state);
        self
    }
}
