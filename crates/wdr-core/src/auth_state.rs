//! Authentication posture reported alongside the permitted scopes.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The caller's authentication state relative to the evaluated credential.
///
/// Serialized as its integer wire code (`0`, `1`, `-1`, `-2`), which is part
/// of the stable discovery response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum AuthState {
    /// No credential was presented.
    AuthRequired = 0,
    /// A valid credential was presented.
    Authenticated = 1,
    /// The credential's validity window has elapsed; a refresh may help.
    AuthExpired = -1,
    /// The credential is invalid or disabled; the caller must log in again.
    AuthInvalid = -2,
}

impl AuthState {
    /// Returns the integer wire code.
    pub fn code(self) -> i32 {
        self as i8 as i32
    }

    /// Parses a wire code back into a state.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::AuthRequired),
            1 => Some(Self::Authenticated),
            -1 => Some(Self::AuthExpired),
            -2 => Some(Self::AuthInvalid),
            _ => None,
        }
    }

    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }

    /// True for the two states where a credential was presented but refused.
    pub fn is_negative(self) -> bool {
        self.code() < 0
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthRequired => "auth-required",
            Self::Authenticated => "authenticated",
            Self::AuthExpired => "auth-expired",
            Self::AuthInvalid => "auth-invalid",
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AuthState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> Deserialize<'de> for AuthState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i32::deserialize(deserializer)?;
        Self::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid authState code: {code}")))
    }
}
