use serde::{Deserialize, Serialize};

/// Deployment settings surfaced through the discovery contract.
///
/// Values are opaque strings owned by the configuration source. Blank values
/// are treated as "not configured".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiServiceSettings {
    /// Browser login URL for token-based (CIBA-style) authentication.
    pub oauth_token_request_url: Option<String>,
    /// Public base URL of this service.
    pub public_service_url: Option<String>,
    /// Where persisted subscriptions are stored.
    pub subscription_storage_directory: Option<String>,
}

impl ApiServiceSettings {
    pub fn new(
        oauth_token_request_url: Option<String>,
        public_service_url: Option<String>,
        subscription_storage_directory: Option<String>,
    ) -> Self {
        Self {
            oauth_token_request_url,
            public_service_url,
            subscription_storage_directory,
        }
        .normalized()
    }

    /// Turns blank strings into absence so "not applicable" and "empty"
    /// cannot be confused downstream.
    #[must_use]
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            oauth_token_request_url: clean(self.oauth_token_request_url),
            public_service_url: clean(self.public_service_url),
            subscription_storage_directory: clean(self.subscription_storage_directory),
        }
    }
}
