use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use wdr_api::ApiServiceSettings;
use wdr_auth::AuthConfig;
use wdr_core::{ApiVersionInfo, PROTOCOL_VERSION, RoutePrefix};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Credential validation and scope authorization
    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // API surface
        self.api
            .version()
            .map_err(|e| format!("api.api_version: {e}"))?;
        self.api
            .route_base()
            .map_err(|e| format!("api.route_base: {e}"))?;
        for (key, value) in [
            ("api.oauth_token_request_url", &self.api.oauth_token_request_url),
            ("api.public_service_url", &self.api.public_service_url),
        ] {
            if let Some(raw) = value.as_deref().map(str::trim)
                && !raw.is_empty()
            {
                url::Url::parse(raw).map_err(|e| format!("{key} is not a valid URL: {e}"))?;
            }
        }
        // Auth validation
        self.auth
            .validate()
            .map_err(|e| format!("auth config error: {e}"))?;
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Discovery surface and deployment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Version reported by `GetApiVersion`.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Route prefix all contracts are served under, e.g. `wdr/v2`.
    #[serde(default = "default_route_base")]
    pub route_base: String,
    #[serde(default)]
    pub oauth_token_request_url: Option<String>,
    #[serde(default)]
    pub public_service_url: Option<String>,
    #[serde(default)]
    pub subscription_storage_directory: Option<String>,
}

fn default_api_version() -> String {
    PROTOCOL_VERSION.into()
}
fn default_route_base() -> String {
    "wdr/v2".into()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            route_base: default_route_base(),
            oauth_token_request_url: None,
            public_service_url: None,
            subscription_storage_directory: None,
        }
    }
}

impl ApiConfig {
    pub fn version(&self) -> wdr_core::Result<ApiVersionInfo> {
        ApiVersionInfo::parse(&self.api_version)
    }

    pub fn route_base(&self) -> wdr_core::Result<RoutePrefix> {
        RoutePrefix::parse(&self.route_base)
    }

    pub fn settings(&self) -> ApiServiceSettings {
        ApiServiceSettings::new(
            self.oauth_token_request_url.clone(),
            self.public_service_url.clone(),
            self.subscription_storage_directory.clone(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Default configuration file, relative to the working directory.
    pub const DEFAULT_CONFIG_PATH: &str = "wdr.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., WDR__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("WDR")
                .prefix_separator("__")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
