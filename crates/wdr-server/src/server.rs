use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use wdr_api::{
    ContractDispatchRegistry, ContractHandler, ContractRegistration, Dispatcher,
    discovery_registration,
};
use wdr_auth::ScopeAuthorizer;
use wdr_core::CapabilityRegistry;

use crate::{config::AppConfig, handlers};

/// Shared per-request state. Everything behind it is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// A contract served next to the discovery contract.
#[derive(Clone)]
pub struct ContractMount {
    pub registration: ContractRegistration,
    pub handler: Arc<dyn ContractHandler>,
}

impl ContractMount {
    pub fn new(registration: ContractRegistration, handler: Arc<dyn ContractHandler>) -> Self {
        Self {
            registration,
            handler,
        }
    }
}

/// Builds the capability registry, authorizer and contract registry, then
/// publishes them behind the dispatcher. Any registration error aborts.
pub fn build_state(cfg: &AppConfig, mounts: &[ContractMount]) -> anyhow::Result<AppState> {
    let capabilities = Arc::new(CapabilityRegistry::well_known());
    let authorizer = ScopeAuthorizer::from_config(&cfg.auth, capabilities.clone())
        .context("failed to configure scope authorizer")?;

    let mut builder = ContractDispatchRegistry::builder(capabilities, Arc::new(authorizer))
        .with_version(cfg.api.version().context("invalid api.api_version")?)
        .with_settings(cfg.api.settings());
    builder
        .register(discovery_registration(&cfg.api.route_base)?)
        .context("failed to register discovery contract")?;
    for mount in mounts {
        builder.register(mount.registration.clone()).with_context(|| {
            format!("failed to register contract {}", mount.registration.contract)
        })?;
    }

    let registry = Arc::new(builder.build());
    tracing::info!(
        contracts = registry.len(),
        capabilities = ?registry.advertised_capabilities(),
        version = %registry.api_version(),
        "Contract registry published"
    );

    let dispatcher = mounts
        .iter()
        .fold(Dispatcher::builder(registry), |builder, mount| {
            builder.handler(mount.registration.contract.clone(), mount.handler.clone())
        })
        .build()?;

    Ok(AppState {
        dispatcher: Arc::new(dispatcher),
    })
}

pub fn build_app(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        .route("/healthz", get(handlers::healthz))
        // Call envelope: POST /{prefix}/{Operation}
        .route("/{*path}", post(handlers::call))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub struct WdrServer {
    addr: SocketAddr,
    app: Router,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    mounts: Vec<ContractMount>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            mounts: Vec::new(),
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn with_contract(
        mut self,
        registration: ContractRegistration,
        handler: Arc<dyn ContractHandler>,
    ) -> Self {
        self.mounts.push(ContractMount::new(registration, handler));
        self
    }

    pub fn build(self) -> anyhow::Result<WdrServer> {
        let state = build_state(&self.config, &self.mounts)?;
        let app = build_app(state, &self.config);

        Ok(WdrServer {
            addr: self.addr,
            app,
        })
    }
}

impl WdrServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
