//! # wdr-api
//!
//! Contract dispatch and the discovery surface of the WDR call-based API.
//!
//! - [`registry`] - route prefix to contract mapping, built once at startup
//! - [`discovery`] - the `IWdrApiInfoService` contract
//! - [`dispatch`] - resolves calls and invokes [`ContractHandler`]s
//! - [`envelope`] - `return`/`fault` wire envelopes
//! - [`error`] - [`ApiError`] and its HTTP mapping

pub mod contract;
pub mod discovery;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod registry;
pub mod settings;

pub use contract::{ContractFault, ContractHandler};
pub use discovery::{
    ApiInfoService, DISCOVERY_CONTRACT, DISCOVERY_ROUTE, DiscoveryHandler, discovery_registration,
};
pub use dispatch::{Dispatcher, DispatcherBuilder};
pub use envelope::{CallResponse, FaultResponse};
pub use error::ApiError;
pub use registry::{
    CallDecision, ContractDispatchRegistry, ContractDispatchRegistryBuilder, ContractRegistration,
};
pub use settings::ApiServiceSettings;
