//! # wdr-core
//!
//! Leaf types of the WDR discovery protocol: identifiers, the
//! [`AuthState`] code, the protocol [`ApiVersionInfo`] and the
//! [`CapabilityRegistry`].

pub mod auth_state;
pub mod capability;
pub mod error;
pub mod id;
pub mod version;

pub use auth_state::AuthState;
pub use capability::{CapabilityDescriptor, CapabilityRegistry, well_known};
pub use error::{RegistryError, Result};
pub use id::{CapabilityId, ContractId, RoutePrefix, ScopeId};
pub use version::{ApiVersionInfo, PROTOCOL_VERSION};
