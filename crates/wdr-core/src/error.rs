use thiserror::Error;

/// Errors raised while populating or querying the process-wide registries.
///
/// Registration errors are fatal at startup: the caller must abort
/// initialization instead of continuing with a partially built registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Capability already registered: {0}")]
    DuplicateCapability(String),

    #[error("Route prefix already registered: {route} (held by {existing})")]
    DuplicateRoute { route: String, existing: String },

    #[error("Contract {contract} already registered under route {existing}")]
    DuplicateContract { contract: String, existing: String },

    #[error("No contract registered for route: {0}")]
    UnknownRoute(String),

    #[error("Contract {contract} references unknown capability: {capability}")]
    UnknownCapability { contract: String, capability: String },

    #[error("Invalid route prefix: {0}")]
    InvalidRoute(String),

    #[error("Invalid API version: {0}")]
    InvalidVersion(String),
}

impl RegistryError {
    /// Create a new DuplicateCapability error
    pub fn duplicate_capability(id: impl Into<String>) -> Self {
        Self::DuplicateCapability(id.into())
    }

    /// Create a new DuplicateRoute error
    pub fn duplicate_route(route: impl Into<String>, existing: impl Into<String>) -> Self {
        Self::DuplicateRoute {
            route: route.into(),
            existing: existing.into(),
        }
    }

    /// Create a new DuplicateContract error
    pub fn duplicate_contract(contract: impl Into<String>, existing: impl Into<String>) -> Self {
        Self::DuplicateContract {
            contract: contract.into(),
            existing: existing.into(),
        }
    }

    /// Create a new UnknownRoute error
    pub fn unknown_route(route: impl Into<String>) -> Self {
        Self::UnknownRoute(route.into())
    }

    /// Create a new UnknownCapability error
    pub fn unknown_capability(contract: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::UnknownCapability {
            contract: contract.into(),
            capability: capability.into(),
        }
    }

    /// Create a new InvalidRoute error
    pub fn invalid_route(route: impl Into<String>) -> Self {
        Self::InvalidRoute(route.into())
    }

    /// Create a new InvalidVersion error
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Self::InvalidVersion(version.into())
    }

    /// Check if this error can only happen while the registries are being built.
    pub fn is_startup_error(&self) -> bool {
        !self.is_not_found()
    }

    /// Check if this error maps to a not-found outcome at the transport boundary.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UnknownRoute(_))
    }
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
