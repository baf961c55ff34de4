//! Contract dispatch registry.
//!
//! Maps contracts to the route prefix they are served under. The registry is
//! built in two phases: a mutable [`ContractDispatchRegistryBuilder`] used
//! single-threaded during startup, then an immutable
//! [`ContractDispatchRegistry`] shared by reference (usually in an `Arc`)
//! across request tasks. No reader can observe the registry before
//! [`ContractDispatchRegistryBuilder::build`] has returned, so lookups need no
//! locking.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use wdr_auth::{AuthError, PermittedScopes, ScopeAuthorizer};
use wdr_core::{
    ApiVersionInfo, AuthState, CapabilityId, CapabilityRegistry, ContractId, RegistryError,
    Result, RoutePrefix,
};

use crate::settings::ApiServiceSettings;

// ============================================================================
// Registration
// ============================================================================

/// A contract bound to its route prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractRegistration {
    pub contract: ContractId,
    pub route: RoutePrefix,
    /// Capabilities that permit calling this contract. Empty means public.
    pub capabilities: Vec<CapabilityId>,
    /// Callable operation names. Empty means the handler decides.
    pub operations: Vec<String>,
}

impl ContractRegistration {
    pub fn new(contract: impl Into<ContractId>, route: RoutePrefix) -> Self {
        Self {
            contract: contract.into(),
            route,
            capabilities: Vec::new(),
            operations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_capability(mut self, capability: impl Into<CapabilityId>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    #[must_use]
    pub fn with_operations<I, S>(mut self, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operations.extend(operations.into_iter().map(Into::into));
        self
    }

    pub fn is_public(&self) -> bool {
        self.capabilities.is_empty()
    }

    pub fn accepts_operation(&self, operation: &str) -> bool {
        self.operations.is_empty() || self.operations.iter().any(|op| op == operation)
    }
}

/// Outcome of gating a call against the caller's permitted scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallDecision {
    Allowed,
    /// The caller is not authenticated; carries the state to report.
    Unauthenticated(AuthState),
    /// Authenticated, but none of the contract's capabilities is permitted.
    Forbidden,
}

// ============================================================================
// Builder
// ============================================================================

pub struct ContractDispatchRegistryBuilder {
    capabilities: Arc<CapabilityRegistry>,
    authorizer: Arc<ScopeAuthorizer>,
    version: ApiVersionInfo,
    settings: ApiServiceSettings,
    by_route: IndexMap<RoutePrefix, ContractRegistration>,
    by_contract: HashMap<ContractId, RoutePrefix>,
}

impl ContractDispatchRegistryBuilder {
    pub fn new(capabilities: Arc<CapabilityRegistry>, authorizer: Arc<ScopeAuthorizer>) -> Self {
        Self {
            capabilities,
            authorizer,
            version: ApiVersionInfo::current(),
            settings: ApiServiceSettings::default(),
            by_route: IndexMap::new(),
            by_contract: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: ApiVersionInfo) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ApiServiceSettings) -> Self {
        self.settings = settings.normalized();
        self
    }

    /// Registers `contract` under `route` with no capability requirement.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn register_contract(
        &mut self,
        contract: impl Into<ContractId>,
        route: &str,
    ) -> Result<()> {
        self.register(ContractRegistration::new(contract, RoutePrefix::parse(route)?))
    }

    /// Registers a contract.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateRoute`] if the prefix is taken
    /// - [`RegistryError::DuplicateContract`] if the contract is already
    ///   registered under another prefix
    /// - [`RegistryError::UnknownCapability`] if a required capability is not
    ///   in the capability registry
    ///
    /// On error the builder is left unchanged.
    pub fn register(&mut self, registration: ContractRegistration) -> Result<()> {
        if let Some(existing) = self.by_route.get(&registration.route) {
            return Err(RegistryError::duplicate_route(
                registration.route.as_str(),
                existing.contract.as_str(),
            ));
        }
        if let Some(existing) = self.by_contract.get(&registration.contract) {
            return Err(RegistryError::duplicate_contract(
                registration.contract.as_str(),
                existing.as_str(),
            ));
        }
        if let Some(unknown) = registration
            .capabilities
            .iter()
            .find(|c| !self.capabilities.exists(c.as_str()))
        {
            return Err(RegistryError::unknown_capability(
                registration.contract.as_str(),
                unknown.as_str(),
            ));
        }

        tracing::info!(
            contract = %registration.contract,
            route = %registration.route,
            capabilities = registration.capabilities.len(),
            "Registered contract"
        );

        self.by_contract
            .insert(registration.contract.clone(), registration.route.clone());
        self.by_route.insert(registration.route.clone(), registration);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.by_route.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_route.is_empty()
    }

    /// Freezes the registry for concurrent read-only use.
    pub fn build(self) -> ContractDispatchRegistry {
        let backed: HashSet<&CapabilityId> = self
            .by_route
            .values()
            .flat_map(|r| r.capabilities.iter())
            .collect();
        let advertised = self
            .capabilities
            .list_all()
            .filter(|id| backed.contains(id))
            .cloned()
            .collect();

        ContractDispatchRegistry {
            capabilities: self.capabilities,
            authorizer: self.authorizer,
            version: self.version,
            settings: self.settings,
            by_route: self.by_route,
            advertised,
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Immutable mapping from route prefix to contract, plus the data served by
/// the discovery contract.
pub struct ContractDispatchRegistry {
    capabilities: Arc<CapabilityRegistry>,
    authorizer: Arc<ScopeAuthorizer>,
    version: ApiVersionInfo,
    settings: ApiServiceSettings,
    by_route: IndexMap<RoutePrefix, ContractRegistration>,
    /// Registry-ordered capabilities backed by at least one contract.
    advertised: Vec<CapabilityId>,
}

impl ContractDispatchRegistry {
    pub fn builder(
        capabilities: Arc<CapabilityRegistry>,
        authorizer: Arc<ScopeAuthorizer>,
    ) -> ContractDispatchRegistryBuilder {
        ContractDispatchRegistryBuilder::new(capabilities, authorizer)
    }

    /// Returns the contract served under `route`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownRoute`] if nothing is registered there.
    pub fn resolve_route(&self, route: &str) -> Result<&ContractId> {
        self.lookup(route).map(|r| &r.contract)
    }

    /// Returns the full registration served under `route`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownRoute`] if nothing is registered there.
    pub fn lookup(&self, route: &str) -> Result<&ContractRegistration> {
        RoutePrefix::parse(route)
            .ok()
            .and_then(|prefix| self.by_route.get(&prefix))
            .ok_or_else(|| RegistryError::unknown_route(route))
    }

    /// Splits a call path `<prefix>/<Operation>` using the longest matching
    /// registered prefix.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownRoute`] if no prefix matches or the
    /// remainder is not a single operation segment.
    pub fn resolve_call<'p>(&self, path: &'p str) -> Result<(&ContractRegistration, &'p str)> {
        self.by_route
            .values()
            .filter_map(|r| {
                r.route
                    .strip_from(path)
                    .filter(|op| !op.is_empty() && !op.contains('/'))
                    .map(|op| (r, op))
            })
            .max_by_key(|(r, _)| r.route.as_str().len())
            .ok_or_else(|| RegistryError::unknown_route(path.trim_matches('/')))
    }

    /// Registrations in registration order.
    pub fn registrations(&self) -> impl Iterator<Item = &ContractRegistration> {
        self.by_route.values()
    }

    pub fn len(&self) -> usize {
        self.by_route.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_route.is_empty()
    }

    pub fn capability_registry(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    pub fn settings(&self) -> &ApiServiceSettings {
        &self.settings
    }

    pub fn api_version(&self) -> &ApiVersionInfo {
        &self.version
    }

    /// Capabilities backed by a registered contract, in registry order.
    pub fn advertised_capabilities(&self) -> &[CapabilityId] {
        &self.advertised
    }

    /// Evaluates the caller's credential material.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::CredentialFormat`] for unparseable material.
    pub fn permitted_scopes(
        &self,
        credential: Option<&str>,
    ) -> std::result::Result<PermittedScopes, AuthError> {
        self.authorizer.evaluate(credential)
    }

    /// Decides whether a caller holding `permitted` may call `registration`.
    pub fn authorize_call(
        &self,
        registration: &ContractRegistration,
        permitted: &PermittedScopes,
    ) -> CallDecision {
        if registration.is_public() {
            return CallDecision::Allowed;
        }
        if !permitted.is_authenticated() {
            return CallDecision::Unauthenticated(permitted.auth_state);
        }
        if registration
            .capabilities
            .iter()
            .any(|c| permitted.has_capability(c.as_str()))
        {
            CallDecision::Allowed
        } else {
            CallDecision::Forbidden
        }
    }
}

impl std::fmt::Debug for ContractDispatchRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractDispatchRegistry")
            .field("version", &self.version)
            .field("routes", &self.by_route.keys().collect::<Vec<_>>())
            .field("advertised", &self.advertised)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use wdr_auth::{Credential, StaticTokenValidator};

    use super::*;

    fn builder() -> ContractDispatchRegistryBuilder {
        let capabilities = Arc::new(CapabilityRegistry::well_known());
        let validator = StaticTokenValidator::new()
            .with_token("editor", Credential::new("alice").with_role("editor"))
            .with_token("reader", Credential::new("bob").with_scope("Study:A"));
        let authorizer = ScopeAuthorizer::new(capabilities.clone(), Arc::new(validator))
            .with_role("editor", ["WdrStoreAccess"]);
        ContractDispatchRegistry::builder(capabilities, Arc::new(authorizer))
    }

    fn route(raw: &str) -> RoutePrefix {
        RoutePrefix::parse(raw).unwrap()
    }

    #[test]
    fn test_register_and_resolve() {
        let mut builder = builder();
        builder
            .register_contract("IWdrApiInfoService", "wdr/v2/WdrApiInfo")
            .unwrap();
        builder.register_contract("IOtherService", "wdr/v2/Other").unwrap();
        let registry = builder.build();

        assert_eq!(
            registry.resolve_route("wdr/v2/WdrApiInfo").unwrap(),
            "IWdrApiInfoService"
        );
        assert_eq!(registry.resolve_route("/wdr/v2/Other/").unwrap(), "IOtherService");
        assert_eq!(
            registry.resolve_route("wdr/v2/Missing").unwrap_err(),
            RegistryError::unknown_route("wdr/v2/Missing")
        );
    }

    #[test]
    fn test_duplicate_route_leaves_registry_unchanged() {
        let mut builder = builder();
        builder.register_contract("IFirst", "wdr/v2/Shared").unwrap();

        let err = builder.register_contract("ISecond", "wdr/v2/Shared").unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRoute { .. }));
        assert_eq!(builder.len(), 1);

        // The rejected contract was not half-registered.
        builder.register_contract("ISecond", "wdr/v2/Second").unwrap();
        let registry = builder.build();
        assert_eq!(registry.resolve_route("wdr/v2/Shared").unwrap(), "IFirst");
    }

    #[test]
    fn test_duplicate_contract() {
        let mut builder = builder();
        builder.register_contract("IFirst", "wdr/v2/A").unwrap();
        let err = builder.register_contract("IFirst", "wdr/v2/B").unwrap_err();
        assert_eq!(err, RegistryError::duplicate_contract("IFirst", "wdr/v2/A"));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_unknown_capability_rejected() {
        let mut builder = builder();
        let err = builder
            .register(
                ContractRegistration::new("IStore", route("wdr/v2/Store")).with_capability("Nope"),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownCapability { .. }));
        assert!(builder.is_empty());
    }

    #[test]
    fn test_advertised_capabilities_only_backed_ones() {
        let mut builder = builder();
        builder.register_contract("IWdrApiInfoService", "wdr/v2/WdrApiInfo").unwrap();
        builder
            .register(
                ContractRegistration::new("IStore", route("wdr/v2/Store"))
                    .with_capability("WdrStoreAccess"),
            )
            .unwrap();
        let registry = builder.build();

        assert_eq!(
            registry.advertised_capabilities(),
            &[CapabilityId::new("WdrStoreAccess")]
        );
        for id in registry.advertised_capabilities() {
            assert!(registry.capability_registry().exists(id.as_str()));
        }
    }

    #[test]
    fn test_resolve_call_prefers_longest_prefix() {
        let mut builder = builder();
        builder.register_contract("IOuter", "wdr/v2").unwrap();
        builder.register_contract("IInner", "wdr/v2/Inner").unwrap();
        let registry = builder.build();

        let (registration, op) = registry.resolve_call("/wdr/v2/Inner/DoThing").unwrap();
        assert_eq!(registration.contract, "IInner");
        assert_eq!(op, "DoThing");

        let (registration, op) = registry.resolve_call("wdr/v2/Ping").unwrap();
        assert_eq!(registration.contract, "IOuter");
        assert_eq!(op, "Ping");

        assert!(registry.resolve_call("wdr/v2/Inner").is_err());
        assert!(registry.resolve_call("wdr/v3/Inner/DoThing").is_err());
    }

    #[test]
    fn test_authorize_call() {
        let mut builder = builder();
        builder.register_contract("IPublic", "wdr/v2/Public").unwrap();
        builder
            .register(
                ContractRegistration::new("IStore", route("wdr/v2/Store"))
                    .with_capability("WdrStoreAccess"),
            )
            .unwrap();
        let registry = builder.build();
        let public = registry.lookup("wdr/v2/Public").unwrap();
        let store = registry.lookup("wdr/v2/Store").unwrap();

        let anonymous = registry.permitted_scopes(None).unwrap();
        assert_eq!(registry.authorize_call(public, &anonymous), CallDecision::Allowed);
        assert_eq!(
            registry.authorize_call(store, &anonymous),
            CallDecision::Unauthenticated(AuthState::AuthRequired)
        );

        let editor = registry.permitted_scopes(Some("editor")).unwrap();
        assert_eq!(registry.authorize_call(store, &editor), CallDecision::Allowed);

        let reader = registry.permitted_scopes(Some("reader")).unwrap();
        assert_eq!(registry.authorize_call(store, &reader), CallDecision::Forbidden);

        let invalid = registry.permitted_scopes(Some("unknown-token")).unwrap();
        assert_eq!(
            registry.authorize_call(store, &invalid),
            CallDecision::Unauthenticated(AuthState::AuthInvalid)
        );
    }

    #[test]
    fn test_operation_filter() {
        let registration = ContractRegistration::new("IStore", route("wdr/v2/Store"))
            .with_operations(["GetEntry", "PutEntry"]);
        assert!(registration.accepts_operation("GetEntry"));
        assert!(!registration.accepts_operation("DropAll"));

        let open = ContractRegistration::new("IOpen", route("wdr/v2/Open"));
        assert!(open.accepts_operation("Anything"));
    }

    #[test]
    fn test_registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ContractDispatchRegistry>();
    }
}
