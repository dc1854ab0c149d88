//! Authentication and authorization core of the Vibe edge gateway.
//!
//! Request path, in order:
//! 1. [`MultiProviderSelector`] sniffs the bearer token's issuer and picks a scheme
//! 2. [`SchemeRegistry`] verifies the token with that scheme's validator
//! 3. [`ClaimExtractor`] + [`FederatedIdentityResolver`] map the principal to an internal user
//! 4. [`PermissionResolver`] computes the effective level and denied statements
//!
//! [`EdgeAuthBackgroundService`] keeps [`ProviderRegistry`] and the registered
//! schemes converged with the persisted provider configuration.

pub mod background;
pub mod claims;
pub mod context;
pub mod error;
pub mod identity;
pub mod permission;
pub mod provisioning;
pub mod registry;
pub mod repository;
pub mod selector;

pub use background::{EdgeAuthBackgroundService, RefreshOutcome, RefreshStats};
pub use claims::ClaimExtractor;
pub use context::{
    AuthenticatedPrincipal, EdgeIdentity, ExtractedClaims, ResolvedIdentity, ResolvedPermission,
    SelectedProvider,
};
pub use error::{AuthError, AuthResult};
pub use identity::FederatedIdentityResolver;
pub use permission::PermissionResolver;
pub use provisioning::UserProvisioningService;
pub use registry::{DynamicSchemeRegistrar, ProviderRegistry, SchemeRegistry};
pub use repository::{
    IdentityRepository, MappingRepository, MemoryEdgeStore, ProviderConfigRepository,
    ProviderConfigSet, StoreError, StoreResult,
};
pub use selector::{extract_bearer_token, MultiProviderSelector};
