//! Persisted configuration and identity models.

mod ids;
mod identity;
mod mappings;
mod permission_level;
mod provider;

pub use ids::{IdentityId, ProviderKey, UserId};
pub use identity::FederatedIdentity;
pub use mappings::{ClientMapping, RoleMapping, DENY_ALL};
pub use permission_level::{PermissionLevel, PermissionLevelParseError};
pub use provider::{normalize_issuer, ProviderRecord};
