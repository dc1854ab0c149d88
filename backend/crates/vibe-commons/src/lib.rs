//! # vibe-commons
//!
//! Shared types and constants for the Vibe edge gateway.
//!
//! The persisted configuration model lives here so that every crate
//! (`vibe-auth`, `vibe-api`, `vibe-sql`) speaks about the same records:
//!
//! - [`ProviderRecord`]: one trusted external identity provider
//! - [`RoleMapping`]: external role → [`PermissionLevel`] plus denied statements
//! - [`ClientMapping`]: per-client permission ceiling
//! - [`FederatedIdentity`]: external (provider, subject) → internal user
//!
//! ## Example Usage
//!
//! ```rust
//! use vibe_commons::{PermissionLevel, ProviderKey};
//!
//! let level = PermissionLevel::parse("write").unwrap();
//! assert!(level > PermissionLevel::Read);
//! assert_eq!(ProviderKey::new("acme").scheme_id(), "oidc-acme");
//! ```

pub mod constants;
pub mod models;

pub use models::{
    normalize_issuer, ClientMapping, FederatedIdentity, IdentityId, PermissionLevel,
    PermissionLevelParseError, ProviderKey, ProviderRecord, RoleMapping, UserId, DENY_ALL,
};
