//! Persistence seams.
//!
//! The relational store holding providers, mappings and identities lives
//! outside the gateway; these traits are all the gateway needs from it.
//! [`MemoryEdgeStore`] backs bootstrap configuration and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use vibe_commons::{
    ClientMapping, FederatedIdentity, IdentityId, ProviderKey, ProviderRecord, RoleMapping,
};

mod memory;

pub use memory::MemoryEdgeStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Everything the refresh cycle loads in one call.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfigSet {
    pub providers: Vec<ProviderRecord>,
    pub role_mappings: Vec<RoleMapping>,
    pub client_mappings: Vec<ClientMapping>,
}

#[async_trait]
pub trait ProviderConfigRepository: Send + Sync {
    /// Full provider, role-mapping and client-mapping set (active and inactive).
    async fn load_provider_config(&self) -> StoreResult<ProviderConfigSet>;
}

#[async_trait]
pub trait MappingRepository: Send + Sync {
    async fn role_mappings(&self, provider_key: &ProviderKey) -> StoreResult<Vec<RoleMapping>>;
    async fn client_mappings(&self, provider_key: &ProviderKey)
        -> StoreResult<Vec<ClientMapping>>;
}

#[async_trait]
pub trait IdentityRepository: Send + Sync {
    async fn find_identity(
        &self,
        provider_key: &ProviderKey,
        external_subject: &str,
    ) -> StoreResult<Option<FederatedIdentity>>;

    /// Record a successful resolution: bump `last_seen` and refresh the email.
    async fn touch_identity(
        &self,
        id: &IdentityId,
        email: Option<&str>,
        seen_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Insert a new identity in one atomic step.
    ///
    /// If a row with the same `(provider_key, external_subject)` already
    /// exists, that row is returned and nothing is written.
    async fn create_identity(&self, identity: FederatedIdentity)
        -> StoreResult<FederatedIdentity>;
}
