//! In-memory implementation of the gateway repositories.
//!
//! Not durable. Used for providers seeded from the config file and in tests.
//! All maps sit behind one `parking_lot::RwLock`; no lock is held across an
//! `.await`.

use super::{
    IdentityRepository, MappingRepository, ProviderConfigRepository, ProviderConfigSet,
    StoreError, StoreResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use vibe_commons::{
    ClientMapping, FederatedIdentity, IdentityId, ProviderKey, ProviderRecord, RoleMapping,
};

#[derive(Default)]
struct Inner {
    providers: BTreeMap<ProviderKey, ProviderRecord>,
    role_mappings: Vec<RoleMapping>,
    client_mappings: Vec<ClientMapping>,
    identities: HashMap<(ProviderKey, String), FederatedIdentity>,
}

#[derive(Default)]
pub struct MemoryEdgeStore {
    inner: RwLock<Inner>,
}

impl MemoryEdgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a provider together with its mappings.
    ///
    /// Existing mappings of the provider are replaced.
    pub fn seed(
        &self,
        provider: ProviderRecord,
        role_mappings: Vec<RoleMapping>,
        client_mappings: Vec<ClientMapping>,
    ) {
        let mut inner = self.inner.write();
        let key = provider.key.clone();
        inner.role_mappings.retain(|m| m.provider_key != key);
        inner.client_mappings.retain(|m| m.provider_key != key);
        inner.role_mappings.extend(role_mappings);
        inner.client_mappings.extend(client_mappings);
        inner.providers.insert(key, provider);
    }

    pub fn upsert_provider(&self, provider: ProviderRecord) {
        self.inner.write().providers.insert(provider.key.clone(), provider);
    }

    /// Flip a provider's active flag; deactivation stamps `deactivated_at`.
    pub fn set_provider_active(&self, key: &ProviderKey, active: bool) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let provider = inner
            .providers
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(format!("provider '{}'", key)))?;
        provider.active = active;
        provider.deactivated_at = if active { None } else { Some(Utc::now()) };
        Ok(())
    }

    pub fn remove_provider(&self, key: &ProviderKey) -> Option<ProviderRecord> {
        let mut inner = self.inner.write();
        inner.role_mappings.retain(|m| &m.provider_key != key);
        inner.client_mappings.retain(|m| &m.provider_key != key);
        inner.providers.remove(key)
    }

    /// Add a role mapping, replacing any mapping for the same external role.
    pub fn put_role_mapping(&self, mapping: RoleMapping) {
        let mut inner = self.inner.write();
        inner.role_mappings.retain(|m| {
            !(m.provider_key == mapping.provider_key && m.external_role == mapping.external_role)
        });
        inner.role_mappings.push(mapping);
    }

    /// Add a client mapping, replacing any mapping for the same client id.
    pub fn put_client_mapping(&self, mapping: ClientMapping) {
        let mut inner = self.inner.write();
        inner.client_mappings.retain(|m| {
            !(m.provider_key == mapping.provider_key && m.client_id == mapping.client_id)
        });
        inner.client_mappings.push(mapping);
    }

    /// Block an identity permanently without deleting it.
    pub fn deactivate_identity(&self, provider_key: &ProviderKey, subject: &str) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let identity = inner
            .identities
            .get_mut(&(provider_key.clone(), subject.to_string()))
            .ok_or_else(|| StoreError::NotFound(format!("identity '{}/{}'", provider_key, subject)))?;
        identity.active = false;
        Ok(())
    }

    pub fn identity_count(&self) -> usize {
        self.inner.read().identities.len()
    }
}

#[async_trait]
impl ProviderConfigRepository for MemoryEdgeStore {
    async fn load_provider_config(&self) -> StoreResult<ProviderConfigSet> {
        let inner = self.inner.read();
        Ok(ProviderConfigSet {
            providers: inner.providers.values().cloned().collect(),
            role_mappings: inner.role_mappings.clone(),
            client_mappings: inner.client_mappings.clone(),
        })
    }
}

#[async_trait]
impl MappingRepository for MemoryEdgeStore {
    async fn role_mappings(&self, provider_key: &ProviderKey) -> StoreResult<Vec<RoleMapping>> {
        Ok(self
            .inner
            .read()
            .role_mappings
            .iter()
            .filter(|m| &m.provider_key == provider_key)
            .cloned()
            .collect())
    }

    async fn client_mappings(
        &self,
        provider_key: &ProviderKey,
    ) -> StoreResult<Vec<ClientMapping>> {
        Ok(self
            .inner
            .read()
            .client_mappings
            .iter()
            .filter(|m| &m.provider_key == provider_key)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl IdentityRepository for MemoryEdgeStore {
    async fn find_identity(
        &self,
        provider_key: &ProviderKey,
        external_subject: &str,
    ) -> StoreResult<Option<FederatedIdentity>> {
        Ok(self
            .inner
            .read()
            .identities
            .get(&(provider_key.clone(), external_subject.to_string()))
            .cloned())
    }

    async fn touch_identity(
        &self,
        id: &IdentityId,
        email: Option<&str>,
        seen_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let identity = inner
            .identities
            .values_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("identity '{}'", id)))?;
        identity.last_seen = seen_at;
        if let Some(email) = email {
            identity.email = Some(email.to_string());
        }
        Ok(())
    }

    async fn create_identity(
        &self,
        identity: FederatedIdentity,
    ) -> StoreResult<FederatedIdentity> {
        let mut inner = self.inner.write();
        let key = (identity.provider_key.clone(), identity.external_subject.clone());
        Ok(inner.identities.entry(key).or_insert(identity).clone())
    }
}
