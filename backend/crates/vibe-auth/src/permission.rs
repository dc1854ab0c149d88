use crate::context::ResolvedPermission;
use crate::error::AuthResult;
use crate::repository::MappingRepository;
use std::collections::BTreeSet;
use std::sync::Arc;
use vibe_commons::{PermissionLevel, ProviderKey};

/// Computes the effective permission of a caller from role and client mappings.
pub struct PermissionResolver {
    mappings: Arc<dyn MappingRepository>,
}

impl PermissionResolver {
    pub fn new(mappings: Arc<dyn MappingRepository>) -> Self {
        Self { mappings }
    }

    /// 1. Role mappings of the provider whose external role is in `roles`
    ///    (exact match). None matched ⇒ no permission.
    /// 2. Level = max over matches; denials = union over matches.
    /// 3. If the provider has active client mappings, `client_id` must match
    ///    one (else no permission) and the level is capped at its max level.
    pub async fn resolve(
        &self,
        provider_key: &ProviderKey,
        roles: &[String],
        client_id: Option<&str>,
    ) -> AuthResult<ResolvedPermission> {
        let role_mappings = self.mappings.role_mappings(provider_key).await?;

        let matched: Vec<_> = role_mappings
            .iter()
            .filter(|m| roles.iter().any(|r| r == &m.external_role))
            .collect();

        if matched.is_empty() {
            return Ok(ResolvedPermission::none());
        }

        let mut effective_level = matched
            .iter()
            .map(|m| m.permission_level)
            .max()
            .unwrap_or(PermissionLevel::None);
        let denied_statements: BTreeSet<String> = matched
            .iter()
            .flat_map(|m| m.denied_statements.iter().cloned())
            .collect();
        let matched_roles = matched.iter().map(|m| m.external_role.clone()).collect();

        let client_mappings = self.mappings.client_mappings(provider_key).await?;
        let active_clients: Vec<_> = client_mappings.iter().filter(|c| c.active).collect();

        let mut client_tier = None;
        if !active_clients.is_empty() {
            let Some(client) = client_id
                .and_then(|id| active_clients.iter().find(|c| c.client_id == id))
            else {
                log::debug!(
                    "Provider '{}' requires a mapped client; got {:?}",
                    provider_key,
                    client_id
                );
                return Ok(ResolvedPermission::none());
            };
            effective_level = effective_level.min(client.max_level);
            client_tier = client.tier.clone();
        }

        Ok(ResolvedPermission {
            effective_level,
            denied_statements,
            matched_roles,
            client_tier,
        })
    }
}
