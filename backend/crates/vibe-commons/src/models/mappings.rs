//! Role and client mappings that drive permission resolution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::ids::ProviderKey;
use super::permission_level::PermissionLevel;

/// Denied-statement wildcard: deny everything regardless of level.
pub const DENY_ALL: &str = "*";

/// (provider, external role) → permission level plus per-statement denials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMapping {
    pub provider_key: ProviderKey,
    /// Matched exactly (case-sensitive) against the token's role claim values.
    pub external_role: String,
    pub permission_level: PermissionLevel,
    /// Statement keywords (`DELETE`, `TRUNCATE`, ...) or [`DENY_ALL`].
    #[serde(default)]
    pub denied_statements: BTreeSet<String>,
}

impl RoleMapping {
    pub fn new(
        provider_key: impl Into<ProviderKey>,
        external_role: impl Into<String>,
        permission_level: PermissionLevel,
    ) -> Self {
        Self {
            provider_key: provider_key.into(),
            external_role: external_role.into(),
            permission_level,
            denied_statements: BTreeSet::new(),
        }
    }

    /// Builder-style helper used by bootstrap config and tests.
    pub fn with_denied<I, S>(mut self, statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.denied_statements.extend(
            statements
                .into_iter()
                .map(|s| s.as_ref().trim().to_ascii_uppercase())
                .filter(|s| !s.is_empty()),
        );
        self
    }
}

/// (provider, client id) → ceiling on the role-derived level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMapping {
    pub provider_key: ProviderKey,
    pub client_id: String,
    pub max_level: PermissionLevel,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Tenant tier label forwarded to the backend as `X-Vibe-Client-Tier`.
    #[serde(default)]
    pub tier: Option<String>,
}

fn default_active() -> bool {
    true
}

impl ClientMapping {
    pub fn new(
        provider_key: impl Into<ProviderKey>,
        client_id: impl Into<String>,
        max_level: PermissionLevel,
    ) -> Self {
        Self {
            provider_key: provider_key.into(),
            client_id: client_id.into(),
            max_level,
            active: true,
            tier: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_denied_normalizes_keywords() {
        let mapping = RoleMapping::new("acme", "analyst", PermissionLevel::Write)
            .with_denied(["delete", " Truncate ", "", "*"]);
        let denied: Vec<&str> = mapping.denied_statements.iter().map(|s| s.as_str()).collect();
        assert_eq!(denied, vec!["*", "DELETE", "TRUNCATE"]);
    }
}
