//! Per-request values produced by each pipeline stage.

use serde_json::Value;
use std::collections::BTreeSet;
use vibe_commons::{IdentityId, PermissionLevel, ProviderKey, UserId, DENY_ALL};
use vibe_oidc::TokenClaims;

/// Output of provider selection, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedProvider {
    pub provider_key: ProviderKey,
    pub scheme_id: String,
}

/// A token verified by a registered scheme.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal {
    pub scheme_id: String,
    pub provider_key: ProviderKey,
    pub claims: TokenClaims,
}

impl AuthenticatedPrincipal {
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// Client id from `aud`: the string itself, or the first entry of an array.
    pub fn client_id(&self) -> Option<String> {
        match self.claims.get("aud")? {
            Value::String(aud) if !aud.is_empty() => Some(aud.clone()),
            Value::Array(values) => values.first().and_then(|v| v.as_str()).map(String::from),
            _ => None,
        }
    }
}

/// Normalized identity claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedClaims {
    pub subject: String,
    pub roles: Vec<String>,
    pub email: Option<String>,
}

/// Internal user behind a federated identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub user_id: UserId,
    pub identity_id: IdentityId,
    pub provider_key: ProviderKey,
    pub external_subject: String,
    pub email: Option<String>,
    /// Created by this resolution.
    pub provisioned: bool,
}

/// Request-scoped identity stashed by identity resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeIdentity {
    pub user_id: UserId,
    pub provider_key: ProviderKey,
    pub external_subject: String,
    pub roles: Vec<String>,
    pub client_id: Option<String>,
    pub email: Option<String>,
}

/// Effective authorization for one request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedPermission {
    pub effective_level: PermissionLevel,
    /// Upper-case statement keywords, or `*`.
    pub denied_statements: BTreeSet<String>,
    pub matched_roles: Vec<String>,
    /// Tier of the matched client mapping, forwarded to the backend.
    pub client_tier: Option<String>,
}

impl ResolvedPermission {
    /// `{None, ∅, ∅}`
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether a statement is denied by type (`EXPLAIN DELETE`) or base keyword (`DELETE`).
    pub fn denies(&self, statement_type: &str, base_keyword: &str) -> bool {
        self.denies_any([statement_type, base_keyword])
    }

    /// Whether any of `keys` is denied, including keywords a statement
    /// embeds (a `DELETE` inside a CTE body).
    pub fn denies_any<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> bool {
        if self.denied_statements.contains(DENY_ALL) {
            return true;
        }
        keys.into_iter()
            .any(|key| self.denied_statements.iter().any(|d| d.eq_ignore_ascii_case(key)))
    }
}
