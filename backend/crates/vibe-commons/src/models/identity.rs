//! External identity → internal user link.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{IdentityId, ProviderKey, UserId};

/// Link between an external (provider, subject) pair and an internal user.
///
/// `(provider_key, external_subject)` is unique. Rows are created once by
/// provisioning, touched on each successful resolution, and deactivated
/// (never deleted) to block a subject permanently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederatedIdentity {
    pub id: IdentityId,
    pub provider_key: ProviderKey,
    pub external_subject: String,
    pub user_id: UserId,
    pub email: Option<String>,
    pub active: bool,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl FederatedIdentity {
    pub fn key(&self) -> (&ProviderKey, &str) {
        (&self.provider_key, self.external_subject.as_str())
    }
}
