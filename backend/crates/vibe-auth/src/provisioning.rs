use crate::context::ExtractedClaims;
use crate::error::AuthResult;
use crate::repository::IdentityRepository;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use vibe_commons::{FederatedIdentity, IdentityId, ProviderKey, UserId};

/// Creates internal users for first-seen external subjects.
pub struct UserProvisioningService {
    identities: Arc<dyn IdentityRepository>,
}

impl UserProvisioningService {
    pub fn new(identities: Arc<dyn IdentityRepository>) -> Self {
        Self { identities }
    }

    /// Allocate a user id and create the identity row; returns `(user id, identity id)`.
    pub async fn provision(
        &self,
        provider_key: &ProviderKey,
        claims: &ExtractedClaims,
    ) -> AuthResult<(UserId, IdentityId)> {
        let identity = self.provision_identity(provider_key, claims).await?;
        Ok((identity.user_id, identity.id))
    }

    /// Like [`provision`](Self::provision) but returns the stored row.
    ///
    /// When a concurrent provisioning of the same subject won the race, the
    /// winner's row is returned.
    pub async fn provision_identity(
        &self,
        provider_key: &ProviderKey,
        claims: &ExtractedClaims,
    ) -> AuthResult<FederatedIdentity> {
        let now = Utc::now();
        let candidate = FederatedIdentity {
            id: IdentityId::new(format!("fi_{}", Uuid::new_v4())),
            provider_key: provider_key.clone(),
            external_subject: claims.subject.clone(),
            user_id: UserId::new(format!("u_{}", Uuid::new_v4())),
            email: claims.email.clone(),
            active: true,
            first_seen: now,
            last_seen: now,
        };
        let candidate_user = candidate.user_id.clone();

        let stored = self.identities.create_identity(candidate).await?;

        if stored.user_id == candidate_user {
            log::info!(
                "Provisioned user {} for subject '{}' of provider '{}'",
                stored.user_id,
                stored.external_subject,
                provider_key
            );
        } else {
            log::debug!(
                "Subject '{}' of provider '{}' was provisioned concurrently as {}",
                stored.external_subject,
                provider_key,
                stored.user_id
            );
        }

        Ok(stored)
    }
}
