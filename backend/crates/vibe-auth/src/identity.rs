use crate::context::{ExtractedClaims, ResolvedIdentity};
use crate::error::AuthResult;
use crate::provisioning::UserProvisioningService;
use crate::repository::IdentityRepository;
use chrono::Utc;
use std::sync::Arc;
use tracing::Instrument;
use vibe_commons::{FederatedIdentity, ProviderKey, ProviderRecord};

/// Resolves `(provider, external subject)` to an internal user.
pub struct FederatedIdentityResolver {
    identities: Arc<dyn IdentityRepository>,
    provisioning: Arc<UserProvisioningService>,
}

impl FederatedIdentityResolver {
    pub fn new(
        identities: Arc<dyn IdentityRepository>,
        provisioning: Arc<UserProvisioningService>,
    ) -> Self {
        Self {
            identities,
            provisioning,
        }
    }

    /// - found and active: touch `last_seen`/email and return it
    /// - found and inactive: `None`, whatever the provider's auto-provision setting
    /// - not found: provision when the provider allows it, otherwise `None`
    pub async fn resolve(
        &self,
        provider_key: &ProviderKey,
        claims: &ExtractedClaims,
        provider: &ProviderRecord,
    ) -> AuthResult<Option<ResolvedIdentity>> {
        let span = tracing::info_span!(
            "edge.identity",
            provider = %provider_key,
            subject = %claims.subject
        );

        async move {
            let existing = self
                .identities
                .find_identity(provider_key, &claims.subject)
                .await?;

            match existing {
                Some(identity) if !identity.active => {
                    log::warn!(
                        "Deactivated identity '{}' of provider '{}' attempted access",
                        claims.subject,
                        provider_key
                    );
                    Ok(None)
                },
                Some(identity) => {
                    self.identities
                        .touch_identity(&identity.id, claims.email.as_deref(), Utc::now())
                        .await?;
                    let mut resolved = resolved_from(identity, false);
                    if claims.email.is_some() {
                        resolved.email = claims.email.clone();
                    }
                    Ok(Some(resolved))
                },
                None if provider.auto_provision => {
                    let identity = self.provisioning.provision_identity(provider_key, claims).await?;
                    if !identity.active {
                        return Ok(None);
                    }
                    Ok(Some(resolved_from(identity, true)))
                },
                None => {
                    log::debug!(
                        "Unknown subject '{}' and provider '{}' does not auto-provision",
                        claims.subject,
                        provider_key
                    );
                    Ok(None)
                },
            }
        }
        .instrument(span)
        .await
    }
}

fn resolved_from(identity: FederatedIdentity, provisioned: bool) -> ResolvedIdentity {
    ResolvedIdentity {
        user_id: identity.user_id,
        identity_id: identity.id,
        provider_key: identity.provider_key,
        external_subject: identity.external_subject,
        email: identity.email,
        provisioned,
    }
}
