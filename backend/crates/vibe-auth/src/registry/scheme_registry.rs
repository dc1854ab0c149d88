use crate::context::AuthenticatedPrincipal;
use crate::error::{AuthError, AuthResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use vibe_commons::constants::SCHEME_ID_PREFIX;
use vibe_commons::{ProviderKey, ProviderRecord};
use vibe_oidc::{OidcConfig, OidcValidator};

/// Host authentication layer: bearer validators keyed by scheme id.
#[derive(Default)]
pub struct SchemeRegistry {
    schemes: RwLock<HashMap<String, Arc<OidcValidator>>>,
}

impl SchemeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, scheme_id: &str) -> Option<Arc<OidcValidator>> {
        self.schemes.read().get(scheme_id).cloned()
    }

    pub fn contains(&self, scheme_id: &str) -> bool {
        self.schemes.read().contains_key(scheme_id)
    }

    /// Insert or replace the validator for `scheme_id`.
    pub fn insert(&self, scheme_id: String, validator: Arc<OidcValidator>) {
        self.schemes.write().insert(scheme_id, validator);
    }

    pub fn remove(&self, scheme_id: &str) -> Option<Arc<OidcValidator>> {
        self.schemes.write().remove(scheme_id)
    }

    pub fn scheme_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.schemes.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Verify `token` with the validator registered under `scheme_id`.
    ///
    /// A scheme removed after selection yields an authentication failure.
    pub async fn authenticate(
        &self,
        scheme_id: &str,
        token: &str,
    ) -> AuthResult<AuthenticatedPrincipal> {
        let validator = self.get(scheme_id).ok_or_else(|| {
            AuthError::AuthenticationFailure(format!("Scheme '{}' is not registered", scheme_id))
        })?;
        let provider_key = ProviderKey::from_scheme_id(scheme_id).ok_or_else(|| {
            AuthError::InvariantViolation(format!("Malformed scheme id '{}'", scheme_id))
        })?;

        let claims = validator.validate(token).await?;

        Ok(AuthenticatedPrincipal {
            scheme_id: scheme_id.to_string(),
            provider_key,
            claims,
        })
    }
}

/// Adds, updates and removes per-provider validators in a [`SchemeRegistry`].
///
/// Called only from the refresh task, so register/unregister are serialized.
pub struct DynamicSchemeRegistrar {
    schemes: Arc<SchemeRegistry>,
    http: reqwest::Client,
    default_clock_skew_seconds: u64,
    /// Record each scheme was last registered from.
    registered: RwLock<HashMap<String, ProviderRecord>>,
}

impl DynamicSchemeRegistrar {
    pub fn new(
        schemes: Arc<SchemeRegistry>,
        http: reqwest::Client,
        default_clock_skew_seconds: u64,
    ) -> Self {
        Self {
            schemes,
            http,
            default_clock_skew_seconds,
            registered: RwLock::new(HashMap::new()),
        }
    }

    pub fn schemes(&self) -> &Arc<SchemeRegistry> {
        &self.schemes
    }

    /// Register (or re-register in place) the validator for `record`.
    ///
    /// No network I/O happens here; discovery runs on first validation.
    pub fn register(&self, record: &ProviderRecord) {
        let scheme_id = record.scheme_id();
        let config = self.oidc_config(record);
        let validator = Arc::new(OidcValidator::with_client(config, self.http.clone()));

        self.schemes.insert(scheme_id.clone(), validator);
        let replaced = self
            .registered
            .write()
            .insert(scheme_id.clone(), record.clone())
            .is_some();

        log::info!(
            "{} scheme '{}' for issuer '{}'",
            if replaced { "Updated" } else { "Registered" },
            scheme_id,
            record.issuer
        );
    }

    /// Remove a scheme and drop its cached signing keys.
    pub async fn unregister(&self, scheme_id: &str) -> bool {
        self.registered.write().remove(scheme_id);
        match self.schemes.remove(scheme_id) {
            Some(validator) => {
                validator.clear_cache().await;
                log::info!("Unregistered scheme '{}'", scheme_id);
                true
            },
            None => false,
        }
    }

    pub fn is_registered(&self, scheme_id: &str) -> bool {
        self.schemes.contains(scheme_id)
    }

    /// Registered from exactly this record.
    pub fn is_current(&self, record: &ProviderRecord) -> bool {
        self.schemes.contains(&record.scheme_id())
            && self.registered.read().get(&record.scheme_id()) == Some(record)
    }

    /// Scheme ids owned by this registrar (`oidc-` prefix).
    pub fn registered_scheme_ids(&self) -> Vec<String> {
        self.schemes
            .scheme_ids()
            .into_iter()
            .filter(|id| id.starts_with(SCHEME_ID_PREFIX))
            .collect()
    }

    fn oidc_config(&self, record: &ProviderRecord) -> OidcConfig {
        let config = match &record.signing_keys {
            Some(keys) => OidcConfig::with_static_keys(
                record.issuer.clone(),
                record.audience.clone(),
                keys.clone(),
            ),
            None => OidcConfig::with_discovery(
                record.issuer.clone(),
                record.audience.clone(),
                record.resolved_discovery_url(),
            ),
        };

        let skew = if record.clock_skew_seconds > 0 {
            record.clock_skew_seconds
        } else {
            self.default_clock_skew_seconds
        };
        config.leeway(skew)
    }
}
