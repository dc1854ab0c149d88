use crate::context::SelectedProvider;
use crate::registry::ProviderRegistry;
use chrono::Utc;
use std::sync::Arc;
use vibe_oidc::extract_issuer_unverified;

/// Bearer token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively; an empty token yields `None`.
pub fn extract_bearer_token(header: Option<&str>) -> Option<&str> {
    let (scheme, token) = header?.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Picks the validator scheme for a request before any signature check.
pub struct MultiProviderSelector {
    registry: Arc<ProviderRegistry>,
    max_token_bytes: usize,
}

impl MultiProviderSelector {
    pub fn new(registry: Arc<ProviderRegistry>, max_token_bytes: usize) -> Self {
        Self {
            registry,
            max_token_bytes,
        }
    }

    /// Select a scheme from an `Authorization` header value.
    ///
    /// Returns `None` for a missing/non-bearer header, an oversized or
    /// structurally invalid token, an unknown issuer, or a provider that is
    /// inactive outside its grace window.
    pub fn select(&self, authorization: Option<&str>) -> Option<SelectedProvider> {
        let span = tracing::debug_span!("edge.select");
        let _entered = span.enter();

        let token = extract_bearer_token(authorization)?;

        if token.len() > self.max_token_bytes {
            log::debug!(
                "Bearer token rejected: {} bytes exceeds limit of {}",
                token.len(),
                self.max_token_bytes
            );
            return None;
        }

        let issuer = match extract_issuer_unverified(token) {
            Ok(issuer) => issuer,
            Err(e) => {
                log::debug!("Bearer token not routable: {}", e);
                return None;
            },
        };

        let Some(record) = self.registry.get_by_issuer(&issuer) else {
            log::debug!("No provider registered for issuer '{}'", issuer);
            return None;
        };

        if !record.is_routable_at(Utc::now()) {
            log::debug!("Provider '{}' is disabled; issuer '{}' not routed", record.key, issuer);
            return None;
        }

        Some(SelectedProvider {
            provider_key: record.key.clone(),
            scheme_id: record.scheme_id(),
        })
    }
}
