use crate::config::{JwksSource, OidcConfig};
use crate::error::OidcError;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Verified token payload.
pub type TokenClaims = serde_json::Map<String, serde_json::Value>;

/// Algorithms accepted from external issuers. Symmetric algorithms are never
/// accepted since the gateway holds no shared secret with any provider.
const ACCEPTED_ALGORITHMS: [Algorithm; 8] = [
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
    Algorithm::ES256,
    Algorithm::ES384,
];

/// OIDC JWT validator with JWKS caching.
///
/// Each `OidcValidator` is bound to a single issuer configuration and
/// maintains an in-process cache of that issuer's public keys (JWKS).
///
/// When a token's `kid` is not found in the cache the validator
/// refreshes the key set (handles key rotation). Static key sets are
/// re-seeded instead of fetched.
#[derive(Clone)]
pub struct OidcValidator {
    config: OidcConfig,
    http: reqwest::Client,
    jwks_cache: Arc<RwLock<HashMap<String, Jwk>>>,
    /// `jwks_uri` resolved through discovery, kept until the cache is cleared.
    resolved_jwks_uri: Arc<RwLock<Option<String>>>,
}

impl OidcValidator {
    pub fn new(config: OidcConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create a validator sharing an existing HTTP client.
    pub fn with_client(config: OidcConfig, http: reqwest::Client) -> Self {
        let seeded = match &config.jwks_source {
            JwksSource::Static(keys) => index_keys(keys),
            _ => HashMap::new(),
        };

        Self {
            config,
            http,
            jwks_cache: Arc::new(RwLock::new(seeded)),
            resolved_jwks_uri: Arc::new(RwLock::new(None)),
        }
    }

    pub fn config(&self) -> &OidcConfig {
        &self.config
    }

    /// Validate a JWT and return its claims.
    ///
    /// Validation includes:
    /// - Signature verification against the issuer's public key
    /// - `iss` must match the configured issuer (case and trailing `/` ignored)
    /// - `aud` must contain the configured audience (if set)
    /// - `exp` / `nbf` within the configured leeway
    pub async fn validate(&self, token: &str) -> Result<TokenClaims, OidcError> {
        let header = decode_header(token)?;

        if !ACCEPTED_ALGORITHMS.contains(&header.alg) {
            return Err(OidcError::JwtValidationFailed(format!(
                "Unsupported algorithm {:?}",
                header.alg
            )));
        }

        let kid = header.kid.ok_or(OidcError::MissingKid)?;
        log::debug!("Token kid: {}, alg: {:?}", kid, header.alg);

        let jwk = self.get_jwk(&kid).await?;
        let decoding_key = DecodingKey::from_jwk(&jwk)
            .map_err(|e| OidcError::InvalidKeyFormat(e.to_string()))?;

        // Pinned to the header's algorithm; the allow-list check above already ran.
        let mut validation = Validation::new(header.alg);
        validation.leeway = self.config.leeway_seconds;
        validation.validate_nbf = true;
        match &self.config.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        let token_data = decode::<TokenClaims>(token, &decoding_key, &validation).map_err(|e| {
            log::debug!("JWT decode failed: kind={:?} msg={}", e.kind(), e);
            OidcError::from(e)
        })?;

        let claims = token_data.claims;
        let actual = claims.get("iss").and_then(|v| v.as_str()).unwrap_or_default();
        if !same_issuer(actual, &self.config.issuer_url) {
            return Err(OidcError::IssuerMismatch {
                expected: self.config.issuer_url.clone(),
                actual: actual.to_string(),
            });
        }

        Ok(claims)
    }

    /// Look up a JWK by `kid`. Refreshes the cache on miss.
    async fn get_jwk(&self, kid: &str) -> Result<Jwk, OidcError> {
        {
            let cache = self.jwks_cache.read().await;
            if let Some(jwk) = cache.get(kid) {
                return Ok(jwk.clone());
            }
        }

        self.refresh_jwks_cache().await?;

        let cache = self.jwks_cache.read().await;
        cache
            .get(kid)
            .cloned()
            .ok_or_else(|| OidcError::KeyNotFound(kid.to_string()))
    }

    /// Reload the key set from its source and replace the cache if keys changed.
    pub async fn refresh_jwks_cache(&self) -> Result<(), OidcError> {
        let new_jwks = match &self.config.jwks_source {
            JwksSource::Static(keys) => keys.clone(),
            _ => self.fetch_jwks().await?,
        };

        let needs_update = {
            let cache = self.jwks_cache.read().await;
            new_jwks.keys.len() != cache.len()
                || new_jwks.keys.iter().any(|jwk| {
                    jwk.common
                        .key_id
                        .as_ref()
                        .is_some_and(|kid| !cache.contains_key(kid))
                })
        };

        if needs_update {
            let new_cache = index_keys(&new_jwks);
            let mut cache = self.jwks_cache.write().await;
            *cache = new_cache;
            log::info!(
                "JWKS cache refreshed with {} keys for {}",
                cache.len(),
                self.config.issuer_url
            );
        } else {
            log::debug!("JWKS cache unchanged for {}", self.config.issuer_url);
        }

        Ok(())
    }

    /// Drop cached signing keys and any discovered `jwks_uri`.
    pub async fn clear_cache(&self) {
        self.jwks_cache.write().await.clear();
        *self.resolved_jwks_uri.write().await = None;
    }

    pub async fn cached_key_count(&self) -> usize {
        self.jwks_cache.read().await.len()
    }

    async fn jwks_uri(&self) -> Result<String, OidcError> {
        let discovery_url = match &self.config.jwks_source {
            JwksSource::Uri(uri) => return Ok(uri.clone()),
            JwksSource::Discovery(url) => url,
            JwksSource::Static(_) => {
                return Err(OidcError::JwksFetchFailed(
                    "Static key set has no JWKS endpoint".into(),
                ))
            },
        };

        if let Some(uri) = self.resolved_jwks_uri.read().await.as_ref() {
            return Ok(uri.clone());
        }

        let uri = OidcConfig::discover_jwks_uri(&self.http, discovery_url).await?;
        *self.resolved_jwks_uri.write().await = Some(uri.clone());
        Ok(uri)
    }

    /// HTTP fetch of the issuer's JWKS endpoint.
    async fn fetch_jwks(&self) -> Result<JwkSet, OidcError> {
        let jwks_uri = self.jwks_uri().await?;
        log::debug!("Fetching JWKS from: {}", jwks_uri);

        let response = self.http.get(&jwks_uri).send().await.map_err(|e| {
            OidcError::JwksFetchFailed(format!("Failed to fetch JWKS from '{}': {}", jwks_uri, e))
        })?;

        if !response.status().is_success() {
            return Err(OidcError::JwksFetchFailed(format!(
                "JWKS request to '{}' returned status {}",
                jwks_uri,
                response.status()
            )));
        }

        let jwks: JwkSet = response.json().await.map_err(|e| {
            OidcError::JwksFetchFailed(format!(
                "Failed to parse JWKS JSON from '{}': {}",
                jwks_uri, e
            ))
        })?;

        log::debug!("Fetched {} keys from JWKS", jwks.keys.len());
        Ok(jwks)
    }
}

fn index_keys(keys: &JwkSet) -> HashMap<String, Jwk> {
    keys.keys
        .iter()
        .filter_map(|jwk| jwk.common.key_id.clone().map(|kid| (kid, jwk.clone())))
        .collect()
}

fn same_issuer(a: &str, b: &str) -> bool {
    let a = a.trim().trim_end_matches('/');
    let b = b.trim().trim_end_matches('/');
    !a.is_empty() && a.eq_ignore_ascii_case(b)
}
