use crate::error::OidcError;
use jsonwebtoken::jwk::JwkSet;

/// OpenID Connect Discovery document (partial).
#[derive(Debug, serde::Deserialize)]
struct OidcDiscovery {
    jwks_uri: String,
}

/// Where a validator obtains the issuer's signing keys.
#[derive(Debug, Clone)]
pub enum JwksSource {
    /// Resolve `jwks_uri` from this discovery document on first use.
    Discovery(String),
    /// Fetch keys from a known JWKS URI.
    Uri(String),
    /// Fixed keys; nothing is ever fetched.
    Static(JwkSet),
}

/// Configuration for a single OIDC issuer.
///
/// Building a config never touches the network. Discovery (when the source is
/// [`JwksSource::Discovery`]) happens lazily on the first validation.
#[derive(Debug, Clone)]
pub struct OidcConfig {
    /// The issuer URL (e.g. `https://keycloak.example.com/realms/myapp`).
    pub issuer_url: String,

    /// Expected `aud`. If `None`, audience validation is skipped.
    pub audience: Option<String>,

    pub jwks_source: JwksSource,

    /// Clock skew tolerated on `exp` / `nbf`.
    pub leeway_seconds: u64,
}

impl OidcConfig {
    /// Config with a known JWKS URI.
    pub fn new(issuer_url: String, audience: Option<String>, jwks_uri: String) -> Self {
        Self {
            issuer_url,
            audience,
            jwks_source: JwksSource::Uri(jwks_uri),
            leeway_seconds: 0,
        }
    }

    /// Config resolved through OIDC discovery at `discovery_url` on first use.
    pub fn with_discovery(
        issuer_url: String,
        audience: Option<String>,
        discovery_url: String,
    ) -> Self {
        Self {
            issuer_url,
            audience,
            jwks_source: JwksSource::Discovery(discovery_url),
            leeway_seconds: 0,
        }
    }

    /// Config backed by a fixed key set.
    pub fn with_static_keys(issuer_url: String, audience: Option<String>, keys: JwkSet) -> Self {
        Self {
            issuer_url,
            audience,
            jwks_source: JwksSource::Static(keys),
            leeway_seconds: 0,
        }
    }

    pub fn leeway(mut self, seconds: u64) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    /// Fetch a discovery document and return its `jwks_uri`.
    pub async fn discover_jwks_uri(
        client: &reqwest::Client,
        discovery_url: &str,
    ) -> Result<String, OidcError> {
        log::debug!("OIDC discovery: fetching {}", discovery_url);

        let response = client.get(discovery_url).send().await.map_err(|e| {
            OidcError::DiscoveryFailed(format!(
                "Failed to fetch OIDC discovery from '{}': {}",
                discovery_url, e
            ))
        })?;

        if !response.status().is_success() {
            return Err(OidcError::DiscoveryFailed(format!(
                "OIDC discovery request to '{}' returned status {}",
                discovery_url,
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if !content_type.starts_with("application/json") {
            return Err(OidcError::DiscoveryFailed(format!(
                "Unexpected Content-Type from '{}': '{}', expected 'application/json'",
                discovery_url, content_type
            )));
        }

        let discovery: OidcDiscovery = response.json().await.map_err(|e| {
            OidcError::DiscoveryFailed(format!(
                "Failed to parse OIDC discovery JSON from '{}': {}",
                discovery_url, e
            ))
        })?;

        log::debug!("OIDC discovery: jwks_uri = {}", discovery.jwks_uri);
        Ok(discovery.jwks_uri)
    }
}
