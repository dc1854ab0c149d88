//! Identity provider configuration record.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::jwk::JwkSet;
use serde::{Deserialize, Serialize};

use super::ids::ProviderKey;

/// One trusted external identity provider.
///
/// Records are persisted by the admin surface and loaded wholesale by the
/// refresh task. The registry indexes them by `key` and by `issuer`
/// (case-insensitive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    /// Unique provider key; also determines the scheme id (`oidc-{key}`).
    pub key: ProviderKey,
    /// Expected `iss` claim.
    pub issuer: String,
    /// OIDC discovery document URL. Defaults to
    /// `{issuer}/.well-known/openid-configuration` when absent.
    #[serde(default)]
    pub discovery_url: Option<String>,
    /// Expected `aud` claim. Audience validation is skipped when absent.
    #[serde(default)]
    pub audience: Option<String>,
    /// Claim path overrides (checked before the built-in aliases).
    #[serde(default)]
    pub subject_claim: Option<String>,
    #[serde(default)]
    pub role_claim: Option<String>,
    #[serde(default)]
    pub email_claim: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Seeded from the gateway's own config file rather than the admin surface.
    #[serde(default)]
    pub bootstrap: bool,
    /// Create a federated identity on first sight of an unknown subject.
    #[serde(default)]
    pub auto_provision: bool,
    /// Role used for permission resolution when a token carries no role claim.
    #[serde(default)]
    pub default_role: Option<String>,
    #[serde(default)]
    pub clock_skew_seconds: u64,
    /// Window after `deactivated_at` during which tokens are still routed.
    #[serde(default)]
    pub disable_grace_seconds: u64,
    #[serde(default)]
    pub deactivated_at: Option<DateTime<Utc>>,
    /// Pre-seeded signing keys; when present the discovery endpoint is never called.
    #[serde(default)]
    pub signing_keys: Option<JwkSet>,
}

fn default_true() -> bool {
    true
}

impl ProviderRecord {
    /// Minimal active record; everything else takes its default.
    pub fn new(key: impl Into<ProviderKey>, issuer: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            issuer: issuer.into(),
            discovery_url: None,
            audience: None,
            subject_claim: None,
            role_claim: None,
            email_claim: None,
            active: true,
            bootstrap: false,
            auto_provision: false,
            default_role: None,
            clock_skew_seconds: 0,
            disable_grace_seconds: 0,
            deactivated_at: None,
            signing_keys: None,
        }
    }

    pub fn scheme_id(&self) -> String {
        self.key.scheme_id()
    }

    /// Normalized issuer used as the registry index.
    pub fn issuer_index(&self) -> String {
        normalize_issuer(&self.issuer)
    }

    /// Discovery URL, derived from the issuer when not configured.
    pub fn resolved_discovery_url(&self) -> String {
        match &self.discovery_url {
            Some(url) if !url.trim().is_empty() => url.clone(),
            _ => format!(
                "{}/.well-known/openid-configuration",
                self.issuer.trim_end_matches('/')
            ),
        }
    }

    /// Whether tokens from this provider may be routed to a validator at `now`.
    ///
    /// Active providers always are. Inactive providers are only routable
    /// inside their disable-grace window.
    pub fn is_routable_at(&self, now: DateTime<Utc>) -> bool {
        if self.active {
            return true;
        }
        match self.deactivated_at {
            Some(at) if self.disable_grace_seconds > 0 => {
                now < at + Duration::seconds(self.disable_grace_seconds as i64)
            }
            _ => false,
        }
    }
}

/// Lowercase and strip trailing slashes so `https://Idp.example.com/` and
/// `https://idp.example.com` index to the same provider.
pub fn normalize_issuer(issuer: &str) -> String {
    issuer.trim().trim_end_matches('/').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_url_defaults_from_issuer() {
        let record = ProviderRecord::new("acme", "https://idp.acme.test/realms/main/");
        assert_eq!(
            record.resolved_discovery_url(),
            "https://idp.acme.test/realms/main/.well-known/openid-configuration"
        );
    }

    #[test]
    fn test_inactive_provider_is_not_routable_without_grace() {
        let mut record = ProviderRecord::new("acme", "https://idp.acme.test");
        record.active = false;
        record.deactivated_at = Some(Utc::now());
        assert!(!record.is_routable_at(Utc::now()));
    }

    #[test]
    fn test_grace_window_keeps_provider_routable() {
        let now = Utc::now();
        let mut record = ProviderRecord::new("acme", "https://idp.acme.test");
        record.active = false;
        record.disable_grace_seconds = 60;
        record.deactivated_at = Some(now - Duration::seconds(30));
        assert!(record.is_routable_at(now));
        assert!(!record.is_routable_at(now + Duration::seconds(31)));
    }

    #[test]
    fn test_record_deserializes_with_defaults() {
        let record: ProviderRecord = serde_json::from_str(
            r#"{"key":"acme","issuer":"https://idp.acme.test"}"#,
        )
        .unwrap();
        assert!(record.active);
        assert!(!record.auto_provision);
        assert!(record.signing_keys.is_none());
        assert_eq!(record.issuer_index(), "https://idp.acme.test");
    }
}
