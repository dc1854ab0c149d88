use crate::error::ProxyError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs forwarded requests with the secret shared with the backend.
///
/// `signature = base64(HMAC-SHA256(key, "{timestamp}|{METHOD}|{path}"))`
/// where `timestamp` is unix seconds.
#[derive(Clone)]
pub struct HmacSigner {
    mac: HmacSha256,
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner").finish_non_exhaustive()
    }
}

impl HmacSigner {
    /// `secret` is the base64 encoding of the key.
    pub fn new(secret: &str) -> Result<Self, ProxyError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(ProxyError::InvalidSecret("secret is empty".to_string()));
        }
        let key = STANDARD
            .decode(secret)
            .map_err(|e| ProxyError::InvalidSecret(format!("not valid base64: {}", e)))?;
        if key.is_empty() {
            return Err(ProxyError::InvalidSecret("decoded key is empty".to_string()));
        }
        let mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| ProxyError::InvalidSecret(e.to_string()))?;
        Ok(Self { mac })
    }

    /// Sign with the current time; returns `(timestamp, signature)`.
    pub fn sign(&self, method: &str, path: &str) -> (String, String) {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign_at(&timestamp, method, path);
        (timestamp, signature)
    }

    pub fn sign_at(&self, timestamp: &str, method: &str, path: &str) -> String {
        let message = format!("{}|{}|{}", timestamp, method.to_ascii_uppercase(), path);
        let mut mac = self.mac.clone();
        mac.update(message.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }
}
