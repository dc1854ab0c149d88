// JWT inspection without signature verification.
//
// Used only to route a token to the validator of the provider that claims to
// have issued it. The chosen validator then verifies the signature and the
// issuer itself.

use crate::error::OidcError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::{decode_header, Algorithm};

/// Extract the `alg` field from the JWT header without verifying the signature.
pub fn extract_algorithm_unverified(token: &str) -> Result<Algorithm, OidcError> {
    let header = decode_header(token)
        .map_err(|e| OidcError::JwtValidationFailed(format!("Invalid JWT header: {}", e)))?;

    Ok(header.alg)
}

/// Extract the `iss` claim from the JWT payload **without verifying the signature**.
///
/// The token must have exactly three dot-separated segments; the payload is
/// base64url (padding tolerated) JSON with a string `iss`.
pub fn extract_issuer_unverified(token: &str) -> Result<String, OidcError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(OidcError::JwtValidationFailed(format!(
            "Invalid JWT format: expected 3 segments, got {}",
            parts.len()
        )));
    }

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|e| {
            OidcError::JwtValidationFailed(format!("Invalid JWT payload base64: {}", e))
        })?;

    let payload: serde_json::Value = serde_json::from_slice(&payload_bytes)
        .map_err(|e| OidcError::JwtValidationFailed(format!("Invalid JWT payload JSON: {}", e)))?;

    payload
        .get("iss")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| OidcError::JwtValidationFailed("Missing 'iss' claim".into()))
}
