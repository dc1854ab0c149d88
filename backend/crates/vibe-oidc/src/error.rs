/// Errors produced while selecting keys for, or validating, an external token.
#[derive(Debug, thiserror::Error)]
pub enum OidcError {
    /// OIDC Discovery endpoint failed or returned unexpected data.
    #[error("OIDC discovery failed: {0}")]
    DiscoveryFailed(String),

    /// JWKS fetch or parse failed.
    #[error("JWKS fetch failed: {0}")]
    JwksFetchFailed(String),

    #[error("Token is missing the 'kid' header")]
    MissingKid,

    /// No key with the given `kid` was found in the issuer's JWKS.
    #[error("No key found for kid '{0}'")]
    KeyNotFound(String),

    #[error("Invalid JWK format: {0}")]
    InvalidKeyFormat(String),

    /// The token's `iss` does not match the validator's issuer.
    #[error("Issuer mismatch: expected '{expected}', got '{actual}'")]
    IssuerMismatch { expected: String, actual: String },

    /// JWT decode / signature verification / claims validation failed.
    #[error("JWT validation failed: {0}")]
    JwtValidationFailed(String),
}

impl From<jsonwebtoken::errors::Error> for OidcError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match e.kind() {
            ErrorKind::ExpiredSignature => OidcError::JwtValidationFailed("Token expired".into()),
            ErrorKind::ImmatureSignature => {
                OidcError::JwtValidationFailed("Token not yet valid".into())
            },
            ErrorKind::InvalidSignature => {
                OidcError::JwtValidationFailed("Invalid signature".into())
            },
            ErrorKind::InvalidAudience => OidcError::JwtValidationFailed("Invalid audience".into()),
            ErrorKind::InvalidToken => OidcError::JwtValidationFailed("Invalid token".into()),
            _ => OidcError::JwtValidationFailed(e.to_string()),
        }
    }
}
