use crate::repository::StoreError;
use vibe_oidc::OidcError;

/// Request-path failures, each with a fixed HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing, malformed, unverifiable, or unknown-issuer token.
    #[error("Authentication failed: {0}")]
    AuthenticationFailure(String),

    /// Token verified but no usable internal identity.
    #[error("Identity not resolved: {0}")]
    IdentityNotResolved(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// State that the pipeline guarantees cannot occur (e.g. a selected
    /// provider missing from the registry).
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Store error: {0}")]
    StoreError(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::AuthenticationFailure(_) => 401,
            AuthError::IdentityNotResolved(_) | AuthError::PermissionDenied(_) => 403,
            AuthError::MalformedRequest(_) => 400,
            AuthError::InvariantViolation(_) => 500,
            AuthError::StoreError(_) => 503,
        }
    }

    /// Value of the `error` field in JSON error bodies.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::AuthenticationFailure(_) => "UNAUTHORIZED",
            AuthError::IdentityNotResolved(_) => "IDENTITY_NOT_RESOLVED",
            AuthError::PermissionDenied(_) => "FORBIDDEN",
            AuthError::MalformedRequest(_) => "BAD_REQUEST",
            AuthError::InvariantViolation(_) => "INTERNAL_ERROR",
            AuthError::StoreError(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Text safe to return to the caller.
    ///
    /// Internal and store failures are not described to the client.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::AuthenticationFailure(msg)
            | AuthError::IdentityNotResolved(msg)
            | AuthError::PermissionDenied(msg)
            | AuthError::MalformedRequest(msg) => msg.clone(),
            AuthError::InvariantViolation(_) => "Internal server error".to_string(),
            AuthError::StoreError(_) => "Identity store unavailable".to_string(),
        }
    }
}

impl From<OidcError> for AuthError {
    fn from(e: OidcError) -> Self {
        AuthError::AuthenticationFailure(e.to_string())
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        AuthError::StoreError(e.to_string())
    }
}
