use crate::models::ErrorResponse;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use vibe_auth::AuthError;

/// Failures while assembling or sending the forwarded request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Invalid HMAC secret: {0}")]
    InvalidSecret(String),

    #[error("Invalid forwarded request: {0}")]
    InvalidRequest(String),

    #[error("Backend request failed: {0}")]
    Backend(#[from] reqwest::Error),
}

/// JSON error body with the given status.
pub fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse::new(code, message))
}

/// Render an [`AuthError`] with its mapped status and public message.
pub fn auth_error_response(err: &AuthError) -> HttpResponse {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match err {
        AuthError::InvariantViolation(_) | AuthError::StoreError(_) => {
            log::error!("Request failed: {}", err);
        },
        _ => log::debug!("Request rejected: {}", err),
    }
    error_response(status, err.error_code(), err.public_message())
}
