use serde::Serialize;

/// Body of every gateway-generated error.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code (e.g. "UNAUTHORIZED", "FORBIDDEN")
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    #[inline]
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
