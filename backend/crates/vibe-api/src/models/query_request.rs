use serde::Deserialize;

/// Body of `POST /v1/query`. Unknown fields are forwarded untouched.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub sql: String,
}
