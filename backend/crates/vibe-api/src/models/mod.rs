//! Request and response bodies owned by the gateway.

mod error_response;
mod health;
mod query_request;

pub use error_response::ErrorResponse;
pub use health::{HealthResponse, ProviderHealth, ProvidersHealthResponse};
pub use query_request::QueryRequest;
