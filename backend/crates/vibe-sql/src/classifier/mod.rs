mod engine;
mod http;
mod types;

pub use engine::SqlStatementClassifier;
pub use http::classify_http_request;
pub use types::Classification;
