mod forward;
mod health;

pub use forward::forward_request;
pub use health::{health_handler, providers_health_handler};
