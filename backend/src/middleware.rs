//! Server-wide middleware configuration helpers.
//!
//! The gateway's own auth stages live in `vibe_api::middleware`; this module
//! only builds the outer CORS and request logging layers.

use actix_cors::Cors;
use actix_web::http::{header::HeaderName, Method};
use actix_web::middleware;
use log::debug;
use vibe_configs::CorsSettings;

/// Build CORS middleware from the `[security.cors]` section using actix-cors.
///
/// An empty origin list or `"*"` allows any origin.
pub fn build_cors_from_config(cors_config: &CorsSettings) -> Cors {
    let mut cors = Cors::default();

    if cors_config.allowed_origins.is_empty() || cors_config.allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
        debug!("CORS: Allowing any origin");
    } else {
        for origin in &cors_config.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
        debug!("CORS: Allowed origins: {:?}", cors_config.allowed_origins);
    }

    let methods: Vec<Method> = cors_config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    if !methods.is_empty() {
        cors = cors.allowed_methods(methods);
    }

    if cors_config.allowed_headers.iter().any(|h| h == "*") {
        cors = cors.allow_any_header();
    } else {
        let headers: Vec<HeaderName> = cors_config
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        if !headers.is_empty() {
            cors = cors.allowed_headers(headers);
        }
    }

    if cors_config.allow_credentials {
        cors = cors.supports_credentials();
    }

    cors.max_age(cors_config.max_age as usize)
}

/// Build the request logger middleware.
///
/// The `Authorization` header is never part of the format.
pub fn request_logger() -> middleware::Logger {
    middleware::Logger::new(r#"%a "%r" %s %b %T"#)
}
