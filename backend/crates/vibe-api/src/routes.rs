//! Route table.
//!
//! - GET /health - liveness
//! - GET /health/providers - provider registry and scheme status
//! - ANY /v1/* - authorized, signed forwarding to the backend

use crate::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_handler))
        .route("/health/providers", web::get().to(handlers::providers_health_handler))
        .service(web::scope("/v1").default_service(web::to(handlers::forward_request)));
}
