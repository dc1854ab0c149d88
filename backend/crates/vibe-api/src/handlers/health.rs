//! Unauthenticated health endpoints.

use crate::models::{HealthResponse, ProviderHealth, ProvidersHealthResponse};
use crate::state::EdgeServices;
use actix_web::{web, HttpResponse, Responder};

/// GET /health
pub async fn health_handler() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse::ok_with_version(env!("CARGO_PKG_VERSION")))
}

/// GET /health/providers
///
/// Every provider in the current registry snapshot and whether its scheme is
/// registered. Inactive providers remain listed until removed from the store.
pub async fn providers_health_handler(services: web::Data<EdgeServices>) -> impl Responder {
    let providers = services
        .registry
        .snapshot()
        .into_iter()
        .map(|record| ProviderHealth {
            key: record.key.to_string(),
            issuer: record.issuer.clone(),
            active: record.active,
            bootstrap: record.bootstrap,
            scheme_registered: services.schemes.contains(&record.scheme_id()),
        })
        .collect();

    HttpResponse::Ok().json(ProvidersHealthResponse { providers })
}
