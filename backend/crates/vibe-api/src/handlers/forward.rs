//! Catch-all handler for `/v1/*`: signs the call and relays it to the backend.

use crate::error::error_response;
use crate::proxy::{EdgeProxy, ProxyContext};
use actix_web::http::{header::CONTENT_TYPE, StatusCode};
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use serde_json::{Map, Value};
use tracing::Instrument;
use vibe_auth::{AuthenticatedPrincipal, EdgeIdentity, ResolvedPermission};

pub async fn forward_request(
    req: HttpRequest,
    body: web::Bytes,
    proxy: web::Data<EdgeProxy>,
) -> HttpResponse {
    let Some(identity) = req.extensions().get::<EdgeIdentity>().cloned() else {
        return error_response(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "A valid bearer token from a registered provider is required",
        );
    };

    let Some(permission) = req.extensions().get::<ResolvedPermission>().cloned() else {
        log::warn!("No authorization decision recorded for {}", req.path());
        return error_response(StatusCode::FORBIDDEN, "FORBIDDEN", "Request was not authorized");
    };

    let context = {
        let extensions = req.extensions();
        ProxyContext {
            client_tier: permission.client_tier,
            tier_claims: extensions
                .get::<AuthenticatedPrincipal>()
                .and_then(|p| tier_claims_header(p, proxy.tier_claims())),
        }
    };

    let request = match proxy.builder().build(&req, body, &context) {
        Ok(request) => request,
        Err(e) => {
            log::warn!("Unable to build backend request for {}: {}", req.path(), e);
            return error_response(StatusCode::BAD_REQUEST, "BAD_REQUEST", e.to_string());
        },
    };

    let span = tracing::info_span!(
        "edge.proxy",
        method = %req.method(),
        path = %req.path(),
        user_id = %identity.user_id
    );

    async move {
        let response = match proxy.send(request).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("Backend request failed: {}", e);
                return error_response(StatusCode::BAD_GATEWAY, "BAD_GATEWAY", "Backend unavailable");
            },
        };

        let status =
            StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("Backend response body failed: {}", e);
                return error_response(StatusCode::BAD_GATEWAY, "BAD_GATEWAY", "Backend unavailable");
            },
        };

        log::debug!("Backend answered {} ({} bytes)", status, bytes.len());
        let mut builder = HttpResponse::build(status);
        if let Some(content_type) = content_type {
            builder.insert_header((CONTENT_TYPE, content_type));
        }
        builder.body(bytes)
    }
    .instrument(span)
    .await
}

/// JSON object of the configured claims present in the token, if any.
fn tier_claims_header(principal: &AuthenticatedPrincipal, names: &[String]) -> Option<String> {
    let selected: Map<String, Value> = names
        .iter()
        .filter_map(|name| principal.claim(name).map(|v| (name.clone(), v.clone())))
        .collect();
    if selected.is_empty() {
        return None;
    }
    serde_json::to_string(&selected).ok()
}
