//! Per-request authorization.
//!
//! Buffers the body (bounded), classifies the request, resolves the caller's
//! effective permission and rejects anything it does not cover. The body is
//! re-attached so the forwarding handler sees it unchanged.
//!
//! Non-canonical paths are rejected before any prefix check so the path
//! that is classified is the path the router matched and the backend sees.

use crate::error::auth_error_response;
use crate::models::QueryRequest;
use crate::path::ensure_canonical_path;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    Error, HttpMessage,
};
use bytes::{Bytes, BytesMut};
use futures_util::future::LocalBoxFuture;
use futures_util::StreamExt;
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
};
use tracing::Instrument;
use vibe_auth::{AuthError, EdgeIdentity, PermissionResolver, ResolvedPermission};
use vibe_commons::{constants::EdgeRoutes, PermissionLevel};
use vibe_sql::{classify_http_request, Classification, SqlStatementClassifier};

pub struct PermissionEnforcement {
    permissions: Arc<PermissionResolver>,
    max_body_bytes: usize,
}

impl PermissionEnforcement {
    pub fn new(permissions: Arc<PermissionResolver>, max_body_bytes: usize) -> Self {
        Self {
            permissions,
            max_body_bytes,
        }
    }
}

impl<S> Transform<S, ServiceRequest> for PermissionEnforcement
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type InitError = ();
    type Transform = PermissionEnforcementService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PermissionEnforcementService {
            service: Rc::new(service),
            permissions: self.permissions.clone(),
            max_body_bytes: self.max_body_bytes,
        }))
    }
}

pub struct PermissionEnforcementService<S> {
    service: Rc<S>,
    permissions: Arc<PermissionResolver>,
    max_body_bytes: usize,
}

impl<S> Service<ServiceRequest> for PermissionEnforcementService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let permissions = self.permissions.clone();
        let max_body_bytes = self.max_body_bytes;

        Box::pin(async move {
            let identity = req.extensions().get::<EdgeIdentity>().cloned();
            let Some(identity) = identity else {
                return service.call(req).await;
            };
            if let Err(e) = ensure_canonical_path(req.path()) {
                log::debug!("Rejected non-canonical path for user {}: {}", identity.user_id, e);
                return Ok(req.into_response(auth_error_response(&e)));
            }
            if !req.path().starts_with(EdgeRoutes::VERSIONED_PREFIX) {
                return service.call(req).await;
            }

            let span = tracing::info_span!(
                "edge.permission",
                method = %req.method(),
                path = %req.path(),
                user_id = %identity.user_id
            );

            let decision = async {
                let body = read_body(&mut req, max_body_bytes).await?;
                let classification = classify(req.method(), req.path(), &body)?;
                let permission = authorize(&permissions, &identity, req.path(), &classification)
                    .await?;
                Ok::<_, AuthError>((body, permission))
            }
            .instrument(span)
            .await;

            match decision {
                Ok((body, permission)) => {
                    req.set_payload(Payload::from(body));
                    req.extensions_mut().insert(permission);
                    service.call(req).await
                },
                Err(e) => Ok(req.into_response(auth_error_response(&e))),
            }
        })
    }
}

/// Drain the payload, failing once it exceeds `limit` bytes.
async fn read_body(req: &mut ServiceRequest, limit: usize) -> Result<Bytes, AuthError> {
    let mut payload = req.take_payload();
    let mut body = BytesMut::new();

    while let Some(chunk) = payload.next().await {
        let chunk = chunk
            .map_err(|e| AuthError::MalformedRequest(format!("Unable to read request body: {}", e)))?;
        if body.len() + chunk.len() > limit {
            return Err(AuthError::MalformedRequest(format!(
                "Request body exceeds {} bytes",
                limit
            )));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body.freeze())
}

fn is_query_route(method: &Method, path: &str) -> bool {
    method == Method::POST && path.trim_end_matches('/') == EdgeRoutes::QUERY
}

fn classify(method: &Method, path: &str, body: &[u8]) -> Result<Classification, AuthError> {
    let classification = if is_query_route(method, path) {
        let query: QueryRequest = serde_json::from_slice(body).map_err(|e| {
            AuthError::MalformedRequest(format!("Query body must be JSON with a 'sql' field: {}", e))
        })?;
        SqlStatementClassifier::classify(&query.sql)
    } else {
        classify_http_request(method.as_str(), path)
    };

    if classification.is_error {
        return Err(AuthError::MalformedRequest(
            classification
                .error_message
                .unwrap_or_else(|| "Statement could not be classified".to_string()),
        ));
    }
    Ok(classification)
}

async fn authorize(
    permissions: &PermissionResolver,
    identity: &EdgeIdentity,
    path: &str,
    classification: &Classification,
) -> Result<ResolvedPermission, AuthError> {
    let permission = permissions
        .resolve(&identity.provider_key, &identity.roles, identity.client_id.as_deref())
        .await?;

    if permission.effective_level == PermissionLevel::None {
        return Err(AuthError::PermissionDenied(
            "No permission granted for this client or role".to_string(),
        ));
    }

    if permission.denies_any(classification.denial_keys()) {
        return Err(AuthError::PermissionDenied(format!(
            "Statement type {} is denied",
            classification.statement_type
        )));
    }

    let required = if is_admin_route(path) {
        PermissionLevel::Admin
    } else {
        classification.required_level
    };
    if !permission.effective_level.satisfies(required) {
        return Err(AuthError::PermissionDenied(format!(
            "{} requires {} permission",
            classification.statement_type,
            required.display_name()
        )));
    }

    log::debug!(
        "Authorized {} for user {} at level {}",
        classification.statement_type,
        identity.user_id,
        permission.effective_level.to_db_string()
    );
    Ok(permission)
}

fn is_admin_route(path: &str) -> bool {
    path == EdgeRoutes::ADMIN
        || path
            .strip_prefix(EdgeRoutes::ADMIN)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_route_detection() {
        assert!(is_query_route(&Method::POST, "/v1/query"));
        assert!(is_query_route(&Method::POST, "/v1/query/"));
        assert!(!is_query_route(&Method::GET, "/v1/query"));
        assert!(!is_query_route(&Method::POST, "/v1/query/x"));
    }

    #[test]
    fn test_admin_route_detection() {
        assert!(is_admin_route("/v1/admin"));
        assert!(is_admin_route("/v1/admin/providers"));
        assert!(!is_admin_route("/v1/administrators"));
        assert!(!is_admin_route("/v1/collections/admin"));
    }

    #[test]
    fn test_classify_query_body() {
        let c = classify(&Method::POST, "/v1/query", br#"{"sql":"INSERT INTO t VALUES (1)"}"#)
            .unwrap();
        assert_eq!(c.required_level, PermissionLevel::Write);
        assert_eq!(c.statement_type, "INSERT");
    }

    #[test]
    fn test_classify_rejects_bad_query_bodies() {
        for body in [&b"not json"[..], br#"{"query":"SELECT 1"}"#, br#"{"sql":"SELECT 1; SELECT 2"}"#] {
            let err = classify(&Method::POST, "/v1/query", body).unwrap_err();
            assert_eq!(err.status_code(), 400);
        }
    }

    #[test]
    fn test_classify_rest_route() {
        let c = classify(&Method::DELETE, "/v1/collections/orders/7", b"").unwrap();
        assert_eq!(c.required_level, PermissionLevel::Write);
        assert_eq!(c.statement_type, "DELETE");
    }
}
