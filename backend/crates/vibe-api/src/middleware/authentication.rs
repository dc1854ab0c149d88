//! Bearer-token authentication.
//!
//! Picks a scheme with [`MultiProviderSelector`] and verifies the token with
//! that scheme's validator. Requests that fail either step continue
//! unauthenticated; the forwarding handler answers them with 401.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
};
use vibe_auth::{extract_bearer_token, MultiProviderSelector, SchemeRegistry};

pub struct EdgeAuthentication {
    selector: Arc<MultiProviderSelector>,
    schemes: Arc<SchemeRegistry>,
}

impl EdgeAuthentication {
    pub fn new(selector: Arc<MultiProviderSelector>, schemes: Arc<SchemeRegistry>) -> Self {
        Self { selector, schemes }
    }
}

impl<S> Transform<S, ServiceRequest> for EdgeAuthentication
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type InitError = ();
    type Transform = EdgeAuthenticationService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(EdgeAuthenticationService {
            service: Rc::new(service),
            selector: self.selector.clone(),
            schemes: self.schemes.clone(),
        }))
    }
}

pub struct EdgeAuthenticationService<S> {
    service: Rc<S>,
    selector: Arc<MultiProviderSelector>,
    schemes: Arc<SchemeRegistry>,
}

impl<S> Service<ServiceRequest> for EdgeAuthenticationService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let selector = self.selector.clone();
        let schemes = self.schemes.clone();

        Box::pin(async move {
            let authorization = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string);

            let Some(selected) = selector.select(authorization.as_deref()) else {
                return service.call(req).await;
            };
            let Some(token) = extract_bearer_token(authorization.as_deref()) else {
                return service.call(req).await;
            };

            match schemes.authenticate(&selected.scheme_id, token).await {
                Ok(principal) => {
                    let mut extensions = req.extensions_mut();
                    extensions.insert(selected);
                    extensions.insert(principal);
                },
                Err(e) => {
                    log::debug!(
                        "Token rejected by scheme '{}' from {:?}: {}",
                        selected.scheme_id,
                        req.peer_addr(),
                        e
                    );
                },
            }

            service.call(req).await
        })
    }
}
