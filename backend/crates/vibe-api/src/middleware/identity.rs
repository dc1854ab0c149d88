//! Maps the verified principal to an internal user.

use crate::error::auth_error_response;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
};
use vibe_auth::{
    AuthError, AuthenticatedPrincipal, ClaimExtractor, EdgeIdentity, FederatedIdentityResolver,
    ProviderRegistry, SelectedProvider,
};

pub struct IdentityResolution {
    registry: Arc<ProviderRegistry>,
    identities: Arc<FederatedIdentityResolver>,
}

impl IdentityResolution {
    pub fn new(registry: Arc<ProviderRegistry>, identities: Arc<FederatedIdentityResolver>) -> Self {
        Self {
            registry,
            identities,
        }
    }
}

impl<S> Transform<S, ServiceRequest> for IdentityResolution
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityResolutionService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityResolutionService {
            service: Rc::new(service),
            registry: self.registry.clone(),
            identities: self.identities.clone(),
        }))
    }
}

pub struct IdentityResolutionService<S> {
    service: Rc<S>,
    registry: Arc<ProviderRegistry>,
    identities: Arc<FederatedIdentityResolver>,
}

impl<S> Service<ServiceRequest> for IdentityResolutionService<S>
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
        let registry = self.registry.clone();
        let identities = self.identities.clone();

        Box::pin(async move {
            let (selected, principal) = {
                let extensions = req.extensions();
                (
                    extensions.get::<SelectedProvider>().cloned(),
                    extensions.get::<AuthenticatedPrincipal>().cloned(),
                )
            };
            let (Some(selected), Some(principal)) = (selected, principal) else {
                return service.call(req).await;
            };

            let Some(provider) = registry.get_by_key(&selected.provider_key) else {
                let err = AuthError::InvariantViolation(format!(
                    "Selected provider '{}' missing from registry",
                    selected.provider_key
                ));
                return Ok(req.into_response(auth_error_response(&err)));
            };

            let claims = match ClaimExtractor::extract(&principal, &provider) {
                Ok(claims) => claims,
                Err(e) => return Ok(req.into_response(auth_error_response(&e))),
            };

            let resolved = match identities
                .resolve(&selected.provider_key, &claims, &provider)
                .await
            {
                Ok(Some(resolved)) => resolved,
                Ok(None) => {
                    let err = AuthError::IdentityNotResolved(
                        "No active identity for this subject".to_string(),
                    );
                    return Ok(req.into_response(auth_error_response(&err)));
                },
                Err(e) => return Ok(req.into_response(auth_error_response(&e))),
            };

            let identity = EdgeIdentity {
                user_id: resolved.user_id,
                provider_key: selected.provider_key,
                external_subject: resolved.external_subject,
                roles: claims.roles,
                client_id: principal.client_id(),
                email: resolved.email,
            };
            req.extensions_mut().insert(identity);

            service.call(req).await
        })
    }
}
