use std::sync::Arc;
use vibe_auth::{
    FederatedIdentityResolver, MultiProviderSelector, PermissionResolver, ProviderRegistry,
    SchemeRegistry,
};

/// Shared auth components handed to the middleware and health handlers.
#[derive(Clone)]
pub struct EdgeServices {
    pub registry: Arc<ProviderRegistry>,
    pub schemes: Arc<SchemeRegistry>,
    pub selector: Arc<MultiProviderSelector>,
    pub identities: Arc<FederatedIdentityResolver>,
    pub permissions: Arc<PermissionResolver>,
}
