//! Shared fixtures: an in-memory gateway and RS256 token signing.
#![allow(dead_code)]

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use vibe_api::EdgeServices;
use vibe_auth::{
    DynamicSchemeRegistrar, EdgeAuthBackgroundService, FederatedIdentityResolver, MemoryEdgeStore,
    MultiProviderSelector, PermissionResolver, ProviderRegistry, SchemeRegistry,
    UserProvisioningService,
};
use vibe_commons::{ClientMapping, ProviderRecord, RoleMapping};

pub const ISSUER: &str = "https://idp.acme.test/realms/main";
const PRIVATE_KEY: &str = include_str!("../../../../tests/fixtures/test_rsa_key.pem");
const JWKS: &str = include_str!("../../../../tests/fixtures/test_jwks.json");

/// Active, auto-provisioning provider `acme` with the fixture key pre-seeded.
pub fn acme_provider() -> ProviderRecord {
    let mut provider = ProviderRecord::new("acme", ISSUER);
    provider.auto_provision = true;
    provider.signing_keys = Some(serde_json::from_str::<JwkSet>(JWKS).unwrap());
    provider
}

pub fn sign(claims: Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some("edge-test-key".to_string());
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap();
    encode(&header, &claims, &key).unwrap()
}

/// Token for `sub` with `roles`; `extra` is merged over the defaults.
pub fn token(sub: &str, roles: &[&str], extra: Value) -> String {
    let now = chrono::Utc::now().timestamp();
    let mut claims = json!({
        "iss": ISSUER,
        "sub": sub,
        "aud": "vibe-api",
        "iat": now,
        "exp": now + 300,
        "roles": roles,
    });
    if let (Some(base), Some(extra)) = (claims.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    sign(claims)
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub struct TestGateway {
    pub store: Arc<MemoryEdgeStore>,
    pub services: EdgeServices,
    refresh: EdgeAuthBackgroundService,
}

impl TestGateway {
    /// Seeds one provider and runs the first refresh.
    pub async fn new(
        provider: ProviderRecord,
        roles: Vec<RoleMapping>,
        clients: Vec<ClientMapping>,
    ) -> Self {
        let store = Arc::new(MemoryEdgeStore::new());
        store.seed(provider, roles, clients);

        let registry = Arc::new(ProviderRegistry::new());
        let schemes = Arc::new(SchemeRegistry::new());
        let registrar = Arc::new(DynamicSchemeRegistrar::new(
            schemes.clone(),
            reqwest::Client::new(),
            60,
        ));
        let refresh = EdgeAuthBackgroundService::new(
            store.clone(),
            registry.clone(),
            registrar,
            Duration::from_secs(300),
        );
        let provisioning = Arc::new(UserProvisioningService::new(store.clone()));

        let services = EdgeServices {
            selector: Arc::new(MultiProviderSelector::new(registry.clone(), 8192)),
            identities: Arc::new(FederatedIdentityResolver::new(store.clone(), provisioning)),
            permissions: Arc::new(PermissionResolver::new(store.clone())),
            registry,
            schemes,
        };

        let gateway = Self {
            store,
            services,
            refresh,
        };
        gateway.refresh().await;
        gateway
    }

    pub async fn refresh(&self) {
        self.refresh.refresh().await;
    }
}
