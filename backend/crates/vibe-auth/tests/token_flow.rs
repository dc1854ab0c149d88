//! Signed tokens through selection, verification, claim extraction,
//! identity resolution and permission resolution.

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use vibe_auth::{
    AuthError, ClaimExtractor, DynamicSchemeRegistrar, EdgeAuthBackgroundService,
    FederatedIdentityResolver, MemoryEdgeStore, MultiProviderSelector, PermissionResolver,
    ProviderRegistry, SchemeRegistry, UserProvisioningService,
};
use vibe_commons::{ClientMapping, PermissionLevel, ProviderKey, ProviderRecord, RoleMapping};

const ISSUER: &str = "https://idp.acme.test/realms/main";
const PRIVATE_KEY: &str = include_str!("../../../tests/fixtures/test_rsa_key.pem");
const JWKS: &str = include_str!("../../../tests/fixtures/test_jwks.json");

fn sign(claims: serde_json::Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some("edge-test-key".to_string());
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap();
    encode(&header, &claims, &key).unwrap()
}

fn token(sub: &str, roles: &[&str]) -> String {
    let now = chrono::Utc::now().timestamp();
    sign(json!({
        "iss": ISSUER,
        "sub": sub,
        "aud": "reporting",
        "iat": now,
        "exp": now + 300,
        "realm_access": { "roles": roles },
    }))
}

struct Gateway {
    store: Arc<MemoryEdgeStore>,
    registry: Arc<ProviderRegistry>,
    schemes: Arc<SchemeRegistry>,
    refresh: EdgeAuthBackgroundService,
    selector: MultiProviderSelector,
    identities: FederatedIdentityResolver,
    permissions: PermissionResolver,
}

fn gateway() -> Gateway {
    let mut provider = ProviderRecord::new("acme", ISSUER);
    provider.audience = Some("reporting".into());
    provider.auto_provision = true;
    provider.signing_keys = Some(serde_json::from_str::<JwkSet>(JWKS).unwrap());

    let mut client = ClientMapping::new("acme", "reporting", PermissionLevel::Write);
    client.tier = Some("gold".into());

    let store = Arc::new(MemoryEdgeStore::new());
    store.seed(
        provider,
        vec![
            RoleMapping::new("acme", "analyst", PermissionLevel::Read),
            RoleMapping::new("acme", "owner", PermissionLevel::Admin).with_denied(["truncate"]),
        ],
        vec![client],
    );

    let registry = Arc::new(ProviderRegistry::new());
    let schemes = Arc::new(SchemeRegistry::new());
    let registrar = Arc::new(DynamicSchemeRegistrar::new(
        schemes.clone(),
        reqwest::Client::new(),
        0,
    ));
    let refresh = EdgeAuthBackgroundService::new(
        store.clone(),
        registry.clone(),
        registrar,
        Duration::from_secs(60),
    );
    let provisioning = Arc::new(UserProvisioningService::new(store.clone()));

    Gateway {
        selector: MultiProviderSelector::new(registry.clone(), 8192),
        identities: FederatedIdentityResolver::new(store.clone(), provisioning),
        permissions: PermissionResolver::new(store.clone()),
        store,
        registry,
        schemes,
        refresh,
    }
}

#[tokio::test]
async fn test_owner_token_resolves_to_capped_permission() {
    let gw = gateway();
    gw.refresh.refresh().await;

    let header = format!("Bearer {}", token("alice", &["owner"]));
    let selected = gw.selector.select(Some(&header)).expect("issuer routed");
    assert_eq!(selected.scheme_id, "oidc-acme");

    let bearer = header.trim_start_matches("Bearer ");
    let principal = gw.schemes.authenticate(&selected.scheme_id, bearer).await.unwrap();
    assert_eq!(principal.client_id().as_deref(), Some("reporting"));

    let provider = gw.registry.get_by_key(&selected.provider_key).unwrap();
    let claims = ClaimExtractor::extract(&principal, &provider).unwrap();
    assert_eq!(claims.roles, vec!["owner".to_string()]);

    let identity = gw
        .identities
        .resolve(&selected.provider_key, &claims, &provider)
        .await
        .unwrap()
        .expect("auto-provisioned");
    assert!(identity.provisioned);
    assert_eq!(gw.store.identity_count(), 1);

    let permission = gw
        .permissions
        .resolve(&selected.provider_key, &claims.roles, principal.client_id().as_deref())
        .await
        .unwrap();
    assert_eq!(permission.effective_level, PermissionLevel::Write);
    assert_eq!(permission.client_tier.as_deref(), Some("gold"));
    assert!(permission.denies("TRUNCATE", "TRUNCATE"));
}

#[tokio::test]
async fn test_unregistered_scheme_fails_authentication() {
    let gw = gateway();
    let bearer = token("alice", &["analyst"]);

    // Before the first refresh nothing is indexed or registered.
    assert!(gw.selector.select(Some(&format!("Bearer {}", bearer))).is_none());
    let err = gw.schemes.authenticate("oidc-acme", &bearer).await.unwrap_err();
    assert!(matches!(err, AuthError::AuthenticationFailure(_)));
}

#[tokio::test]
async fn test_tampered_token_is_rejected() {
    let gw = gateway();
    gw.refresh.refresh().await;

    let genuine = token("alice", &["analyst"]);
    let forged = token("mallory", &["owner"]);
    let genuine: Vec<&str> = genuine.split('.').collect();
    let forged: Vec<&str> = forged.split('.').collect();
    let bearer = format!("{}.{}.{}", genuine[0], forged[1], genuine[2]);
    let err = gw.schemes.authenticate("oidc-acme", &bearer).await.unwrap_err();
    assert_eq!(err.status_code(), 401);
}

#[tokio::test]
async fn test_deactivated_provider_stops_routing() {
    let gw = gateway();
    gw.refresh.refresh().await;
    let header = format!("Bearer {}", token("alice", &["analyst"]));
    assert!(gw.selector.select(Some(&header)).is_some());

    gw.store.set_provider_active(&ProviderKey::new("acme"), false).unwrap();
    gw.refresh.refresh().await;

    assert!(gw.selector.select(Some(&header)).is_none());
    assert!(!gw.schemes.contains("oidc-acme"));
}
