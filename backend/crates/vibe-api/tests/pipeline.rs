//! Authentication, identity and permission middleware against a local echo handler.

mod common;

use actix_web::{test, web, App, HttpMessage, HttpRequest, HttpResponse};
use common::{acme_provider, bearer, token, TestGateway};
use serde_json::{json, Value};
use std::sync::Arc;
use vibe_api::handlers::health_handler;
use vibe_api::{EdgeAuthentication, IdentityResolution, PermissionEnforcement};
use vibe_auth::{EdgeIdentity, ProviderRegistry, ResolvedPermission};
use vibe_commons::{ClientMapping, PermissionLevel, ProviderKey, RoleMapping};

const MAX_BODY: usize = 1024;

/// Stands in for the forwarding handler.
async fn echo_context(req: HttpRequest, body: web::Bytes) -> HttpResponse {
    let extensions = req.extensions();
    let Some(identity) = extensions.get::<EdgeIdentity>() else {
        return HttpResponse::Unauthorized().json(json!({"error": "UNAUTHORIZED"}));
    };
    HttpResponse::Ok().json(json!({
        "user_id": identity.user_id.as_str(),
        "roles": identity.roles,
        "client_id": identity.client_id,
        "level": extensions
            .get::<ResolvedPermission>()
            .map(|p| p.effective_level.to_db_string()),
        "body": String::from_utf8_lossy(&body),
    }))
}

macro_rules! init_app {
    ($gw:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($gw.services.clone()))
                .wrap(PermissionEnforcement::new($gw.services.permissions.clone(), MAX_BODY))
                .wrap(IdentityResolution::new(
                    $gw.services.registry.clone(),
                    $gw.services.identities.clone(),
                ))
                .wrap(EdgeAuthentication::new(
                    $gw.services.selector.clone(),
                    $gw.services.schemes.clone(),
                ))
                .route("/health", web::get().to(health_handler))
                .default_service(web::to(echo_context)),
        )
        .await
    };
}

async fn reader_gateway() -> TestGateway {
    TestGateway::new(
        acme_provider(),
        vec![
            RoleMapping::new("acme", "reader", PermissionLevel::Read),
            RoleMapping::new("acme", "writer", PermissionLevel::Write),
            RoleMapping::new("acme", "owner", PermissionLevel::Admin),
        ],
        vec![],
    )
    .await
}

fn query(sql: &str) -> Value {
    json!({ "sql": sql })
}

#[actix_web::test]
async fn test_missing_token_passes_through_unauthenticated() {
    let gw = reader_gateway().await;
    let app = init_app!(gw);

    let req = test::TestRequest::post().uri("/v1/query").set_json(query("SELECT 1")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn test_unknown_issuer_is_unauthenticated() {
    let gw = reader_gateway().await;
    let app = init_app!(gw);

    let forged = token("alice", &["owner"], json!({"iss": "https://unknown.test"}));
    let req = test::TestRequest::post()
        .uri("/v1/query")
        .insert_header(bearer(&forged))
        .set_json(query("SELECT 1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_expired_token_is_unauthenticated() {
    let gw = reader_gateway().await;
    let app = init_app!(gw);

    let now = chrono::Utc::now().timestamp();
    let expired = token("alice", &["reader"], json!({"exp": now - 3600, "iat": now - 7200}));
    let req = test::TestRequest::get()
        .uri("/v1/collections")
        .insert_header(bearer(&expired))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_read_role_select_is_allowed_and_body_preserved() {
    let gw = reader_gateway().await;
    let app = init_app!(gw);

    let req = test::TestRequest::post()
        .uri("/v1/query")
        .insert_header(bearer(&token("alice", &["reader"], json!({}))))
        .set_json(query("SELECT * FROM users"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert!(body["user_id"].as_str().unwrap().starts_with("u_"));
    assert_eq!(body["level"], "read");
    assert_eq!(body["client_id"], "vibe-api");
    let forwarded: Value = serde_json::from_str(body["body"].as_str().unwrap()).unwrap();
    assert_eq!(forwarded["sql"], "SELECT * FROM users");
}

#[actix_web::test]
async fn test_read_role_insert_is_forbidden() {
    let gw = reader_gateway().await;
    let app = init_app!(gw);

    let req = test::TestRequest::post()
        .uri("/v1/query")
        .insert_header(bearer(&token("alice", &["reader"], json!({}))))
        .set_json(query("INSERT INTO users VALUES (1)"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "FORBIDDEN");
}

#[actix_web::test]
async fn test_denied_statement_is_forbidden_despite_level() {
    let gw = reader_gateway().await;
    gw.store.put_role_mapping(
        RoleMapping::new("acme", "writer", PermissionLevel::Write).with_denied(["DELETE"]),
    );
    let app = init_app!(gw);
    let writer = token("bob", &["writer"], json!({}));

    let req = test::TestRequest::post()
        .uri("/v1/query")
        .insert_header(bearer(&writer))
        .set_json(query("DELETE FROM x"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::post()
        .uri("/v1/query")
        .insert_header(bearer(&writer))
        .set_json(query("UPDATE x SET a = 1"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);
}

#[actix_web::test]
async fn test_denied_statement_inside_cte_is_forbidden() {
    let gw = reader_gateway().await;
    gw.store.put_role_mapping(
        RoleMapping::new("acme", "writer", PermissionLevel::Write).with_denied(["DELETE"]),
    );
    let app = init_app!(gw);
    let writer = token("bob", &["writer"], json!({}));

    for sql in [
        "WITH gone AS (DELETE FROM x RETURNING *) SELECT * FROM gone",
        "EXPLAIN ANALYZE WITH gone AS (DELETE FROM x RETURNING id) SELECT count(*) FROM gone",
    ] {
        let req = test::TestRequest::post()
            .uri("/v1/query")
            .insert_header(bearer(&writer))
            .set_json(query(sql))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403, "{}", sql);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "FORBIDDEN");
    }

    let req = test::TestRequest::post()
        .uri("/v1/query")
        .insert_header(bearer(&writer))
        .set_json(query("WITH moved AS (UPDATE x SET a = 1 RETURNING *) SELECT * FROM moved"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);
}

#[actix_web::test]
async fn test_non_canonical_paths_are_rejected() {
    let gw = reader_gateway().await;
    let app = init_app!(gw);
    let writer = token("bob", &["writer"], json!({}));

    for uri in [
        "/v1/%61dmin/users",
        "/v1//admin/users",
        "/v1/collections/../admin/users",
        "/v1/collections/%2e%2e/admin",
        "/%761/admin/users",
    ] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(bearer(&writer))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400, "{}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "BAD_REQUEST");
    }

    let req = test::TestRequest::get()
        .uri("/v1/collections/order%20items")
        .insert_header(bearer(&writer))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);
}

#[actix_web::test]
async fn test_selected_provider_missing_from_registry_is_internal_error() {
    let gw = reader_gateway().await;
    // Identity resolution sees a registry that lost the provider after selection.
    let drained = Arc::new(ProviderRegistry::new());
    drained.replace(vec![]);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gw.services.clone()))
            .wrap(PermissionEnforcement::new(gw.services.permissions.clone(), MAX_BODY))
            .wrap(IdentityResolution::new(drained, gw.services.identities.clone()))
            .wrap(EdgeAuthentication::new(
                gw.services.selector.clone(),
                gw.services.schemes.clone(),
            ))
            .default_service(web::to(echo_context)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/v1/query")
        .insert_header(bearer(&token("alice", &["reader"], json!({}))))
        .set_json(query("SELECT 1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "INTERNAL_ERROR");
    assert_eq!(body["message"], "Internal server error");
    assert_eq!(gw.store.identity_count(), 0);
}

#[actix_web::test]
async fn test_wildcard_denial_blocks_everything() {
    let gw = TestGateway::new(
        acme_provider(),
        vec![RoleMapping::new("acme", "frozen", PermissionLevel::Admin).with_denied(["*"])],
        vec![],
    )
    .await;
    let app = init_app!(gw);

    let req = test::TestRequest::get()
        .uri("/v1/collections/orders")
        .insert_header(bearer(&token("carol", &["frozen"], json!({}))))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);
}

#[actix_web::test]
async fn test_unmapped_role_is_forbidden() {
    let gw = reader_gateway().await;
    let app = init_app!(gw);

    let req = test::TestRequest::get()
        .uri("/v1/collections")
        .insert_header(bearer(&token("dave", &["Reader"], json!({}))))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);
}

#[actix_web::test]
async fn test_malformed_queries_are_bad_requests() {
    let gw = reader_gateway().await;
    let app = init_app!(gw);
    let reader = token("alice", &["reader"], json!({}));

    for payload in [
        "not json".to_string(),
        json!({"query": "SELECT 1"}).to_string(),
        query("SELECT 1; DROP TABLE t").to_string(),
        query("SELECT /* open").to_string(),
    ] {
        let req = test::TestRequest::post()
            .uri("/v1/query")
            .insert_header(bearer(&reader))
            .insert_header(("Content-Type", "application/json"))
            .set_payload(payload.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400, "payload {}", payload);
    }
}

#[actix_web::test]
async fn test_oversized_body_is_rejected() {
    let gw = reader_gateway().await;
    let app = init_app!(gw);

    let sql = format!("SELECT '{}'", "x".repeat(MAX_BODY));
    let req = test::TestRequest::post()
        .uri("/v1/query")
        .insert_header(bearer(&token("alice", &["reader"], json!({}))))
        .set_json(query(&sql))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "BAD_REQUEST");
}

#[actix_web::test]
async fn test_admin_routes_require_admin() {
    let gw = reader_gateway().await;
    let app = init_app!(gw);

    let req = test::TestRequest::get()
        .uri("/v1/admin/providers")
        .insert_header(bearer(&token("bob", &["writer"], json!({}))))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::get()
        .uri("/v1/admin/providers")
        .insert_header(bearer(&token("erin", &["owner"], json!({}))))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);
}

#[actix_web::test]
async fn test_client_mapping_is_enforced() {
    let gw = TestGateway::new(
        acme_provider(),
        vec![RoleMapping::new("acme", "owner", PermissionLevel::Admin)],
        vec![ClientMapping::new("acme", "reporting", PermissionLevel::Read)],
    )
    .await;
    let app = init_app!(gw);

    // aud "vibe-api" has no client mapping.
    let req = test::TestRequest::get()
        .uri("/v1/collections")
        .insert_header(bearer(&token("erin", &["owner"], json!({}))))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let reporting = token("erin", &["owner"], json!({"aud": ["reporting", "other"]}));
    let req = test::TestRequest::get()
        .uri("/v1/collections")
        .insert_header(bearer(&reporting))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["level"], "read");

    let req = test::TestRequest::post()
        .uri("/v1/collections/orders")
        .insert_header(bearer(&reporting))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);
}

#[actix_web::test]
async fn test_deactivated_identity_is_forbidden() {
    let gw = reader_gateway().await;
    let app = init_app!(gw);
    let alice = token("alice", &["reader"], json!({}));

    let req = test::TestRequest::get()
        .uri("/v1/collections")
        .insert_header(bearer(&alice))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    gw.store.deactivate_identity(&ProviderKey::new("acme"), "alice").unwrap();

    let req = test::TestRequest::get()
        .uri("/v1/collections")
        .insert_header(bearer(&alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "IDENTITY_NOT_RESOLVED");
}

#[actix_web::test]
async fn test_unknown_subject_without_auto_provision_is_forbidden() {
    let mut provider = acme_provider();
    provider.auto_provision = false;
    let gw = TestGateway::new(
        provider,
        vec![RoleMapping::new("acme", "reader", PermissionLevel::Read)],
        vec![],
    )
    .await;
    let app = init_app!(gw);

    let req = test::TestRequest::get()
        .uri("/v1/collections")
        .insert_header(bearer(&token("stranger", &["reader"], json!({}))))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);
    assert_eq!(gw.store.identity_count(), 0);
}

#[actix_web::test]
async fn test_token_without_subject_is_unauthenticated() {
    let gw = reader_gateway().await;
    let app = init_app!(gw);

    let now = chrono::Utc::now().timestamp();
    let anonymous = common::sign(json!({
        "iss": common::ISSUER,
        "aud": "vibe-api",
        "iat": now,
        "exp": now + 300,
        "roles": ["reader"],
    }));
    let req = test::TestRequest::get()
        .uri("/v1/collections")
        .insert_header(bearer(&anonymous))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);
}

#[actix_web::test]
async fn test_default_role_applies_without_role_claim() {
    let mut provider = acme_provider();
    provider.default_role = Some("reader".into());
    let gw = TestGateway::new(
        provider,
        vec![RoleMapping::new("acme", "reader", PermissionLevel::Read)],
        vec![],
    )
    .await;
    let app = init_app!(gw);

    let req = test::TestRequest::get()
        .uri("/v1/collections")
        .insert_header(bearer(&token("frank", &[], json!({}))))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["roles"], json!(["reader"]));
    assert_eq!(body["level"], "read");
}
