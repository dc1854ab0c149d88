//! Server lifecycle management helpers.
//!
//! Bootstraps the provider store and auth services, wires the HTTP server,
//! and coordinates graceful shutdown of the server and the provider refresh loop.

use crate::middleware;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use log::{debug, info, warn};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use vibe_api::routes::configure_routes;
use vibe_api::{
    EdgeAuthentication, EdgeProxy, EdgeServices, HmacSigner, IdentityResolution,
    PermissionEnforcement, ProxyRequestBuilder,
};
use vibe_auth::{
    DynamicSchemeRegistrar, EdgeAuthBackgroundService, FederatedIdentityResolver,
    MemoryEdgeStore, MultiProviderSelector, PermissionResolver, ProviderRegistry, RefreshOutcome,
    SchemeRegistry, UserProvisioningService,
};
use vibe_configs::EdgeConfig;

/// Aggregated components shared across the HTTP workers and shutdown handling.
pub struct EdgeComponents {
    pub store: Arc<MemoryEdgeStore>,
    pub services: EdgeServices,
    pub proxy: EdgeProxy,
    pub refresh: Arc<EdgeAuthBackgroundService>,
}

/// Seed the provider store, build the auth pipeline and run the first
/// provider refresh so schemes are registered before the server binds.
pub async fn bootstrap(config: &EdgeConfig) -> Result<EdgeComponents> {
    let bootstrap_start = Instant::now();

    let store = Arc::new(MemoryEdgeStore::new());
    for entry in &config.providers.bootstrap {
        let mut entry = entry.clone();
        entry.load_signing_keys()?;
        let (provider, roles, clients) = entry.to_records();
        debug!(
            "Seeding provider '{}' ({}) with {} role and {} client mappings",
            provider.key,
            provider.issuer,
            roles.len(),
            clients.len()
        );
        store.seed(provider, roles, clients);
    }
    info!("Seeded {} bootstrap providers", config.providers.bootstrap.len());

    let registry = Arc::new(ProviderRegistry::new());
    let schemes = Arc::new(SchemeRegistry::new());

    // Discovery and JWKS fetches share one client
    let discovery_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.proxy.timeout_seconds))
        .build()?;
    let registrar = Arc::new(DynamicSchemeRegistrar::new(
        schemes.clone(),
        discovery_client,
        config.auth.default_clock_skew_seconds,
    ));

    let refresh = Arc::new(EdgeAuthBackgroundService::new(
        store.clone(),
        registry.clone(),
        registrar,
        Duration::from_secs(config.providers.refresh_interval_seconds),
    ));

    let provisioning = Arc::new(UserProvisioningService::new(store.clone()));
    let services = EdgeServices {
        registry: registry.clone(),
        schemes,
        selector: Arc::new(MultiProviderSelector::new(
            registry,
            config.auth.max_token_bytes,
        )),
        identities: Arc::new(FederatedIdentityResolver::new(store.clone(), provisioning)),
        permissions: Arc::new(PermissionResolver::new(store.clone())),
    };

    let signer = HmacSigner::new(&config.proxy.hmac_secret)?;
    let builder =
        ProxyRequestBuilder::new(&config.proxy.backend_url, &config.proxy.service_name, signer);
    let proxy = EdgeProxy::new(
        builder,
        Duration::from_secs(config.proxy.timeout_seconds),
        config.proxy.tier_claims.clone(),
    )?;

    match refresh.refresh().await {
        RefreshOutcome::Completed(stats) => info!(
            "Initial provider refresh: {} providers, {} schemes registered",
            stats.providers, stats.registered
        ),
        RefreshOutcome::Skipped => debug!("Initial provider refresh skipped"),
        RefreshOutcome::Failed(e) => warn!("Initial provider refresh failed: {}", e),
    }

    info!(
        "Bootstrap completed in {:.2}ms",
        bootstrap_start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(EdgeComponents {
        store,
        services,
        proxy,
        refresh,
    })
}

/// Build the App with the full middleware stack.
///
/// `wrap` runs in reverse registration order, so requests pass through
/// Logger, Cors, EdgeAuthentication, IdentityResolution and then
/// PermissionEnforcement.
macro_rules! edge_app {
    ($services:expr, $proxy:expr, $cors:expr, $max_body:expr) => {{
        let services: EdgeServices = $services;
        App::new()
            .app_data(web::Data::new(services.clone()))
            .app_data(web::Data::new($proxy))
            .app_data(web::PayloadConfig::new($max_body))
            .wrap(PermissionEnforcement::new(services.permissions.clone(), $max_body))
            .wrap(IdentityResolution::new(
                services.registry.clone(),
                services.identities.clone(),
            ))
            .wrap(EdgeAuthentication::new(
                services.selector.clone(),
                services.schemes.clone(),
            ))
            .wrap(middleware::build_cors_from_config(&$cors))
            .wrap(middleware::request_logger())
            .configure(configure_routes)
    }};
}

fn worker_count(config: &EdgeConfig) -> usize {
    if config.server.workers == 0 {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    } else {
        config.server.workers
    }
}

/// Start the HTTP server and manage graceful shutdown.
pub async fn run(config: &EdgeConfig, components: EdgeComponents, main_start: Instant) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting HTTP server on {}", bind_addr);
    debug!("Endpoints: GET /health, GET /health/providers, ANY /v1/*");
    info!(
        "Server config: workers={}, body_limit={} bytes, backend={}",
        worker_count(config),
        config.limits.max_request_body_bytes,
        config.proxy.backend_url
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh_task = components.refresh.clone().spawn(shutdown_rx);

    let services = components.services.clone();
    let proxy = components.proxy.clone();
    let cors_config = config.security.cors.clone();
    let max_body = config.limits.max_request_body_bytes;

    let server = HttpServer::new(move || {
        edge_app!(services.clone(), proxy.clone(), cors_config, max_body)
    })
    .bind(&bind_addr)?
    .workers(worker_count(config))
    .run();

    info!("🚀 Server started in {:.2}ms", main_start.elapsed().as_secs_f64() * 1000.0);

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Err(e)) => log::error!("Server exited with error: {}", e),
                Err(e) => log::error!("Server task failed: {}", e),
                Ok(Ok(())) => {}
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
            server_handle.stop(true).await;
        }
    }

    let _ = shutdown_tx.send(true);
    if let Err(e) = refresh_task.await {
        warn!("Provider refresh task ended abnormally: {}", e);
    }

    drop(components);
    info!("Server shutdown complete");
    Ok(())
}

/// A running server bound to an ephemeral port, for integration tests.
///
/// Uses the same middleware stack and routes as [`run`] but installs no
/// Ctrl+C handling; call [`RunningTestHttpServer::shutdown`] to stop it.
pub struct RunningTestHttpServer {
    pub base_url: String,
    pub bind_addr: SocketAddr,
    pub store: Arc<MemoryEdgeStore>,
    pub refresh: Arc<EdgeAuthBackgroundService>,
    server_handle: actix_web::dev::ServerHandle,
    server_task: tokio::task::JoinHandle<std::io::Result<()>>,
    shutdown_tx: watch::Sender<bool>,
    refresh_task: tokio::task::JoinHandle<()>,
}

impl RunningTestHttpServer {
    pub async fn shutdown(self) {
        self.server_handle.stop(false).await;
        let _ = self.server_task.await;
        let _ = self.shutdown_tx.send(true);
        let _ = self.refresh_task.await;
    }
}

/// Start the server for integration tests on a random available port.
pub async fn run_for_tests(
    config: &EdgeConfig,
    components: EdgeComponents,
) -> Result<RunningTestHttpServer> {
    let bind_ip = if config.server.host.is_empty() {
        "127.0.0.1"
    } else {
        config.server.host.as_str()
    };

    let listener = TcpListener::bind((bind_ip, 0))?;
    let bind_addr = listener.local_addr()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh_task = components.refresh.clone().spawn(shutdown_rx);

    let services = components.services.clone();
    let proxy = components.proxy.clone();
    let cors_config = config.security.cors.clone();
    let max_body = config.limits.max_request_body_bytes;

    let server = HttpServer::new(move || {
        edge_app!(services.clone(), proxy.clone(), cors_config, max_body)
    })
    .listen(listener)?
    .workers(1)
    .disable_signals()
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    Ok(RunningTestHttpServer {
        base_url: format!("http://{}", bind_addr),
        bind_addr,
        store: components.store,
        refresh: components.refresh,
        server_handle,
        server_task,
        shutdown_tx,
        refresh_task,
    })
}
