// Vibe edge gateway entrypoint
//!
//! Initialization, middleware wiring and graceful shutdown live in
//! `lifecycle` so this file remains a thin orchestrator.

use anyhow::Result;
use log::info;
use std::env;
use std::time::Instant;
use vibe_configs::EdgeConfig;
use vibe_edge::lifecycle::{bootstrap, run};
use vibe_edge::{build_info, logging};

#[actix_web::main]
async fn main() -> Result<()> {
    let main_start = Instant::now();

    let config_path = env::var("VIBE_EDGE_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = match EdgeConfig::load(&config_path) {
        Ok(cfg) => {
            eprintln!(
                "✅ Loaded config from: {}",
                std::fs::canonicalize(&config_path)
                    .unwrap_or_else(|_| std::path::PathBuf::from(&config_path))
                    .display()
            );
            cfg
        },
        Err(e) => {
            eprintln!("❌ FATAL: Failed to load {}: {}", config_path, e);
            eprintln!("❌ Edge cannot start without valid configuration");
            std::process::exit(1);
        },
    };

    // Logging before any other side effects
    let edge_log_path = format!("{}/edge.log", config.logging.logs_path);
    logging::init_logging(
        &config.logging.level,
        &edge_log_path,
        config.logging.log_to_console,
        Some(&config.logging.targets),
        &config.logging.format,
    )?;

    info!("╔═══════════════════════════════════════════════════════════════╗");
    info!("║           Vibe Edge v{:<42} ║", build_info::VERSION);
    info!("╠═══════════════════════════════════════════════════════════════╣");
    info!("║  Commit:     {:<49} ║", build_info::GIT_COMMIT);
    info!("║  Branch:     {:<49} ║", build_info::GIT_BRANCH);
    info!("║  Built:      {:<49} ║", build_info::BUILT_AT);
    info!("╚═══════════════════════════════════════════════════════════════╝");
    info!("Host: {}  Port: {}", config.server.host, config.server.port);

    let components = bootstrap(&config).await?;

    // Run HTTP server until termination signal is received
    run(&config, components, main_start).await
}
