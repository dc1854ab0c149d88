use crate::registry::{DynamicSchemeRegistrar, ProviderRegistry};
use crate::repository::ProviderConfigRepository;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Counters from one completed refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub providers: usize,
    pub registered: usize,
    pub unregistered: usize,
    pub orphans_removed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed(RefreshStats),
    /// Another cycle was already running.
    Skipped,
    /// The store could not be read; registry and schemes were left untouched.
    Failed(String),
}

/// Periodically converges the provider registry and registered schemes with
/// the persisted provider configuration.
pub struct EdgeAuthBackgroundService {
    store: Arc<dyn ProviderConfigRepository>,
    registry: Arc<ProviderRegistry>,
    registrar: Arc<DynamicSchemeRegistrar>,
    interval: Duration,
    running: Mutex<()>,
}

impl EdgeAuthBackgroundService {
    pub fn new(
        store: Arc<dyn ProviderConfigRepository>,
        registry: Arc<ProviderRegistry>,
        registrar: Arc<DynamicSchemeRegistrar>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            registry,
            registrar,
            interval,
            running: Mutex::new(()),
        }
    }

    /// Run one refresh cycle. Concurrent callers skip instead of waiting.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Ok(_guard) = self.running.try_lock() else {
            log::debug!("Provider refresh already running; skipping");
            return RefreshOutcome::Skipped;
        };

        let config = match self.store.load_provider_config().await {
            Ok(config) => config,
            Err(e) => {
                log::error!("Provider refresh failed to load configuration: {}", e);
                return RefreshOutcome::Failed(e.to_string());
            },
        };

        let now = Utc::now();
        let mut stats = RefreshStats {
            providers: config.providers.len(),
            ..Default::default()
        };
        let known: HashSet<String> = config.providers.iter().map(|p| p.scheme_id()).collect();

        for provider in &config.providers {
            let scheme_id = provider.scheme_id();
            if provider.is_routable_at(now) {
                if !self.registrar.is_current(provider) {
                    self.registrar.register(provider);
                    stats.registered += 1;
                }
            } else if self.registrar.is_registered(&scheme_id) {
                self.registrar.unregister(&scheme_id).await;
                stats.unregistered += 1;
            }
        }

        for scheme_id in self.registrar.registered_scheme_ids() {
            if !known.contains(&scheme_id) {
                log::info!("Removing orphaned scheme '{}'", scheme_id);
                self.registrar.unregister(&scheme_id).await;
                stats.orphans_removed += 1;
            }
        }

        let unmapped = config
            .role_mappings
            .iter()
            .map(|m| &m.provider_key)
            .chain(config.client_mappings.iter().map(|m| &m.provider_key))
            .filter(|key| !known.contains(&key.scheme_id()))
            .count();
        if unmapped > 0 {
            log::warn!("{} role/client mappings reference unknown providers", unmapped);
        }

        self.registry.replace(config.providers);

        log::debug!(
            "Provider refresh complete: {} providers, {} registered, {} unregistered, {} orphans",
            stats.providers,
            stats.registered,
            stats.unregistered,
            stats.orphans_removed
        );
        RefreshOutcome::Completed(stats)
    }

    /// Refresh on a fixed interval until `shutdown` flips to `true` or its sender drops.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick completes immediately; the startup cycle already ran.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        log::info!("Provider refresh loop stopped");
                        return;
                    }
                }
            }
        }
    }

    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
