use super::types::{BootstrapProvider, EdgeConfig};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use jsonwebtoken::jwk::JwkSet;
use std::env;
use std::fs;
use std::path::Path;

impl EdgeConfig {
    /// Load configuration from a TOML file
    ///
    /// Note: Environment overrides are applied separately via `apply_env_overrides()`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        Self::from_toml_str(&content)
    }

    /// Load the startup configuration: parse the file, apply `VIBE_EDGE_*`
    /// overrides, then normalize and validate.
    ///
    /// Validation runs last so secrets may come from the environment alone.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;
        let mut config: EdgeConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

        config.apply_env_overrides()?;
        config.finalize()?;

        Ok(config)
    }

    /// Parse configuration from TOML text and validate it.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let mut config: EdgeConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

        config.finalize()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VIBE_EDGE_HOST: Override server.host
    /// - VIBE_EDGE_PORT: Override server.port
    /// - VIBE_EDGE_LOG_LEVEL: Override logging.level
    /// - VIBE_EDGE_BACKEND_URL: Override proxy.backend_url
    /// - VIBE_EDGE_HMAC_SECRET: Override proxy.hmac_secret
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        if let Ok(host) = env::var("VIBE_EDGE_HOST") {
            self.server.host = host;
        }

        if let Ok(port_str) = env::var("VIBE_EDGE_PORT") {
            self.server.port = port_str
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid VIBE_EDGE_PORT value: {}", port_str))?;
        }

        if let Ok(level) = env::var("VIBE_EDGE_LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }

        if let Ok(url) = env::var("VIBE_EDGE_BACKEND_URL") {
            self.proxy.backend_url = url;
        }

        // Secret material: never logged
        if let Ok(secret) = env::var("VIBE_EDGE_HMAC_SECRET") {
            self.proxy.hmac_secret = secret;
        }

        Ok(())
    }

    /// Normalize and validate. Call this after applying environment overrides.
    pub fn finalize(&mut self) -> anyhow::Result<()> {
        self.proxy.backend_url = self.proxy.backend_url.trim_end_matches('/').to_string();
        self.logging.level = self.logging.level.to_lowercase();
        self.logging.format = self.logging.format.to_lowercase();

        self.validate()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            ));
        }
        for (target, level) in &self.logging.targets {
            if !valid_levels.contains(&level.as_str()) {
                return Err(anyhow::anyhow!(
                    "Invalid log level '{}' for target '{}'. Must be one of: {}",
                    level,
                    target,
                    valid_levels.join(", ")
                ));
            }
        }

        let valid_formats = ["compact", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_formats.join(", ")
            ));
        }

        if self.auth.max_token_bytes == 0 {
            return Err(anyhow::anyhow!("auth.max_token_bytes cannot be 0"));
        }

        if self.limits.max_request_body_bytes == 0 {
            return Err(anyhow::anyhow!("limits.max_request_body_bytes cannot be 0"));
        }

        if self.providers.refresh_interval_seconds == 0 {
            return Err(anyhow::anyhow!("providers.refresh_interval_seconds cannot be 0"));
        }

        if self.proxy.backend_url.trim().is_empty() {
            return Err(anyhow::anyhow!("proxy.backend_url cannot be empty"));
        }

        if self.proxy.hmac_secret.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "proxy.hmac_secret is required (set it in config or VIBE_EDGE_HMAC_SECRET)"
            ));
        }
        match STANDARD.decode(self.proxy.hmac_secret.trim()) {
            Ok(bytes) if !bytes.is_empty() => {},
            _ => return Err(anyhow::anyhow!("proxy.hmac_secret must be non-empty base64")),
        }

        let mut keys = std::collections::HashSet::new();
        let mut issuers = std::collections::HashSet::new();
        for bootstrap in &self.providers.bootstrap {
            let provider = &bootstrap.provider;
            if provider.key.as_str().trim().is_empty() {
                return Err(anyhow::anyhow!("Bootstrap provider key cannot be empty"));
            }
            if provider.issuer.trim().is_empty() {
                return Err(anyhow::anyhow!(
                    "Bootstrap provider '{}' has an empty issuer",
                    provider.key
                ));
            }
            if !keys.insert(provider.key.clone()) {
                return Err(anyhow::anyhow!("Duplicate bootstrap provider key '{}'", provider.key));
            }
            if !issuers.insert(provider.issuer_index()) {
                return Err(anyhow::anyhow!(
                    "Duplicate bootstrap issuer '{}' (provider '{}')",
                    provider.issuer,
                    provider.key
                ));
            }
        }

        Ok(())
    }
}

impl BootstrapProvider {
    /// Read `jwks_file` (if any) into the provider's pre-seeded signing keys.
    pub fn load_signing_keys(&mut self) -> anyhow::Result<()> {
        let Some(path) = self.jwks_file.as_deref() else {
            return Ok(());
        };

        let content = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to read JWKS file '{}' for provider '{}': {}",
                path,
                self.provider.key,
                e
            )
        })?;
        let jwks: JwkSet = serde_json::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Invalid JWKS file '{}' for provider '{}': {}", path, self.provider.key, e)
        })?;

        log::debug!(
            "Loaded {} pre-seeded signing keys for provider '{}'",
            jwks.keys.len(),
            self.provider.key
        );
        self.provider.signing_keys = Some(jwks);
        Ok(())
    }
}
