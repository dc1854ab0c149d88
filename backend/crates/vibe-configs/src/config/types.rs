use super::defaults::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use vibe_commons::{ClientMapping, PermissionLevel, ProviderRecord, RoleMapping};

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub limits: LimitsSettings,
    #[serde(default)]
    pub providers: ProviderSettings,
    #[serde(default)]
    pub proxy: ProxySettings,
    #[serde(default)]
    pub security: SecuritySettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for log files (default: "./logs")
    #[serde(default = "default_logs_path")]
    pub logs_path: String,
    #[serde(default = "default_true")]
    pub log_to_console: bool,
    /// "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Optional per-target log level overrides
    /// [logging.targets]
    /// vibe_auth = "debug"
    #[serde(default)]
    pub targets: HashMap<String, String>,
}

/// Bearer-token handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Tokens longer than this are rejected before any parsing (default: 8 KiB)
    #[serde(default = "default_max_token_bytes")]
    pub max_token_bytes: usize,
    /// Leeway applied to providers that do not configure their own clock skew
    #[serde(default = "default_clock_skew_seconds")]
    pub default_clock_skew_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsSettings {
    /// Largest request body permission enforcement will buffer (default: 1 MiB)
    #[serde(default = "default_max_request_body_bytes")]
    pub max_request_body_bytes: usize,
}

/// Provider refresh and bootstrap providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Interval between refresh cycles (default: 300s)
    #[serde(default = "default_refresh_interval_seconds")]
    pub refresh_interval_seconds: u64,
    /// Providers seeded from this file at startup
    /// [[providers.bootstrap]]
    /// key = "acme"
    /// issuer = "https://idp.acme.test/realms/main"
    #[serde(default)]
    pub bootstrap: Vec<BootstrapProvider>,
}

/// A provider defined in the config file, with its mappings inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapProvider {
    #[serde(flatten)]
    pub provider: ProviderRecord,
    /// JWKS JSON file used instead of OIDC discovery
    #[serde(default)]
    pub jwks_file: Option<String>,
    #[serde(default)]
    pub roles: Vec<BootstrapRole>,
    #[serde(default)]
    pub clients: Vec<BootstrapClient>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapRole {
    pub external_role: String,
    pub permission_level: PermissionLevel,
    #[serde(default)]
    pub denied_statements: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapClient {
    pub client_id: String,
    pub max_level: PermissionLevel,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub tier: Option<String>,
}

/// Outbound forwarding to the query backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxySettings {
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Base64-encoded HMAC key shared with the backend
    #[serde(default)]
    pub hmac_secret: String,
    /// Value of the `X-Vibe-Service` header
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_proxy_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Token claims copied into `X-Vibe-Tier-Claims` (JSON object)
    #[serde(default)]
    pub tier_claims: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecuritySettings {
    #[serde(default)]
    pub cors: CorsSettings,
}

/// CORS configuration that maps directly to actix-cors options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins. Empty list or ["*"] allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_cors_methods")]
    pub allowed_methods: Vec<String>,
    #[serde(default = "default_cors_headers")]
    pub allowed_headers: Vec<String>,
    #[serde(default = "default_true")]
    pub allow_credentials: bool,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

impl BootstrapProvider {
    /// Split into persisted records. The provider is always flagged `bootstrap`.
    pub fn to_records(&self) -> (ProviderRecord, Vec<RoleMapping>, Vec<ClientMapping>) {
        let mut provider = self.provider.clone();
        provider.bootstrap = true;

        let roles = self
            .roles
            .iter()
            .map(|role| {
                RoleMapping::new(
                    provider.key.clone(),
                    role.external_role.clone(),
                    role.permission_level,
                )
                .with_denied(&role.denied_statements)
            })
            .collect();

        let clients = self
            .clients
            .iter()
            .map(|client| ClientMapping {
                provider_key: provider.key.clone(),
                client_id: client.client_id.clone(),
                max_level: client.max_level,
                active: client.active,
                tier: client.tier.clone(),
            })
            .collect();

        (provider, roles, clients)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            logs_path: default_logs_path(),
            log_to_console: true,
            format: default_log_format(),
            targets: HashMap::new(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            max_token_bytes: default_max_token_bytes(),
            default_clock_skew_seconds: default_clock_skew_seconds(),
        }
    }
}

impl Default for LimitsSettings {
    fn default() -> Self {
        Self {
            max_request_body_bytes: default_max_request_body_bytes(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: default_refresh_interval_seconds(),
            bootstrap: Vec::new(),
        }
    }
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            hmac_secret: String::new(),
            service_name: default_service_name(),
            timeout_seconds: default_proxy_timeout_seconds(),
            tier_claims: Vec::new(),
        }
    }
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(), // Empty = allow any
            allowed_methods: default_cors_methods(),
            allowed_headers: default_cors_headers(),
            allow_credentials: true,
            max_age: default_cors_max_age(),
        }
    }
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            logging: LoggingSettings::default(),
            auth: AuthSettings::default(),
            limits: LimitsSettings::default(),
            providers: ProviderSettings::default(),
            proxy: ProxySettings::default(),
            security: SecuritySettings::default(),
        }
    }
}
