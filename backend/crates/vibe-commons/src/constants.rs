//! Header names, route prefixes, and fixed limits shared by the gateway crates.

/// Outbound headers attached by the proxy stage.
pub struct EdgeHeaders;

impl EdgeHeaders {
    pub const TIMESTAMP: &'static str = "X-Vibe-Timestamp";
    pub const SIGNATURE: &'static str = "X-Vibe-Signature";
    pub const SERVICE: &'static str = "X-Vibe-Service";
    pub const CLIENT_TIER: &'static str = "X-Vibe-Client-Tier";
    pub const TIER_CLAIMS: &'static str = "X-Vibe-Tier-Claims";

    /// Identity facts the backend trusts. They must never be accepted from a caller.
    pub const USER_ID: &'static str = "X-Vibe-User-Id";
    pub const CLIENT_ID: &'static str = "X-Vibe-Client-Id";
    pub const PERMISSION_LEVEL: &'static str = "X-Vibe-Permission-Level";

    /// Every header starting with this prefix is reserved for the gateway.
    pub const RESERVED_PREFIX: &'static str = "x-vibe-";
}

/// Route layout of the public API.
pub struct EdgeRoutes;

impl EdgeRoutes {
    /// Versioned API prefix; only requests below it are permission-checked.
    pub const VERSIONED_PREFIX: &'static str = "/v1/";
    /// Generic SQL query endpoint (`POST` with `{"sql": "..."}`).
    pub const QUERY: &'static str = "/v1/query";
    pub const COLLECTIONS: &'static str = "/v1/collections";
    pub const SCHEMA: &'static str = "/v1/schema";
    pub const ADMIN: &'static str = "/v1/admin";
    pub const HEALTH: &'static str = "/health";
    pub const HEALTH_PROVIDERS: &'static str = "/health/providers";
}

/// Prefix of every dynamically registered validator scheme.
pub const SCHEME_ID_PREFIX: &str = "oidc-";

/// Default ceiling for bearer tokens, checked before any parsing.
pub const DEFAULT_MAX_TOKEN_BYTES: usize = 8 * 1024;

/// Default ceiling for request bodies inspected by permission enforcement.
pub const DEFAULT_MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;
