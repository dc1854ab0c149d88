use vibe_commons::constants::{DEFAULT_MAX_REQUEST_BODY_BYTES, DEFAULT_MAX_TOKEN_BYTES};

// Default value functions
pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_port() -> u16 {
    8443
}

pub fn default_workers() -> usize {
    0 // 0 = one worker per physical core (actix default)
}

pub fn default_true() -> bool {
    true
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_log_format() -> String {
    "compact".to_string()
}

pub fn default_logs_path() -> String {
    "./logs".to_string()
}

pub fn default_max_token_bytes() -> usize {
    DEFAULT_MAX_TOKEN_BYTES
}

pub fn default_clock_skew_seconds() -> u64 {
    60
}

pub fn default_max_request_body_bytes() -> usize {
    DEFAULT_MAX_REQUEST_BODY_BYTES
}

pub fn default_refresh_interval_seconds() -> u64 {
    300 // 5 minutes
}

pub fn default_backend_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

pub fn default_service_name() -> String {
    "vibe-edge".to_string()
}

pub fn default_proxy_timeout_seconds() -> u64 {
    30
}

pub fn default_cors_max_age() -> u64 {
    3600 // 1 hour
}

pub fn default_cors_methods() -> Vec<String> {
    ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

pub fn default_cors_headers() -> Vec<String> {
    ["Authorization", "Content-Type", "Accept", "Origin", "X-Requested-With"]
        .iter()
        .map(|h| h.to_string())
        .collect()
}
