use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

impl HealthResponse {
    pub fn ok_with_version(version: &'static str) -> Self {
        Self {
            status: "healthy",
            version,
        }
    }
}

/// One provider as seen by the registry and the scheme registry.
#[derive(Debug, Serialize)]
pub struct ProviderHealth {
    pub key: String,
    pub issuer: String,
    pub active: bool,
    pub bootstrap: bool,
    pub scheme_registered: bool,
}

#[derive(Debug, Serialize)]
pub struct ProvidersHealthResponse {
    pub providers: Vec<ProviderHealth>,
}
