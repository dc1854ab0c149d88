//! Signed forwarding to the query backend.

mod builder;
mod signer;

pub use builder::{ProxyContext, ProxyRequest, ProxyRequestBuilder};
pub use signer::HmacSigner;

use crate::error::ProxyError;
use std::time::Duration;

/// Shared forwarding state: one HTTP client plus the request builder.
#[derive(Clone)]
pub struct EdgeProxy {
    client: reqwest::Client,
    builder: ProxyRequestBuilder,
    tier_claims: Vec<String>,
}

impl EdgeProxy {
    pub fn new(
        builder: ProxyRequestBuilder,
        timeout: Duration,
        tier_claims: Vec<String>,
    ) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            builder,
            tier_claims,
        })
    }

    pub fn builder(&self) -> &ProxyRequestBuilder {
        &self.builder
    }

    /// Claim names copied into `X-Vibe-Tier-Claims`.
    pub fn tier_claims(&self) -> &[String] {
        &self.tier_claims
    }

    pub async fn send(&self, request: ProxyRequest) -> Result<reqwest::Response, ProxyError> {
        let response = self
            .client
            .request(request.method, request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;
        Ok(response)
    }
}
