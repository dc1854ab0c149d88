use super::signer::HmacSigner;
use crate::error::ProxyError;
use actix_web::HttpRequest;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use vibe_commons::constants::EdgeHeaders;

/// Connection-scoped headers that never cross a proxy hop.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Never forwarded; the backend trusts only the signed edge headers.
const STRIPPED: &[&str] = &["host", "authorization", "content-length"];

/// Request-scoped values the gateway adds to the forwarded call.
#[derive(Debug, Clone, Default)]
pub struct ProxyContext {
    pub client_tier: Option<String>,
    /// JSON object of selected token claims.
    pub tier_claims: Option<String>,
}

/// A fully assembled backend request.
#[derive(Debug)]
pub struct ProxyRequest {
    pub method: reqwest::Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Builds signed backend requests from inbound ones.
#[derive(Debug, Clone)]
pub struct ProxyRequestBuilder {
    backend_url: String,
    service_name: String,
    signer: HmacSigner,
}

impl ProxyRequestBuilder {
    pub fn new(
        backend_url: impl Into<String>,
        service_name: impl Into<String>,
        signer: HmacSigner,
    ) -> Self {
        Self {
            backend_url: backend_url.into().trim_end_matches('/').to_string(),
            service_name: service_name.into(),
            signer,
        }
    }

    pub fn build(
        &self,
        req: &HttpRequest,
        body: Bytes,
        context: &ProxyContext,
    ) -> Result<ProxyRequest, ProxyError> {
        let method = reqwest::Method::from_bytes(req.method().as_str().as_bytes())
            .map_err(|e| ProxyError::InvalidRequest(format!("method: {}", e)))?;

        let path = req.path();
        let url = match req.query_string() {
            "" => format!("{}{}", self.backend_url, path),
            query => format!("{}{}?{}", self.backend_url, path, query),
        };

        let mut headers = HeaderMap::new();
        for (name, value) in req.headers() {
            if !is_forwardable(name.as_str()) {
                continue;
            }
            let name = HeaderName::from_bytes(name.as_str().as_bytes())
                .map_err(|e| ProxyError::InvalidRequest(format!("header name: {}", e)))?;
            let value = HeaderValue::from_bytes(value.as_bytes())
                .map_err(|e| ProxyError::InvalidRequest(format!("header value: {}", e)))?;
            headers.append(name, value);
        }

        let (timestamp, signature) = self.signer.sign(req.method().as_str(), path);
        insert(&mut headers, EdgeHeaders::TIMESTAMP, &timestamp)?;
        insert(&mut headers, EdgeHeaders::SIGNATURE, &signature)?;
        insert(&mut headers, EdgeHeaders::SERVICE, &self.service_name)?;
        if let Some(tier) = context.client_tier.as_deref() {
            insert(&mut headers, EdgeHeaders::CLIENT_TIER, tier)?;
        }
        if let Some(claims) = context.tier_claims.as_deref() {
            insert(&mut headers, EdgeHeaders::TIER_CLAIMS, claims)?;
        }

        Ok(ProxyRequest {
            method,
            url,
            headers,
            body,
        })
    }
}

fn is_forwardable(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    !HOP_BY_HOP.contains(&name.as_str())
        && !STRIPPED.contains(&name.as_str())
        && !name.starts_with(EdgeHeaders::RESERVED_PREFIX)
}

fn insert(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), ProxyError> {
    let invalid = |e: &dyn std::fmt::Display| ProxyError::InvalidRequest(format!("{}: {}", name, e));
    let header = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(&e))?;
    let value = HeaderValue::from_str(value).map_err(|e| invalid(&e))?;
    headers.insert(header, value);
    Ok(())
}
