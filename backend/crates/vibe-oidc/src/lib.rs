//! OIDC token validation for externally issued bearer tokens.
//!
//! - [`utils`]: structural inspection of a JWT before verification (issuer sniffing)
//! - [`OidcConfig`]: issuer, audience, leeway and where signing keys come from
//! - [`OidcValidator`]: signature and claim validation with a per-issuer JWKS cache

pub mod config;
pub mod error;
pub mod utils;
pub mod validator;

pub use config::{JwksSource, OidcConfig};
pub use error::OidcError;
pub use utils::{extract_algorithm_unverified, extract_issuer_unverified};
pub use validator::{OidcValidator, TokenClaims};
