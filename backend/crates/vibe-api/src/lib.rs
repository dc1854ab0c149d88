//! HTTP surface of the Vibe edge gateway.
//!
//! Middleware runs in this order for every request:
//! [`EdgeAuthentication`] → [`IdentityResolution`] → [`PermissionEnforcement`],
//! after which the forwarding handler signs and relays the call to the backend.
//!
//! ```rust,ignore
//! App::new()
//!     .app_data(web::Data::new(services.clone()))
//!     .app_data(web::Data::new(proxy.clone()))
//!     .wrap(PermissionEnforcement::new(services.permissions.clone(), max_body))
//!     .wrap(IdentityResolution::new(services.registry.clone(), services.identities.clone()))
//!     .wrap(EdgeAuthentication::new(services.selector.clone(), services.schemes.clone()))
//!     .configure(routes::configure_routes)
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod path;
pub mod proxy;
pub mod routes;
pub mod state;

pub use error::{auth_error_response, error_response, ProxyError};
pub use middleware::{EdgeAuthentication, IdentityResolution, PermissionEnforcement};
pub use path::ensure_canonical_path;
pub use proxy::{EdgeProxy, HmacSigner, ProxyRequest, ProxyRequestBuilder};
pub use state::EdgeServices;
