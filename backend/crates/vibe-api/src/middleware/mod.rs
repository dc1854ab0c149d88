//! Request pipeline stages.
//!
//! Each stage stores its output in request extensions for the next one:
//! [`SelectedProvider`](vibe_auth::SelectedProvider) and
//! [`AuthenticatedPrincipal`](vibe_auth::AuthenticatedPrincipal), then
//! [`EdgeIdentity`](vibe_auth::EdgeIdentity), then
//! [`ResolvedPermission`](vibe_auth::ResolvedPermission).

mod authentication;
mod identity;
mod permission;

pub use authentication::{EdgeAuthentication, EdgeAuthenticationService};
pub use identity::{IdentityResolution, IdentityResolutionService};
pub use permission::{PermissionEnforcement, PermissionEnforcementService};
