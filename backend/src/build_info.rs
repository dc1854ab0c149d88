//! Version details stamped in by `build.rs`.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Short commit hash, or `unknown` outside a git checkout.
pub const GIT_COMMIT: &str = env!("EDGE_GIT_COMMIT");
pub const GIT_BRANCH: &str = env!("EDGE_GIT_BRANCH");
/// UTC, RFC 3339.
pub const BUILT_AT: &str = env!("EDGE_BUILT_AT");
