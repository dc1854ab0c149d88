//! vibe-configs
//!
//! Gateway configuration types and loader for the Vibe edge.

pub mod config;

pub use config::defaults;
pub use config::*;
