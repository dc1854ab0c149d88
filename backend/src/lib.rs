//! Vibe edge server library
//!
//! Exposes the bootstrap and server wiring for integration testing.

pub mod build_info;
pub mod lifecycle;
pub mod logging;
pub mod middleware;
