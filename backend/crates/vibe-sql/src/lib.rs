//! Coarse classification of inbound requests by the permission they need.
//!
//! This is not a SQL validator. The classifier tokenizes the statement,
//! finds its leading keyword and maps it to a [`PermissionLevel`]. It also
//! rejects a few dangerous shapes (multiple statements, unterminated comments).
//!
//! ```rust
//! use vibe_commons::PermissionLevel;
//! use vibe_sql::SqlStatementClassifier;
//!
//! let c = SqlStatementClassifier::classify("DELETE FROM orders WHERE id = 7");
//! assert_eq!(c.required_level, PermissionLevel::Write);
//! assert_eq!(c.statement_type, "DELETE");
//! ```
//!
//! [`PermissionLevel`]: vibe_commons::PermissionLevel

pub mod classifier;
pub mod keywords;

pub use classifier::{classify_http_request, Classification, SqlStatementClassifier};
pub use keywords::SqlKeyword;
