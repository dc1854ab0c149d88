use serde::Serialize;
use vibe_commons::PermissionLevel;

/// Result of classifying a SQL statement or REST request.
///
/// Errors are data: `is_error` is set and `error_message` says why. An error
/// classification always carries `PermissionLevel::Admin` so that a caller
/// ignoring `is_error` still fails closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub required_level: PermissionLevel,
    /// Leading keyword in upper case, possibly prefixed (`EXPLAIN `, `WITH...`).
    pub statement_type: String,
    pub is_error: bool,
    pub error_message: Option<String>,
    /// Data-modifying keywords found inside CTE bodies, e.g. the `DELETE`
    /// in `WITH gone AS (DELETE ...) SELECT ...`.
    pub embedded_statements: Vec<String>,
}

impl Classification {
    pub fn new(required_level: PermissionLevel, statement_type: impl Into<String>) -> Self {
        Self {
            required_level,
            statement_type: statement_type.into(),
            is_error: false,
            error_message: None,
            embedded_statements: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            required_level: PermissionLevel::Admin,
            statement_type: String::new(),
            is_error: true,
            error_message: Some(message.into()),
            embedded_statements: Vec::new(),
        }
    }

    /// Prepend `prefix` to the statement type, keeping everything else.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.statement_type.insert_str(0, prefix);
        self
    }

    /// Statement type with `EXPLAIN`/`WITH` prefixes removed.
    ///
    /// `"EXPLAIN ANALYZE WITH...DELETE"` → `"DELETE"`.
    pub fn base_keyword(&self) -> &str {
        let mut ty = self.statement_type.as_str();
        loop {
            let stripped = ty
                .strip_prefix("EXPLAIN ANALYZE ")
                .or_else(|| ty.strip_prefix("EXPLAIN "))
                .or_else(|| ty.strip_prefix("WITH..."));
            match stripped {
                Some(rest) => ty = rest,
                None => return ty,
            }
        }
    }

    /// Every name a statement denial can match: the full statement type,
    /// its base keyword, and each keyword embedded in a CTE body.
    pub fn denial_keys(&self) -> impl Iterator<Item = &str> {
        [self.statement_type.as_str(), self.base_keyword()]
            .into_iter()
            .chain(self.embedded_statements.iter().map(String::as_str))
    }
}
