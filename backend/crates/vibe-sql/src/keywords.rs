//! Leading statement keywords the classifier recognizes.

use std::str::FromStr;
use vibe_commons::PermissionLevel;

/// Leading keyword of a classifiable statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlKeyword {
    Select,
    Show,
    Describe,
    Insert,
    Update,
    Delete,
    Upsert,
    Merge,
    Copy,
    Create,
    Alter,
    Drop,
    Truncate,
    Grant,
    Revoke,
    Vacuum,
    Reindex,
    Cluster,
}

impl SqlKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            SqlKeyword::Select => "SELECT",
            SqlKeyword::Show => "SHOW",
            SqlKeyword::Describe => "DESCRIBE",
            SqlKeyword::Insert => "INSERT",
            SqlKeyword::Update => "UPDATE",
            SqlKeyword::Delete => "DELETE",
            SqlKeyword::Upsert => "UPSERT",
            SqlKeyword::Merge => "MERGE",
            SqlKeyword::Copy => "COPY",
            SqlKeyword::Create => "CREATE",
            SqlKeyword::Alter => "ALTER",
            SqlKeyword::Drop => "DROP",
            SqlKeyword::Truncate => "TRUNCATE",
            SqlKeyword::Grant => "GRANT",
            SqlKeyword::Revoke => "REVOKE",
            SqlKeyword::Vacuum => "VACUUM",
            SqlKeyword::Reindex => "REINDEX",
            SqlKeyword::Cluster => "CLUSTER",
        }
    }

    /// Level required before looking at the object kind.
    ///
    /// CREATE/ALTER/DROP are raised to Admin for database-wide objects by the
    /// classifier; see [`SqlKeyword::is_object_ddl`].
    pub fn base_level(self) -> PermissionLevel {
        match self {
            SqlKeyword::Select | SqlKeyword::Show | SqlKeyword::Describe => PermissionLevel::Read,
            SqlKeyword::Insert
            | SqlKeyword::Update
            | SqlKeyword::Delete
            | SqlKeyword::Upsert
            | SqlKeyword::Merge
            | SqlKeyword::Copy => PermissionLevel::Write,
            SqlKeyword::Create | SqlKeyword::Alter | SqlKeyword::Drop => PermissionLevel::Schema,
            SqlKeyword::Truncate
            | SqlKeyword::Grant
            | SqlKeyword::Revoke
            | SqlKeyword::Vacuum
            | SqlKeyword::Reindex
            | SqlKeyword::Cluster => PermissionLevel::Admin,
        }
    }

    pub fn is_object_ddl(self) -> bool {
        matches!(self, SqlKeyword::Create | SqlKeyword::Alter | SqlKeyword::Drop)
    }

    /// Keywords that may terminate a `WITH` prologue.
    pub fn is_cte_terminal(self) -> bool {
        matches!(
            self,
            SqlKeyword::Select
                | SqlKeyword::Insert
                | SqlKeyword::Update
                | SqlKeyword::Delete
                | SqlKeyword::Merge
                | SqlKeyword::Upsert
        )
    }

    pub fn is_data_modifying(self) -> bool {
        self.is_cte_terminal() && self != SqlKeyword::Select
    }
}

impl FromStr for SqlKeyword {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SELECT" => Ok(SqlKeyword::Select),
            "SHOW" => Ok(SqlKeyword::Show),
            "DESCRIBE" | "DESC" => Ok(SqlKeyword::Describe),
            "INSERT" => Ok(SqlKeyword::Insert),
            "UPDATE" => Ok(SqlKeyword::Update),
            "DELETE" => Ok(SqlKeyword::Delete),
            "UPSERT" => Ok(SqlKeyword::Upsert),
            "MERGE" => Ok(SqlKeyword::Merge),
            "COPY" => Ok(SqlKeyword::Copy),
            "CREATE" => Ok(SqlKeyword::Create),
            "ALTER" => Ok(SqlKeyword::Alter),
            "DROP" => Ok(SqlKeyword::Drop),
            "TRUNCATE" => Ok(SqlKeyword::Truncate),
            "GRANT" => Ok(SqlKeyword::Grant),
            "REVOKE" => Ok(SqlKeyword::Revoke),
            "VACUUM" => Ok(SqlKeyword::Vacuum),
            "REINDEX" => Ok(SqlKeyword::Reindex),
            "CLUSTER" => Ok(SqlKeyword::Cluster),
            _ => Err(()),
        }
    }
}

/// Object kinds whose CREATE/ALTER/DROP require Admin rather than Schema.
pub const ADMIN_OBJECT_KINDS: [&str; 5] = ["SCHEMA", "DATABASE", "ROLE", "USER", "EXTENSION"];

/// Modifiers that may sit between CREATE/DROP and the object kind.
pub const DDL_MODIFIERS: [&str; 10] = [
    "OR",
    "REPLACE",
    "TEMP",
    "TEMPORARY",
    "UNIQUE",
    "MATERIALIZED",
    "GLOBAL",
    "LOCAL",
    "UNLOGGED",
    "IF",
];
