use super::types::Classification;
use vibe_commons::constants::EdgeRoutes;
use vibe_commons::PermissionLevel;

/// Classify a REST call by verb and path.
///
/// - `/v1/schema...`: GET/HEAD/OPTIONS → Read `SHOW`; POST/PUT → `CREATE`,
///   PATCH → `ALTER`, DELETE → `DROP`, all at Schema
/// - any other GET/HEAD/OPTIONS → Read `SELECT`
/// - `/v1/collections...`: POST → `INSERT`, PUT/PATCH → `UPDATE`, DELETE → `DELETE`, at Write
/// - everything else → Admin
pub fn classify_http_request(method: &str, path: &str) -> Classification {
    let method = method.trim().to_ascii_uppercase();
    let is_read = matches!(method.as_str(), "GET" | "HEAD" | "OPTIONS");

    if is_under(path, EdgeRoutes::SCHEMA) {
        return match method.as_str() {
            _ if is_read => Classification::new(PermissionLevel::Read, "SHOW"),
            "POST" | "PUT" => Classification::new(PermissionLevel::Schema, "CREATE"),
            "PATCH" => Classification::new(PermissionLevel::Schema, "ALTER"),
            "DELETE" => Classification::new(PermissionLevel::Schema, "DROP"),
            _ => Classification::new(PermissionLevel::Admin, method),
        };
    }

    if is_read {
        return Classification::new(PermissionLevel::Read, "SELECT");
    }

    if is_under(path, EdgeRoutes::COLLECTIONS) {
        let statement_type = match method.as_str() {
            "POST" => Some("INSERT"),
            "PUT" | "PATCH" => Some("UPDATE"),
            "DELETE" => Some("DELETE"),
            _ => None,
        };
        if let Some(statement_type) = statement_type {
            return Classification::new(PermissionLevel::Write, statement_type);
        }
    }

    Classification::new(PermissionLevel::Admin, method)
}

/// `path` equals `prefix` or continues it with a `/` segment.
fn is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_routes() {
        let c = classify_http_request("GET", "/v1/schema/tables");
        assert_eq!((c.required_level, c.statement_type.as_str()), (PermissionLevel::Read, "SHOW"));

        for (method, ty) in [("POST", "CREATE"), ("PUT", "CREATE"), ("PATCH", "ALTER"), ("DELETE", "DROP")] {
            let c = classify_http_request(method, "/v1/schema/tables/orders");
            assert_eq!(c.required_level, PermissionLevel::Schema);
            assert_eq!(c.statement_type, ty);
        }
    }

    #[test]
    fn test_reads_anywhere() {
        for method in ["GET", "head", "OPTIONS"] {
            let c = classify_http_request(method, "/v1/collections/orders");
            assert_eq!(c.required_level, PermissionLevel::Read);
            assert_eq!(c.statement_type, "SELECT");
        }
    }

    #[test]
    fn test_collection_writes() {
        for (method, ty) in [("POST", "INSERT"), ("PUT", "UPDATE"), ("PATCH", "UPDATE"), ("DELETE", "DELETE")] {
            let c = classify_http_request(method, "/v1/collections/orders/42");
            assert_eq!(c.required_level, PermissionLevel::Write);
            assert_eq!(c.statement_type, ty);
        }
    }

    #[test]
    fn test_unmapped_mutations_fail_closed() {
        assert_eq!(classify_http_request("POST", "/v1/admin/reload").required_level, PermissionLevel::Admin);
        assert_eq!(classify_http_request("DELETE", "/v1/other").required_level, PermissionLevel::Admin);
        assert_eq!(
            classify_http_request("POST", "/v1/collectionsx").required_level,
            PermissionLevel::Admin
        );
    }
}
