//! Intermediate-path construction.
//!
//! Contract:
//! - directory paths end with exactly one slash;
//! - concatenation inserts exactly one slash between components;
//! - intermediate results of one table live under
//!   `<intermediateRoot>/<queryId>/<schema>/<table>/`.

use strato_common::QueryId;

/// The path with a trailing slash appended if missing.
pub fn with_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// Join a base path and a relative component with exactly one slash.
pub fn join_path(base: &str, name: &str) -> String {
    let name = name.strip_prefix('/').unwrap_or(name);
    format!("{}{}", with_trailing_slash(base), name)
}

/// Intermediate directory of one table's results within a query.
pub fn table_base(intermediate_root: &str, query_id: QueryId, schema: &str, table: &str) -> String {
    format!(
        "{}{}/{}/{}/",
        with_trailing_slash(intermediate_root),
        query_id,
        schema,
        table
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_slash_between_components() {
        assert_eq!(join_path("/a/b", "c"), "/a/b/c");
        assert_eq!(join_path("/a/b/", "c"), "/a/b/c");
        assert_eq!(join_path("/a/b/", "/c"), "/a/b/c");
    }

    #[test]
    fn table_base_layout() {
        assert_eq!(
            table_base("/inter", QueryId(42), "tpch", "orders_join_lineitem"),
            "/inter/42/tpch/orders_join_lineitem/"
        );
        assert_eq!(
            table_base("/inter/", QueryId(42), "tpch", "t"),
            "/inter/42/tpch/t/"
        );
    }
}
