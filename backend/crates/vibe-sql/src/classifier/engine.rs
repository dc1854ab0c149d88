use super::types::Classification;
use crate::keywords::{SqlKeyword, ADMIN_OBJECT_KINDS, DDL_MODIFIERS};
use sqlparser::dialect::GenericDialect;
use sqlparser::tokenizer::{Token, Tokenizer};
use vibe_commons::PermissionLevel;

pub(crate) const MULTI_STATEMENT: &str = "Multi-statement requests are not permitted.";
pub(crate) const UNRECOGNIZED: &str = "Unrecognized statement type.";
const TOO_MANY_EXPLAINS: &str = "Too many nested EXPLAIN prefixes.";

/// Longest accepted run of `EXPLAIN` prefixes.
const MAX_EXPLAIN_DEPTH: usize = 4;

/// Maps a SQL statement to the permission level needed to run it.
pub struct SqlStatementClassifier;

impl SqlStatementClassifier {
    /// Classify a single SQL statement.
    ///
    /// Comments and whitespace are dropped by the tokenizer, so leading
    /// `--` and `/* */` comments never hide the real keyword. A single
    /// trailing `;` is allowed; any other `;` outside a quoted region is
    /// rejected.
    pub fn classify(sql: &str) -> Classification {
        let tokens = match significant_tokens(sql) {
            Ok(tokens) => tokens,
            Err(classification) => return classification,
        };

        let statement = match tokens.split_last() {
            Some((Token::SemiColon, rest)) => rest,
            _ => &tokens[..],
        };

        if statement.is_empty() {
            return Classification::error("Empty SQL statement.");
        }

        if statement.iter().any(|t| matches!(t, Token::SemiColon)) {
            return Classification::error(MULTI_STATEMENT);
        }

        classify_tokens(statement)
    }
}

/// Tokenize and drop whitespace, comments and EOF.
fn significant_tokens(sql: &str) -> Result<Vec<Token>, Classification> {
    let dialect = GenericDialect {};
    let tokens = Tokenizer::new(&dialect, sql).tokenize().map_err(|e| {
        if e.message.to_ascii_lowercase().contains("comment") {
            Classification::error("Unterminated block comment.")
        } else {
            Classification::error(format!("Unable to tokenize SQL: {}", e.message))
        }
    })?;

    Ok(tokens
        .into_iter()
        .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
        .collect())
}

/// Unquoted word in upper case.
fn keyword_of(token: &Token) -> Option<String> {
    match token {
        Token::Word(w) if w.quote_style.is_none() => Some(w.value.to_ascii_uppercase()),
        _ => None,
    }
}

fn classify_tokens(tokens: &[Token]) -> Classification {
    let mut prefix = String::new();
    let mut rest = tokens;
    let mut explains = 0usize;

    let inner = loop {
        let Some(first) = rest.first().and_then(keyword_of) else {
            return Classification::error(UNRECOGNIZED);
        };

        match first.as_str() {
            "EXPLAIN" => {
                explains += 1;
                if explains > MAX_EXPLAIN_DEPTH {
                    return Classification::error(TOO_MANY_EXPLAINS);
                }
                let (analyze, consumed) = match explain_options(&rest[1..]) {
                    Ok(options) => options,
                    Err(e) => return e,
                };
                prefix.push_str(if analyze { "EXPLAIN ANALYZE " } else { "EXPLAIN " });
                rest = &rest[1 + consumed..];
            },
            "WITH" => break classify_with(&rest[1..]),
            _ => break classify_simple(&first, &rest[1..]),
        }
    };

    if inner.is_error || prefix.is_empty() {
        inner
    } else {
        inner.with_prefix(&prefix)
    }
}

/// Options following `EXPLAIN`: `[ (options) ] [ANALYZE] [VERBOSE]`.
///
/// Returns whether ANALYZE was requested and how many tokens were consumed.
fn explain_options(rest: &[Token]) -> Result<(bool, usize), Classification> {
    let mut i = 0;
    let mut analyze = false;

    if matches!(rest.first(), Some(Token::LParen)) {
        let close = matching_paren(rest, 0)
            .ok_or_else(|| Classification::error("Unbalanced parentheses."))?;
        analyze = rest[1..close]
            .iter()
            .any(|t| keyword_of(t).as_deref() == Some("ANALYZE"));
        i = close + 1;
    }

    while let Some(word) = rest.get(i).and_then(keyword_of) {
        match word.as_str() {
            "ANALYZE" => analyze = true,
            "VERBOSE" => {},
            _ => break,
        }
        i += 1;
    }

    Ok((analyze, i))
}

/// `WITH [RECURSIVE] name AS (...) [, ...] <terminal statement>`
///
/// The terminal keyword is the first SELECT/INSERT/UPDATE/DELETE/MERGE/UPSERT
/// at nesting depth 0. Any parenthesized body opening with a data-modifying
/// keyword raises the level to at least Write and is recorded in
/// `embedded_statements`.
fn classify_with(rest: &[Token]) -> Classification {
    let mut i = usize::from(rest.first().and_then(keyword_of).as_deref() == Some("RECURSIVE"));
    let mut depth = 0usize;
    let mut body_level = PermissionLevel::None;
    let mut embedded: Vec<String> = Vec::new();

    while i < rest.len() {
        match &rest[i] {
            Token::LParen => {
                depth += 1;
                if let Some(kw) = rest.get(i + 1).and_then(statement_keyword) {
                    if kw.is_data_modifying() {
                        body_level = body_level.max(kw.base_level());
                        if !embedded.iter().any(|e| e == kw.as_str()) {
                            embedded.push(kw.as_str().to_string());
                        }
                    }
                }
            },
            Token::RParen => {
                if depth == 0 {
                    return Classification::error("Unbalanced parentheses.");
                }
                depth -= 1;
            },
            token if depth == 0 => {
                if let Some(kw) = statement_keyword(token).filter(|kw| kw.is_cte_terminal()) {
                    let inner = classify_simple(kw.as_str(), &rest[i + 1..]);
                    if inner.is_error {
                        return inner;
                    }
                    let mut classification = Classification::new(
                        inner.required_level.max(body_level),
                        format!("WITH...{}", inner.statement_type),
                    );
                    classification.embedded_statements = embedded;
                    return classification;
                }
            },
            _ => {},
        }
        i += 1;
    }

    Classification::error(UNRECOGNIZED)
}

fn classify_simple(first: &str, rest: &[Token]) -> Classification {
    let Ok(keyword) = first.parse::<SqlKeyword>() else {
        return Classification::error(UNRECOGNIZED);
    };

    let mut level = keyword.base_level();
    if keyword.is_object_ddl()
        && object_kind(rest).is_some_and(|kind| ADMIN_OBJECT_KINDS.contains(&kind.as_str()))
    {
        level = PermissionLevel::Admin;
    }

    Classification::new(level, first)
}

fn statement_keyword(token: &Token) -> Option<SqlKeyword> {
    keyword_of(token).and_then(|w| w.parse().ok())
}

/// First word after CREATE/ALTER/DROP that is not a modifier (`OR REPLACE`, `TEMP`, ...).
fn object_kind(rest: &[Token]) -> Option<String> {
    rest.iter()
        .map_while(keyword_of)
        .find(|w| !DDL_MODIFIERS.contains(&w.as_str()))
}

fn matching_paren(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, token) in tokens.iter().enumerate().skip(open) {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            },
            _ => {},
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_and_type(sql: &str) -> (PermissionLevel, String) {
        let c = SqlStatementClassifier::classify(sql);
        assert!(!c.is_error, "{} -> {:?}", sql, c.error_message);
        (c.required_level, c.statement_type)
    }

    #[test]
    fn test_classify_select() {
        assert_eq!(level_and_type("SELECT * FROM t"), (PermissionLevel::Read, "SELECT".into()));
        assert_eq!(level_and_type("select 1;"), (PermissionLevel::Read, "SELECT".into()));
        assert_eq!(level_and_type("SHOW TABLES"), (PermissionLevel::Read, "SHOW".into()));
    }

    #[test]
    fn test_classify_dml() {
        for (sql, ty) in [
            ("INSERT INTO t VALUES (1)", "INSERT"),
            ("UPDATE t SET a = 1", "UPDATE"),
            ("DELETE FROM t", "DELETE"),
            ("MERGE INTO t USING s ON t.id = s.id WHEN MATCHED THEN DELETE", "MERGE"),
            ("COPY t FROM STDIN", "COPY"),
            ("UPSERT INTO t VALUES (1)", "UPSERT"),
        ] {
            assert_eq!(level_and_type(sql), (PermissionLevel::Write, ty.to_string()));
        }
    }

    #[test]
    fn test_classify_ddl() {
        assert_eq!(level_and_type("DROP TABLE t"), (PermissionLevel::Schema, "DROP".into()));
        assert_eq!(
            level_and_type("CREATE TABLE t (id INT)"),
            (PermissionLevel::Schema, "CREATE".into())
        );
        assert_eq!(
            level_and_type("CREATE UNIQUE INDEX i ON t (id)"),
            (PermissionLevel::Schema, "CREATE".into())
        );
        assert_eq!(
            level_and_type("ALTER TABLE t ADD COLUMN c INT"),
            (PermissionLevel::Schema, "ALTER".into())
        );
        assert_eq!(level_and_type("DROP INDEX i"), (PermissionLevel::Schema, "DROP".into()));
    }

    #[test]
    fn test_classify_admin() {
        for sql in [
            "TRUNCATE t",
            "CREATE SCHEMA analytics",
            "DROP SCHEMA analytics CASCADE",
            "CREATE DATABASE other",
            "CREATE OR REPLACE ROLE r",
            "DROP USER bob",
            "CREATE EXTENSION pgcrypto",
            "GRANT SELECT ON t TO bob",
            "REVOKE ALL ON t FROM bob",
            "VACUUM",
            "REINDEX TABLE t",
            "CLUSTER t",
        ] {
            assert_eq!(
                SqlStatementClassifier::classify(sql).required_level,
                PermissionLevel::Admin,
                "{}",
                sql
            );
        }
        assert_eq!(level_and_type("TRUNCATE t").1, "TRUNCATE");
    }

    #[test]
    fn test_leading_comments_are_skipped() {
        assert_eq!(
            level_and_type("-- just reading\n/* really */ DELETE FROM t"),
            (PermissionLevel::Write, "DELETE".into())
        );
    }

    #[test]
    fn test_unterminated_block_comment_is_error() {
        let c = SqlStatementClassifier::classify("/* SELECT 1");
        assert!(c.is_error);
    }

    #[test]
    fn test_empty_statement_is_error() {
        for sql in ["", "   ", "-- nothing", ";"] {
            let c = SqlStatementClassifier::classify(sql);
            assert!(c.is_error, "{:?}", sql);
        }
    }

    #[test]
    fn test_multi_statement_rejected() {
        let c = SqlStatementClassifier::classify("SELECT 1; DROP TABLE t");
        assert!(c.is_error);
        assert!(c.error_message.unwrap().contains("Multi-statement"));

        assert!(SqlStatementClassifier::classify("SELECT 1;;").is_error);
    }

    #[test]
    fn test_semicolon_inside_quotes_allowed() {
        assert!(!SqlStatementClassifier::classify("SELECT * FROM t WHERE name='a;b'").is_error);
        assert!(!SqlStatementClassifier::classify(r#"SELECT "a;b" FROM t"#).is_error);
    }

    #[test]
    fn test_unrecognized_keyword() {
        let c = SqlStatementClassifier::classify("FROBNICATE t");
        assert!(c.is_error);
        assert_eq!(c.error_message.as_deref(), Some(UNRECOGNIZED));
        assert!(SqlStatementClassifier::classify("\"SELECT\" 1").is_error);
    }

    #[test]
    fn test_explain_inherits_level() {
        assert_eq!(
            level_and_type("EXPLAIN SELECT * FROM t"),
            (PermissionLevel::Read, "EXPLAIN SELECT".into())
        );
        assert_eq!(
            level_and_type("EXPLAIN ANALYZE VERBOSE DELETE FROM t"),
            (PermissionLevel::Write, "EXPLAIN ANALYZE DELETE".into())
        );
        assert_eq!(
            level_and_type("EXPLAIN (ANALYZE, BUFFERS) UPDATE t SET a = 1"),
            (PermissionLevel::Write, "EXPLAIN ANALYZE UPDATE".into())
        );
        assert_eq!(
            level_and_type("EXPLAIN (FORMAT JSON) SELECT 1"),
            (PermissionLevel::Read, "EXPLAIN SELECT".into())
        );
    }

    #[test]
    fn test_cte_terminal_keyword() {
        assert_eq!(
            level_and_type("WITH x AS (SELECT 1) SELECT * FROM x"),
            (PermissionLevel::Read, "WITH...SELECT".into())
        );
        assert_eq!(
            level_and_type("WITH RECURSIVE x(n) AS (SELECT 1 UNION SELECT n + 1 FROM x) DELETE FROM t"),
            (PermissionLevel::Write, "WITH...DELETE".into())
        );
    }

    #[test]
    fn test_data_modifying_cte_raises_level() {
        assert_eq!(
            level_and_type("WITH gone AS (DELETE FROM t RETURNING *) SELECT * FROM gone"),
            (PermissionLevel::Write, "WITH...SELECT".into())
        );
    }

    #[test]
    fn test_data_modifying_cte_records_embedded_keywords() {
        let c = SqlStatementClassifier::classify(
            "WITH gone AS (DELETE FROM t RETURNING *), moved AS (INSERT INTO u SELECT * FROM gone) SELECT * FROM moved",
        );
        assert!(!c.is_error);
        assert_eq!(c.embedded_statements, vec!["DELETE".to_string(), "INSERT".to_string()]);
        assert!(c.denial_keys().any(|k| k == "DELETE"));

        let explained =
            SqlStatementClassifier::classify("EXPLAIN WITH gone AS (DELETE FROM t) SELECT 1");
        assert_eq!(explained.statement_type, "EXPLAIN WITH...SELECT");
        assert_eq!(explained.embedded_statements, vec!["DELETE".to_string()]);

        let plain = SqlStatementClassifier::classify("WITH x AS (SELECT 1) SELECT * FROM x");
        assert!(plain.embedded_statements.is_empty());
    }

    #[test]
    fn test_stacked_explain_is_bounded() {
        let nested = SqlStatementClassifier::classify("EXPLAIN EXPLAIN SELECT 1");
        assert_eq!(nested.statement_type, "EXPLAIN EXPLAIN SELECT");

        let sql = format!("{}SELECT 1", "EXPLAIN ".repeat(100_000));
        let c = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || SqlStatementClassifier::classify(&sql))
            .unwrap()
            .join()
            .unwrap();
        assert!(c.is_error);
        assert_eq!(c.error_message.as_deref(), Some(TOO_MANY_EXPLAINS));
        assert_eq!(c.required_level, PermissionLevel::Admin);
    }

    #[test]
    fn test_cte_without_terminal_is_error() {
        assert!(SqlStatementClassifier::classify("WITH x AS (SELECT 1)").is_error);
    }
}
