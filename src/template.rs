//! Ad-hoc query templates: decode, substitute, guard, cap.
//!
//! The guard is a textual denylist of mutation and administrative keywords,
//! checked after substitution. It blocks known dangerous keywords, not
//! semantics; it is documented as best-effort, not a sandbox.

use crate::error::AppError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::Value;

pub const DEFAULT_ROW_LIMIT: i64 = 1000;

const DENIED_WORDS: &[&str] = &[
    "insert", "update", "delete", "merge", "alter", "drop", "create", "truncate", "exec",
    "execute", "grant", "revoke", "use", "begin", "commit", "rollback",
];

/// Administrative procedure-name prefixes, matched at word start.
const DENIED_PREFIXES: &[&str] = &["sp_", "xp_"];

pub fn decode(data: &str) -> Result<String, AppError> {
    let bytes = BASE64
        .decode(data)
        .map_err(|e| AppError::BadRequest(format!("template is not valid base64: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|_| AppError::BadRequest("template is not valid UTF-8".to_string()))
}

/// Replace each `{{ name }}` placeholder from the supplied values. A missing
/// name fails the request before any database call. Numeric-looking values
/// substitute unquoted; everything else is single-quoted with embedded
/// quotes doubled.
pub fn substitute(template: &str, vars: &serde_json::Map<String, Value>) -> Result<String, AppError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            return Err(AppError::BadRequest("unterminated template placeholder".to_string()));
        };
        let name = after[..end].trim();
        let value = vars
            .get(name)
            .ok_or_else(|| AppError::BadRequest(format!("missing template value: {}", name)))?;
        out.push_str(&render_value(value));
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

fn looks_numeric(s: &str) -> bool {
    !s.is_empty()
        && s.parse::<f64>().is_ok()
        && s.bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
}

fn render_value(v: &Value) -> String {
    match v {
        Value::Number(n) => n.to_string(),
        Value::String(s) if looks_numeric(s) => s.clone(),
        Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        Value::Null => "NULL".to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

/// Reject substituted text containing mutation or administrative keywords.
pub fn guard(sql: &str) -> Result<(), AppError> {
    let lower = sql.to_ascii_lowercase();
    for word in words_of(&lower) {
        if DENIED_WORDS.contains(&word) {
            return Err(AppError::BadRequest(format!(
                "template rejected: contains '{}'",
                word
            )));
        }
        if DENIED_PREFIXES.iter().any(|p| word.starts_with(p)) {
            return Err(AppError::BadRequest(format!(
                "template rejected: contains '{}'",
                word
            )));
        }
    }
    Ok(())
}

fn words_of(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
}

/// Wrap accepted text with a session-scoped row cap. A non-positive or
/// missing override falls back to the default.
pub fn wrap_with_row_limit(sql: &str, row_limit: Option<i64>) -> String {
    let cap = match row_limit {
        Some(n) if n > 0 => n,
        _ => DEFAULT_ROW_LIMIT,
    };
    format!("SET ROWCOUNT {};\n{};\nSET ROWCOUNT 0;", cap, sql.trim_end_matches(';'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn vars(pairs: &[(&str, Value)]) -> serde_json::Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn numeric_values_substitute_unquoted() {
        let out = substitute("SELECT {{x}} AS v", &vars(&[("x", json!(5))])).unwrap();
        assert_eq!(out, "SELECT 5 AS v");
    }

    #[test]
    fn numeric_looking_strings_substitute_unquoted() {
        let out = substitute("SELECT {{ x }} AS v", &vars(&[("x", json!("3.5"))])).unwrap();
        assert_eq!(out, "SELECT 3.5 AS v");
    }

    #[test]
    fn string_values_are_quoted_and_escaped() {
        let out = substitute(
            "SELECT * FROM t WHERE name = {{n}}",
            &vars(&[("n", json!("O'Brien"))]),
        )
        .unwrap();
        assert_eq!(out, "SELECT * FROM t WHERE name = 'O''Brien'");
    }

    #[test]
    fn booleans_and_null_render_as_sql_literals() {
        let out = substitute(
            "SELECT * FROM t WHERE active = {{a}} AND deleted_at IS {{d}}",
            &vars(&[("a", json!(true)), ("d", json!(null))]),
        )
        .unwrap();
        assert_eq!(out, "SELECT * FROM t WHERE active = 1 AND deleted_at IS NULL");
    }

    #[test]
    fn missing_value_fails_before_execution() {
        let err = substitute("SELECT {{missing}}", &vars(&[])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn guard_rejects_mutation_keywords_case_insensitively() {
        assert!(guard("DROP TABLE t").is_err());
        assert!(guard("select * from t; dRoP table t").is_err());
        assert!(guard("TRUNCATE TABLE t").is_err());
        assert!(guard("EXEC something").is_err());
        assert!(guard("BEGIN TRANSACTION").is_err());
    }

    #[test]
    fn guard_rejects_admin_procedure_prefixes() {
        assert!(guard("select * from t where x = 1; sp_help").is_err());
        assert!(guard("xp_cmdshell 'dir'").is_err());
    }

    #[test]
    fn guard_matches_whole_words_only() {
        // Column names containing a denied keyword as a substring pass.
        assert!(guard("SELECT updated_at, dropped, user_name FROM t").is_ok());
        assert!(guard("SELECT 1 AS v").is_ok());
    }

    #[test]
    fn wrap_applies_default_and_override_caps() {
        assert_eq!(
            wrap_with_row_limit("SELECT 1", None),
            "SET ROWCOUNT 1000;\nSELECT 1;\nSET ROWCOUNT 0;"
        );
        assert!(wrap_with_row_limit("SELECT 1", Some(50)).starts_with("SET ROWCOUNT 50;"));
        // Negative overrides fall back to the default.
        assert!(wrap_with_row_limit("SELECT 1", Some(-5)).starts_with("SET ROWCOUNT 1000;"));
    }

    #[test]
    fn decode_round_trips_base64() {
        use base64::Engine as _;
        let encoded = base64::engine::general_purpose::STANDARD.encode("SELECT {{x}} AS v");
        assert_eq!(decode(&encoded).unwrap(), "SELECT {{x}} AS v");
        assert!(decode("not base64!!!").is_err());
    }
}
