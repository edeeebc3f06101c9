//! Include patterns compiled to bound name predicates.
//!
//! Three pattern shapes: `^prefix` anchors a starts-with match, a pattern
//! containing `%` or `_` passes through as a LIKE pattern, anything else is
//! exact equality. Pattern text is always bound as a parameter, never placed
//! in SQL text.

use crate::sql::{BindValue, QueryBuf};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompiledPattern {
    /// LIKE with an escaped-prefix + `%` bound value.
    StartsWith(String),
    /// LIKE with the pattern bound verbatim.
    Like(String),
    /// Exact equality.
    Exact(String),
}

pub fn compile(pattern: &str) -> CompiledPattern {
    if let Some(prefix) = pattern.strip_prefix('^') {
        CompiledPattern::StartsWith(format!("{}%", escape_like(prefix)))
    } else if pattern.contains('%') || pattern.contains('_') {
        CompiledPattern::Like(pattern.to_string())
    } else {
        CompiledPattern::Exact(pattern.to_string())
    }
}

/// Bracket-escape LIKE metacharacters so a prefix matches literally.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '[' | '%' | '_' => {
                out.push('[');
                out.push(ch);
                out.push(']');
            }
            _ => out.push(ch),
        }
    }
    out
}

/// OR-combined predicate over `column`, one bound parameter per pattern.
/// `column` is a fixed catalog column reference chosen by the discoverer,
/// never request input. Returns None for an empty pattern list: that kind is
/// simply not discovered.
pub fn name_predicate(column: &str, patterns: &[String], q: &mut QueryBuf) -> Option<String> {
    if patterns.is_empty() {
        return None;
    }
    let parts: Vec<String> = patterns
        .iter()
        .map(|p| match compile(p) {
            CompiledPattern::StartsWith(v) | CompiledPattern::Like(v) => {
                let ph = q.push_param(BindValue::String(v));
                format!("{} LIKE {}", column, ph)
            }
            CompiledPattern::Exact(v) => {
                let ph = q.push_param(BindValue::String(v));
                format!("{} = {}", column, ph)
            }
        })
        .collect();
    Some(format!("({})", parts.join(" OR ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn anchored_pattern_becomes_starts_with() {
        assert_eq!(
            compile("^foo"),
            CompiledPattern::StartsWith("foo%".to_string())
        );
    }

    #[test]
    fn anchored_prefix_escapes_like_metacharacters() {
        assert_eq!(
            compile("^a_b%c"),
            CompiledPattern::StartsWith("a[_]b[%]c%".to_string())
        );
    }

    #[test]
    fn wildcard_pattern_passes_through() {
        assert_eq!(compile("inv%"), CompiledPattern::Like("inv%".to_string()));
        assert_eq!(compile("a_c"), CompiledPattern::Like("a_c".to_string()));
    }

    #[test]
    fn plain_name_is_exact() {
        assert_eq!(compile("orders"), CompiledPattern::Exact("orders".to_string()));
    }

    #[test]
    fn predicate_binds_one_param_per_pattern() {
        let mut q = QueryBuf::new();
        let clause = name_predicate(
            "TABLE_NAME",
            &["^inv".to_string(), "orders".to_string(), "log_%".to_string()],
            &mut q,
        )
        .unwrap();
        assert_eq!(
            clause,
            "(TABLE_NAME LIKE @P1 OR TABLE_NAME = @P2 OR TABLE_NAME LIKE @P3)"
        );
        assert_eq!(
            q.params,
            vec![
                BindValue::String("inv%".to_string()),
                BindValue::String("orders".to_string()),
                BindValue::String("log_%".to_string()),
            ]
        );
    }

    #[test]
    fn empty_pattern_list_yields_no_predicate() {
        let mut q = QueryBuf::new();
        assert_eq!(name_predicate("TABLE_NAME", &[], &mut q), None);
        assert!(q.params.is_empty());
    }
}
