//! Maps catalog type descriptors to bind types and schema-description types.
//!
//! The mapping is total: every type name produces a result, unknown names
//! fall back to unbounded text. Classification order matters; `bigint` is
//! matched before the generic `int`-containing check.

use crate::sql::BindValue;
use serde_json::Value;

/// Coarse type used in schema fragments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaType {
    Integer,
    Number,
    Boolean,
    String,
    DateTime,
    Uuid,
}

impl SchemaType {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaType::Integer => "integer",
            SchemaType::Number => "number",
            SchemaType::Boolean => "boolean",
            SchemaType::String => "string",
            SchemaType::DateTime => "date-time",
            SchemaType::Uuid => "uuid",
        }
    }

    /// JSON-schema style description: base type plus optional format.
    pub fn describe(self) -> Value {
        match self {
            SchemaType::DateTime => serde_json::json!({"type": "string", "format": "date-time"}),
            SchemaType::Uuid => serde_json::json!({"type": "string", "format": "uuid"}),
            other => serde_json::json!({"type": other.as_str()}),
        }
    }
}

/// Bind type for safe parameter binding. Also renders the T-SQL declaration
/// used by the staging-table capture strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindType {
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Bit,
    Decimal { precision: u8, scale: u8 },
    Float,
    DateTime,
    Date,
    Time,
    Guid,
    /// Declared length; None means `max` (unbounded).
    NVarChar { length: Option<u16>, base: &'static str },
    Binary { length: Option<u16>, base: &'static str },
}

impl BindType {
    /// T-SQL type declaration text, e.g. `nvarchar(50)`, `decimal(18, 4)`.
    pub fn decl_sql(&self) -> String {
        match self {
            BindType::TinyInt => "tinyint".to_string(),
            BindType::SmallInt => "smallint".to_string(),
            BindType::Int => "int".to_string(),
            BindType::BigInt => "bigint".to_string(),
            BindType::Bit => "bit".to_string(),
            BindType::Decimal { precision, scale } => {
                format!("decimal({}, {})", precision, scale)
            }
            BindType::Float => "float".to_string(),
            BindType::DateTime => "datetime2".to_string(),
            BindType::Date => "date".to_string(),
            BindType::Time => "time".to_string(),
            BindType::Guid => "uniqueidentifier".to_string(),
            BindType::NVarChar { length, base } | BindType::Binary { length, base } => {
                match length {
                    Some(n) => format!("{}({})", base, n),
                    None => format!("{}(max)", base),
                }
            }
        }
    }

    /// Coerce a JSON value into a bindable value for this type. Best-effort
    /// and infallible: values that do not fit bind as text and the database
    /// reports the conversion error.
    pub fn coerce(&self, v: &Value) -> BindValue {
        if v.is_null() {
            return BindValue::Null;
        }
        match self {
            BindType::TinyInt | BindType::SmallInt | BindType::Int => match v {
                Value::Number(n) => n
                    .as_i64()
                    .and_then(|i| i32::try_from(i).ok())
                    .map(BindValue::I32)
                    .unwrap_or_else(|| BindValue::from_json(v)),
                Value::String(s) => s
                    .parse::<i32>()
                    .map(BindValue::I32)
                    .unwrap_or_else(|_| BindValue::String(s.clone())),
                _ => BindValue::from_json(v),
            },
            BindType::BigInt => match v {
                Value::Number(n) => n
                    .as_i64()
                    .map(BindValue::I64)
                    .unwrap_or_else(|| BindValue::from_json(v)),
                Value::String(s) => s
                    .parse::<i64>()
                    .map(BindValue::I64)
                    .unwrap_or_else(|_| BindValue::String(s.clone())),
                _ => BindValue::from_json(v),
            },
            BindType::Bit => match v {
                Value::Bool(b) => BindValue::Bool(*b),
                Value::Number(n) => BindValue::Bool(n.as_i64() == Some(1)),
                Value::String(s) if s.eq_ignore_ascii_case("true") => BindValue::Bool(true),
                Value::String(s) if s.eq_ignore_ascii_case("false") => BindValue::Bool(false),
                Value::String(s) if s == "1" => BindValue::Bool(true),
                Value::String(s) if s == "0" => BindValue::Bool(false),
                _ => BindValue::from_json(v),
            },
            BindType::Decimal { .. } | BindType::Float => match v {
                Value::Number(n) => n
                    .as_f64()
                    .map(BindValue::F64)
                    .unwrap_or_else(|| BindValue::from_json(v)),
                Value::String(s) => s
                    .parse::<f64>()
                    .map(BindValue::F64)
                    .unwrap_or_else(|_| BindValue::String(s.clone())),
                _ => BindValue::from_json(v),
            },
            BindType::Guid => match v {
                Value::String(s) => uuid::Uuid::parse_str(s)
                    .map(BindValue::Uuid)
                    .unwrap_or_else(|_| BindValue::String(s.clone())),
                _ => BindValue::from_json(v),
            },
            BindType::DateTime | BindType::Date | BindType::Time => match v {
                Value::String(s) => parse_datetime(s)
                    .map(BindValue::DateTime)
                    .unwrap_or_else(|| BindValue::String(s.clone())),
                _ => BindValue::from_json(v),
            },
            BindType::NVarChar { .. } | BindType::Binary { .. } => match v {
                Value::String(s) => BindValue::String(s.clone()),
                other => BindValue::String(
                    other
                        .as_i64()
                        .map(|i| i.to_string())
                        .unwrap_or_else(|| other.to_string()),
                ),
            },
        }
    }
}

fn parse_datetime(s: &str) -> Option<chrono::NaiveDateTime> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ];
    for f in FORMATS {
        if let Ok(d) = chrono::NaiveDateTime::parse_from_str(s, f) {
            return Some(d);
        }
    }
    if let Ok(d) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(d.naive_utc());
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Map a catalog type descriptor to a bind type and a schema type.
pub fn map_type(
    name: &str,
    max_length: i32,
    precision: Option<u8>,
    scale: Option<u8>,
) -> (BindType, SchemaType) {
    let lower = name.to_ascii_lowercase();
    // bigint first: the generic check below matches any "int"-containing name.
    if lower == "bigint" {
        return (BindType::BigInt, SchemaType::Integer);
    }
    if lower == "tinyint" {
        return (BindType::TinyInt, SchemaType::Integer);
    }
    if lower == "smallint" {
        return (BindType::SmallInt, SchemaType::Integer);
    }
    if lower.contains("int") {
        return (BindType::Int, SchemaType::Integer);
    }
    if lower == "bit" {
        return (BindType::Bit, SchemaType::Boolean);
    }
    if lower == "decimal" || lower == "numeric" || lower.contains("money") {
        return (
            BindType::Decimal {
                precision: precision.unwrap_or(18),
                scale: scale.unwrap_or(4),
            },
            SchemaType::Number,
        );
    }
    if lower == "float" || lower == "real" {
        return (BindType::Float, SchemaType::Number);
    }
    if lower == "uniqueidentifier" {
        return (BindType::Guid, SchemaType::Uuid);
    }
    if lower == "date" {
        return (BindType::Date, SchemaType::DateTime);
    }
    if lower == "time" {
        return (BindType::Time, SchemaType::DateTime);
    }
    if lower.contains("date") {
        return (BindType::DateTime, SchemaType::DateTime);
    }
    let length = char_length(max_length);
    match lower.as_str() {
        "char" => (BindType::NVarChar { length, base: "char" }, SchemaType::String),
        "nchar" => (BindType::NVarChar { length, base: "nchar" }, SchemaType::String),
        "varchar" => (BindType::NVarChar { length, base: "varchar" }, SchemaType::String),
        "nvarchar" => (BindType::NVarChar { length, base: "nvarchar" }, SchemaType::String),
        "text" | "ntext" | "xml" => (
            BindType::NVarChar { length: None, base: "nvarchar" },
            SchemaType::String,
        ),
        "binary" => (BindType::Binary { length, base: "binary" }, SchemaType::String),
        "varbinary" | "image" => (
            BindType::Binary { length, base: "varbinary" },
            SchemaType::String,
        ),
        // Unrecognized types bind as unbounded text.
        _ => (
            BindType::NVarChar { length: None, base: "nvarchar" },
            SchemaType::String,
        ),
    }
}

fn char_length(max_length: i32) -> Option<u16> {
    if max_length <= 0 {
        None
    } else {
        u16::try_from(max_length).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bigint_matched_before_generic_int() {
        assert_eq!(
            map_type("bigint", 0, None, None),
            (BindType::BigInt, SchemaType::Integer)
        );
        assert_eq!(
            map_type("int", 0, None, None),
            (BindType::Int, SchemaType::Integer)
        );
    }

    #[test]
    fn mapping_is_total_over_the_spec_samples() {
        let samples: &[(&str, i32, Option<u8>, Option<u8>)] = &[
            ("int", 0, None, None),
            ("bigint", 0, None, None),
            ("bit", 0, None, None),
            ("decimal", 0, Some(10), Some(2)),
            ("varchar", 50, None, None),
            ("datetime", 0, None, None),
            ("uniqueidentifier", 0, None, None),
            ("unknown_type", 0, None, None),
        ];
        for (name, len, p, s) in samples {
            let first = map_type(name, *len, *p, *s);
            let second = map_type(name, *len, *p, *s);
            assert_eq!(first, second, "mapping must be deterministic for {name}");
        }
    }

    #[test]
    fn decimal_defaults_to_precision_18_scale_4() {
        let (bind, schema) = map_type("decimal", 0, None, None);
        assert_eq!(bind, BindType::Decimal { precision: 18, scale: 4 });
        assert_eq!(schema, SchemaType::Number);
        assert_eq!(bind.decl_sql(), "decimal(18, 4)");
    }

    #[test]
    fn character_types_are_sized_to_declared_length() {
        let (bind, _) = map_type("varchar", 50, None, None);
        assert_eq!(bind.decl_sql(), "varchar(50)");
        let (bind, _) = map_type("nvarchar", -1, None, None);
        assert_eq!(bind.decl_sql(), "nvarchar(max)");
    }

    #[test]
    fn unknown_type_falls_back_to_unbounded_text() {
        let (bind, schema) = map_type("geography", 0, None, None);
        assert_eq!(bind.decl_sql(), "nvarchar(max)");
        assert_eq!(schema, SchemaType::String);
    }

    #[test]
    fn coercion_parses_typed_strings() {
        let (int_bind, _) = map_type("int", 0, None, None);
        assert_eq!(int_bind.coerce(&serde_json::json!("42")), BindValue::I32(42));
        let (guid_bind, _) = map_type("uniqueidentifier", 0, None, None);
        let u = "6f9619ff-8b86-d011-b42d-00c04fc964ff";
        assert_eq!(
            guid_bind.coerce(&serde_json::json!(u)),
            BindValue::Uuid(uuid::Uuid::parse_str(u).unwrap())
        );
        let (bit_bind, _) = map_type("bit", 0, None, None);
        assert_eq!(bit_bind.coerce(&serde_json::json!(true)), BindValue::Bool(true));
    }

    #[test]
    fn null_always_binds_null() {
        let (bind, _) = map_type("datetime", 0, None, None);
        assert_eq!(bind.coerce(&Value::Null), BindValue::Null);
    }
}
