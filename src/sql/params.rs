//! Values bound to synthesized T-SQL. Bridges serde_json values to tiberius binds.

use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    String(String),
    Uuid(uuid::Uuid),
    DateTime(chrono::NaiveDateTime),
}

impl BindValue {
    /// Untyped conversion, used where no column metadata is available.
    /// Column-typed coercion lives on `BindType` in the type mapper.
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    BindValue::I64(i)
                } else {
                    BindValue::F64(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => BindValue::String(s.clone()),
            Value::Array(_) | Value::Object(_) => BindValue::String(v.to_string()),
        }
    }

    /// Push this value onto a tiberius query in placeholder order.
    pub fn bind_to<'a>(&self, query: &mut tiberius::Query<'a>) {
        match self {
            BindValue::Null => query.bind(Option::<String>::None),
            BindValue::Bool(b) => query.bind(*b),
            BindValue::I32(n) => query.bind(*n),
            BindValue::I64(n) => query.bind(*n),
            BindValue::F64(n) => query.bind(*n),
            BindValue::String(s) => query.bind(s.clone()),
            BindValue::Uuid(u) => query.bind(*u),
            BindValue::DateTime(d) => query.bind(*d),
        }
    }
}
