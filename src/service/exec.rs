//! Statement execution against a pooled SQL Server connection, rows as JSON.

use crate::error::AppError;
use crate::service::MssqlPool;
use crate::sql::QueryBuf;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::Value;

pub struct Executor;

impl Executor {
    /// Run a synthesized statement batch and return the rows of its final
    /// result set. Reselect strategies emit the captured row as the last
    /// statement of the batch; the preceding statements produce none.
    pub async fn query_rows(pool: &MssqlPool, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = q.params.len(), "execute");
        let mut conn = pool.get().await?;
        let mut query = tiberius::Query::new(q.sql.clone());
        for p in &q.params {
            p.bind_to(&mut query);
        }
        let stream = query.query(&mut *conn).await?;
        let mut results = stream.into_results().await?;
        let rows = results.pop().unwrap_or_default();
        Ok(rows.iter().map(row_to_json).collect())
    }

    /// Run a batch expected to affect one row. None means the key matched
    /// nothing.
    pub async fn query_optional(pool: &MssqlPool, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        let mut rows = Self::query_rows(pool, q).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    /// Run already-substituted text with no parameters (advanced templates).
    pub async fn simple(pool: &MssqlPool, sql: &str) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %sql, "execute ad-hoc");
        let mut conn = pool.get().await?;
        let stream = conn.simple_query(sql).await?;
        let results = stream.into_results().await?;
        // SET ROWCOUNT statements produce no result sets; take the last that
        // carries rows.
        let rows = results
            .into_iter()
            .rev()
            .find(|r| !r.is_empty())
            .unwrap_or_default();
        Ok(rows.iter().map(row_to_json).collect())
    }
}

fn row_to_json(row: &tiberius::Row) -> Value {
    let mut map = serde_json::Map::new();
    for (i, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), cell_to_value(row, i));
    }
    Value::Object(map)
}

fn cell_to_value(row: &tiberius::Row, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<u8, _>(idx) {
        if let Some(n) = v {
            return Value::Number(n.into());
        }
    }
    if let Ok(v) = row.try_get::<i16, _>(idx) {
        if let Some(n) = v {
            return Value::Number(n.into());
        }
    }
    if let Ok(v) = row.try_get::<i32, _>(idx) {
        if let Some(n) = v {
            return Value::Number(n.into());
        }
    }
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        if let Some(n) = v {
            return Value::Number(n.into());
        }
    }
    if let Ok(v) = row.try_get::<f32, _>(idx) {
        if let Some(n) = v {
            if let Some(n) = serde_json::Number::from_f64(n as f64) {
                return Value::Number(n);
            }
        }
    }
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        if let Some(n) = v {
            if let Some(n) = serde_json::Number::from_f64(n) {
                return Value::Number(n);
            }
        }
    }
    if let Ok(v) = row.try_get::<bool, _>(idx) {
        if let Some(b) = v {
            return Value::Bool(b);
        }
    }
    if let Ok(v) = row.try_get::<uuid::Uuid, _>(idx) {
        if let Some(u) = v {
            return Value::String(u.to_string());
        }
    }
    if let Ok(v) = row.try_get::<tiberius::numeric::Numeric, _>(idx) {
        if let Some(n) = v {
            let text = n.to_string();
            if let Some(num) = text.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                return Value::Number(num);
            }
            return Value::String(text);
        }
    }
    if let Ok(v) = row.try_get::<chrono::DateTime<chrono::Utc>, _>(idx) {
        if let Some(d) = v {
            return Value::String(d.to_rfc3339());
        }
    }
    if let Ok(v) = row.try_get::<chrono::NaiveDateTime, _>(idx) {
        if let Some(d) = v {
            return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
        }
    }
    if let Ok(v) = row.try_get::<chrono::NaiveDate, _>(idx) {
        if let Some(d) = v {
            return Value::String(d.format("%Y-%m-%d").to_string());
        }
    }
    if let Ok(v) = row.try_get::<chrono::NaiveTime, _>(idx) {
        if let Some(t) = v {
            return Value::String(t.format("%H:%M:%S%.f").to_string());
        }
    }
    if let Ok(v) = row.try_get::<&str, _>(idx) {
        if let Some(s) = v {
            return Value::String(s.to_string());
        }
    }
    if let Ok(v) = row.try_get::<&[u8], _>(idx) {
        if let Some(b) = v {
            return Value::String(BASE64.encode(b));
        }
    }
    Value::Null
}
