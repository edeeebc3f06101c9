//! Builds parameterized T-SQL per operation, trigger- and identity-aware.
//!
//! Identifiers placed in SQL text come from catalog metadata only; request
//! column names are checked against the object's known column set first.
//! Values are always bound as parameters.

use crate::error::AppError;
use crate::metadata::{FunctionKind, RoutineMetadata, TableMetadata};
use crate::sql::params::BindValue;
use crate::typemap::map_type;
use serde_json::Value;
use std::collections::HashMap;

/// Quote an identifier for SQL Server.
fn quoted(s: &str) -> String {
    format!("[{}]", s.replace(']', "]]"))
}

fn qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(name))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl QueryBuf {
    pub fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Bind a value and return its placeholder, `@P1`-numbered in bind order.
    pub fn push_param(&mut self, v: BindValue) -> String {
        self.params.push(v);
        format!("@P{}", self.params.len())
    }
}

impl Default for QueryBuf {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// List query options as parsed from the request. `limit`/`offset` are None
/// when the caller did not ask for pagination at all.
#[derive(Default)]
pub struct ListOptions {
    pub filters: Vec<(String, Value)>,
    pub order: Option<(String, SortDirection)>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn select_column_list(table: &TableMetadata) -> String {
    table
        .columns
        .iter()
        .map(|c| quoted(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// OUTPUT column list, e.g. `INSERTED.[id], INSERTED.[name]`.
fn output_column_list(prefix: &str, table: &TableMetadata) -> String {
    table
        .columns
        .iter()
        .map(|c| format!("{}.{}", prefix, quoted(&c.name)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Staging table declaration used when an enabled trigger blocks direct
/// OUTPUT capture: every column rendered with its declared type, nullable.
fn staging_declaration(table: &TableMetadata) -> String {
    let decls = table
        .columns
        .iter()
        .map(|c| {
            let (bind, _) = map_type(&c.data_type, c.max_length, c.precision, c.scale);
            format!("{} {} NULL", quoted(&c.name), bind.decl_sql())
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("DECLARE @captured TABLE ({});", decls)
}

/// Push a value bound with the column's mapped type.
fn push_typed(q: &mut QueryBuf, table: &TableMetadata, column: &str, v: &Value) -> String {
    let bind = table
        .column(column)
        .map(|c| {
            let (b, _) = map_type(&c.data_type, c.max_length, c.precision, c.scale);
            b.coerce(v)
        })
        .unwrap_or_else(|| BindValue::from_json(v));
    q.push_param(bind)
}

/// SELECT list with recognized-column equality filters, ORDER BY, and
/// OFFSET/FETCH pagination. Unknown filter and order columns are dropped,
/// never placed in SQL text.
pub fn select_list(table: &TableMetadata, opts: &ListOptions) -> QueryBuf {
    let mut q = QueryBuf::new();
    let target = qualified(&table.schema, &table.name);

    let mut where_parts = Vec::new();
    for (col, val) in &opts.filters {
        if !table.has_column(col) {
            continue;
        }
        let ph = push_typed(&mut q, table, col, val);
        where_parts.push(format!("{} = {}", quoted(col), ph));
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };

    let order = match &opts.order {
        Some((col, dir)) if table.has_column(col) => Some((col.as_str(), *dir)),
        _ => table
            .default_order_column()
            .map(|c| (c, SortDirection::Asc)),
    };
    let order_clause = order
        .map(|(col, dir)| format!(" ORDER BY {} {}", quoted(col), dir.as_sql()))
        .unwrap_or_default();

    // OFFSET requires an ORDER BY in T-SQL; a column always exists for
    // discovered objects.
    let mut paging = String::new();
    if (opts.limit.is_some() || opts.offset.is_some()) && !order_clause.is_empty() {
        let offset = opts.offset.unwrap_or(0).max(0);
        let ph = q.push_param(BindValue::I64(offset));
        paging.push_str(&format!(" OFFSET {} ROWS", ph));
        // A negative limit means no cap: skip the FETCH clause entirely.
        if let Some(limit) = opts.limit {
            if limit >= 0 {
                let ph = q.push_param(BindValue::I64(limit));
                paging.push_str(&format!(" FETCH NEXT {} ROWS ONLY", ph));
            }
        }
    }

    q.sql = format!(
        "SELECT {} FROM {}{}{}{}",
        select_column_list(table),
        target,
        where_clause,
        order_clause,
        paging
    );
    q
}

/// Equality lookup on the single-column primary key. The registrar only
/// exposes single-row routes when `single_key` exists.
pub fn select_by_key(table: &TableMetadata, key: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let target = qualified(&table.schema, &table.name);
    let pk = &table.primary_key[0];
    let ph = push_typed(&mut q, table, pk, key);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(table),
        target,
        quoted(pk),
        ph
    );
    q
}

/// INSERT with only the recognized body columns, identity column excluded.
///
/// Without an enabled trigger the inserted row is captured inline with
/// `OUTPUT INSERTED`. With one, direct capture is blocked server-side, so a
/// reselect strategy is picked in priority order: identity value, supplied
/// primary key, staging-table capture. Every strategy is a single batch so
/// the reselect observes the just-inserted row.
pub fn insert(table: &TableMetadata, body: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let target = qualified(&table.schema, &table.name);
    let cols = select_column_list(table);

    let mut names = Vec::new();
    let mut placeholders = Vec::new();
    for c in &table.columns {
        if Some(c.name.as_str()) == table.identity_column.as_deref() {
            continue;
        }
        let Some(v) = body.get(&c.name) else { continue };
        let ph = push_typed(&mut q, table, &c.name, v);
        names.push(quoted(&c.name));
        placeholders.push(ph);
    }

    let columns_part = if names.is_empty() {
        String::new()
    } else {
        format!(" ({})", names.join(", "))
    };
    let values_part = if placeholders.is_empty() {
        " DEFAULT VALUES".to_string()
    } else {
        format!(" VALUES ({})", placeholders.join(", "))
    };

    if !table.has_triggers {
        q.sql = format!(
            "INSERT INTO {}{} OUTPUT {}{}",
            target,
            columns_part,
            output_column_list("INSERTED", table),
            values_part
        );
        return q;
    }

    if let Some(identity) = &table.identity_column {
        q.sql = format!(
            "INSERT INTO {}{}{}; SELECT {} FROM {} WHERE {} = SCOPE_IDENTITY();",
            target,
            columns_part,
            values_part,
            cols,
            target,
            quoted(identity)
        );
        return q;
    }

    if let Some(pk) = table.single_key() {
        if let Some(key) = body.get(pk) {
            let insert_sql = format!("INSERT INTO {}{}{};", target, columns_part, values_part);
            let ph = push_typed(&mut q, table, pk, key);
            q.sql = format!(
                "{} SELECT {} FROM {} WHERE {} = {};",
                insert_sql,
                cols,
                target,
                quoted(pk),
                ph
            );
            return q;
        }
    }

    q.sql = format!(
        "{} INSERT INTO {}{} OUTPUT {} INTO @captured{}; SELECT {} FROM @captured;",
        staging_declaration(table),
        target,
        columns_part,
        output_column_list("INSERTED", table),
        values_part,
        cols
    );
    q
}

/// UPDATE by key, SET only recognized non-key columns present in the body.
/// An empty effective SET list is a client error, reported before any
/// database call.
pub fn update(
    table: &TableMetadata,
    key: &Value,
    body: &HashMap<String, Value>,
) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let target = qualified(&table.schema, &table.name);
    let pk = &table.primary_key[0];
    let cols = select_column_list(table);

    let mut sets = Vec::new();
    for c in &table.columns {
        if c.name == *pk || Some(c.name.as_str()) == table.identity_column.as_deref() {
            continue;
        }
        let Some(v) = body.get(&c.name) else { continue };
        let ph = push_typed(&mut q, table, &c.name, v);
        sets.push(format!("{} = {}", quoted(&c.name), ph));
    }
    if sets.is_empty() {
        return Err(AppError::Validation(
            "no updatable fields in body".to_string(),
        ));
    }
    let set_clause = sets.join(", ");

    if !table.has_triggers {
        let key_ph = push_typed(&mut q, table, pk, key);
        q.sql = format!(
            "UPDATE {} SET {} OUTPUT {} WHERE {} = {}",
            target,
            set_clause,
            output_column_list("INSERTED", table),
            quoted(pk),
            key_ph
        );
        return Ok(q);
    }

    let key_ph = push_typed(&mut q, table, pk, key);
    q.sql = format!(
        "{} UPDATE {} SET {} OUTPUT {} INTO @captured WHERE {} = {}; SELECT {} FROM @captured;",
        staging_declaration(table),
        target,
        set_clause,
        output_column_list("INSERTED", table),
        quoted(pk),
        key_ph,
        cols
    );
    Ok(q)
}

/// DELETE by key, deleted row captured inline or via the staging table.
pub fn delete(table: &TableMetadata, key: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let target = qualified(&table.schema, &table.name);
    let pk = &table.primary_key[0];
    let key_ph = push_typed(&mut q, table, pk, key);

    if !table.has_triggers {
        q.sql = format!(
            "DELETE FROM {} OUTPUT {} WHERE {} = {}",
            target,
            output_column_list("DELETED", table),
            quoted(pk),
            key_ph
        );
        return q;
    }

    q.sql = format!(
        "{} DELETE FROM {} OUTPUT {} INTO @captured WHERE {} = {}; SELECT {} FROM @captured;",
        staging_declaration(table),
        target,
        output_column_list("DELETED", table),
        quoted(pk),
        key_ph,
        select_column_list(table)
    );
    q
}

/// EXEC with named arguments for the non-output parameters present in the
/// body; absent parameters fall back to their procedure defaults.
pub fn exec_procedure(routine: &RoutineMetadata, body: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let target = qualified(&routine.schema, &routine.name);
    let mut args = Vec::new();
    for p in routine.input_params() {
        let Some(v) = body.get(&p.name) else { continue };
        let (bind, _) = map_type(&p.data_type, p.max_length, p.precision, p.scale);
        let ph = q.push_param(bind.coerce(v));
        args.push(format!("@{} = {}", p.name, ph));
    }
    q.sql = if args.is_empty() {
        format!("EXEC {}", target)
    } else {
        format!("EXEC {} {}", target, args.join(", "))
    };
    q
}

/// Function invocation: arguments are positional and all required, missing
/// body values bind NULL. Scalar functions wrap the result as `[value]`;
/// table-valued functions select the row set.
pub fn select_function(routine: &RoutineMetadata, body: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let target = qualified(&routine.schema, &routine.name);
    let args: Vec<String> = routine
        .input_params()
        .map(|p| {
            let (bind, _) = map_type(&p.data_type, p.max_length, p.precision, p.scale);
            let v = body.get(&p.name).cloned().unwrap_or(Value::Null);
            q.push_param(bind.coerce(&v))
        })
        .collect();
    let args = args.join(", ");
    q.sql = match routine.function_kind {
        Some(FunctionKind::Table) => format!("SELECT * FROM {}({})", target, args),
        _ => format!("SELECT {}({}) AS [value]", target, args),
    };
    q
}
