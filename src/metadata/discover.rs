//! One-shot catalog discovery: enumerate objects matching the endpoint's
//! include patterns and describe each one.
//!
//! Runs once per endpoint at connection time on a single checked-out
//! connection. Any failure here aborts registration for this endpoint only.

use crate::config::EndpointConfig;
use crate::error::DiscoveryError;
use crate::metadata::types::{
    Column, FunctionKind, ObjectKind, Parameter, RoutineMetadata, TableMetadata,
};
use crate::pattern;
use crate::service::MssqlPool;
use crate::sql::QueryBuf;
use tracing::{debug, info};

mod queries {
    pub const LIST_RELATIONS: &str = "SELECT TABLE_SCHEMA, TABLE_NAME \
         FROM INFORMATION_SCHEMA.TABLES \
         WHERE TABLE_TYPE = @TYPE AND ";

    pub const LIST_ROUTINES: &str = "SELECT ROUTINE_SCHEMA, ROUTINE_NAME, ISNULL(DATA_TYPE, '') \
         FROM INFORMATION_SCHEMA.ROUTINES \
         WHERE ROUTINE_TYPE = @TYPE AND ";

    pub const TABLE_COLUMNS: &str = "SELECT COLUMN_NAME, DATA_TYPE, IS_NULLABLE, \
                ISNULL(CHARACTER_MAXIMUM_LENGTH, 0), \
                CAST(ISNULL(NUMERIC_PRECISION, 0) AS int), \
                CAST(ISNULL(NUMERIC_SCALE, -1) AS int) \
         FROM INFORMATION_SCHEMA.COLUMNS \
         WHERE TABLE_SCHEMA = @P1 AND TABLE_NAME = @P2 \
         ORDER BY ORDINAL_POSITION";

    pub const PRIMARY_KEY: &str = "SELECT k.COLUMN_NAME \
         FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS c \
         JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE k \
           ON k.CONSTRAINT_NAME = c.CONSTRAINT_NAME \
          AND k.CONSTRAINT_SCHEMA = c.CONSTRAINT_SCHEMA \
         WHERE c.CONSTRAINT_TYPE = 'PRIMARY KEY' \
           AND c.TABLE_SCHEMA = @P1 AND c.TABLE_NAME = @P2 \
         ORDER BY k.ORDINAL_POSITION";

    pub const ENABLED_TRIGGERS: &str = "SELECT COUNT(*) FROM sys.triggers \
         WHERE parent_id = OBJECT_ID(@P1) AND is_disabled = 0";

    pub const IDENTITY_COLUMN: &str = "SELECT name FROM sys.identity_columns \
         WHERE object_id = OBJECT_ID(@P1)";

    pub const ROUTINE_PARAMS: &str = "SELECT ISNULL(PARAMETER_NAME, ''), ISNULL(DATA_TYPE, ''), \
                ISNULL(CHARACTER_MAXIMUM_LENGTH, 0), \
                CAST(ISNULL(NUMERIC_PRECISION, 0) AS int), \
                CAST(ISNULL(NUMERIC_SCALE, -1) AS int), \
                ISNULL(PARAMETER_MODE, 'IN'), ISNULL(IS_RESULT, 'NO') \
         FROM INFORMATION_SCHEMA.PARAMETERS \
         WHERE SPECIFIC_SCHEMA = @P1 AND SPECIFIC_NAME = @P2 \
         ORDER BY ORDINAL_POSITION";
}

/// Everything discovered for one endpoint.
#[derive(Default)]
pub struct EndpointCatalog {
    pub tables: Vec<TableMetadata>,
    pub views: Vec<TableMetadata>,
    pub procedures: Vec<RoutineMetadata>,
    pub functions: Vec<RoutineMetadata>,
}

type Conn<'a> = bb8::PooledConnection<'a, bb8_tiberius::ConnectionManager>;

pub async fn discover_endpoint(
    pool: &MssqlPool,
    cfg: &EndpointConfig,
) -> Result<EndpointCatalog, DiscoveryError> {
    let mut conn = pool.get().await?;
    let catalog = EndpointCatalog {
        tables: discover_relations(&mut conn, cfg, ObjectKind::Table).await?,
        views: discover_relations(&mut conn, cfg, ObjectKind::View).await?,
        procedures: discover_routines(&mut conn, cfg, ObjectKind::Procedure).await?,
        functions: discover_routines(&mut conn, cfg, ObjectKind::Function).await?,
    };
    info!(
        endpoint = %cfg.name,
        tables = catalog.tables.len(),
        views = catalog.views.len(),
        procedures = catalog.procedures.len(),
        functions = catalog.functions.len(),
        "discovery complete"
    );
    Ok(catalog)
}

async fn fetch_rows(conn: &mut Conn<'_>, q: &QueryBuf) -> Result<Vec<tiberius::Row>, DiscoveryError> {
    debug!(sql = %q.sql, params = q.params.len(), "catalog query");
    let mut query = tiberius::Query::new(q.sql.clone());
    for p in &q.params {
        p.bind_to(&mut query);
    }
    let stream = query.query(&mut **conn).await?;
    Ok(stream.into_first_result().await?)
}

fn str_at(row: &tiberius::Row, idx: usize) -> Result<String, DiscoveryError> {
    Ok(row
        .try_get::<&str, _>(idx)?
        .unwrap_or_default()
        .to_string())
}

fn i32_at(row: &tiberius::Row, idx: usize) -> Result<i32, DiscoveryError> {
    Ok(row.try_get::<i32, _>(idx)?.unwrap_or_default())
}

async fn discover_relations(
    conn: &mut Conn<'_>,
    cfg: &EndpointConfig,
    kind: ObjectKind,
) -> Result<Vec<TableMetadata>, DiscoveryError> {
    let mut q = QueryBuf::new();
    let Some(predicate) = pattern::name_predicate("TABLE_NAME", cfg.patterns_for(kind), &mut q)
    else {
        return Ok(Vec::new());
    };
    let table_type = match kind {
        ObjectKind::View => "VIEW",
        _ => "BASE TABLE",
    };
    q.sql = format!(
        "{}{} ORDER BY TABLE_SCHEMA, TABLE_NAME",
        queries::LIST_RELATIONS.replace("@TYPE", &format!("'{}'", table_type)),
        predicate
    );

    let mut names = Vec::new();
    for row in fetch_rows(conn, &q).await? {
        names.push((str_at(&row, 0)?, str_at(&row, 1)?));
    }

    let mut out = Vec::with_capacity(names.len());
    for (schema, name) in names {
        out.push(describe_relation(conn, schema, name, kind).await?);
    }
    Ok(out)
}

async fn describe_relation(
    conn: &mut Conn<'_>,
    schema: String,
    name: String,
    kind: ObjectKind,
) -> Result<TableMetadata, DiscoveryError> {
    let columns = fetch_columns(conn, &schema, &name).await?;

    // Views get no key, trigger, or identity metadata: they are list-only.
    if kind == ObjectKind::View {
        return Ok(TableMetadata {
            schema,
            name,
            kind,
            columns,
            primary_key: Vec::new(),
            has_triggers: false,
            identity_column: None,
        });
    }

    let mut q = name_params(queries::PRIMARY_KEY, &schema, &name);
    let mut primary_key = Vec::new();
    for row in fetch_rows(conn, &q).await? {
        primary_key.push(str_at(&row, 0)?);
    }

    let object_ref = format!("[{}].[{}]", schema.replace(']', "]]"), name.replace(']', "]]"));
    q = QueryBuf::new();
    q.push_param(crate::sql::BindValue::String(object_ref.clone()));
    q.sql = queries::ENABLED_TRIGGERS.to_string();
    let has_triggers = fetch_rows(conn, &q)
        .await?
        .first()
        .map(|r| i32_at(r, 0))
        .transpose()?
        .unwrap_or(0)
        > 0;

    q = QueryBuf::new();
    q.push_param(crate::sql::BindValue::String(object_ref));
    q.sql = queries::IDENTITY_COLUMN.to_string();
    let identity_column = match fetch_rows(conn, &q).await?.first() {
        Some(row) => Some(str_at(row, 0)?),
        None => None,
    };

    Ok(TableMetadata {
        schema,
        name,
        kind,
        columns,
        primary_key,
        has_triggers,
        identity_column,
    })
}

async fn fetch_columns(
    conn: &mut Conn<'_>,
    schema: &str,
    name: &str,
) -> Result<Vec<Column>, DiscoveryError> {
    let q = name_params(queries::TABLE_COLUMNS, schema, name);
    let mut columns = Vec::new();
    for row in fetch_rows(conn, &q).await? {
        columns.push(Column {
            name: str_at(&row, 0)?,
            data_type: str_at(&row, 1)?,
            nullable: str_at(&row, 2)? == "YES",
            max_length: i32_at(&row, 3)?,
            precision: precision_from(i32_at(&row, 4)?),
            scale: scale_from(i32_at(&row, 5)?),
        });
    }
    Ok(columns)
}

async fn discover_routines(
    conn: &mut Conn<'_>,
    cfg: &EndpointConfig,
    kind: ObjectKind,
) -> Result<Vec<RoutineMetadata>, DiscoveryError> {
    let mut q = QueryBuf::new();
    let Some(predicate) = pattern::name_predicate("ROUTINE_NAME", cfg.patterns_for(kind), &mut q)
    else {
        return Ok(Vec::new());
    };
    let routine_type = match kind {
        ObjectKind::Function => "FUNCTION",
        _ => "PROCEDURE",
    };
    q.sql = format!(
        "{}{} ORDER BY ROUTINE_SCHEMA, ROUTINE_NAME",
        queries::LIST_ROUTINES.replace("@TYPE", &format!("'{}'", routine_type)),
        predicate
    );

    let mut heads = Vec::new();
    for row in fetch_rows(conn, &q).await? {
        heads.push((str_at(&row, 0)?, str_at(&row, 1)?, str_at(&row, 2)?));
    }

    let mut out = Vec::with_capacity(heads.len());
    for (schema, name, return_type) in heads {
        let params = fetch_params(conn, &schema, &name).await?;
        let (function_kind, function_return) = match kind {
            ObjectKind::Function if return_type == "TABLE" => (Some(FunctionKind::Table), None),
            ObjectKind::Function => (Some(FunctionKind::Scalar), Some(return_type)),
            _ => (None, None),
        };
        out.push(RoutineMetadata {
            schema,
            name,
            kind,
            params,
            function_kind,
            function_return,
        });
    }
    Ok(out)
}

async fn fetch_params(
    conn: &mut Conn<'_>,
    schema: &str,
    name: &str,
) -> Result<Vec<Parameter>, DiscoveryError> {
    let q = name_params(queries::ROUTINE_PARAMS, schema, name);
    let mut params = Vec::new();
    for row in fetch_rows(conn, &q).await? {
        // IS_RESULT rows describe a function's return value, not a bindable
        // parameter.
        if str_at(&row, 6)? == "YES" {
            continue;
        }
        let mode = str_at(&row, 5)?;
        params.push(Parameter {
            name: str_at(&row, 0)?.trim_start_matches('@').to_string(),
            data_type: str_at(&row, 1)?,
            max_length: i32_at(&row, 2)?,
            precision: precision_from(i32_at(&row, 3)?),
            scale: scale_from(i32_at(&row, 4)?),
            is_output: mode.contains("OUT"),
        });
    }
    Ok(params)
}

fn name_params(sql: &str, schema: &str, name: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(crate::sql::BindValue::String(schema.to_string()));
    q.push_param(crate::sql::BindValue::String(name.to_string()));
    q.sql = sql.to_string();
    q
}

fn precision_from(v: i32) -> Option<u8> {
    if v <= 0 {
        None
    } else {
        u8::try_from(v).ok()
    }
}

fn scale_from(v: i32) -> Option<u8> {
    if v < 0 {
        None
    } else {
        u8::try_from(v).ok()
    }
}
