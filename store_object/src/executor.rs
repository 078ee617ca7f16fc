//! Database capability
//!
//! Mappers and bulk blocks hand SQL text plus a positional argument list to
//! a [`DatabaseExecutor`]. [`PgExecutor`] is the sqlx implementation.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use config::DatabaseConfig;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow, PgValueRef};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{Column, Decode, PgPool, Postgres, Row, TypeInfo, ValueRef};
use std::fmt::Debug;
use std::time::Duration;
use type_mapping::{RowMap, SqlValue};

/// Executes statements against the database
#[async_trait]
pub trait DatabaseExecutor: Send + Sync + Debug {
    /// Run `sql` and return its first row, if any
    async fn fetch_one(&self, sql: &str, args: &[SqlValue]) -> Result<Option<RowMap>, sqlx::Error>;

    /// Run `sql` and return every row
    async fn fetch_all(&self, sql: &str, args: &[SqlValue]) -> Result<Vec<RowMap>, sqlx::Error>;

    /// Run `sql` for its effect and return the affected row count
    async fn modify(&self, sql: &str, args: &[SqlValue]) -> Result<u64, sqlx::Error>;
}

/// Pooled PostgreSQL executor
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a pool from `config`, retrying the initial connection
    /// `reconnect_attempts` times. Broken connections are replaced by the
    /// pool afterwards.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let connection_string = config.connection_string();

        let mut pool_options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .test_before_acquire(true);

        if config.max_lifetime_seconds > 0 {
            pool_options =
                pool_options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
        }

        let mut retries_left = config.reconnect_attempts;
        loop {
            match pool_options.clone().connect(&connection_string).await {
                Ok(pool) => {
                    tracing::info!(
                        "[CONNECT] Connected to {}:{}/{}",
                        config.host,
                        config.port,
                        config.database
                    );
                    return Ok(Self { pool });
                }
                Err(e) if retries_left > 0 && is_connect_error(&e) => {
                    tracing::warn!(
                        "[CONNECT] Could not connect to database: {}. {} retries left",
                        e,
                        retries_left
                    );
                    retries_left -= 1;
                    tokio::time::sleep(Duration::from_millis(config.reconnect_delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_connect_error(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::Tls(_)
    )
}

#[async_trait]
impl DatabaseExecutor for PgExecutor {
    async fn fetch_one(&self, sql: &str, args: &[SqlValue]) -> Result<Option<RowMap>, sqlx::Error> {
        let row = bind_all(sqlx::query(sql), args)?
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_map).transpose()
    }

    async fn fetch_all(&self, sql: &str, args: &[SqlValue]) -> Result<Vec<RowMap>, sqlx::Error> {
        let rows = bind_all(sqlx::query(sql), args)?
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_map).collect()
    }

    async fn modify(&self, sql: &str, args: &[SqlValue]) -> Result<u64, sqlx::Error> {
        let result = bind_all(sqlx::query(sql), args)?
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

fn bind_all<'q>(mut query: PgQuery<'q>, args: &'q [SqlValue]) -> Result<PgQuery<'q>, sqlx::Error> {
    for arg in args {
        query = bind_value(query, arg)?;
    }
    Ok(query)
}

fn bind_value<'q>(query: PgQuery<'q>, value: &'q SqlValue) -> Result<PgQuery<'q>, sqlx::Error> {
    Ok(match value {
        SqlValue::Integer(i) => query.bind(*i),
        SqlValue::Numeric(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.as_str()),
        SqlValue::Binary(bytes) => query.bind(bytes.as_slice()),
        SqlValue::Boolean(b) => query.bind(*b),
        SqlValue::Timestamp(ts) => query.bind(*ts),
        SqlValue::Date(date) => query.bind(*date),
        SqlValue::Interval(delta) => query.bind(*delta),
        SqlValue::Json(doc) => query.bind(Json(doc)),
        SqlValue::Array(items) => bind_array(query, items)?,
        // Typed as text: Postgres accepts it for text-like and untyped
        // targets only
        SqlValue::Null => query.bind(Option::<String>::None),
    })
}

/// Bind a list as a Postgres array, typed after its first non-null element
fn bind_array<'q>(query: PgQuery<'q>, items: &'q [SqlValue]) -> Result<PgQuery<'q>, sqlx::Error> {
    let first = items.iter().find(|item| !item.is_null());

    macro_rules! collect {
        ($variant:ident, $map:expr) => {
            items
                .iter()
                .map(|item| match item {
                    SqlValue::$variant(v) => Ok(Some($map(v))),
                    SqlValue::Null => Ok(None),
                    other => Err(sqlx::Error::Encode(
                        format!("mixed array element: {}", other.kind()).into(),
                    )),
                })
                .collect::<Result<Vec<_>, sqlx::Error>>()?
        };
    }

    Ok(match first {
        None => query.bind(Vec::<String>::new()),
        Some(SqlValue::Integer(_)) => query.bind(collect!(Integer, |v: &i64| *v)),
        Some(SqlValue::Numeric(_)) => query.bind(collect!(Numeric, |v: &f64| *v)),
        Some(SqlValue::Text(_)) => query.bind(collect!(Text, |v: &String| v.clone())),
        Some(SqlValue::Boolean(_)) => query.bind(collect!(Boolean, |v: &bool| *v)),
        Some(SqlValue::Timestamp(_)) => {
            query.bind(collect!(Timestamp, |v: &DateTime<Utc>| *v))
        }
        Some(SqlValue::Date(_)) => query.bind(collect!(Date, |v: &NaiveDate| *v)),
        Some(other) => {
            return Err(sqlx::Error::Encode(
                format!("unsupported array element: {}", other.kind()).into(),
            ))
        }
    })
}

/// Convert a driver row into a column → value mapping
fn row_to_map(row: &PgRow) -> Result<RowMap, sqlx::Error> {
    let mut map = RowMap::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            decode_value(raw, index)?
        };
        map.insert(column.name().to_string(), value);
    }
    Ok(map)
}

fn decode_value(raw: PgValueRef<'_>, index: usize) -> Result<SqlValue, sqlx::Error> {
    fn decode<'r, T: Decode<'r, Postgres>>(
        raw: PgValueRef<'r>,
        index: usize,
    ) -> Result<T, sqlx::Error> {
        T::decode(raw).map_err(|source| sqlx::Error::ColumnDecode {
            index: index.to_string(),
            source,
        })
    }

    let type_name = raw.type_info().name().to_string();
    let value = match type_name.as_str() {
        "INT2" => SqlValue::Integer(decode::<i16>(raw, index)?.into()),
        "INT4" => SqlValue::Integer(decode::<i32>(raw, index)?.into()),
        "INT8" => SqlValue::Integer(decode::<i64>(raw, index)?),
        "FLOAT4" => SqlValue::Numeric(decode::<f32>(raw, index)?.into()),
        "FLOAT8" => SqlValue::Numeric(decode::<f64>(raw, index)?),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" => {
            SqlValue::Text(decode::<String>(raw, index)?)
        }
        "UUID" => SqlValue::Text(decode::<uuid::Uuid>(raw, index)?.to_string()),
        "BYTEA" => SqlValue::Binary(decode::<Vec<u8>>(raw, index)?),
        "BOOL" => SqlValue::Boolean(decode::<bool>(raw, index)?),
        "TIMESTAMPTZ" => SqlValue::Timestamp(decode::<DateTime<Utc>>(raw, index)?),
        "TIMESTAMP" => SqlValue::Timestamp(decode::<NaiveDateTime>(raw, index)?.and_utc()),
        "DATE" => SqlValue::Date(decode::<NaiveDate>(raw, index)?),
        "INTERVAL" => {
            let interval = decode::<sqlx::postgres::types::PgInterval>(raw, index)?;
            // Months have no fixed length; count them as 30 days
            let days = i64::from(interval.months) * 30 + i64::from(interval.days);
            SqlValue::Interval(TimeDelta::days(days) + TimeDelta::microseconds(interval.microseconds))
        }
        "JSON" | "JSONB" => SqlValue::Json(decode::<serde_json::Value>(raw, index)?),
        "INT4[]" => SqlValue::Array(
            decode::<Vec<Option<i32>>>(raw, index)?
                .into_iter()
                .map(SqlValue::from)
                .collect(),
        ),
        "INT8[]" => SqlValue::Array(
            decode::<Vec<Option<i64>>>(raw, index)?
                .into_iter()
                .map(SqlValue::from)
                .collect(),
        ),
        "FLOAT8[]" => SqlValue::Array(
            decode::<Vec<Option<f64>>>(raw, index)?
                .into_iter()
                .map(SqlValue::from)
                .collect(),
        ),
        "TEXT[]" | "VARCHAR[]" => SqlValue::Array(
            decode::<Vec<Option<String>>>(raw, index)?
                .into_iter()
                .map(SqlValue::from)
                .collect(),
        ),
        "BOOL[]" => SqlValue::Array(
            decode::<Vec<Option<bool>>>(raw, index)?
                .into_iter()
                .map(SqlValue::from)
                .collect(),
        ),
        other => {
            return Err(sqlx::Error::ColumnDecode {
                index: index.to_string(),
                source: format!("unsupported column type {}", other).into(),
            })
        }
    };
    Ok(value)
}
