//! `SQLite` implementation of the database client contract.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, TypeInfo};
use vigil_storage::{StorageError, StorageErrorKind, Value};

use crate::provider::{DbProvider, DbQuery, DbRow};

/// Backend identifier for error messages.
const BACKEND: &str = "Db";

/// [`DbProvider`] over an embedded `SQLite` database.
///
/// sqlx is async; the provider owns a current-thread tokio runtime and
/// bridges each call with `block_on`, keeping the poll loop synchronous.
/// One provider backs exactly one folder, so the pool is capped at a
/// single connection (which also keeps `sqlite::memory:` databases alive
/// between polls).
pub struct SqliteProvider {
    pool: SqlitePool,
    runtime: tokio::runtime::Runtime,
    url: String,
}

impl SqliteProvider {
    /// Connect to the database at `url` (e.g. `sqlite://verify.db` or
    /// `sqlite::memory:`).
    pub fn connect(url: &str) -> Result<Self, StorageError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                StorageError::new(StorageErrorKind::Other)
                    .with_backend(BACKEND)
                    .with_source(e)
            })?;

        let pool = runtime
            .block_on(SqlitePoolOptions::new().max_connections(1).connect(url))
            .map_err(|e| db_error(e, format!("database '{url}'")))?;

        tracing::debug!(url, "connected");

        Ok(Self {
            pool,
            runtime,
            url: url.to_owned(),
        })
    }

    /// Run one or more statements that return no rows.
    ///
    /// Schema setup and test seeding helper; the verification core itself
    /// only ever reads.
    pub fn execute(&self, sql: &str) -> Result<(), StorageError> {
        self.runtime.block_on(async {
            sqlx::raw_sql(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| db_error(e, self.description()))?;
            Ok(())
        })
    }
}

impl DbProvider for SqliteProvider {
    fn select(&self, query: &DbQuery) -> Result<Vec<DbRow>, StorageError> {
        self.runtime.block_on(async {
            let mut prepared = sqlx::query(query.sql());
            for bind in query.binds() {
                prepared = match bind {
                    Value::Str(s) => prepared.bind(s.clone()),
                    Value::Int(i) => prepared.bind(*i),
                    Value::Float(x) => prepared.bind(*x),
                    Value::Bool(b) => prepared.bind(*b),
                    Value::Time(t) => prepared.bind(*t),
                    Value::Bytes(b) => prepared.bind(b.clone()),
                    Value::Null => prepared.bind(Option::<String>::None),
                };
            }

            let rows = prepared
                .fetch_all(&self.pool)
                .await
                .map_err(|e| db_error(e, self.description()))?;

            rows.iter().map(|row| row_to_record(row, &self.url)).collect()
        })
    }

    fn description(&self) -> String {
        format!("database '{}'", self.url)
    }
}

fn row_to_record(row: &SqliteRow, url: &str) -> Result<DbRow, StorageError> {
    let mut record = Vec::with_capacity(row.columns().len());
    for (index, column) in row.columns().iter().enumerate() {
        let value = decode_value(row, index, column.type_info().name())
            .map_err(|e| db_error(e, format!("database '{url}'")))?;
        record.push((column.name().to_owned(), value));
    }
    Ok(record)
}

/// Map one column to a [`Value`] by its declared `SQLite` type.
fn decode_value(row: &SqliteRow, index: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    let value = match type_name {
        "INTEGER" | "INT4" | "INT8" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)?
            .map_or(Value::Null, Value::Int),
        "REAL" => row
            .try_get::<Option<f64>, _>(index)?
            .map_or(Value::Null, Value::Float),
        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)?
            .map_or(Value::Null, Value::Bool),
        "BLOB" => row
            .try_get::<Option<Vec<u8>>, _>(index)?
            .map_or(Value::Null, Value::Bytes),
        "DATETIME" | "TIMESTAMP" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)?
            .map_or(Value::Null, Value::Time),
        "NULL" => Value::Null,
        // TEXT and anything exotic decodes as text
        _ => row
            .try_get::<Option<String>, _>(index)?
            .map_or(Value::Null, Value::Str),
    };
    Ok(value)
}

fn db_error(e: sqlx::Error, target: String) -> StorageError {
    let kind = match &e {
        sqlx::Error::Database(_) => StorageErrorKind::Rejected,
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => StorageErrorKind::Unavailable,
        _ => StorageErrorKind::Other,
    };
    StorageError::new(kind)
        .with_target(target)
        .with_backend(BACKEND)
        .with_source(e)
}
