//! The narrow database client contract.

use vigil_storage::{StorageError, Value};

/// Immutable read-query descriptor: SQL text plus bind values.
///
/// Owned by the verification driver and handed once to
/// [`DbStorage`](crate::DbStorage) to construct a folder.
#[derive(Clone, Debug)]
pub struct DbQuery {
    sql: String,
    binds: Vec<Value>,
}

impl DbQuery {
    /// Create a query with no bind values.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            binds: Vec::new(),
        }
    }

    /// Append one bind value.
    #[must_use]
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.binds.push(value.into());
        self
    }

    /// The SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The bind values in positional order.
    #[must_use]
    pub fn binds(&self) -> &[Value] {
        &self.binds
    }
}

/// One result row: `(column, value)` pairs in column order.
pub type DbRow = Vec<(String, Value)>;

/// What the verification core needs from a database client: run one read
/// query, hand back typed rows, and describe the endpoint for log lines.
///
/// Retry, authentication and dialect concerns live behind this trait, not
/// in front of it. A hard failure (malformed query, connection refused)
/// must surface as a [`StorageError`]; it is never swallowed or retried at
/// this layer.
pub trait DbProvider {
    /// Execute a read query and return every result row.
    fn select(&self, query: &DbQuery) -> Result<Vec<DbRow>, StorageError>;

    /// Human-readable description of the database endpoint.
    fn description(&self) -> String;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_query_builder() {
        let query = DbQuery::new("SELECT * FROM runs WHERE state = ? AND tries > ?")
            .bind("done")
            .bind(3i64);

        assert_eq!(query.sql(), "SELECT * FROM runs WHERE state = ? AND tries > ?");
        assert_eq!(query.binds().len(), 2);
        assert_eq!(query.binds()[0], Value::Str("done".to_owned()));
        assert_eq!(query.binds()[1], Value::Int(3));
    }
}
