//! Prepared statement handling for parameterized queries.
//!
//! A [`PreparedStatement`] owns one query text and a table of positional
//! parameters. Each execution snapshots the table into an immutable
//! [`BoundStatement`] and hands it to the query engine. At most one
//! [`ResultCursor`] is live per statement.

use crate::connection::ClientHandle;
use crate::engine::BoundStatement;
use crate::error::QueryError;
use crate::query::parameter::{Parameter, SqlArray};
use crate::query::results::ResultCursor;
use crate::types::SqlType;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// A prepared statement for parameterized query execution.
///
/// Parameters are 1-based. Binding an index the query never references is
/// accepted; executing with a referenced index left unbound is reported by
/// the remote side.
///
/// # Example
///
/// ```no_run
/// # use bigtable_sql::query::PreparedStatement;
/// # async fn example(stmt: &mut PreparedStatement) -> Result<(), Box<dyn std::error::Error>> {
/// stmt.set_bytes(1, b"hotels#1".to_vec())?;
/// let cursor = stmt.execute_query().await?;
/// while cursor.next().await? {
///     println!("{:?}", cursor.get_string("_key")?);
/// }
/// stmt.close();
/// # Ok(())
/// # }
/// ```
pub struct PreparedStatement {
    client: ClientHandle,
    sql: String,
    parameters: BTreeMap<usize, Parameter>,
    cursor: Option<ResultCursor>,
    closed: bool,
}

impl std::fmt::Debug for PreparedStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedStatement")
            .field("sql", &self.sql)
            .field("parameters", &self.parameters.len())
            .field("cursor", &self.cursor.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}

impl PreparedStatement {
    pub(crate) fn new(client: ClientHandle, sql: impl Into<String>) -> Self {
        Self {
            client,
            sql: sql.into(),
            parameters: BTreeMap::new(),
            cursor: None,
            closed: false,
        }
    }

    /// Query text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Check if the prepared statement has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of bound parameter slots.
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Bind a parameter value at a 1-based index, replacing any earlier value.
    ///
    /// # Errors
    /// - `StatementClosed` if the statement is closed
    /// - `ParameterBindingError` if `index` is 0 or an array element has the wrong type
    /// - `UnsupportedType` for decimals, structs and non-bindable NULL types
    pub fn bind(&mut self, index: usize, value: impl Into<Parameter>) -> Result<(), QueryError> {
        self.ensure_open()?;
        check_index(index)?;
        let value = value.into().into_bindable(index)?;
        self.parameters.insert(index, value);
        Ok(())
    }

    pub fn set_null(&mut self, index: usize, sql_type: SqlType) -> Result<(), QueryError> {
        self.bind(index, Parameter::Null(sql_type))
    }

    pub fn set_bool(&mut self, index: usize, value: bool) -> Result<(), QueryError> {
        self.bind(index, value)
    }

    pub fn set_short(&mut self, index: usize, value: i16) -> Result<(), QueryError> {
        self.bind(index, value)
    }

    pub fn set_int(&mut self, index: usize, value: i32) -> Result<(), QueryError> {
        self.bind(index, value)
    }

    pub fn set_long(&mut self, index: usize, value: i64) -> Result<(), QueryError> {
        self.bind(index, value)
    }

    pub fn set_float(&mut self, index: usize, value: f32) -> Result<(), QueryError> {
        self.bind(index, value)
    }

    pub fn set_double(&mut self, index: usize, value: f64) -> Result<(), QueryError> {
        self.bind(index, value)
    }

    pub fn set_string(&mut self, index: usize, value: impl Into<String>) -> Result<(), QueryError> {
        self.bind(index, Parameter::String(value.into()))
    }

    pub fn set_bytes(&mut self, index: usize, value: impl Into<Vec<u8>>) -> Result<(), QueryError> {
        self.bind(index, Parameter::Bytes(value.into()))
    }

    pub fn set_date(&mut self, index: usize, value: NaiveDate) -> Result<(), QueryError> {
        self.bind(index, value)
    }

    /// Bind the calendar day `instant` falls on in `offset`.
    pub fn set_date_at(
        &mut self,
        index: usize,
        instant: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Result<(), QueryError> {
        self.bind(index, instant.with_timezone(&offset).date_naive())
    }

    pub fn set_timestamp(&mut self, index: usize, value: DateTime<Utc>) -> Result<(), QueryError> {
        self.bind(index, value)
    }

    /// Bind a wall-clock date-time interpreted in `offset`.
    pub fn set_timestamp_with_offset(
        &mut self,
        index: usize,
        local: NaiveDateTime,
        offset: FixedOffset,
    ) -> Result<(), QueryError> {
        let instant = offset
            .from_local_datetime(&local)
            .single()
            .ok_or_else(|| QueryError::ParameterBindingError {
                index,
                message: format!("{} does not exist in offset {}", local, offset),
            })?;
        self.bind(index, instant.with_timezone(&Utc))
    }

    pub fn set_array(&mut self, index: usize, value: SqlArray) -> Result<(), QueryError> {
        self.bind(index, value)
    }

    /// Bind a dynamically typed value.
    pub fn set_object(&mut self, index: usize, value: Parameter) -> Result<(), QueryError> {
        self.bind(index, value)
    }

    /// Arbitrary-precision decimals cannot be bound; always fails with `UnsupportedType`
    /// on an open statement.
    pub fn set_big_decimal(&mut self, index: usize, value: &str) -> Result<(), QueryError> {
        self.bind(index, Parameter::Decimal(value.to_string()))
    }

    /// Value bound at a 1-based index.
    pub fn parameter(&self, index: usize) -> Result<&Parameter, QueryError> {
        self.ensure_open()?;
        check_index(index)?;
        self.parameters
            .get(&index)
            .ok_or_else(|| QueryError::ParameterBindingError {
                index,
                message: format!("Parameter {} is not bound", index),
            })
    }

    /// Clear all bound parameters.
    pub fn clear_parameters(&mut self) -> Result<(), QueryError> {
        self.ensure_open()?;
        self.parameters.clear();
        Ok(())
    }

    /// Execute the query and return a cursor over its rows.
    ///
    /// Any cursor left over from a previous execution is closed first. On
    /// failure the statement stays open and holds no cursor.
    ///
    /// # Errors
    /// - `StatementClosed` if the statement is closed
    /// - `MissingSql` if the query text is blank
    /// - `ExecutionFailed` if the connection is closed or the engine rejects the query
    pub async fn execute_query(&mut self) -> Result<&mut ResultCursor, QueryError> {
        self.ensure_open()?;
        self.discard_cursor();

        if self.sql.trim().is_empty() {
            return Err(QueryError::MissingSql);
        }
        if self.client.is_closed() {
            return Err(QueryError::ExecutionFailed(
                "Connection is closed".to_string(),
            ));
        }

        let statement = BoundStatement::builder(self.sql.as_str())
            .bind_all(&self.parameters)
            .build();
        debug!(
            parameters = statement.parameters().len(),
            "Executing prepared statement"
        );

        let stream = self.client.engine().execute_query(statement).await?;
        Ok(self.cursor.insert(ResultCursor::new(stream)))
    }

    /// Execute the query, keeping the cursor for [`get_result_set`](Self::get_result_set).
    ///
    /// Always returns `true`: every successful execution produces a result set.
    pub async fn execute(&mut self) -> Result<bool, QueryError> {
        self.execute_query().await?;
        Ok(true)
    }

    /// The cursor from the last execution, if still held.
    ///
    /// # Errors
    /// - `StatementClosed` if the statement is closed
    pub fn get_result_set(&mut self) -> Result<Option<&mut ResultCursor>, QueryError> {
        self.ensure_open()?;
        Ok(self.cursor.as_mut())
    }

    /// Data modification is not supported by this driver.
    pub async fn execute_update(&mut self) -> Result<u64, QueryError> {
        Err(QueryError::UnsupportedOperation("executeUpdate".to_string()))
    }

    /// Batches are not supported by this driver.
    pub async fn execute_batch(&mut self) -> Result<Vec<u64>, QueryError> {
        Err(QueryError::UnsupportedOperation("executeBatch".to_string()))
    }

    /// Query timeouts are not enforced; always fails so callers know.
    pub fn set_query_timeout(&mut self, _timeout: Duration) -> Result<(), QueryError> {
        Err(QueryError::UnsupportedOperation("setQueryTimeout".to_string()))
    }

    pub fn set_max_rows(&mut self, _max: u32) -> Result<(), QueryError> {
        Err(QueryError::UnsupportedOperation("setMaxRows".to_string()))
    }

    pub fn set_large_max_rows(&mut self, _max: u64) -> Result<(), QueryError> {
        Err(QueryError::UnsupportedOperation("setLargeMaxRows".to_string()))
    }

    /// Close the statement and any open cursor. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.discard_cursor();
        self.parameters.clear();
        self.closed = true;
    }

    fn ensure_open(&self) -> Result<(), QueryError> {
        if self.closed {
            Err(QueryError::StatementClosed)
        } else {
            Ok(())
        }
    }

    fn discard_cursor(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            cursor.close();
        }
    }
}

fn check_index(index: usize) -> Result<(), QueryError> {
    if index == 0 {
        return Err(QueryError::ParameterBindingError {
            index,
            message: "Parameter indexes start at 1".to_string(),
        });
    }
    Ok(())
}

impl Drop for PreparedStatement {
    fn drop(&mut self) {
        if !self.closed {
            warn!(sql = %self.sql, "PreparedStatement dropped without being closed");
            self.close();
        }
    }
}
