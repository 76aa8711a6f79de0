//! Row cursor over a remote result stream.
//!
//! A [`ResultCursor`] is forward-only and single-pass. Column metadata is
//! fetched lazily from the stream and shared by every row. Typed getters
//! coerce the current cell on demand and report SQL NULL as `None`.

use crate::engine::{Row, RowStream};
use crate::error::{ConversionError, QueryError};
use crate::types::{coercion, Cell, ResultMetadata};
use chrono::{DateTime, FixedOffset, NaiveDate};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Column address: 1-based position or name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column<'a> {
    /// 1-based position
    Index(usize),
    /// Column name, matched exactly first and then case-insensitively
    Name(&'a str),
}

impl From<usize> for Column<'_> {
    fn from(index: usize) -> Self {
        Column::Index(index)
    }
}

impl<'a> From<&'a str> for Column<'a> {
    fn from(name: &'a str) -> Self {
        Column::Name(name)
    }
}

impl<'a> From<&'a String> for Column<'a> {
    fn from(name: &'a String) -> Self {
        Column::Name(name.as_str())
    }
}

/// Cursor over the rows produced by one statement execution.
pub struct ResultCursor {
    stream: Box<dyn RowStream>,
    metadata: Option<Arc<ResultMetadata>>,
    current: Option<Row>,
    exhausted: bool,
    last_was_null: bool,
    rows_read: u64,
    closed: bool,
}

impl fmt::Debug for ResultCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCursor")
            .field("stream", &"<RowStream>")
            .field("metadata", &self.metadata)
            .field("positioned", &self.current.is_some())
            .field("exhausted", &self.exhausted)
            .field("rows_read", &self.rows_read)
            .field("closed", &self.closed)
            .finish()
    }
}

impl ResultCursor {
    pub(crate) fn new(stream: Box<dyn RowStream>) -> Self {
        Self {
            stream,
            metadata: None,
            current: None,
            exhausted: false,
            last_was_null: false,
            rows_read: 0,
            closed: false,
        }
    }

    /// Advance to the next row.
    ///
    /// Returns `false` at end of stream, and keeps returning `false` on every
    /// later call.
    pub async fn next(&mut self) -> Result<bool, QueryError> {
        self.ensure_open()?;
        if self.exhausted {
            return Ok(false);
        }

        let metadata = self.load_metadata().await?;

        match self.stream.next_row().await {
            Ok(Some(row)) => {
                if row.len() != metadata.column_count() {
                    self.finish_stream();
                    return Err(QueryError::ExecutionFailed(format!(
                        "row has {} cells but the result declares {} columns",
                        row.len(),
                        metadata.column_count()
                    )));
                }
                self.current = Some(row);
                self.rows_read += 1;
                self.last_was_null = false;
                Ok(true)
            }
            Ok(None) => {
                trace!(rows = self.rows_read, "Result stream exhausted");
                self.finish_stream();
                Ok(false)
            }
            Err(e) => {
                self.finish_stream();
                Err(e.into())
            }
        }
    }

    /// 1-based number of the current row, 0 before the first row and after the last.
    pub fn row_number(&self) -> u64 {
        if self.current.is_some() {
            self.rows_read
        } else {
            0
        }
    }

    /// Whether the last getter read SQL NULL.
    pub fn was_null(&self) -> bool {
        self.last_was_null
    }

    /// Result column metadata.
    pub async fn metadata(&mut self) -> Result<Arc<ResultMetadata>, QueryError> {
        self.ensure_open()?;
        self.load_metadata().await
    }

    /// Number of columns.
    pub async fn column_count(&mut self) -> Result<usize, QueryError> {
        Ok(self.metadata().await?.column_count())
    }

    /// Name of the column at a 1-based position.
    pub async fn column_name(&mut self, index: usize) -> Result<String, QueryError> {
        let metadata = self.metadata().await?;
        metadata
            .column(index)
            .map(|c| c.name.clone())
            .ok_or(QueryError::InvalidColumnIndex {
                index,
                count: metadata.column_count(),
            })
    }

    /// 1-based position of a named column.
    pub async fn find_column(&mut self, name: &str) -> Result<usize, QueryError> {
        self.metadata()
            .await?
            .position_of(name)
            .ok_or_else(|| QueryError::UnknownColumn(name.to_string()))
    }

    pub fn get_string<'c>(
        &mut self,
        column: impl Into<Column<'c>>,
    ) -> Result<Option<String>, QueryError> {
        self.read(column.into(), coercion::to_string)
    }

    pub fn get_bytes<'c>(
        &mut self,
        column: impl Into<Column<'c>>,
    ) -> Result<Option<Vec<u8>>, QueryError> {
        self.read(column.into(), coercion::to_bytes)
    }

    pub fn get_bool<'c>(
        &mut self,
        column: impl Into<Column<'c>>,
    ) -> Result<Option<bool>, QueryError> {
        self.read(column.into(), coercion::to_bool)
    }

    pub fn get_short<'c>(
        &mut self,
        column: impl Into<Column<'c>>,
    ) -> Result<Option<i16>, QueryError> {
        self.read(column.into(), coercion::to_i16)
    }

    pub fn get_int<'c>(
        &mut self,
        column: impl Into<Column<'c>>,
    ) -> Result<Option<i32>, QueryError> {
        self.read(column.into(), coercion::to_i32)
    }

    pub fn get_long<'c>(
        &mut self,
        column: impl Into<Column<'c>>,
    ) -> Result<Option<i64>, QueryError> {
        self.read(column.into(), coercion::to_i64)
    }

    pub fn get_float<'c>(
        &mut self,
        column: impl Into<Column<'c>>,
    ) -> Result<Option<f32>, QueryError> {
        self.read(column.into(), coercion::to_f32)
    }

    pub fn get_double<'c>(
        &mut self,
        column: impl Into<Column<'c>>,
    ) -> Result<Option<f64>, QueryError> {
        self.read(column.into(), coercion::to_f64)
    }

    /// Calendar day of a DATE or TIMESTAMP cell.
    ///
    /// `offset` selects the zone used to decompose a timestamp (UTC when
    /// `None`); the stored instant is never shifted.
    pub fn get_date<'c>(
        &mut self,
        column: impl Into<Column<'c>>,
        offset: Option<FixedOffset>,
    ) -> Result<Option<NaiveDate>, QueryError> {
        self.read(column.into(), |cell, position| {
            coercion::to_date(cell, position, offset)
        })
    }

    /// Date-time view of a TIMESTAMP or DATE cell in `offset` (UTC when `None`).
    pub fn get_timestamp<'c>(
        &mut self,
        column: impl Into<Column<'c>>,
        offset: Option<FixedOffset>,
    ) -> Result<Option<DateTime<FixedOffset>>, QueryError> {
        self.read(column.into(), |cell, position| {
            coercion::to_timestamp(cell, position, offset)
        })
    }

    pub fn get_array<'c>(
        &mut self,
        column: impl Into<Column<'c>>,
    ) -> Result<Option<Vec<Cell>>, QueryError> {
        self.read(column.into(), coercion::to_array)
    }

    /// The raw cell, unconverted.
    pub fn get_object<'c>(
        &mut self,
        column: impl Into<Column<'c>>,
    ) -> Result<Option<Cell>, QueryError> {
        self.read(column.into(), |cell, _| Ok(coercion::to_object(cell)))
    }

    /// Close the cursor and cancel the underlying stream. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.finish_stream();
        self.closed = true;
    }

    /// Check if the cursor has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), QueryError> {
        if self.closed {
            Err(QueryError::ResultSetClosed)
        } else {
            Ok(())
        }
    }

    async fn load_metadata(&mut self) -> Result<Arc<ResultMetadata>, QueryError> {
        if let Some(metadata) = &self.metadata {
            return Ok(Arc::clone(metadata));
        }
        if self.exhausted {
            return Err(QueryError::ExecutionFailed(
                "Result stream was released before its metadata arrived".to_string(),
            ));
        }
        match self.stream.metadata().await {
            Ok(metadata) => {
                self.metadata = Some(Arc::clone(&metadata));
                Ok(metadata)
            }
            Err(e) => {
                self.finish_stream();
                Err(e.into())
            }
        }
    }

    fn finish_stream(&mut self) {
        self.current = None;
        if !self.exhausted {
            self.exhausted = true;
            self.stream.close();
        }
    }

    fn position(&self, column: Column<'_>) -> Result<usize, QueryError> {
        let count = self.metadata.as_ref().map_or(0, |m| m.column_count());
        match column {
            Column::Index(index) if (1..=count).contains(&index) => Ok(index),
            Column::Index(index) => Err(QueryError::InvalidColumnIndex { index, count }),
            Column::Name(name) => self
                .metadata
                .as_ref()
                .and_then(|m| m.position_of(name))
                .ok_or_else(|| QueryError::UnknownColumn(name.to_string())),
        }
    }

    fn read<T>(
        &mut self,
        column: Column<'_>,
        convert: impl FnOnce(&Cell, usize) -> Result<Option<T>, ConversionError>,
    ) -> Result<Option<T>, QueryError> {
        self.ensure_open()?;
        let row = self
            .current
            .as_ref()
            .ok_or(QueryError::CursorNotPositioned)?;
        let position = self.position(column)?;
        let cell = &row[position - 1];
        let was_null = cell.is_null();
        let value = convert(cell, position)?;
        self.last_was_null = was_null;
        Ok(value)
    }
}

impl Drop for ResultCursor {
    fn drop(&mut self) {
        if !self.closed {
            self.finish_stream();
        }
    }
}
