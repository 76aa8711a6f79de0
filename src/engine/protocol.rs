//! Query engine abstraction traits.
//!
//! The driver never talks to Bigtable directly. Everything that crosses the
//! network goes through these traits, so the same statement and cursor code
//! runs against the real data client, the emulator or an in-memory fake.

use crate::connection::ClientSettings;
use crate::error::EngineError;
use crate::types::ResultMetadata;
use async_trait::async_trait;
use std::sync::Arc;

use super::messages::{BoundStatement, Row};

/// A live data client able to run SQL queries.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Submit a bound statement and open its result stream.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` if the remote side rejects the statement.
    async fn execute_query(
        &self,
        statement: BoundStatement,
    ) -> Result<Box<dyn RowStream>, EngineError>;

    /// Release the client and its channels.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` if shutdown fails.
    async fn close(&self) -> Result<(), EngineError>;
}

/// Forward-only stream of result rows.
#[async_trait]
pub trait RowStream: Send {
    /// Column metadata, available before the first row.
    async fn metadata(&mut self) -> Result<Arc<ResultMetadata>, EngineError>;

    /// Next row, or `None` once the stream is exhausted.
    async fn next_row(&mut self) -> Result<Option<Row>, EngineError>;

    /// Cancel the stream and release its server-side resources.
    ///
    /// Must be idempotent.
    fn close(&mut self);
}

/// Builds a [`QueryEngine`] from fully resolved client settings.
///
/// Construction is local; no request is sent until the first query.
pub trait EngineConnector: Send + Sync {
    /// Create a data client.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` if the settings cannot be turned into a client.
    fn connect(&self, settings: &ClientSettings) -> Result<Arc<dyn QueryEngine>, EngineError>;
}
