//! Open connection to a Bigtable instance.

use crate::connection::{ClientHandle, ConnectionParams};
use crate::error::{ConnectionError, EngineError};
use crate::query::PreparedStatement;
use tracing::debug;

/// A connection created by [`Driver::connect`](crate::Driver::connect).
///
/// Statements share the connection's data client.
#[derive(Debug)]
pub struct Connection {
    params: ConnectionParams,
    client: ClientHandle,
}

impl Connection {
    pub(crate) fn new(params: ConnectionParams, client: ClientHandle) -> Self {
        Self { params, client }
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Shared data client handle.
    pub fn client(&self) -> &ClientHandle {
        &self.client
    }

    /// Prepare a statement. The query text is checked when it is executed.
    pub fn prepare_statement(
        &self,
        sql: impl Into<String>,
    ) -> Result<PreparedStatement, ConnectionError> {
        if self.client.is_closed() {
            return Err(ConnectionError::ConnectionClosed);
        }
        Ok(PreparedStatement::new(self.client.clone(), sql))
    }

    /// Optimistic validity: `true` until the connection is closed.
    ///
    /// Never sends a request; unreachable endpoints are reported by the
    /// first query instead.
    pub fn is_valid(&self) -> bool {
        !self.client.is_closed()
    }

    pub fn is_closed(&self) -> bool {
        self.client.is_closed()
    }

    /// Close the data client. Idempotent.
    pub async fn close(&self) -> Result<(), EngineError> {
        if !self.client.is_closed() {
            debug!(
                project = %self.params.project_id,
                instance = %self.params.instance_id,
                "Closing connection"
            );
        }
        self.client.close().await
    }
}
