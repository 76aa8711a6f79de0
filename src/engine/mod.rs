//! Remote query engine boundary.
//!
//! - `protocol` - traits implemented by data clients and result streams
//! - `messages` - bound statements and rows

pub mod messages;
pub mod protocol;

pub use crate::types::Cell;
pub use messages::{BoundParameter, BoundStatement, BoundStatementBuilder, Row};
pub use protocol::{EngineConnector, QueryEngine, RowStream};

#[cfg(test)]
pub(crate) mod mocks {
    use super::*;
    use crate::connection::ClientSettings;
    use crate::error::EngineError;
    use crate::types::ResultMetadata;
    use async_trait::async_trait;
    use mockall::mock;
    use std::sync::Arc;

    mock! {
        pub Engine {}

        #[async_trait]
        impl QueryEngine for Engine {
            async fn execute_query(
                &self,
                statement: BoundStatement,
            ) -> Result<Box<dyn RowStream>, EngineError>;
            async fn close(&self) -> Result<(), EngineError>;
        }
    }

    mock! {
        pub Stream {}

        #[async_trait]
        impl RowStream for Stream {
            async fn metadata(&mut self) -> Result<Arc<ResultMetadata>, EngineError>;
            async fn next_row(&mut self) -> Result<Option<Row>, EngineError>;
            fn close(&mut self);
        }
    }

    mock! {
        pub Connector {}

        impl EngineConnector for Connector {
            fn connect(
                &self,
                settings: &ClientSettings,
            ) -> Result<Arc<dyn QueryEngine>, EngineError>;
        }
    }

    /// A stream mock that yields `rows` after `metadata` and closes any number of times.
    pub fn stream_of(metadata: ResultMetadata, rows: Vec<Row>) -> MockStream {
        let metadata = Arc::new(metadata);
        let mut rows = rows.into_iter();
        let mut stream = MockStream::new();
        stream
            .expect_metadata()
            .returning(move || Ok(Arc::clone(&metadata)));
        stream.expect_next_row().returning(move || Ok(rows.next()));
        stream.expect_close().returning(|| ());
        stream
    }
}
