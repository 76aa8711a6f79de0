//! # bigtable-sql
//!
//! SQL driver for Google Cloud Bigtable.
//!
//! Exposes Bigtable's SQL query capability through a prepare, bind, execute
//! and fetch workflow. Query execution itself is delegated to a data client
//! behind the [`engine::QueryEngine`] trait; this crate owns credential
//! resolution, client construction, parameter binding and typed row access.
//!
//! ## Example
//!
//! ```no_run
//! # use bigtable_sql::*;
//! # use std::collections::HashMap;
//! # use std::sync::Arc;
//! # async fn example(connector: Arc<dyn engine::EngineConnector>) -> Result<(), Box<dyn std::error::Error>> {
//! let driver = Driver::new(connector);
//! let connection = driver
//!     .connect("jdbc:bigtable:/projects/my-project/instances/my-instance", &HashMap::new())
//!     .await?;
//!
//! let mut stmt = connection.prepare_statement("SELECT * FROM hotels WHERE _key = ?")?;
//! stmt.set_bytes(1, b"hotels#1#Basel#Hilton Basel#Luxury".to_vec())?;
//!
//! let cursor = stmt.execute_query().await?;
//! while cursor.next().await? {
//!     println!("booked: {:?}", cursor.get_bool("booked")?);
//! }
//!
//! stmt.close();
//! connection.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod driver;
pub mod engine;
pub mod error;
pub mod logging;
pub mod query;
pub mod types;

pub use connection::{ClientHandle, ConnectionFactory, CredentialResolver, EndpointConfig};
pub use driver::{Connection, Driver};
pub use error::{
    BigtableError, ConnectionError, ConversionError, CredentialError, EngineError, ErrorKind,
    QueryError,
};
pub use query::{Column, Parameter, PreparedStatement, ResultCursor, SqlArray};
pub use types::{Cell, SqlType};
