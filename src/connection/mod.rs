//! Connection setup: parameters, credentials and data clients.
//!
//! # Example
//!
//! ```no_run
//! # use bigtable_sql::connection::{
//! #     ConnectionFactory, ConnectionParams, CredentialResolver,
//! # };
//! # use bigtable_sql::engine::EngineConnector;
//! # use std::str::FromStr;
//! # use std::sync::Arc;
//! # async fn example(connector: Arc<dyn EngineConnector>) -> Result<(), Box<dyn std::error::Error>> {
//! let params = ConnectionParams::from_str(
//!     "jdbc:bigtable:/projects/my-project/instances/my-instance?credential_file_path=/keys/sa.json",
//! )?;
//!
//! let factory = ConnectionFactory::new(
//!     CredentialResolver::new(params.credential_config()),
//!     connector,
//! );
//! let client = factory.create_client(&params.endpoint_config()).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod factory;
pub mod params;

pub use auth::{
    AmbientCredentials, Credential, CredentialConfig, CredentialKey, CredentialResolver,
    CredentialSource, DiscoveredCredentials, EnvironmentCredentials, BIGTABLE_SCOPES,
};
pub use factory::{
    ClientHandle, ClientSettings, ConnectionFactory, Endpoint, EndpointConfig, LOOPBACK_HOSTS,
    USER_AGENT,
};
pub use params::{ConnectionBuilder, ConnectionParams};
