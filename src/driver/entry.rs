//! Driver entry point.

use crate::connection::{
    AmbientCredentials, ConnectionFactory, ConnectionParams, CredentialResolver,
};
use crate::driver::Connection;
use crate::engine::EngineConnector;
use crate::error::ConnectionError;
use crate::logging::init_logging;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Bigtable SQL driver.
///
/// Parses connection strings, resolves credentials and builds data clients
/// through the configured [`EngineConnector`].
///
/// # Example
///
/// ```no_run
/// # use bigtable_sql::Driver;
/// # use bigtable_sql::engine::EngineConnector;
/// # use std::collections::HashMap;
/// # use std::sync::Arc;
/// # async fn example(connector: Arc<dyn EngineConnector>) -> Result<(), Box<dyn std::error::Error>> {
/// let driver = Driver::new(connector);
/// let mut properties = HashMap::new();
/// properties.insert("credential_file_path".to_string(), "/keys/sa.json".to_string());
///
/// let connection = driver
///     .connect("jdbc:bigtable:/projects/my-project/instances/my-instance", &properties)
///     .await?;
/// let mut stmt = connection.prepare_statement("SELECT * FROM hotels WHERE _key = ?")?;
/// stmt.set_bytes(1, b"hotels#1".to_vec())?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Driver {
    connector: Arc<dyn EngineConnector>,
    ambient: Option<Arc<dyn AmbientCredentials>>,
}

impl Driver {
    /// Driver using `connector` to build data clients.
    pub fn new(connector: Arc<dyn EngineConnector>) -> Self {
        Self {
            connector,
            ambient: None,
        }
    }

    /// Replace environment-based ambient credential discovery.
    pub fn with_ambient_credentials(mut self, ambient: Arc<dyn AmbientCredentials>) -> Self {
        self.ambient = Some(ambient);
        self
    }

    pub fn name(&self) -> &str {
        "bigtable-sql"
    }

    pub fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    /// Whether `url` uses a scheme this driver handles.
    pub fn accepts_url(&self, url: &str) -> bool {
        let url = url.trim();
        url.strip_prefix("jdbc:")
            .unwrap_or(url)
            .starts_with("bigtable:")
    }

    /// Open a connection.
    ///
    /// `properties` share the query-parameter key space and override values
    /// from the URL. No request is sent to Bigtable; connectivity problems
    /// surface on the first query.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` for a malformed URL, invalid properties,
    /// credential failures or a rejected client configuration.
    pub async fn connect(
        &self,
        url: &str,
        properties: &HashMap<String, String>,
    ) -> Result<Connection, ConnectionError> {
        let params = ConnectionParams::parse_with_properties(url, properties)?;
        init_logging(&params.log_config());
        debug!(params = %params, "Opening connection");

        let resolver = match &self.ambient {
            Some(ambient) => {
                CredentialResolver::with_ambient(params.credential_config(), Arc::clone(ambient))
            }
            None => CredentialResolver::new(params.credential_config()),
        };
        let factory = ConnectionFactory::new(resolver, Arc::clone(&self.connector))
            .with_metrics(params.enable_metrics);

        let client = factory.create_client(&params.endpoint_config()).await?;
        Ok(Connection::new(params, client))
    }
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("name", &self.name())
            .field("version", &self.version())
            .finish()
    }
}
