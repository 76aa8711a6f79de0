//! Data client construction.
//!
//! [`ConnectionFactory`] turns endpoint fields into a [`ClientHandle`]. A
//! loopback emulator endpoint gets an unauthenticated channel and never
//! touches the credential resolver; everything else resolves credentials
//! first. No request is sent while building the client, so a handle is
//! reported valid until the first query proves otherwise.

use crate::connection::auth::{Credential, CredentialResolver};
use crate::engine::{EngineConnector, QueryEngine};
use crate::error::{ConnectionError, EngineError};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Hosts treated as a local emulator.
pub const LOOPBACK_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// Value of the `user-agent` header sent with every request.
pub const USER_AGENT: &str = concat!("bigtable-sql-rs/", env!("CARGO_PKG_VERSION"));

/// Endpoint fields of a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointConfig {
    pub project_id: String,
    pub instance_id: String,
    pub app_profile_id: Option<String>,
    /// Set together with `emulator_port`
    pub emulator_host: Option<String>,
    /// Set together with `emulator_host`
    pub emulator_port: Option<u16>,
}

impl EndpointConfig {
    pub fn new(project_id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            instance_id: instance_id.into(),
            ..Self::default()
        }
    }

    pub fn with_app_profile(mut self, app_profile_id: impl Into<String>) -> Self {
        self.app_profile_id = Some(app_profile_id.into());
        self
    }

    pub fn with_emulator(mut self, host: impl Into<String>, port: u16) -> Self {
        self.emulator_host = Some(host.into());
        self.emulator_port = Some(port);
        self
    }

    fn validate(&self) -> Result<(), ConnectionError> {
        if self.project_id.trim().is_empty() {
            return Err(ConnectionError::InvalidParameter {
                parameter: "project_id".to_string(),
                message: "Project ID cannot be empty".to_string(),
            });
        }
        if self.instance_id.trim().is_empty() {
            return Err(ConnectionError::InvalidParameter {
                parameter: "instance_id".to_string(),
                message: "Instance ID cannot be empty".to_string(),
            });
        }
        if self.emulator_host.is_some() != self.emulator_port.is_some() {
            return Err(ConnectionError::InvalidParameter {
                parameter: "emulator".to_string(),
                message: "Emulator host and port must be given together".to_string(),
            });
        }
        Ok(())
    }

    /// Emulator address, if the configured host is a loopback alias with a usable port.
    fn loopback_emulator(&self) -> Option<(&str, u16)> {
        match (self.emulator_host.as_deref(), self.emulator_port) {
            (Some(host), Some(port)) if port != 0 && LOOPBACK_HOSTS.contains(&host) => {
                Some((host, port))
            }
            _ => None,
        }
    }
}

/// Where the data client connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Local emulator over an insecure channel
    Emulator { host: String, port: u16 },
    /// Authenticated channel, optionally to an explicit `host:port`
    Production { endpoint_override: Option<String> },
}

/// Fully resolved settings handed to the engine connector.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub project_id: String,
    pub instance_id: String,
    pub app_profile_id: Option<String>,
    pub endpoint: Endpoint,
    pub credential: Credential,
    /// Fixed request headers
    pub headers: Vec<(String, String)>,
    /// Client-side metrics
    pub metrics_enabled: bool,
}

impl ClientSettings {
    /// Settings with the fixed `user-agent` header attached.
    pub fn new(
        project_id: impl Into<String>,
        instance_id: impl Into<String>,
        app_profile_id: Option<String>,
        endpoint: Endpoint,
        credential: Credential,
        metrics_enabled: bool,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            instance_id: instance_id.into(),
            app_profile_id,
            endpoint,
            credential,
            headers: vec![("user-agent".to_string(), USER_AGENT.to_string())],
            metrics_enabled,
        }
    }

    pub fn is_emulator(&self) -> bool {
        matches!(self.endpoint, Endpoint::Emulator { .. })
    }

    /// Value of a fixed header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Shared handle to a data client.
///
/// Cheap to clone; every statement created from a connection holds one.
#[derive(Clone)]
pub struct ClientHandle {
    engine: Arc<dyn QueryEngine>,
    settings: Arc<ClientSettings>,
    closed: Arc<AtomicBool>,
}

impl ClientHandle {
    /// Wrap an engine built for `settings`.
    pub fn new(engine: Arc<dyn QueryEngine>, settings: ClientSettings) -> Self {
        Self {
            engine,
            settings: Arc::new(settings),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub(crate) fn engine(&self) -> &Arc<dyn QueryEngine> {
        &self.engine
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close the data client. Only the first call reaches the engine.
    pub async fn close(&self) -> Result<(), EngineError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.engine.close().await
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("engine", &"<QueryEngine>")
            .field("settings", &self.settings)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Builds data clients, resolving credentials on first authenticated use.
pub struct ConnectionFactory {
    resolver: CredentialResolver,
    connector: Arc<dyn EngineConnector>,
    metrics_enabled: bool,
}

impl ConnectionFactory {
    /// Factory with client-side metrics disabled.
    pub fn new(resolver: CredentialResolver, connector: Arc<dyn EngineConnector>) -> Self {
        Self {
            resolver,
            connector,
            metrics_enabled: false,
        }
    }

    /// Turn client-side metrics on or off.
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    pub fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }

    /// Build a client handle for `endpoint`.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` for empty identifiers or a half-configured emulator
    /// - `Credential` if resolution fails on the authenticated path
    /// - `ClientCreationFailed` if the connector rejects the settings
    pub async fn create_client(
        &self,
        endpoint: &EndpointConfig,
    ) -> Result<ClientHandle, ConnectionError> {
        endpoint.validate()?;

        let (target, credential) = match endpoint.loopback_emulator() {
            Some((host, port)) => {
                info!(host, port, "Using emulator endpoint without credentials");
                (
                    Endpoint::Emulator {
                        host: host.to_string(),
                        port,
                    },
                    Credential::insecure(),
                )
            }
            None => {
                let credential = self.resolver.resolve().await?;
                let endpoint_override = match (&endpoint.emulator_host, endpoint.emulator_port) {
                    (Some(host), Some(port)) => Some(format!("{}:{}", host, port)),
                    _ => None,
                };
                info!(
                    project = %endpoint.project_id,
                    instance = %endpoint.instance_id,
                    endpoint_override = ?endpoint_override,
                    "Using authenticated endpoint"
                );
                (Endpoint::Production { endpoint_override }, credential)
            }
        };

        let settings = ClientSettings::new(
            endpoint.project_id.clone(),
            endpoint.instance_id.clone(),
            endpoint.app_profile_id.clone(),
            target,
            credential,
            self.metrics_enabled,
        );

        let engine = self
            .connector
            .connect(&settings)
            .map_err(|e| ConnectionError::ClientCreationFailed {
                project: endpoint.project_id.clone(),
                instance: endpoint.instance_id.clone(),
                message: e.to_string(),
            })?;

        Ok(ClientHandle::new(engine, settings))
    }
}

impl fmt::Debug for ConnectionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionFactory")
            .field("resolver", &self.resolver)
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}
