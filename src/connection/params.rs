//! Connection string parsing and validation.
//!
//! ```text
//! [jdbc:]bigtable:[//host:port]/projects/{project}/instances/{instance}[?key=value&...]
//! ```
//!
//! Query parameters and the property map handed to `Driver::connect` share
//! one key space; explicit properties override values from the URL.

use crate::connection::auth::CredentialConfig;
use crate::connection::factory::EndpointConfig;
use crate::error::ConnectionError;
use crate::logging::LogConfig;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// `app_profile_id` property key.
pub const APP_PROFILE_ID: &str = "app_profile_id";
/// `credential_json` property key.
pub const CREDENTIAL_JSON: &str = "credential_json";
/// `credential_file_path` property key.
pub const CREDENTIAL_FILE_PATH: &str = "credential_file_path";
/// `enable_metrics` property key.
pub const ENABLE_METRICS: &str = "enable_metrics";
/// `log_level` property key.
pub const LOG_LEVEL: &str = "log_level";
/// `log_file` property key.
pub const LOG_FILE: &str = "log_file";

/// Validated connection parameters.
#[derive(Clone)]
pub struct ConnectionParams {
    /// Google Cloud project
    pub project_id: String,

    /// Bigtable instance
    pub instance_id: String,

    /// Optional app profile
    pub app_profile_id: Option<String>,

    /// Endpoint host; set together with `port`
    pub host: Option<String>,

    /// Endpoint port; set together with `host`
    pub port: Option<u16>,

    /// Inline credential JSON (never logged)
    credential_json: Option<String>,

    /// Credential file path
    pub credential_file_path: Option<String>,

    /// Client-side metrics; off unless asked for
    pub enable_metrics: bool,

    /// Logging level
    pub log_level: Option<String>,

    /// Logging file
    pub log_file: Option<String>,

    /// Unrecognized properties
    pub attributes: HashMap<String, String>,
}

impl ConnectionParams {
    /// Create a new ConnectionBuilder.
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// Parse a connection string and overlay an explicit property map.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::ParseError` for a malformed URL and
    /// `ConnectionError::InvalidParameter` for invalid values.
    pub fn parse_with_properties(
        url: &str,
        properties: &HashMap<String, String>,
    ) -> Result<Self, ConnectionError> {
        let (builder, mut params) = parse_url(url)?;
        for (key, value) in properties {
            params.insert(key.clone(), value.clone());
        }
        apply_query_params(builder, params)?.build()
    }

    /// Endpoint fields for the connection factory.
    pub fn endpoint_config(&self) -> EndpointConfig {
        EndpointConfig {
            project_id: self.project_id.clone(),
            instance_id: self.instance_id.clone(),
            app_profile_id: self.app_profile_id.clone(),
            emulator_host: self.host.clone(),
            emulator_port: self.port,
        }
    }

    /// Credential inputs for the resolver.
    pub fn credential_config(&self) -> CredentialConfig {
        CredentialConfig {
            inline_json: self.credential_json.clone(),
            file_path: self.credential_file_path.clone(),
        }
    }

    /// Logging options.
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level.clone(),
            file: self.log_file.clone(),
        }
    }
}

impl FromStr for ConnectionParams {
    type Err = ConnectionError;

    /// Parse a connection string without extra properties.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bigtable_sql::connection::ConnectionParams;
    /// # use std::str::FromStr;
    /// let params = ConnectionParams::from_str("jdbc:bigtable:/projects/p/instances/i")?;
    ///
    /// // Emulator endpoint
    /// let params = ConnectionParams::from_str(
    ///     "bigtable://localhost:8086/projects/p/instances/i?app_profile_id=reader"
    /// )?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_properties(s, &HashMap::new())
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("project_id", &self.project_id)
            .field("instance_id", &self.instance_id)
            .field("app_profile_id", &self.app_profile_id)
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "credential_json",
                &self.credential_json.as_ref().map(|_| "<redacted>"),
            )
            .field("credential_file_path", &self.credential_file_path)
            .field("enable_metrics", &self.enable_metrics)
            .field("log_level", &self.log_level)
            .field("log_file", &self.log_file)
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConnectionParams {{ project: {}, instance: {}, app_profile: {:?}",
            self.project_id, self.instance_id, self.app_profile_id
        )?;
        if let (Some(host), Some(port)) = (&self.host, self.port) {
            write!(f, ", endpoint: {}:{}", host, port)?;
        }
        write!(f, " }}")
    }
}

/// Builder for constructing ConnectionParams with validation.
#[derive(Clone, Default)]
pub struct ConnectionBuilder {
    project_id: Option<String>,
    instance_id: Option<String>,
    app_profile_id: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    credential_json: Option<String>,
    credential_file_path: Option<String>,
    enable_metrics: Option<bool>,
    log_level: Option<String>,
    log_file: Option<String>,
    attributes: HashMap<String, String>,
}

impl fmt::Debug for ConnectionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionBuilder")
            .field("project_id", &self.project_id)
            .field("instance_id", &self.instance_id)
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "credential_json",
                &self.credential_json.as_ref().map(|_| "<redacted>"),
            )
            .finish_non_exhaustive()
    }
}

impl ConnectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_id(mut self, project_id: &str) -> Self {
        self.project_id = Some(project_id.to_string());
        self
    }

    pub fn instance_id(mut self, instance_id: &str) -> Self {
        self.instance_id = Some(instance_id.to_string());
        self
    }

    pub fn app_profile_id(mut self, app_profile_id: &str) -> Self {
        self.app_profile_id = Some(app_profile_id.to_string());
        self
    }

    /// Set an explicit endpoint, typically an emulator.
    pub fn endpoint(mut self, host: &str, port: u16) -> Self {
        self.host = Some(host.to_string());
        self.port = Some(port);
        self
    }

    pub fn host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn credential_json(mut self, json: &str) -> Self {
        self.credential_json = Some(json.to_string());
        self
    }

    pub fn credential_file_path(mut self, path: &str) -> Self {
        self.credential_file_path = Some(path.to_string());
        self
    }

    pub fn enable_metrics(mut self, enabled: bool) -> Self {
        self.enable_metrics = Some(enabled);
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.log_level = Some(level.to_string());
        self
    }

    pub fn log_file(mut self, path: &str) -> Self {
        self.log_file = Some(path.to_string());
        self
    }

    /// Add a custom connection attribute.
    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// Build the ConnectionParams with validation.
    pub fn build(self) -> Result<ConnectionParams, ConnectionError> {
        let project_id = required(self.project_id, "project_id", "Project")?;
        let instance_id = required(self.instance_id, "instance_id", "Instance")?;

        match (&self.host, self.port) {
            (Some(host), _) if host.is_empty() => {
                return Err(ConnectionError::InvalidParameter {
                    parameter: "host".to_string(),
                    message: "Host cannot be empty".to_string(),
                });
            }
            (_, Some(0)) => {
                return Err(ConnectionError::InvalidParameter {
                    parameter: "port".to_string(),
                    message: "Port must be greater than 0".to_string(),
                });
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(ConnectionError::InvalidParameter {
                    parameter: "host".to_string(),
                    message: "Host and port must be given together".to_string(),
                });
            }
            _ => {}
        }

        Ok(ConnectionParams {
            project_id,
            instance_id,
            app_profile_id: self.app_profile_id.filter(|p| !p.is_empty()),
            host: self.host,
            port: self.port,
            credential_json: self.credential_json,
            credential_file_path: self.credential_file_path,
            enable_metrics: self.enable_metrics.unwrap_or(false),
            log_level: self.log_level,
            log_file: self.log_file,
            attributes: self.attributes,
        })
    }
}

fn required(value: Option<String>, parameter: &str, label: &str) -> Result<String, ConnectionError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(ConnectionError::InvalidParameter {
            parameter: parameter.to_string(),
            message: format!("{} ID cannot be empty", label),
        }),
        None => Err(ConnectionError::InvalidParameter {
            parameter: parameter.to_string(),
            message: format!("{} ID is required", label),
        }),
    }
}

/// Split a connection string into path fields and raw query parameters.
fn parse_url(s: &str) -> Result<(ConnectionBuilder, HashMap<String, String>), ConnectionError> {
    let url = s.trim();
    let url = url.strip_prefix("jdbc:").unwrap_or(url);
    let url = url.strip_prefix("bigtable:").ok_or_else(|| {
        ConnectionError::ParseError(
            "Connection string must start with 'jdbc:bigtable:' or 'bigtable:'".to_string(),
        )
    })?;

    let (main_part, query_string) = match url.split_once('?') {
        Some((main, query)) => (main, Some(query)),
        None => (url, None),
    };
    let params = parse_query_params(query_string)?;

    let mut builder = ConnectionBuilder::new();
    let path = match main_part.strip_prefix("//") {
        Some(rest) => {
            let (authority, path) = match rest.find('/') {
                Some(pos) => rest.split_at(pos),
                None => (rest, ""),
            };
            let (host, port) = parse_host_port(authority)?;
            builder = builder.endpoint(&host, port);
            path
        }
        None => main_part,
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        ["projects", project, "instances", instance] => {
            builder = builder
                .project_id(&decode(project, "project")?)
                .instance_id(&decode(instance, "instance")?);
        }
        _ => {
            return Err(ConnectionError::ParseError(format!(
                "Expected path '/projects/{{project}}/instances/{{instance}}', got '{}'",
                path
            )));
        }
    }

    Ok((builder, params))
}

fn decode(value: &str, what: &str) -> Result<String, ConnectionError> {
    urlencoding::decode(value)
        .map(|v| v.into_owned())
        .map_err(|e| ConnectionError::ParseError(format!("Failed to decode {}: {}", what, e)))
}

/// Parse query parameters from URL query string.
fn parse_query_params(query: Option<&str>) -> Result<HashMap<String, String>, ConnectionError> {
    let mut params = HashMap::new();

    if let Some(query) = query {
        for pair in query.split('&') {
            if pair.is_empty() {
                continue;
            }

            let (key, value) = pair.split_once('=').ok_or_else(|| {
                ConnectionError::ParseError(format!("Invalid query parameter format: {}", pair))
            })?;

            params.insert(decode(key, "key")?, decode(value, "value")?);
        }
    }

    Ok(params)
}

/// Parse `host:port`, with bracketed IPv6 hosts. The port is mandatory.
fn parse_host_port(host_port: &str) -> Result<(String, u16), ConnectionError> {
    let (host, port_str) = if let Some(rest) = host_port.strip_prefix('[') {
        let (host, after) = rest.split_once(']').ok_or_else(|| {
            ConnectionError::ParseError(format!("Unterminated IPv6 address: {}", host_port))
        })?;
        (host, after.strip_prefix(':'))
    } else {
        match host_port.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (host_port, None),
        }
    };

    let port_str = port_str.ok_or_else(|| ConnectionError::InvalidParameter {
        parameter: "port".to_string(),
        message: format!("Endpoint '{}' needs an explicit port", host_port),
    })?;
    let port = port_str
        .parse()
        .map_err(|_| ConnectionError::ParseError(format!("Invalid port: {}", port_str)))?;

    Ok((host.to_string(), port))
}

/// Apply query parameters to builder.
fn apply_query_params(
    mut builder: ConnectionBuilder,
    params: HashMap<String, String>,
) -> Result<ConnectionBuilder, ConnectionError> {
    for (key, value) in params {
        match key.as_str() {
            APP_PROFILE_ID => builder = builder.app_profile_id(&value),
            CREDENTIAL_JSON => builder = builder.credential_json(&value),
            CREDENTIAL_FILE_PATH => builder = builder.credential_file_path(&value),
            ENABLE_METRICS => builder = builder.enable_metrics(parse_bool(&key, &value)?),
            LOG_LEVEL => builder = builder.log_level(&value),
            LOG_FILE => builder = builder.log_file(&value),
            _ => builder = builder.attribute(&key, &value),
        }
    }

    Ok(builder)
}

/// Parse boolean value from string.
fn parse_bool(key: &str, s: &str) -> Result<bool, ConnectionError> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConnectionError::InvalidParameter {
            parameter: key.to_string(),
            message: format!("Invalid boolean value: {}", s),
        }),
    }
}
