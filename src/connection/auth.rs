//! Credential resolution for Bigtable connections.
//!
//! Credentials come from exactly one of three places, checked in order:
//! inline JSON, a credential file, or ambient discovery from the
//! environment. The first configured source wins and is resolved at most
//! once per [`CredentialResolver`]; the outcome, success or failure, is
//! cached for the resolver's lifetime.

use crate::error::CredentialError;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Authorization scopes attached to every resolved credential.
pub const BIGTABLE_SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/bigtable.data",
    "https://www.googleapis.com/auth/bigtable.admin",
    "https://www.googleapis.com/auth/cloud-platform",
];

/// Environment variable naming an explicit application default credential file.
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

const WELL_KNOWN_FILE: &str = "application_default_credentials.json";

/// Secret string that zeros its bytes on drop and never displays its contents.
#[derive(Clone)]
pub struct Secret {
    data: Vec<u8>,
}

impl Secret {
    /// Wrap a secret value.
    pub fn new(value: String) -> Self {
        Self {
            data: value.into_bytes(),
        }
    }

    /// The secret value (for handing to the data client only).
    pub fn expose(&self) -> &str {
        std::str::from_utf8(&self.data).unwrap_or_default()
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        for byte in &mut self.data {
            *byte = 0;
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<redacted>)")
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Secret::new)
    }
}

/// Parsed credential key material.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialKey {
    /// Service account key file
    ServiceAccount {
        client_email: String,
        private_key: Secret,
        #[serde(default)]
        private_key_id: Option<String>,
        #[serde(default)]
        project_id: Option<String>,
        #[serde(default)]
        token_uri: Option<String>,
    },
    /// End-user credentials written by `gcloud auth application-default login`
    AuthorizedUser {
        client_id: String,
        client_secret: Secret,
        refresh_token: Secret,
        #[serde(default)]
        quota_project_id: Option<String>,
    },
    /// Workload identity federation configuration
    ExternalAccount {
        audience: String,
        subject_token_type: String,
        #[serde(default)]
        token_url: Option<String>,
        #[serde(default)]
        credential_source: serde_json::Value,
    },
}

impl CredentialKey {
    /// Parse credential JSON.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Malformed` for invalid JSON, an unknown
    /// `type` or missing required fields.
    pub fn from_json(json: &str) -> Result<Self, CredentialError> {
        serde_json::from_str(json).map_err(|e| CredentialError::Malformed(e.to_string()))
    }

    /// The `type` tag of the key.
    pub fn kind(&self) -> &'static str {
        match self {
            CredentialKey::ServiceAccount { .. } => "service_account",
            CredentialKey::AuthorizedUser { .. } => "authorized_user",
            CredentialKey::ExternalAccount { .. } => "external_account",
        }
    }

    /// Non-secret identity of the key, safe to log.
    pub fn principal(&self) -> &str {
        match self {
            CredentialKey::ServiceAccount { client_email, .. } => client_email,
            CredentialKey::AuthorizedUser { client_id, .. } => client_id,
            CredentialKey::ExternalAccount { audience, .. } => audience,
        }
    }
}

/// Where a credential came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// `credential_json` property
    InlineJson,
    /// `credential_file_path` property
    File(String),
    /// Ambient discovery; `origin` names the file or mechanism used
    Ambient { origin: String },
    /// No credential; emulator channels only
    Insecure,
}

/// Resolved authorization material, restricted to [`BIGTABLE_SCOPES`].
#[derive(Debug, Clone)]
pub struct Credential {
    key: Option<Arc<CredentialKey>>,
    source: CredentialSource,
}

impl Credential {
    fn new(key: CredentialKey, source: CredentialSource) -> Self {
        Self {
            key: Some(Arc::new(key)),
            source,
        }
    }

    /// Placeholder for unauthenticated emulator channels.
    pub fn insecure() -> Self {
        Self {
            key: None,
            source: CredentialSource::Insecure,
        }
    }

    /// Parsed key material, `None` for the insecure placeholder.
    pub fn key(&self) -> Option<&CredentialKey> {
        self.key.as_deref()
    }

    pub fn source(&self) -> &CredentialSource {
        &self.source
    }

    /// Authorization scopes requested with this credential.
    pub fn scopes(&self) -> &'static [&'static str] {
        &BIGTABLE_SCOPES
    }

    pub fn is_insecure(&self) -> bool {
        self.key.is_none()
    }
}

/// Credential inputs from connection properties.
#[derive(Clone, Default)]
pub struct CredentialConfig {
    /// Inline credential JSON
    pub inline_json: Option<String>,
    /// Path to a credential JSON file
    pub file_path: Option<String>,
}

impl CredentialConfig {
    /// Configuration with neither source set; resolution falls back to ambient discovery.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inline_json(mut self, json: impl Into<String>) -> Self {
        self.inline_json = Some(json.into());
        self
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    fn inline_json(&self) -> Option<&str> {
        non_blank(self.inline_json.as_deref())
    }

    fn file_path(&self) -> Option<&str> {
        non_blank(self.file_path.as_deref())
    }
}

impl fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialConfig")
            .field(
                "inline_json",
                &self.inline_json.as_ref().map(|_| "<redacted>"),
            )
            .field("file_path", &self.file_path)
            .finish()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Credential JSON found by ambient discovery.
#[derive(Clone)]
pub struct DiscoveredCredentials {
    /// File or mechanism the JSON came from
    pub origin: String,
    /// Credential JSON content
    pub json: String,
}

impl fmt::Debug for DiscoveredCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveredCredentials")
            .field("origin", &self.origin)
            .field("json", &"<redacted>")
            .finish()
    }
}

/// Environment-provided credential discovery.
#[async_trait]
pub trait AmbientCredentials: Send + Sync {
    /// Locate credential JSON without explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::AmbientUnavailable` if nothing is found.
    async fn discover(&self) -> Result<DiscoveredCredentials, CredentialError>;
}

/// Application default credentials from the process environment.
///
/// Looks at the file named by `GOOGLE_APPLICATION_CREDENTIALS`, then the
/// well-known gcloud file.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentCredentials {
    explicit: Option<PathBuf>,
    well_known: Option<PathBuf>,
}

impl EnvironmentCredentials {
    /// Discovery over explicit locations instead of the process environment.
    pub fn new(explicit: Option<PathBuf>, well_known: Option<PathBuf>) -> Self {
        Self {
            explicit,
            well_known,
        }
    }

    /// Read locations from the process environment.
    pub fn from_env() -> Self {
        let explicit = std::env::var_os(CREDENTIALS_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::new(explicit, well_known_file())
    }
}

fn well_known_file() -> Option<PathBuf> {
    let config_dir = if cfg!(windows) {
        std::env::var_os("APPDATA").map(|appdata| PathBuf::from(appdata).join("gcloud"))
    } else {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config").join("gcloud"))
    };
    config_dir.map(|dir| dir.join(WELL_KNOWN_FILE))
}

#[async_trait]
impl AmbientCredentials for EnvironmentCredentials {
    async fn discover(&self) -> Result<DiscoveredCredentials, CredentialError> {
        if let Some(path) = &self.explicit {
            let origin = path.display().to_string();
            let json = tokio::fs::read_to_string(path).await.map_err(|e| {
                CredentialError::AmbientUnavailable(format!(
                    "{} points to '{}': {}",
                    CREDENTIALS_ENV, origin, e
                ))
            })?;
            return Ok(DiscoveredCredentials { origin, json });
        }

        if let Some(path) = &self.well_known {
            if let Ok(json) = tokio::fs::read_to_string(path).await {
                return Ok(DiscoveredCredentials {
                    origin: path.display().to_string(),
                    json,
                });
            }
        }

        Err(CredentialError::AmbientUnavailable(format!(
            "{} is not set and no gcloud application default credentials were found",
            CREDENTIALS_ENV
        )))
    }
}

/// Resolves credentials once and caches the outcome.
pub struct CredentialResolver {
    config: CredentialConfig,
    ambient: Arc<dyn AmbientCredentials>,
    cached: OnceCell<Result<Credential, CredentialError>>,
}

impl CredentialResolver {
    /// Resolver that falls back to the process environment.
    pub fn new(config: CredentialConfig) -> Self {
        Self::with_ambient(config, Arc::new(EnvironmentCredentials::from_env()))
    }

    /// Resolver with a custom ambient discovery mechanism.
    pub fn with_ambient(config: CredentialConfig, ambient: Arc<dyn AmbientCredentials>) -> Self {
        Self {
            config,
            ambient,
            cached: OnceCell::new(),
        }
    }

    /// Resolve the credential, running resolution at most once.
    ///
    /// Concurrent first callers wait on the single in-flight resolution and
    /// all observe the same result or the same failure.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if the selected source is unreadable,
    /// malformed or, for ambient discovery, unavailable.
    pub async fn resolve(&self) -> Result<Credential, CredentialError> {
        self.cached
            .get_or_init(|| self.resolve_uncached())
            .await
            .clone()
    }

    /// Whether resolution has already run.
    pub fn is_resolved(&self) -> bool {
        self.cached.initialized()
    }

    async fn resolve_uncached(&self) -> Result<Credential, CredentialError> {
        if let Some(json) = self.config.inline_json() {
            let key = CredentialKey::from_json(json)?;
            info!(kind = key.kind(), principal = key.principal(), "Using inline credential JSON");
            return Ok(Credential::new(key, CredentialSource::InlineJson));
        }

        if let Some(path) = self.config.file_path() {
            let json = tokio::fs::read_to_string(path).await.map_err(|e| {
                CredentialError::FileUnreadable {
                    path: path.to_string(),
                    message: e.to_string(),
                }
            })?;
            let key = CredentialKey::from_json(&json)?;
            info!(path, kind = key.kind(), principal = key.principal(), "Using credential file");
            return Ok(Credential::new(key, CredentialSource::File(path.to_string())));
        }

        let found = self.ambient.discover().await?;
        let key = CredentialKey::from_json(&found.json)?;
        info!(
            origin = %found.origin,
            kind = key.kind(),
            principal = key.principal(),
            "Using application default credentials"
        );
        Ok(Credential::new(
            key,
            CredentialSource::Ambient {
                origin: found.origin,
            },
        ))
    }
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("config", &self.config)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
