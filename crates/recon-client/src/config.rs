//! Configuration for the service connection.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// Default base URL of the reconciliation API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Default request timeout. Comparisons run a language model server-side
/// and routinely take longer than a minute.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings for the reconciliation service.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Optional bearer token sent with every request. Blank is none.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_token"
    )]
    pub api_token: Option<String>,

    /// Endpoint paths relative to `base_url`.
    pub endpoints: Endpoints,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            api_token: None,
            endpoints: Endpoints::default(),
        }
    }
}

impl ServiceConfig {
    /// Replace the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the bearer token.
    #[must_use]
    pub fn with_api_token(mut self, token: Option<String>) -> Self {
        self.api_token = non_blank(token);
        self
    }

    /// Configured bearer token, if it is not blank.
    pub fn token(&self) -> Option<&str> {
        self.api_token.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Join the base URL and an endpoint path with exactly one slash.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

fn non_blank(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.trim().is_empty())
}

fn deserialize_token<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(non_blank)
}

/// Endpoint paths of the reconciliation API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Column discovery (multipart upload of one document).
    pub columns: String,
    /// Document comparison (multipart upload of both documents).
    pub compare: String,
    /// Saved results collection; delete appends `/{id}`.
    pub results: String,
    /// Report export.
    pub export: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            columns: "logistica/analisar-colunas".to_string(),
            compare: "logistica/comparar-documentos".to_string(),
            results: "logistica/resultados".to_string(),
            export: "logistica/exportar".to_string(),
        }
    }
}
