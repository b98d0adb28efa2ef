//! HTTP client for the reconciliation API.

use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue,
    USER_AGENT,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode, Url};

use recon_model::{Column, ComparisonResult, DocumentHandle, MappingEntry};

use crate::ReconcileService;
use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::export::{ExportedDocument, export_file_name};
use crate::request::SaveRequest;
use crate::response::{failure_reason, parse_columns, parse_comparison, parse_saved_id};

/// User agent string for API requests.
const USER_AGENT_VALUE: &str = concat!("recon/", env!("CARGO_PKG_VERSION"));

/// Multipart part carrying the document for column discovery.
const PART_FILE: &str = "file";
/// Multipart parts carrying the two documents of a comparison.
const PART_SOURCE: &str = "source";
const PART_TARGET: &str = "target";
/// Multipart text part carrying the serialized mapping rows.
const PART_MAPPINGS: &str = "mappings";

/// Client for the remote reconciliation service.
#[derive(Debug, Clone)]
pub struct ReconClient {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl ReconClient {
    /// Creates a client for the configured service.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        if let Some(token) = config.token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ServiceError::Client(format!("invalid API token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| ServiceError::Client(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Active configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        self.config.endpoint_url(path)
    }

    /// URL of one item below a collection endpoint; `id` is encoded as a
    /// single path segment.
    fn item_url(&self, collection: &str, id: &str) -> std::result::Result<Url, String> {
        let mut url = Url::parse(&self.url(collection)).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|()| format!("{} cannot carry a path", self.config.base_url))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    fn document_part(document: &DocumentHandle) -> Part {
        Part::bytes(document.bytes().to_vec()).file_name(document.name().to_string())
    }
}

/// Read a response body, returning the status alongside it.
async fn read_body(response: Response) -> std::result::Result<(StatusCode, Vec<u8>), String> {
    let status = response.status();
    let body = response.bytes().await.map_err(|e| e.to_string())?;
    Ok((status, body.to_vec()))
}

impl ReconcileService for ReconClient {
    async fn discover_columns(&self, document: &DocumentHandle) -> Result<Vec<Column>> {
        let url = self.url(&self.config.endpoints.columns);
        tracing::debug!(
            document = document.name(),
            bytes = document.len(),
            "Requesting column discovery from {}",
            url
        );

        let failed = |reason: String| ServiceError::DiscoveryFailed {
            document: document.name().to_string(),
            reason,
        };

        let form = Form::new().part(PART_FILE, Self::document_part(document));
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        let (status, body) = read_body(response).await.map_err(failed)?;

        if !status.is_success() {
            return Err(failed(failure_reason(status, &body)));
        }

        let columns = parse_columns(document.name(), &body)?;
        tracing::info!(
            document = document.name(),
            columns = columns.len(),
            "Columns discovered"
        );
        Ok(columns)
    }

    async fn compare(
        &self,
        source: &DocumentHandle,
        target: &DocumentHandle,
        mappings: &[MappingEntry],
    ) -> Result<ComparisonResult> {
        let url = self.url(&self.config.endpoints.compare);
        tracing::debug!(
            source = source.name(),
            target = target.name(),
            mappings = mappings.len(),
            "Requesting comparison from {}",
            url
        );

        let mappings_json =
            serde_json::to_string(mappings).map_err(|e| ServiceError::ComparisonFailed {
                reason: format!("could not encode mappings: {e}"),
            })?;
        let form = Form::new()
            .part(PART_SOURCE, Self::document_part(source))
            .part(PART_TARGET, Self::document_part(target))
            .text(PART_MAPPINGS, mappings_json);

        let failed = |reason: String| ServiceError::ComparisonFailed { reason };
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        let (status, body) = read_body(response).await.map_err(failed)?;

        if !status.is_success() {
            return Err(failed(failure_reason(status, &body)));
        }

        let result = parse_comparison(&body)?;
        let counts = result.counts();
        tracing::info!(
            matching = counts.matching,
            missing_from_source = counts.missing_from_source,
            missing_from_target = counts.missing_from_target,
            unknown_terms = counts.unknown_terms,
            narrative = result.narrative.is_some(),
            "Comparison completed"
        );
        Ok(result)
    }

    async fn save(&self, request: &SaveRequest<'_>) -> Result<String> {
        let url = self.url(&self.config.endpoints.results);
        tracing::debug!(name = request.name, "Saving comparison to {}", url);

        let failed = |reason: String| ServiceError::SaveFailed { reason };
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        let (status, body) = read_body(response).await.map_err(failed)?;

        if !status.is_success() {
            return Err(failed(failure_reason(status, &body)));
        }

        let id = parse_saved_id(&body)?;
        tracing::info!(id = %id, "Comparison saved");
        Ok(id)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let failed = |reason: String| ServiceError::DeleteFailed { reason };
        let url = self
            .item_url(&self.config.endpoints.results, id)
            .map_err(failed)?;
        tracing::debug!(id, "Deleting saved comparison at {}", url);

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        let (status, body) = read_body(response).await.map_err(failed)?;

        if !status.is_success() {
            return Err(failed(failure_reason(status, &body)));
        }

        tracing::info!(id, "Saved comparison deleted");
        Ok(())
    }

    async fn export(&self, result: &ComparisonResult) -> Result<ExportedDocument> {
        let url = self.url(&self.config.endpoints.export);
        tracing::debug!("Requesting report export from {}", url);

        let failed = |reason: String| ServiceError::ExportFailed { reason };
        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "*/*")
            .json(result)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(CONTENT_TYPE);
        let disposition = header(CONTENT_DISPOSITION);
        let (status, bytes) = read_body(response).await.map_err(failed)?;

        if !status.is_success() {
            return Err(failed(failure_reason(status, &bytes)));
        }
        if bytes.is_empty() {
            return Err(failed("service returned an empty document".to_string()));
        }

        let file_name = export_file_name(
            disposition.as_deref(),
            content_type.as_deref(),
            chrono::Utc::now(),
        );
        tracing::info!(file = %file_name, bytes = bytes.len(), "Report exported");
        Ok(ExportedDocument {
            file_name,
            content_type,
            bytes,
        })
    }
}
