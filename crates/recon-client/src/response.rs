//! Normalization of service responses.
//!
//! These functions work on raw status codes and bodies so the contract can
//! be tested without a server.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use recon_model::{Column, ComparisonResult};

use crate::error::{Result, ServiceError};

/// Fields checked, in order, for a service-provided error message.
const MESSAGE_FIELDS: &[&str] = &["message", "error"];

/// Service-provided message from an error body, if any.
pub fn service_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    MESSAGE_FIELDS
        .iter()
        .find_map(|field| value.get(field).and_then(Value::as_str))
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

/// Reason for a failed call: the service message, else the status line.
pub fn failure_reason(status: StatusCode, body: &[u8]) -> String {
    service_message(body).unwrap_or_else(|| format!("service responded with {status}"))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColumnsBody {
    Bare(Vec<Column>),
    Wrapped {
        #[serde(default)]
        columns: Vec<Column>,
    },
}

/// Parse a discovery response: a bare array or `{ "columns": [...] }`.
pub fn parse_columns(document: &str, body: &[u8]) -> Result<Vec<Column>> {
    let parsed: ColumnsBody =
        serde_json::from_slice(body).map_err(|e| ServiceError::DiscoveryFailed {
            document: document.to_string(),
            reason: format!("unexpected response: {e}"),
        })?;
    let columns = match parsed {
        ColumnsBody::Bare(columns) | ColumnsBody::Wrapped { columns } => columns,
    };
    if columns.is_empty() {
        return Err(ServiceError::EmptyDocument {
            document: document.to_string(),
        });
    }
    Ok(columns)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawComparison {
    matching: Option<Vec<String>>,
    missing_from_source: Option<Vec<String>>,
    missing_from_target: Option<Vec<String>>,
    unknown_terms: Option<Vec<String>>,
    narrative: Option<String>,
}

/// Parse and validate a comparison response.
///
/// `matching` is required: a body without it is reported as
/// [`ServiceError::MalformedResult`] instead of an empty comparison. The
/// other buckets default to empty.
pub fn parse_comparison(body: &[u8]) -> Result<ComparisonResult> {
    let value: Value = serde_json::from_slice(body).map_err(|e| ServiceError::MalformedResult {
        reason: format!("response is not JSON: {e}"),
    })?;
    if !value.is_object() {
        return Err(ServiceError::MalformedResult {
            reason: "response is not a JSON object".to_string(),
        });
    }
    let raw: RawComparison =
        serde_json::from_value(value).map_err(|e| ServiceError::MalformedResult {
            reason: e.to_string(),
        })?;

    let Some(matching) = raw.matching else {
        let reason = service_message(body)
            .map(|message| format!("no `matching` field (service said: {message})"))
            .unwrap_or_else(|| "no `matching` field".to_string());
        return Err(ServiceError::MalformedResult { reason });
    };

    Ok(ComparisonResult {
        matching,
        missing_from_source: bucket("missingFromSource", raw.missing_from_source),
        missing_from_target: bucket("missingFromTarget", raw.missing_from_target),
        unknown_terms: bucket("unknownTerms", raw.unknown_terms),
        narrative: raw.narrative,
    })
}

fn bucket(field: &str, values: Option<Vec<String>>) -> Vec<String> {
    values.unwrap_or_else(|| {
        tracing::warn!(field, "comparison response has no {field}; treating as empty");
        Vec::new()
    })
}

/// Parse a save response: `{ "id": ... }` or a bare string/number.
pub fn parse_saved_id(body: &[u8]) -> Result<String> {
    let value: Value = serde_json::from_slice(body).map_err(|e| ServiceError::SaveFailed {
        reason: format!("unexpected response: {e}"),
    })?;
    let id = match &value {
        Value::Object(map) => map.get("id").and_then(id_text),
        other => id_text(other),
    };
    id.filter(|id| !id.is_empty())
        .ok_or_else(|| ServiceError::SaveFailed {
            reason: "response did not include an identifier".to_string(),
        })
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
