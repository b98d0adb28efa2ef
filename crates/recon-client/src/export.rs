//! Exported report artifacts.

use std::fmt;

use chrono::{DateTime, Utc};
use url::form_urlencoded;

/// Binary report returned by the export endpoint.
#[derive(Clone)]
pub struct ExportedDocument {
    /// Suggested file name for the download.
    pub file_name: String,
    /// MIME type reported by the service, if any.
    pub content_type: Option<String>,
    /// Report contents.
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ExportedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedDocument")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Pick the download name: the `Content-Disposition` file name when the
/// service sent one, otherwise a timestamped default.
pub fn export_file_name(
    content_disposition: Option<&str>,
    content_type: Option<&str>,
    now: DateTime<Utc>,
) -> String {
    content_disposition
        .and_then(disposition_file_name)
        .unwrap_or_else(|| default_file_name(content_type, now))
}

/// `reconciliation-report-YYYYMMDD-HHMMSS.<ext>`.
pub fn default_file_name(content_type: Option<&str>, now: DateTime<Utc>) -> String {
    format!(
        "reconciliation-report-{}.{}",
        now.format("%Y%m%d-%H%M%S"),
        extension_for(content_type)
    )
}

fn extension_for(content_type: Option<&str>) -> &'static str {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .unwrap_or_default();
    match mime {
        "text/csv" => "csv",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
        "application/json" => "json",
        _ => "pdf",
    }
}

/// Extract the file name from a `Content-Disposition` header, keeping only
/// the last path component. An RFC 5987 `filename*` wins over `filename`.
fn disposition_file_name(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;
    for param in header.split(';') {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"');
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => extended = decode_extended(value),
            "filename" => plain = Some(value.to_string()),
            _ => {}
        }
    }
    extended
        .or(plain)
        .as_deref()
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
}

/// Decode `charset'lang'percent-encoded`. Only UTF-8 and ASCII are accepted.
fn decode_extended(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;
    if !charset.eq_ignore_ascii_case("utf-8") && !charset.eq_ignore_ascii_case("us-ascii") {
        return None;
    }
    // `+` is a literal in this encoding, not a space.
    let query = format!("n={}", encoded.replace('+', "%2B"));
    form_urlencoded::parse(query.as_bytes())
        .next()
        .map(|(_, name)| name.into_owned())
}
