//! Error types for calls to the reconciliation service.

use thiserror::Error;

/// Errors that can occur while talking to the remote service.
///
/// Every remote operation has its own failure variant; transport errors
/// (connection refused, timeout) are reported through the variant of the
/// operation that was running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ServiceError {
    /// HTTP client could not be created.
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Column discovery was rejected or could not be performed.
    #[error("column discovery failed for {document}: {reason}")]
    DiscoveryFailed {
        /// Declared name of the document.
        document: String,
        /// Service-reported message, or a generic reason.
        reason: String,
    },

    /// Discovery succeeded but the document has no columns.
    #[error("no columns found in {document}")]
    EmptyDocument {
        /// Declared name of the document.
        document: String,
    },

    /// The comparison request failed.
    #[error("comparison failed: {reason}")]
    ComparisonFailed {
        /// Service-reported message, or the HTTP status.
        reason: String,
    },

    /// The comparison response lacks the classification fields.
    #[error("malformed comparison result: {reason}")]
    MalformedResult {
        /// What was wrong with the response.
        reason: String,
    },

    /// Saving the result failed.
    #[error("save failed: {reason}")]
    SaveFailed {
        /// Service-reported message, or the HTTP status.
        reason: String,
    },

    /// Deleting a saved result failed.
    #[error("delete failed: {reason}")]
    DeleteFailed {
        /// Service-reported message, or the HTTP status.
        reason: String,
    },

    /// Exporting the result failed.
    #[error("export failed: {reason}")]
    ExportFailed {
        /// Service-reported message, or the HTTP status.
        reason: String,
    },
}

impl ServiceError {
    /// Returns a user-friendly message suitable for display in the UI.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Client(_) => {
                "Could not prepare the connection to the reconciliation service.".to_string()
            }
            Self::DiscoveryFailed { reason, .. } => {
                format!("Could not analyze the document columns: {reason}")
            }
            Self::EmptyDocument { document } => {
                format!("No columns were found in '{document}'. Check the file format.")
            }
            Self::ComparisonFailed { reason } => format!("The comparison failed: {reason}"),
            Self::MalformedResult { .. } => {
                "The service returned an incomplete comparison result.".to_string()
            }
            Self::SaveFailed { reason } => format!("Could not save the comparison: {reason}"),
            Self::DeleteFailed { reason } => {
                format!("Could not delete the saved comparison: {reason}")
            }
            Self::ExportFailed { reason } => format!("Could not export the report: {reason}"),
        }
    }

    /// Returns whether repeating the same action may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DiscoveryFailed { .. }
                | Self::ComparisonFailed { .. }
                | Self::SaveFailed { .. }
                | Self::DeleteFailed { .. }
                | Self::ExportFailed { .. }
        )
    }
}

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
