//! Workflow error types.

use recon_client::ServiceError;
use recon_model::MappingError;
use thiserror::Error;

/// Errors returned by workflow actions.
///
/// Every error is also recorded in the workflow's error slot, so callers
/// that only render state may ignore the return value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// A local precondition did not hold. The state is unchanged.
    #[error("{0}")]
    Validation(String),

    /// Another service call is still outstanding.
    #[error("another operation is still running")]
    Busy,

    /// The session could not start because the user is signed out.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The outstanding call was cancelled before its result arrived.
    #[error("the operation was cancelled")]
    Cancelled,

    /// A mapping edit was rejected.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// The remote service reported a failure.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl WorkflowError {
    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Message shown in the error slot.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Busy => "Please wait for the current operation to finish.".to_string(),
            Self::NotAuthenticated => "Sign in to start a reconciliation.".to_string(),
            Self::Cancelled => "The operation was cancelled.".to_string(),
            Self::Mapping(err) => {
                let text = err.to_string();
                let mut chars = text.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => text,
                }
            }
            Self::Service(err) => err.user_message(),
        }
    }
}

/// Result type for workflow actions.
pub type Result<T> = std::result::Result<T, WorkflowError>;
