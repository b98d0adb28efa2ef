//! Error types for the reconciliation model.

use std::path::PathBuf;
use thiserror::Error;

use crate::document::DocumentSide;

/// Errors from editing a mapping set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// Source column is already mapped by another row.
    #[error("column '{column}' is already mapped to '{target}'")]
    ColumnAlreadyUsed { column: String, target: String },

    /// Column was not discovered in the document for that side.
    #[error("'{column}' is not a column of the {side} document")]
    UnknownColumn { column: String, side: DocumentSide },
}

/// Errors from loading a document from disk.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// File could not be read.
    #[error("failed to read document {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Path has no usable file name.
    #[error("document path has no file name: {path}")]
    NoFileName { path: PathBuf },
}
