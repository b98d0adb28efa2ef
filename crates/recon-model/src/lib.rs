//! Data model for the document reconciliation workflow.
//!
//! Everything the workflow owns for one session lives here:
//!
//! - [`DocumentHandle`]: a user-supplied file and its declared name
//! - [`MappingSet`]: source/target column correspondences with optional
//!   per-pair instructions
//! - [`ComparisonResult`]: the classified outcome returned by the service
//! - [`SavedRecord`]: a result persisted by the service
//! - [`WorkflowStep`]: the four steps of the wizard
//!
//! The model performs no network I/O. Wire field names follow the
//! service contract (`sourceColumn`, `missingFromSource`, ...).

#![deny(unsafe_code)]

pub mod document;
pub mod error;
pub mod mapping;
pub mod result;
pub mod step;

pub use document::{DocumentHandle, DocumentSide};
pub use error::{DocumentError, MappingError};
pub use mapping::{DEFAULT_SEED_ROWS, MappingEntry, MappingSet};
pub use result::{
    BreakdownSlice, ComparisonResult, ResultCategory, ResultCounts, SavedRecord,
};
pub use step::WorkflowStep;

/// A column name as reported by the remote service.
pub type Column = String;
