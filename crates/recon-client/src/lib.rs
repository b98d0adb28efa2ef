//! HTTP adapter for the remote reconciliation service.
//!
//! The service owns all document parsing and matching. This crate only
//! knows its request/response contract:
//!
//! - column discovery: one document in, ordered column names out
//! - comparison: both documents plus the mapping rows in, a
//!   [`ComparisonResult`] out
//! - save / delete of a result, keyed by a service-assigned id
//! - export of a result as a binary report
//!
//! [`ReconcileService`] is the seam the workflow depends on;
//! [`ReconClient`] implements it over `reqwest`.

#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod request;
pub mod response;

use std::future::Future;

use recon_model::{Column, ComparisonResult, DocumentHandle, MappingEntry};

pub use client::ReconClient;
pub use config::{Endpoints, ServiceConfig};
pub use error::{Result, ServiceError};
pub use export::ExportedDocument;
pub use request::SaveRequest;

/// Request/response contract of the reconciliation service.
///
/// Every method is a single call with no retries. Implementations must not
/// keep workflow state.
pub trait ReconcileService {
    /// List the header columns of one document, in document order.
    ///
    /// Fails with [`ServiceError::EmptyDocument`] when the service finds
    /// no columns.
    fn discover_columns(
        &self,
        document: &DocumentHandle,
    ) -> impl Future<Output = Result<Vec<Column>>> + Send;

    /// Compare two documents under the given (complete) mapping rows.
    fn compare(
        &self,
        source: &DocumentHandle,
        target: &DocumentHandle,
        mappings: &[MappingEntry],
    ) -> impl Future<Output = Result<ComparisonResult>> + Send;

    /// Persist a result; returns the service-assigned id.
    fn save(&self, request: &SaveRequest<'_>) -> impl Future<Output = Result<String>> + Send;

    /// Delete a saved result.
    fn delete(&self, id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Render a result as a downloadable report.
    fn export(
        &self,
        result: &ComparisonResult,
    ) -> impl Future<Output = Result<ExportedDocument>> + Send;
}
