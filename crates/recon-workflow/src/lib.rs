//! Reconciliation workflow.
//!
//! Drives one reconciliation session through four steps:
//!
//! 1. select the source document and discover its columns
//! 2. select the target document and discover its columns
//! 3. map source columns to target columns
//! 4. review the comparison, then save, delete or export it
//!
//! [`Workflow`] is the synchronous state machine. Every service call is
//! issued as a [`PendingRequest`] with a [`Ticket`]; only the outcome for the
//! outstanding ticket is applied. [`Session`] runs those calls against a
//! [`ReconcileService`](recon_client::ReconcileService).

pub mod auth;
pub mod error;
pub mod pending;
pub mod session;
pub mod workflow;

pub use auth::Authenticator;
pub use error::{Result, WorkflowError};
pub use pending::{Completion, Operation, PendingRequest, ServiceCall, Ticket, Transition};
pub use session::Session;
pub use workflow::{Feedback, Workflow};
