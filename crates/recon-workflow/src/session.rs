//! Async driver that runs a workflow against a service.

use recon_client::{ExportedDocument, ReconcileService, SaveRequest};
use recon_model::{DocumentHandle, DocumentSide, WorkflowStep};

use crate::auth::Authenticator;
use crate::error::{Result, WorkflowError};
use crate::pending::{Completion, PendingRequest, ServiceCall, Transition};
use crate::workflow::Workflow;

/// A workflow bound to a service implementation.
///
/// Network actions run the call and apply its outcome before returning, so
/// at most one call is in flight. Dropping one of the returned futures
/// before it finishes leaves the workflow busy until [`Workflow::reset`].
pub struct Session<S> {
    service: S,
    workflow: Workflow,
}

impl<S: ReconcileService> Session<S> {
    /// Start a session. Refused while the user is signed out.
    pub fn start(service: S, auth: &impl Authenticator) -> Result<Self> {
        Ok(Self {
            service,
            workflow: Workflow::start(auth)?,
        })
    }

    /// Workflow state.
    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// Workflow state, for local actions (mapping edits, back, reset).
    pub fn workflow_mut(&mut self) -> &mut Workflow {
        &mut self.workflow
    }

    /// Underlying service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Choose the document for a side.
    pub fn select_document(&mut self, side: DocumentSide, document: DocumentHandle) -> Result<()> {
        self.workflow.select_document(side, document)
    }

    /// Move forward, running discovery or comparison when needed.
    pub async fn advance(&mut self) -> Result<WorkflowStep> {
        if let Transition::Pending(request) = self.workflow.advance()? {
            self.run(request).await?;
        }
        Ok(self.workflow.step())
    }

    /// Save the current result; returns the service id.
    pub async fn save(&mut self, name: &str) -> Result<String> {
        let request = self.workflow.begin_save(name)?;
        let completion = self.run(request).await?;
        self.applied(completion)?;
        match self.workflow.saved_id().map(str::to_string) {
            Some(id) => Ok(id),
            None => self.workflow.fail(WorkflowError::Cancelled),
        }
    }

    /// Delete the saved result. The deletion must have been requested with
    /// [`Workflow::request_delete`].
    pub async fn confirm_delete(&mut self) -> Result<()> {
        let request = self.workflow.confirm_delete()?;
        let completion = self.run(request).await?;
        self.applied(completion).map(|_| ())
    }

    /// Export the current result.
    pub async fn export(&mut self) -> Result<ExportedDocument> {
        let request = self.workflow.begin_export()?;
        let completion = self.run(request).await?;
        match self.applied(completion)? {
            Some(document) => Ok(document),
            None => self.workflow.fail(WorkflowError::Cancelled),
        }
    }

    /// Value of an applied completion. A discarded one is reported as
    /// [`WorkflowError::Cancelled`] through the error slot.
    fn applied<T>(&mut self, completion: Completion<T>) -> Result<T> {
        match completion {
            Completion::Applied(value) => Ok(value),
            Completion::Discarded => self.workflow.fail(WorkflowError::Cancelled),
        }
    }

    /// Perform one pending call and hand its outcome back.
    pub async fn run(
        &mut self,
        request: PendingRequest,
    ) -> Result<Completion<Option<ExportedDocument>>> {
        let ticket = request.ticket();
        tracing::debug!(ticket = %ticket, operation = %request.operation(), "Running service call");

        let completion = match request.into_call() {
            ServiceCall::DiscoverColumns { document, .. } => {
                let outcome = self.service.discover_columns(&document).await;
                self.workflow.complete_discovery(ticket, outcome)?
            }
            ServiceCall::Compare {
                source,
                target,
                mappings,
            } => {
                let outcome = self.service.compare(&source, &target, &mappings).await;
                self.workflow.complete_comparison(ticket, outcome)?
            }
            ServiceCall::Save {
                name,
                mappings,
                result,
            } => {
                let outcome = self
                    .service
                    .save(&SaveRequest::new(&name, &mappings, &result))
                    .await;
                self.workflow.complete_save(ticket, outcome)?.map(|_| ())
            }
            ServiceCall::Delete { id } => {
                let outcome = self.service.delete(&id).await;
                self.workflow.complete_delete(ticket, outcome)?
            }
            ServiceCall::Export { result } => {
                let outcome = self.service.export(&result).await;
                return Ok(self.workflow.complete_export(ticket, outcome)?.map(Some));
            }
        };
        Ok(completion.map(|()| None))
    }
}

#[cfg(test)]
mod tests {
    use recon_client::{SaveRequest, ServiceError};
    use recon_model::{Column, ComparisonResult, MappingEntry};

    use super::*;

    struct Offline;

    fn offline<T>() -> recon_client::Result<T> {
        Err(ServiceError::Client("offline".to_string()))
    }

    impl ReconcileService for Offline {
        async fn discover_columns(
            &self,
            _document: &DocumentHandle,
        ) -> recon_client::Result<Vec<Column>> {
            offline()
        }

        async fn compare(
            &self,
            _source: &DocumentHandle,
            _target: &DocumentHandle,
            _mappings: &[MappingEntry],
        ) -> recon_client::Result<ComparisonResult> {
            offline()
        }

        async fn save(&self, _request: &SaveRequest<'_>) -> recon_client::Result<String> {
            offline()
        }

        async fn delete(&self, _id: &str) -> recon_client::Result<()> {
            offline()
        }

        async fn export(&self, _result: &ComparisonResult) -> recon_client::Result<ExportedDocument> {
            offline()
        }
    }

    struct SignedIn;

    impl Authenticator for SignedIn {
        fn is_authenticated(&self) -> bool {
            true
        }

        fn sign_out(&mut self) {}
    }

    #[test]
    fn test_discarded_completion_records_cancellation() {
        let mut session = Session::start(Offline, &SignedIn).unwrap();
        let err = session.applied(Completion::<()>::Discarded).unwrap_err();
        assert_eq!(err, WorkflowError::Cancelled);
        assert_eq!(
            session.workflow().error_message(),
            Some("The operation was cancelled.")
        );
    }

    #[test]
    fn test_applied_completion_passes_value_through() {
        let mut session = Session::start(Offline, &SignedIn).unwrap();
        assert_eq!(session.applied(Completion::Applied(7)), Ok(7));
        assert!(session.workflow().error_message().is_none());
    }
}
