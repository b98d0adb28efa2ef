//! Reconciliation workflow state machine.
//!
//! The workflow owns every entity of one session: both documents, their
//! discovered columns, the mapping set, the comparison result and the saved
//! record. It never talks to the network. Actions that need the service
//! return a [`PendingRequest`]; the outcome comes back through the matching
//! `complete_*` method.

use chrono::Utc;
use recon_client::{ExportedDocument, ServiceError};
use recon_model::{
    Column, ComparisonResult, DocumentHandle, DocumentSide, MappingError, MappingSet,
    SavedRecord, WorkflowStep,
};

use crate::auth::Authenticator;
use crate::error::{Result, WorkflowError};
use crate::pending::{Completion, Operation, PendingRequest, ServiceCall, Ticket, Transition};

// =============================================================================
// FEEDBACK
// =============================================================================

/// User-visible message slots.
///
/// Both slots are cleared by the next state-changing action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feedback {
    /// Last failure.
    pub error: Option<String>,
    /// Last confirmation.
    pub success: Option<String>,
}

impl Feedback {
    fn clear(&mut self) {
        *self = Self::default();
    }
}

// =============================================================================
// WORKFLOW
// =============================================================================

/// Columns discovered for one specific document.
#[derive(Debug, Clone)]
struct DiscoveredColumns {
    fingerprint: String,
    columns: Vec<Column>,
}

#[derive(Debug, Clone, Copy)]
struct Outstanding {
    ticket: Ticket,
    operation: Operation,
}

/// State of one reconciliation session.
#[derive(Debug, Clone)]
pub struct Workflow {
    step: WorkflowStep,
    source: Option<DocumentHandle>,
    target: Option<DocumentHandle>,
    source_columns: Option<DiscoveredColumns>,
    target_columns: Option<DiscoveredColumns>,
    mapping: MappingSet,
    result: Option<ComparisonResult>,
    saved: Option<SavedRecord>,
    outstanding: Option<Outstanding>,
    last_ticket: Option<Ticket>,
    save_name: Option<String>,
    delete_requested: bool,
    feedback: Feedback,
}

impl Workflow {
    /// Start a session. Refused while the user is signed out.
    pub fn start(auth: &impl Authenticator) -> Result<Self> {
        if !auth.is_authenticated() {
            tracing::warn!("Refusing to start a reconciliation while signed out");
            return Err(WorkflowError::NotAuthenticated);
        }
        tracing::info!("Reconciliation session started");
        Ok(Self::blank())
    }

    fn blank() -> Self {
        Self {
            step: WorkflowStep::default(),
            source: None,
            target: None,
            source_columns: None,
            target_columns: None,
            mapping: MappingSet::new(),
            result: None,
            saved: None,
            outstanding: None,
            last_ticket: None,
            save_name: None,
            delete_requested: false,
            feedback: Feedback::default(),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Active step.
    pub fn step(&self) -> WorkflowStep {
        self.step
    }

    /// Selected document for a side.
    pub fn document(&self, side: DocumentSide) -> Option<&DocumentHandle> {
        match side {
            DocumentSide::Source => self.source.as_ref(),
            DocumentSide::Target => self.target.as_ref(),
        }
    }

    /// Columns discovered for the selected document of a side.
    ///
    /// Empty until discovery for the current document succeeded.
    pub fn columns(&self, side: DocumentSide) -> &[Column] {
        self.discovered(side).unwrap_or_default()
    }

    /// Mapping rows, drafts included.
    pub fn mapping(&self) -> &MappingSet {
        &self.mapping
    }

    /// Latest comparison result.
    pub fn result(&self) -> Option<&ComparisonResult> {
        self.result.as_ref()
    }

    /// Record of the saved result, if the current result was saved.
    pub fn saved_record(&self) -> Option<&SavedRecord> {
        self.saved.as_ref()
    }

    /// Service id of the saved result.
    pub fn saved_id(&self) -> Option<&str> {
        self.saved.as_ref().map(|record| record.id.as_str())
    }

    /// True while a service call is outstanding.
    pub fn is_busy(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Kind of the outstanding call.
    pub fn outstanding_operation(&self) -> Option<Operation> {
        self.outstanding.map(|o| o.operation)
    }

    /// Message slots.
    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    /// Current error message.
    pub fn error_message(&self) -> Option<&str> {
        self.feedback.error.as_deref()
    }

    /// Current confirmation message.
    pub fn success_message(&self) -> Option<&str> {
        self.feedback.success.as_deref()
    }

    /// True while the delete confirmation is open.
    pub fn is_delete_requested(&self) -> bool {
        self.delete_requested
    }

    /// The Results step offers save (and not delete).
    pub fn can_save(&self) -> bool {
        self.step == WorkflowStep::Results && self.result.is_some() && self.saved.is_none()
    }

    /// The Results step offers delete (and not save).
    pub fn can_delete(&self) -> bool {
        self.step == WorkflowStep::Results && self.saved.is_some()
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Choose the document for a side. Only valid on that side's upload step.
    ///
    /// Re-selecting the same contents keeps its columns, even under another
    /// file name; only the displayed handle is swapped. A different
    /// document clears that side's columns and cancels a discovery still
    /// running for the previous one.
    pub fn select_document(&mut self, side: DocumentSide, document: DocumentHandle) -> Result<()> {
        if self.step.upload_side() != Some(side) {
            return self.fail(WorkflowError::validation(format!(
                "The {side} document can only be chosen on its upload step."
            )));
        }
        self.feedback.clear();

        if self
            .document(side)
            .is_some_and(|current| current.is_same_document(&document))
        {
            tracing::debug!(%side, document = document.name(), "Same document selected again");
            *self.document_slot(side) = Some(document);
            return Ok(());
        }

        if let Some(outstanding) = self
            .outstanding
            .filter(|o| o.operation == Operation::Discovery(side))
        {
            tracing::debug!(
                ticket = %outstanding.ticket,
                %side,
                "Cancelling discovery for the replaced document"
            );
            self.outstanding = None;
        }

        tracing::info!(
            %side,
            document = document.name(),
            bytes = document.len(),
            fingerprint = document.fingerprint(),
            "Document selected"
        );
        *self.columns_slot(side) = None;
        *self.document_slot(side) = Some(document);
        Ok(())
    }

    /// Move forward from the active step.
    ///
    /// Upload steps need the document's columns: when they are already known
    /// the step changes at once, otherwise a discovery call is issued. On
    /// Mapping a comparison call is issued.
    pub fn advance(&mut self) -> Result<Transition> {
        self.ensure_idle()?;
        self.feedback.clear();
        match self.step {
            WorkflowStep::SourceUpload => self.advance_upload(DocumentSide::Source),
            WorkflowStep::TargetUpload => self.advance_upload(DocumentSide::Target),
            WorkflowStep::Mapping => self.begin_comparison(),
            WorkflowStep::Results => self.fail(WorkflowError::validation(
                "The comparison is complete. Start over to reconcile other documents.",
            )),
        }
    }

    fn advance_upload(&mut self, side: DocumentSide) -> Result<Transition> {
        let Some(document) = self.document(side).cloned() else {
            return self.fail(WorkflowError::validation(format!(
                "Select the {side} document first."
            )));
        };
        if self.discovered(side).is_some() {
            self.after_discovery(side);
            return Ok(Transition::Moved(self.step));
        }
        let request = self.issue(ServiceCall::DiscoverColumns { side, document });
        Ok(Transition::Pending(request))
    }

    fn begin_comparison(&mut self) -> Result<Transition> {
        if !self.mapping.has_active() {
            return self.fail(WorkflowError::validation(
                "Map at least one source column to a target column.",
            ));
        }
        let (Some(source), Some(target)) = (self.source.clone(), self.target.clone()) else {
            return self.fail(WorkflowError::validation("Both documents are required."));
        };
        let mappings = self.mapping.active_entries();
        tracing::info!(mappings = mappings.len(), "Starting comparison");
        let request = self.issue(ServiceCall::Compare {
            source,
            target,
            mappings,
        });
        Ok(Transition::Pending(request))
    }

    /// Go back one step. Discovered columns and the mapping are kept.
    pub fn back(&mut self) -> Result<WorkflowStep> {
        self.ensure_idle()?;
        let Some(previous) = self.step.previous() else {
            return self.fail(WorkflowError::validation("Already at the first step."));
        };
        self.feedback.clear();
        self.delete_requested = false;
        self.move_to(previous);
        Ok(previous)
    }

    /// Clear the session and return to the first step.
    ///
    /// Allowed while busy; the outstanding call is cancelled and its late
    /// outcome will be discarded.
    pub fn reset(&mut self) {
        if let Some(outstanding) = self.outstanding {
            tracing::debug!(
                ticket = %outstanding.ticket,
                operation = %outstanding.operation,
                "Cancelling outstanding call on reset"
            );
        }
        let last_ticket = self.last_ticket;
        *self = Self::blank();
        self.last_ticket = last_ticket;
        tracing::info!("Workflow reset");
    }

    /// Reset and sign the user out.
    pub fn end_session(&mut self, auth: &mut impl Authenticator) {
        self.reset();
        auth.sign_out();
        tracing::info!("Reconciliation session ended");
    }

    // -------------------------------------------------------------------------
    // Mapping edits
    // -------------------------------------------------------------------------

    /// Append an empty draft row.
    pub fn add_entry(&mut self) -> Result<()> {
        self.ensure_editable()?;
        self.mapping.add_entry();
        Ok(())
    }

    /// Remove a row. Out-of-range indexes are ignored.
    pub fn remove_entry(&mut self, index: usize) -> Result<()> {
        self.ensure_editable()?;
        self.mapping.remove_entry(index);
        Ok(())
    }

    /// Remove every row, seeded drafts included.
    pub fn clear_mapping(&mut self) -> Result<()> {
        self.ensure_editable()?;
        self.mapping.clear();
        Ok(())
    }

    /// Upsert the row for a source column; an empty target removes it.
    pub fn set_pair(&mut self, source_column: &str, target_column: &str) -> Result<()> {
        self.ensure_editable()?;
        self.ensure_known(DocumentSide::Source, source_column)?;
        self.ensure_known(DocumentSide::Target, target_column)?;
        self.mapping.set_pair(source_column, target_column);
        Ok(())
    }

    /// Attach guidance text to a row.
    pub fn set_instruction(&mut self, index: usize, text: &str) -> Result<()> {
        self.ensure_editable()?;
        self.mapping.set_instruction(index, text);
        Ok(())
    }

    /// Change the source column of one row.
    pub fn set_source(&mut self, index: usize, column: &str) -> Result<()> {
        self.ensure_editable()?;
        self.ensure_known(DocumentSide::Source, column)?;
        if let Err(err) = self.mapping.set_source(index, column) {
            return self.fail(err.into());
        }
        Ok(())
    }

    /// Change the target column of one row.
    pub fn set_target(&mut self, index: usize, column: &str) -> Result<()> {
        self.ensure_editable()?;
        self.ensure_known(DocumentSide::Target, column)?;
        self.mapping.set_target(index, column);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Result actions
    // -------------------------------------------------------------------------

    /// Issue a save of the current result under `name`.
    pub fn begin_save(&mut self, name: &str) -> Result<PendingRequest> {
        self.ensure_idle()?;
        self.feedback.clear();
        let result = self.current_result()?;
        if self.saved.is_some() {
            return self.fail(WorkflowError::validation(
                "This comparison is already saved.",
            ));
        }
        let name = name.trim();
        if name.is_empty() {
            return self.fail(WorkflowError::validation(
                "Enter a name for the comparison.",
            ));
        }
        let mappings = self.mapping.active_entries();
        self.save_name = Some(name.to_string());
        Ok(self.issue(ServiceCall::Save {
            name: name.to_string(),
            mappings,
            result,
        }))
    }

    /// Open the delete confirmation for the saved result.
    pub fn request_delete(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.feedback.clear();
        if !self.can_delete() {
            return self.fail(WorkflowError::validation(
                "There is no saved comparison to delete.",
            ));
        }
        self.delete_requested = true;
        Ok(())
    }

    /// Close the delete confirmation without deleting.
    pub fn cancel_delete(&mut self) {
        self.delete_requested = false;
    }

    /// Issue the delete after the user confirmed it.
    pub fn confirm_delete(&mut self) -> Result<PendingRequest> {
        self.ensure_idle()?;
        self.feedback.clear();
        if !self.delete_requested {
            return self.fail(WorkflowError::validation("Confirm the deletion first."));
        }
        self.delete_requested = false;
        let Some(id) = self.saved_id().map(str::to_string) else {
            return self.fail(WorkflowError::validation(
                "There is no saved comparison to delete.",
            ));
        };
        Ok(self.issue(ServiceCall::Delete { id }))
    }

    /// Issue an export of the current result.
    pub fn begin_export(&mut self) -> Result<PendingRequest> {
        self.ensure_idle()?;
        self.feedback.clear();
        let result = self.current_result()?;
        Ok(self.issue(ServiceCall::Export { result }))
    }

    // -------------------------------------------------------------------------
    // Completions
    // -------------------------------------------------------------------------

    /// Apply the outcome of a column discovery.
    ///
    /// On success, mapping rows naming columns the document no longer has
    /// are dropped and the workflow moves to the next step. An empty column
    /// list is reported as [`ServiceError::EmptyDocument`] and the step is
    /// unchanged.
    pub fn complete_discovery(
        &mut self,
        ticket: Ticket,
        outcome: std::result::Result<Vec<Column>, ServiceError>,
    ) -> Result<Completion> {
        let Some(Operation::Discovery(side)) =
            self.settle(ticket, |op| matches!(op, Operation::Discovery(_)))
        else {
            return Ok(Completion::Discarded);
        };
        let Some(document) = self.document(side) else {
            return Ok(Completion::Discarded);
        };
        let name = document.name().to_string();
        let fingerprint = document.fingerprint().to_string();

        let columns = match outcome {
            Ok(columns) if columns.is_empty() => {
                return self.fail(ServiceError::EmptyDocument { document: name }.into());
            }
            Ok(columns) => columns,
            Err(err) => return self.fail(err.into()),
        };

        tracing::info!(%side, document = %name, columns = columns.len(), "Columns discovered");
        let dropped = self.mapping.retain_columns(side, &columns);
        if dropped > 0 {
            tracing::info!(%side, dropped, "Dropped mapping rows for missing columns");
        }
        *self.columns_slot(side) = Some(DiscoveredColumns {
            fingerprint,
            columns,
        });
        self.after_discovery(side);
        Ok(Completion::Applied(()))
    }

    /// Apply the outcome of a comparison; success moves to Results.
    pub fn complete_comparison(
        &mut self,
        ticket: Ticket,
        outcome: std::result::Result<ComparisonResult, ServiceError>,
    ) -> Result<Completion> {
        if self
            .settle(ticket, |op| op == Operation::Comparison)
            .is_none()
        {
            return Ok(Completion::Discarded);
        }
        let result = match outcome {
            Ok(result) => result,
            Err(err) => return self.fail(err.into()),
        };

        let counts = result.counts();
        tracing::info!(
            matching = counts.matching,
            missing_from_source = counts.missing_from_source,
            missing_from_target = counts.missing_from_target,
            unknown_terms = counts.unknown_terms,
            "Comparison result received"
        );
        self.result = Some(result);
        self.saved = None;
        self.delete_requested = false;
        self.move_to(WorkflowStep::Results);
        Ok(Completion::Applied(()))
    }

    /// Apply the outcome of a save; success holds the returned id.
    pub fn complete_save(
        &mut self,
        ticket: Ticket,
        outcome: std::result::Result<String, ServiceError>,
    ) -> Result<Completion<String>> {
        if self.settle(ticket, |op| op == Operation::Save).is_none() {
            return Ok(Completion::Discarded);
        }
        let name = self.save_name.take().unwrap_or_default();
        let id = match outcome {
            Ok(id) => id,
            Err(err) => return self.fail(err.into()),
        };

        tracing::info!(id = %id, "Comparison saved");
        self.saved = Some(SavedRecord {
            id: id.clone(),
            name,
            mappings: self.mapping.active_entries(),
            result: self.result.clone().unwrap_or_default(),
            created_at: Utc::now(),
        });
        self.feedback.success = Some("Comparison saved.".to_string());
        Ok(Completion::Applied(id))
    }

    /// Apply the outcome of a delete; success allows saving again.
    pub fn complete_delete(
        &mut self,
        ticket: Ticket,
        outcome: std::result::Result<(), ServiceError>,
    ) -> Result<Completion> {
        if self.settle(ticket, |op| op == Operation::Delete).is_none() {
            return Ok(Completion::Discarded);
        }
        if let Err(err) = outcome {
            return self.fail(err.into());
        }

        if let Some(record) = self.saved.take() {
            tracing::info!(id = %record.id, "Saved comparison deleted");
        }
        self.feedback.success = Some("Saved comparison deleted.".to_string());
        Ok(Completion::Applied(()))
    }

    /// Apply the outcome of an export. The document is handed back to the
    /// caller; the workflow state is unchanged.
    pub fn complete_export(
        &mut self,
        ticket: Ticket,
        outcome: std::result::Result<ExportedDocument, ServiceError>,
    ) -> Result<Completion<ExportedDocument>> {
        if self.settle(ticket, |op| op == Operation::Export).is_none() {
            return Ok(Completion::Discarded);
        }
        let document = match outcome {
            Ok(document) => document,
            Err(err) => return self.fail(err.into()),
        };
        self.feedback.success = Some(format!("Report ready: {}", document.file_name));
        Ok(Completion::Applied(document))
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn document_slot(&mut self, side: DocumentSide) -> &mut Option<DocumentHandle> {
        match side {
            DocumentSide::Source => &mut self.source,
            DocumentSide::Target => &mut self.target,
        }
    }

    fn columns_slot(&mut self, side: DocumentSide) -> &mut Option<DiscoveredColumns> {
        match side {
            DocumentSide::Source => &mut self.source_columns,
            DocumentSide::Target => &mut self.target_columns,
        }
    }

    fn discovered(&self, side: DocumentSide) -> Option<&[Column]> {
        let document = self.document(side)?;
        let discovered = match side {
            DocumentSide::Source => self.source_columns.as_ref(),
            DocumentSide::Target => self.target_columns.as_ref(),
        }?;
        (discovered.fingerprint == document.fingerprint()).then_some(discovered.columns.as_slice())
    }

    fn after_discovery(&mut self, side: DocumentSide) {
        match side {
            DocumentSide::Source => self.move_to(WorkflowStep::TargetUpload),
            DocumentSide::Target => {
                if self.mapping.is_empty() {
                    self.mapping = MappingSet::seeded(
                        self.columns(DocumentSide::Source),
                        self.columns(DocumentSide::Target),
                    );
                    tracing::debug!(rows = self.mapping.len(), "Mapping seeded");
                }
                self.move_to(WorkflowStep::Mapping);
            }
        }
    }

    fn move_to(&mut self, step: WorkflowStep) {
        if step != self.step {
            tracing::info!(from = %self.step, to = %step, "Workflow step changed");
        }
        self.step = step;
    }

    fn issue(&mut self, call: ServiceCall) -> PendingRequest {
        let ticket = self.last_ticket.map_or_else(Ticket::first, Ticket::following);
        let operation = call.operation();
        self.last_ticket = Some(ticket);
        self.outstanding = Some(Outstanding { ticket, operation });
        tracing::debug!(ticket = %ticket, %operation, "Service call issued");
        PendingRequest::new(ticket, call)
    }

    /// Release the outstanding call if `ticket` is still the live one.
    fn settle(&mut self, ticket: Ticket, expected: impl Fn(Operation) -> bool) -> Option<Operation> {
        match self.outstanding {
            Some(outstanding) if outstanding.ticket == ticket && expected(outstanding.operation) => {
                self.outstanding = None;
                Some(outstanding.operation)
            }
            _ => {
                tracing::debug!(ticket = %ticket, "Discarding response for a stale ticket");
                None
            }
        }
    }

    fn current_result(&mut self) -> Result<ComparisonResult> {
        if self.step == WorkflowStep::Results
            && let Some(result) = &self.result
        {
            return Ok(result.clone());
        }
        self.fail(WorkflowError::validation("Run a comparison first."))
    }

    fn ensure_idle(&mut self) -> Result<()> {
        if self.outstanding.is_some() {
            return self.fail(WorkflowError::Busy);
        }
        Ok(())
    }

    fn ensure_editable(&mut self) -> Result<()> {
        self.ensure_idle()?;
        if self.step != WorkflowStep::Mapping {
            return self.fail(WorkflowError::validation(
                "Mappings can only be edited on the mapping step.",
            ));
        }
        self.feedback.clear();
        Ok(())
    }

    fn ensure_known(&mut self, side: DocumentSide, column: &str) -> Result<()> {
        if column.is_empty() || self.columns(side).iter().any(|c| c == column) {
            return Ok(());
        }
        self.fail(
            MappingError::UnknownColumn {
                column: column.to_string(),
                side,
            }
            .into(),
        )
    }

    /// Record `err` in the error slot and return it.
    pub(crate) fn fail<T>(&mut self, err: WorkflowError) -> Result<T> {
        match &err {
            WorkflowError::Service(service) => {
                tracing::warn!(step = %self.step, error = %service, "Service call failed");
            }
            other => tracing::debug!(step = %self.step, error = %other, "Action refused"),
        }
        self.feedback = Feedback {
            error: Some(err.user_message()),
            success: None,
        };
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SignedIn(bool);

    impl Authenticator for SignedIn {
        fn is_authenticated(&self) -> bool {
            self.0
        }

        fn sign_out(&mut self) {
            self.0 = false;
        }
    }

    fn cols(names: &[&str]) -> Vec<Column> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn doc(name: &str, body: &str) -> DocumentHandle {
        DocumentHandle::from_bytes(name, body.as_bytes().to_vec())
    }

    fn pending(transition: Transition) -> PendingRequest {
        match transition {
            Transition::Pending(request) => request,
            Transition::Moved(step) => panic!("expected a pending call, moved to {step}"),
        }
    }

    /// Workflow on the Mapping step with SKU/Qty and Code/Amount.
    fn at_mapping() -> Workflow {
        let mut wf = Workflow::start(&SignedIn(true)).unwrap();
        wf.select_document(DocumentSide::Source, doc("base.csv", "SKU,Qty"))
            .unwrap();
        let req = pending(wf.advance().unwrap());
        wf.complete_discovery(req.ticket(), Ok(cols(&["SKU", "Qty"])))
            .unwrap();
        wf.select_document(DocumentSide::Target, doc("audit.csv", "Code,Amount"))
            .unwrap();
        let req = pending(wf.advance().unwrap());
        wf.complete_discovery(req.ticket(), Ok(cols(&["Code", "Amount"])))
            .unwrap();
        assert_eq!(wf.step(), WorkflowStep::Mapping);
        wf
    }

    fn at_results() -> Workflow {
        let mut wf = at_mapping();
        wf.set_pair("SKU", "Code").unwrap();
        let req = pending(wf.advance().unwrap());
        wf.complete_comparison(
            req.ticket(),
            Ok(ComparisonResult {
                matching: vec!["SKU-1".to_string()],
                ..Default::default()
            }),
        )
        .unwrap();
        wf
    }

    #[test]
    fn test_start_requires_authentication() {
        let err = Workflow::start(&SignedIn(false)).unwrap_err();
        assert_eq!(err, WorkflowError::NotAuthenticated);
    }

    #[test]
    fn test_advance_without_document_is_validation() {
        let mut wf = Workflow::start(&SignedIn(true)).unwrap();
        let err = wf.advance().unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        assert_eq!(wf.step(), WorkflowStep::SourceUpload);
        assert_eq!(wf.error_message(), Some("Select the source document first."));
    }

    #[test]
    fn test_target_cannot_be_chosen_on_source_step() {
        let mut wf = Workflow::start(&SignedIn(true)).unwrap();
        let err = wf
            .select_document(DocumentSide::Target, doc("a.csv", "x"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        assert!(wf.document(DocumentSide::Target).is_none());
    }

    #[test]
    fn test_busy_refuses_navigation_and_edits() {
        let mut wf = at_mapping();
        wf.set_pair("SKU", "Code").unwrap();
        let req = pending(wf.advance().unwrap());
        assert!(wf.is_busy());
        assert_eq!(wf.outstanding_operation(), Some(Operation::Comparison));

        assert_eq!(wf.back().unwrap_err(), WorkflowError::Busy);
        assert_eq!(wf.add_entry().unwrap_err(), WorkflowError::Busy);
        assert!(matches!(wf.advance(), Err(WorkflowError::Busy)));
        assert!(wf.error_message().is_some());

        wf.complete_comparison(req.ticket(), Ok(ComparisonResult::default()))
            .unwrap();
        assert!(!wf.is_busy());
        assert_eq!(wf.step(), WorkflowStep::Results);
    }

    #[test]
    fn test_replacing_document_cancels_its_discovery() {
        let mut wf = Workflow::start(&SignedIn(true)).unwrap();
        wf.select_document(DocumentSide::Source, doc("a.csv", "A"))
            .unwrap();
        let first = pending(wf.advance().unwrap());
        wf.select_document(DocumentSide::Source, doc("b.csv", "B"))
            .unwrap();
        assert!(!wf.is_busy());

        let completion = wf
            .complete_discovery(first.ticket(), Ok(cols(&["A"])))
            .unwrap();
        assert_eq!(completion, Completion::Discarded);
        assert_eq!(wf.step(), WorkflowStep::SourceUpload);
        assert!(wf.columns(DocumentSide::Source).is_empty());

        let second = pending(wf.advance().unwrap());
        assert!(second.ticket() > first.ticket());
    }

    #[test]
    fn test_reselecting_same_document_keeps_columns() {
        let mut wf = at_mapping();
        wf.back().unwrap();
        wf.select_document(DocumentSide::Target, doc("audit.csv", "Code,Amount"))
            .unwrap();
        assert_eq!(wf.columns(DocumentSide::Target), cols(&["Code", "Amount"]));
        assert!(matches!(
            wf.advance().unwrap(),
            Transition::Moved(WorkflowStep::Mapping)
        ));
    }

    #[test]
    fn test_renamed_copy_keeps_columns() {
        let mut wf = Workflow::start(&SignedIn(true)).unwrap();
        wf.select_document(DocumentSide::Source, doc("a.csv", "SKU,Qty"))
            .unwrap();
        let req = pending(wf.advance().unwrap());
        wf.complete_discovery(req.ticket(), Ok(cols(&["SKU", "Qty"])))
            .unwrap();
        wf.back().unwrap();

        wf.select_document(DocumentSide::Source, doc("copy.csv", "SKU,Qty"))
            .unwrap();
        assert_eq!(wf.document(DocumentSide::Source).unwrap().name(), "copy.csv");
        assert_eq!(wf.columns(DocumentSide::Source), cols(&["SKU", "Qty"]));
        assert!(matches!(
            wf.advance().unwrap(),
            Transition::Moved(WorkflowStep::TargetUpload)
        ));
    }

    #[test]
    fn test_empty_discovery_keeps_step() {
        let mut wf = Workflow::start(&SignedIn(true)).unwrap();
        wf.select_document(DocumentSide::Source, doc("empty.csv", ""))
            .unwrap();
        let req = pending(wf.advance().unwrap());
        let err = wf.complete_discovery(req.ticket(), Ok(Vec::new())).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Service(ServiceError::EmptyDocument { .. })
        ));
        assert_eq!(wf.step(), WorkflowStep::SourceUpload);
        assert!(!wf.is_busy());
    }

    #[test]
    fn test_seed_on_entering_mapping() {
        let wf = at_mapping();
        assert_eq!(wf.mapping().len(), 2);
        assert!(!wf.mapping().has_active());
    }

    #[test]
    fn test_unknown_column_is_rejected() {
        let mut wf = at_mapping();
        let err = wf.set_pair("SKU", "Lote").unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Mapping(MappingError::UnknownColumn { .. })
        ));
        assert_eq!(wf.mapping().target_for("SKU"), None);
    }

    #[test]
    fn test_edits_only_on_mapping_step() {
        let mut wf = at_results();
        assert!(matches!(wf.add_entry(), Err(WorkflowError::Validation(_))));
    }

    #[test]
    fn test_save_requires_name() {
        let mut wf = at_results();
        assert!(wf.can_save());
        let err = wf.begin_save("   ").unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        assert!(!wf.is_busy());
    }

    #[test]
    fn test_save_then_delete_toggles_actions() {
        let mut wf = at_results();
        let req = wf.begin_save("October").unwrap();
        let id = wf.complete_save(req.ticket(), Ok("r-1".to_string())).unwrap();
        assert_eq!(id, Completion::Applied("r-1".to_string()));
        assert!(!wf.can_save());
        assert!(wf.can_delete());
        assert_eq!(wf.saved_record().map(|r| r.name.as_str()), Some("October"));
        assert_eq!(wf.success_message(), Some("Comparison saved."));

        assert!(matches!(wf.confirm_delete(), Err(WorkflowError::Validation(_))));
        wf.request_delete().unwrap();
        wf.cancel_delete();
        assert!(!wf.is_delete_requested());
        wf.request_delete().unwrap();
        let req = wf.confirm_delete().unwrap();
        wf.complete_delete(req.ticket(), Ok(())).unwrap();
        assert!(wf.can_save());
        assert!(!wf.can_delete());
    }

    #[test]
    fn test_failed_delete_keeps_record() {
        let mut wf = at_results();
        let req = wf.begin_save("x").unwrap();
        wf.complete_save(req.ticket(), Ok("r-1".to_string())).unwrap();
        wf.request_delete().unwrap();
        let req = wf.confirm_delete().unwrap();
        let err = wf
            .complete_delete(
                req.ticket(),
                Err(ServiceError::DeleteFailed {
                    reason: "forbidden".to_string(),
                }),
            )
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Service(_)));
        assert_eq!(wf.saved_id(), Some("r-1"));
        assert!(wf.error_message().is_some_and(|m| m.contains("forbidden")));
    }

    #[test]
    fn test_reset_while_busy_discards_late_outcome() {
        let mut wf = at_mapping();
        wf.set_pair("SKU", "Code").unwrap();
        let req = pending(wf.advance().unwrap());
        wf.reset();
        assert!(!wf.is_busy());

        let completion = wf
            .complete_comparison(req.ticket(), Ok(ComparisonResult::default()))
            .unwrap();
        assert_eq!(completion, Completion::Discarded);
        assert_eq!(wf.step(), WorkflowStep::SourceUpload);
        assert!(wf.result().is_none());
    }

    #[test]
    fn test_end_session_signs_out() {
        let mut auth = SignedIn(true);
        let mut wf = Workflow::start(&auth).unwrap();
        wf.end_session(&mut auth);
        assert!(!auth.is_authenticated());
        assert!(Workflow::start(&auth).is_err());
    }
}
