//! Outstanding service calls.
//!
//! A network-issuing action does not call the service itself. It returns a
//! [`PendingRequest`] carrying the inputs and a [`Ticket`]; the caller runs
//! the call and hands the outcome back with that ticket. Outcomes whose
//! ticket is no longer outstanding are dropped.

use std::fmt;

use recon_model::{ComparisonResult, DocumentHandle, DocumentSide, MappingEntry, WorkflowStep};

/// Identifier of one service call. Strictly increasing per workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub(crate) fn first() -> Self {
        Self(1)
    }

    pub(crate) fn following(self) -> Self {
        Self(self.0 + 1)
    }

    /// Numeric value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Discovery(DocumentSide),
    Comparison,
    Save,
    Delete,
    Export,
}

impl Operation {
    /// Get the display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Discovery(DocumentSide::Source) => "source column discovery",
            Self::Discovery(DocumentSide::Target) => "target column discovery",
            Self::Comparison => "comparison",
            Self::Save => "save",
            Self::Delete => "delete",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inputs of the call the caller must perform.
#[derive(Debug, Clone)]
pub enum ServiceCall {
    /// List the columns of one document.
    DiscoverColumns {
        side: DocumentSide,
        document: DocumentHandle,
    },
    /// Compare both documents under the active mapping rows.
    Compare {
        source: DocumentHandle,
        target: DocumentHandle,
        mappings: Vec<MappingEntry>,
    },
    /// Persist the current result.
    Save {
        name: String,
        mappings: Vec<MappingEntry>,
        result: ComparisonResult,
    },
    /// Delete the saved record.
    Delete { id: String },
    /// Render the current result as a report.
    Export { result: ComparisonResult },
}

impl ServiceCall {
    /// Kind of call.
    pub fn operation(&self) -> Operation {
        match self {
            Self::DiscoverColumns { side, .. } => Operation::Discovery(*side),
            Self::Compare { .. } => Operation::Comparison,
            Self::Save { .. } => Operation::Save,
            Self::Delete { .. } => Operation::Delete,
            Self::Export { .. } => Operation::Export,
        }
    }
}

/// A call the workflow is waiting on.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    ticket: Ticket,
    call: ServiceCall,
}

impl PendingRequest {
    pub(crate) fn new(ticket: Ticket, call: ServiceCall) -> Self {
        Self { ticket, call }
    }

    /// Ticket to hand back with the outcome.
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Call inputs.
    pub fn call(&self) -> &ServiceCall {
        &self.call
    }

    /// Take the call inputs.
    pub fn into_call(self) -> ServiceCall {
        self.call
    }

    /// Kind of call.
    pub fn operation(&self) -> Operation {
        self.call.operation()
    }
}

/// Outcome of a forward action.
#[derive(Debug, Clone)]
pub enum Transition {
    /// The step changed without a service call.
    Moved(WorkflowStep),
    /// A service call must run before the step can change.
    Pending(PendingRequest),
}

/// Whether a completed call was applied to the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<T = ()> {
    /// The outcome matched the outstanding ticket and was applied.
    Applied(T),
    /// The ticket was stale; nothing changed.
    Discarded,
}

impl<T> Completion<T> {
    /// True when the outcome was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// Map the applied value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Completion<U> {
        match self {
            Self::Applied(value) => Completion::Applied(f(value)),
            Self::Discarded => Completion::Discarded,
        }
    }
}
