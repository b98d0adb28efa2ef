//! Workflow steps.

use std::fmt;

use crate::document::DocumentSide;

/// Step of the reconciliation wizard.
///
/// Steps advance strictly in order; `Results` is terminal until reset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkflowStep {
    /// Select the source document (initial step).
    #[default]
    SourceUpload,

    /// Select the target document.
    TargetUpload,

    /// Declare column correspondences.
    Mapping,

    /// Review, save and export the comparison.
    Results,
}

impl WorkflowStep {
    /// Get the display name for this step.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SourceUpload => "Source document",
            Self::TargetUpload => "Target document",
            Self::Mapping => "Mapping",
            Self::Results => "Results",
        }
    }

    /// Get all steps in order.
    pub const fn all() -> &'static [WorkflowStep] {
        &[
            Self::SourceUpload,
            Self::TargetUpload,
            Self::Mapping,
            Self::Results,
        ]
    }

    /// Get the index of this step (0-based).
    pub fn index(&self) -> usize {
        match self {
            Self::SourceUpload => 0,
            Self::TargetUpload => 1,
            Self::Mapping => 2,
            Self::Results => 3,
        }
    }

    /// The step after this one.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::SourceUpload => Some(Self::TargetUpload),
            Self::TargetUpload => Some(Self::Mapping),
            Self::Mapping => Some(Self::Results),
            Self::Results => None,
        }
    }

    /// The step before this one.
    pub fn previous(&self) -> Option<Self> {
        match self {
            Self::SourceUpload => None,
            Self::TargetUpload => Some(Self::SourceUpload),
            Self::Mapping => Some(Self::TargetUpload),
            Self::Results => Some(Self::Mapping),
        }
    }

    /// The document selected on this step, if it is an upload step.
    pub fn upload_side(&self) -> Option<DocumentSide> {
        match self {
            Self::SourceUpload => Some(DocumentSide::Source),
            Self::TargetUpload => Some(DocumentSide::Target),
            Self::Mapping | Self::Results => None,
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
