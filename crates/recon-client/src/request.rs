//! Request bodies sent as JSON.

use serde::Serialize;

use recon_model::{ComparisonResult, MappingEntry};

/// Body of the save endpoint: `{result, name, mappings, narrative?}`.
#[derive(Debug, Clone, Serialize)]
pub struct SaveRequest<'a> {
    pub result: &'a ComparisonResult,
    pub name: &'a str,
    pub mappings: &'a [MappingEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<&'a str>,
}

impl<'a> SaveRequest<'a> {
    /// Build a save request; the narrative is lifted from the result.
    pub fn new(name: &'a str, mappings: &'a [MappingEntry], result: &'a ComparisonResult) -> Self {
        Self {
            result,
            name,
            mappings,
            narrative: result.narrative.as_deref(),
        }
    }
}
