//! Comparison results and saved records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mapping::MappingEntry;

/// Classified outcome of comparing two documents.
///
/// Immutable once received; a new comparison replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    /// Rows present and consistent in both documents.
    pub matching: Vec<String>,
    /// Rows the target has but the source lacks.
    pub missing_from_source: Vec<String>,
    /// Rows the source has but the target lacks.
    pub missing_from_target: Vec<String>,
    /// Terms the service could not classify.
    pub unknown_terms: Vec<String>,
    /// Optional narrative analysis, opaque to the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

impl ComparisonResult {
    /// Items in one category.
    pub fn items(&self, category: ResultCategory) -> &[String] {
        match category {
            ResultCategory::Matching => &self.matching,
            ResultCategory::MissingFromSource => &self.missing_from_source,
            ResultCategory::MissingFromTarget => &self.missing_from_target,
            ResultCategory::UnknownTerms => &self.unknown_terms,
        }
    }

    /// Count per category.
    pub fn counts(&self) -> ResultCounts {
        ResultCounts {
            matching: self.matching.len(),
            missing_from_source: self.missing_from_source.len(),
            missing_from_target: self.missing_from_target.len(),
            unknown_terms: self.unknown_terms.len(),
        }
    }

    /// Chart breakdown: non-empty categories in display order.
    pub fn breakdown(&self) -> Vec<BreakdownSlice> {
        ResultCategory::all()
            .iter()
            .map(|&category| BreakdownSlice {
                category,
                count: self.items(category).len(),
            })
            .filter(|slice| slice.count > 0)
            .collect()
    }

    /// True when the service reported at least one divergence.
    pub fn has_divergences(&self) -> bool {
        let counts = self.counts();
        counts.missing_from_source + counts.missing_from_target + counts.unknown_terms > 0
    }
}

/// Result classification buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCategory {
    Matching,
    MissingFromSource,
    MissingFromTarget,
    UnknownTerms,
}

impl ResultCategory {
    /// Get the display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Matching => "Matching",
            Self::MissingFromSource => "Missing from source",
            Self::MissingFromTarget => "Missing from target",
            Self::UnknownTerms => "Unknown terms",
        }
    }

    /// Get all categories in display order.
    pub const fn all() -> &'static [ResultCategory] {
        &[
            Self::Matching,
            Self::MissingFromSource,
            Self::MissingFromTarget,
            Self::UnknownTerms,
        ]
    }
}

impl fmt::Display for ResultCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Number of items in each category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultCounts {
    pub matching: usize,
    pub missing_from_source: usize,
    pub missing_from_target: usize,
    pub unknown_terms: usize,
}

impl ResultCounts {
    /// Sum over all categories.
    pub fn total(&self) -> usize {
        self.matching + self.missing_from_source + self.missing_from_target + self.unknown_terms
    }
}

/// One slice of the result chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakdownSlice {
    pub category: ResultCategory,
    pub count: usize,
}

impl BreakdownSlice {
    /// Share of the total, in percent.
    pub fn percentage(&self, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        self.count as f64 * 100.0 / total as f64
    }
}

/// A comparison result persisted by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecord {
    /// Identifier assigned by the service.
    pub id: String,
    /// User-chosen name.
    pub name: String,
    /// Mapping rows the result was produced with.
    pub mappings: Vec<MappingEntry>,
    /// The saved result.
    pub result: ComparisonResult,
    /// When the save completed.
    pub created_at: DateTime<Utc>,
}
