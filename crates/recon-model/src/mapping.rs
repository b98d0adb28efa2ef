//! Column mapping between the source and target documents.
//!
//! The mapping set is an ordered list of rows as the user edits them. A row
//! whose source or target is still empty is a draft: it stays visible for
//! editing but is never serialized or sent to the service. Complete rows
//! form the active set.
//!
//! Invariant: a non-empty source column appears in at most one row.

use std::collections::HashSet;

use serde::{Deserialize, Serialize, Serializer};

use crate::Column;
use crate::document::DocumentSide;
use crate::error::MappingError;

/// Number of rows seeded from the source columns on entering the mapping step.
pub const DEFAULT_SEED_ROWS: usize = 3;

/// One source-to-target column correspondence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingEntry {
    /// Column in the source document.
    pub source_column: Column,
    /// Column in the target document.
    pub target_column: Column,
    /// Free-text guidance passed to the service as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

impl MappingEntry {
    /// Create an entry without instruction.
    pub fn new(source_column: impl Into<String>, target_column: impl Into<String>) -> Self {
        Self {
            source_column: source_column.into(),
            target_column: target_column.into(),
            instruction: None,
        }
    }

    /// Attach an instruction.
    #[must_use]
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        let text = instruction.into();
        self.instruction = if text.is_empty() { None } else { Some(text) };
        self
    }

    /// True when both columns are set.
    pub fn is_complete(&self) -> bool {
        !self.source_column.is_empty() && !self.target_column.is_empty()
    }

    fn column(&self, side: DocumentSide) -> &str {
        match side {
            DocumentSide::Source => &self.source_column,
            DocumentSide::Target => &self.target_column,
        }
    }
}

/// Ordered mapping rows for one reconciliation session.
///
/// Serializes as the list of complete rows only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<MappingEntry>")]
pub struct MappingSet {
    rows: Vec<MappingEntry>,
}

impl MappingSet {
    /// Create an empty mapping set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed rows for a freshly discovered pair of documents.
    ///
    /// One row per leading source column (up to [`DEFAULT_SEED_ROWS`]). The
    /// target is pre-filled only when a target column has the same name,
    /// ignoring ASCII case. With no source columns a single draft row is
    /// created so there is something to edit.
    pub fn seeded(source_columns: &[Column], target_columns: &[Column]) -> Self {
        let mut rows: Vec<MappingEntry> = source_columns
            .iter()
            .take(DEFAULT_SEED_ROWS)
            .map(|source| {
                let target = target_columns
                    .iter()
                    .find(|t| t.eq_ignore_ascii_case(source))
                    .cloned()
                    .unwrap_or_default();
                MappingEntry::new(source.clone(), target)
            })
            .collect();
        if rows.is_empty() {
            rows.push(MappingEntry::default());
        }
        Self { rows }
    }

    /// All rows, drafts included, in display order.
    pub fn rows(&self) -> &[MappingEntry] {
        &self.rows
    }

    /// Get a row by position.
    pub fn get(&self, index: usize) -> Option<&MappingEntry> {
        self.rows.get(index)
    }

    /// Number of rows, drafts included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Complete rows, in display order.
    pub fn active(&self) -> impl Iterator<Item = &MappingEntry> {
        self.rows.iter().filter(|row| row.is_complete())
    }

    /// Owned copy of the complete rows.
    pub fn active_entries(&self) -> Vec<MappingEntry> {
        self.active().cloned().collect()
    }

    /// Number of complete rows.
    pub fn active_len(&self) -> usize {
        self.active().count()
    }

    /// True when at least one complete row exists.
    pub fn has_active(&self) -> bool {
        self.active().next().is_some()
    }

    /// Position of the row for a source column.
    pub fn position_of(&self, source_column: &str) -> Option<usize> {
        if source_column.is_empty() {
            return None;
        }
        self.rows
            .iter()
            .position(|row| row.source_column == source_column)
    }

    /// Target currently mapped for a source column.
    pub fn target_for(&self, source_column: &str) -> Option<&str> {
        self.position_of(source_column)
            .map(|idx| self.rows[idx].target_column.as_str())
            .filter(|target| !target.is_empty())
    }

    /// Append an empty draft row.
    pub fn add_entry(&mut self) {
        self.rows.push(MappingEntry::default());
    }

    /// Remove a row by position. Out-of-range indexes are ignored.
    pub fn remove_entry(&mut self, index: usize) -> Option<MappingEntry> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    /// Upsert the row for `source_column`.
    ///
    /// An empty `target_column` removes that source column's row. An empty
    /// source column is ignored.
    pub fn set_pair(&mut self, source_column: &str, target_column: &str) {
        if source_column.is_empty() {
            return;
        }
        match (self.position_of(source_column), target_column.is_empty()) {
            (Some(idx), true) => {
                self.rows.remove(idx);
            }
            (Some(idx), false) => {
                self.rows[idx].target_column = target_column.to_string();
            }
            (None, true) => {}
            (None, false) => self
                .rows
                .push(MappingEntry::new(source_column, target_column)),
        }
    }

    /// Attach guidance text to a row; empty text clears it.
    ///
    /// Returns false when the row does not exist.
    pub fn set_instruction(&mut self, index: usize, text: &str) -> bool {
        match self.rows.get_mut(index) {
            Some(row) => {
                row.instruction = if text.is_empty() {
                    None
                } else {
                    Some(text.to_string())
                };
                true
            }
            None => false,
        }
    }

    /// Change the source column of one row.
    ///
    /// Fails when another row already maps that column. Out-of-range
    /// indexes are ignored.
    pub fn set_source(&mut self, index: usize, column: &str) -> Result<(), MappingError> {
        if index >= self.rows.len() {
            return Ok(());
        }
        if let Some(other) = self.position_of(column).filter(|&other| other != index) {
            return Err(MappingError::ColumnAlreadyUsed {
                column: column.to_string(),
                target: self.rows[other].target_column.clone(),
            });
        }
        self.rows[index].source_column = column.to_string();
        Ok(())
    }

    /// Change the target column of one row. An empty column leaves a draft.
    ///
    /// Returns false when the row does not exist.
    pub fn set_target(&mut self, index: usize, column: &str) -> bool {
        match self.rows.get_mut(index) {
            Some(row) => {
                row.target_column = column.to_string();
                true
            }
            None => false,
        }
    }

    /// Drop rows referencing a column that is no longer present on `side`.
    ///
    /// Rows with an empty column on that side are kept. Returns the number
    /// of rows dropped.
    pub fn retain_columns(&mut self, side: DocumentSide, columns: &[Column]) -> usize {
        let present: HashSet<&str> = columns.iter().map(String::as_str).collect();
        let before = self.rows.len();
        self.rows.retain(|row| {
            let column = row.column(side);
            column.is_empty() || present.contains(column)
        });
        before - self.rows.len()
    }

    /// Remove every row.
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

impl From<Vec<MappingEntry>> for MappingSet {
    /// Later rows repeating an earlier source column are dropped.
    fn from(entries: Vec<MappingEntry>) -> Self {
        let mut seen = HashSet::new();
        let rows = entries
            .into_iter()
            .filter(|row| row.source_column.is_empty() || seen.insert(row.source_column.clone()))
            .collect();
        Self { rows }
    }
}

impl Serialize for MappingSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.active())
    }
}
