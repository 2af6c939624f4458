//! Export payload: both element lists plus timing, as one JSON document.

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use serde::{Deserialize, Serialize};

use crate::board::BoardSnapshot;
use crate::doc::Element;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    /// Epoch milliseconds at export.
    pub exported_at: i64,
    /// Countdown left at export; `None` when no timer was involved.
    pub remaining_ms: Option<i64>,
    pub cross_section: Vec<Element>,
    pub wheeler: Vec<Element>,
}

impl ExportPayload {
    #[must_use]
    pub fn new(snapshot: BoardSnapshot, remaining_ms: Option<i64>, exported_at: i64) -> Self {
        Self { exported_at, remaining_ms, cross_section: snapshot.cross_section, wheeler: snapshot.wheeler }
    }

    /// Pretty-printed JSON for download.
    ///
    /// # Errors
    ///
    /// Propagates serialization failure.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Suggested download name, e.g. `wheeler-exam-1700000000000.json`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("wheeler-exam-{}.json", self.exported_at)
    }

    /// Element counts per type name across both surfaces, sorted by name.
    #[must_use]
    pub fn summary(&self) -> Vec<(&'static str, usize)> {
        let mut counts: std::collections::BTreeMap<&'static str, usize> = std::collections::BTreeMap::new();
        for el in self.cross_section.iter().chain(&self.wheeler) {
            *counts.entry(el.type_name()).or_default() += 1;
        }
        counts.into_iter().collect()
    }
}
