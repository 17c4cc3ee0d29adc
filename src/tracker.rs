//! Decides when a streamed file is final and announces it exactly once.
//!
//! The extractor only marks a block done when its closing fence arrives,
//! and a streamed response may show the next opening fence in the same
//! snapshot. The tracker therefore treats the start of a new file as the
//! signal that every earlier file is finished. The last file has no
//! successor, so it is only announced by [`EmissionTracker::finish`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::code::ExtractionResult;

/// A file whose content is final.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emission {
    /// Zero-based position in first-appearance order.
    pub index: usize,
    pub filename: String,
    pub content: String,
}

/// Cross-snapshot state for one streaming session.
///
/// Files are keyed by filename; a block without one is tracked under `""`.
#[derive(Debug, Default)]
pub struct EmissionTracker {
    order: Vec<String>,
    positions: HashMap<String, usize>,
    latest: Vec<String>,
    emitted: usize,
}

impl EmissionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one snapshot's extraction and return the files that became
    /// final because a later file started.
    pub fn push(&mut self, result: &ExtractionResult) -> Vec<Emission> {
        let mut out = Vec::new();

        for file in &result.files {
            let name = file.name();

            if let Some(&at) = self.positions.get(name) {
                self.latest[at].clone_from(&file.content);
                continue;
            }

            let at = self.order.len();
            self.order.push(name.to_string());
            self.positions.insert(name.to_string(), at);
            self.latest.push(file.content.clone());

            while self.emitted < at {
                out.push(self.emit_next("emitting completed file"));
            }
        }

        out
    }

    /// End of stream: announce every file not yet emitted, in order.
    ///
    /// Calling this again is a no-op.
    pub fn finish(&mut self) -> Vec<Emission> {
        let mut out = Vec::with_capacity(self.order.len() - self.emitted);
        while self.emitted < self.order.len() {
            out.push(self.emit_next("emitting final file"));
        }
        out
    }

    fn emit_next(&mut self, what: &str) -> Emission {
        let index = self.emitted;
        let filename = self.order[index].clone();
        tracing::info!(index, filename = %filename, "{what}");

        self.emitted += 1;
        Emission {
            index,
            filename,
            content: self.latest[index].clone(),
        }
    }

    /// Filenames in first-appearance order.
    pub fn filenames(&self) -> &[String] {
        &self.order
    }

    /// How many files have been announced so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Latest content seen for `filename`.
    pub fn content(&self, filename: &str) -> Option<&str> {
        self.positions
            .get(filename)
            .map(|&at| self.latest[at].as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
