//! Stream files out of fenced code blocks in growing LLM output.
//!
//! A model streams its answer as accumulated-text snapshots. Each snapshot
//! is re-parsed from scratch with [`extract_partial`] (or [`extract`] once
//! the text is complete), and an [`EmissionTracker`]
//! decides which files are final: a file is released as soon as the next
//! one starts, and whatever is left is released when the stream ends.
//! [`Session`] wires the two together, [`Architect`] wraps a session in the
//! task lifecycle of a design agent.
//!
//! # Quick start
//!
//! ```rust
//! use artifact_line::{EmissionTracker, extract};
//!
//! let snapshots = [
//!     "```mermaid architecture.mmd\ngraph TD\n",
//!     "```mermaid architecture.mmd\ngraph TD\nA-->B\n```\n\n```markdown spec.md\n",
//!     "```mermaid architecture.mmd\ngraph TD\nA-->B\n```\n\n```markdown spec.md\n# Spec\n```",
//! ];
//!
//! let mut tracker = EmissionTracker::new();
//! let mut released = Vec::new();
//! for text in snapshots {
//!     released.extend(tracker.push(&extract(text)));
//! }
//! assert_eq!(released.len(), 1);
//! assert_eq!(released[0].filename, "architecture.mmd");
//!
//! released.extend(tracker.finish());
//! assert_eq!(released[1].filename, "spec.md");
//! assert_eq!(released[1].content, "# Spec\n");
//! ```

mod architect;
mod code;
mod error;
mod extract;
mod session;
mod tracker;
mod update;

pub use architect::{
    Architect, GenerateRequest, HistoryMessage, Model, ModelMessage, ModelRole, Part, Role,
    ScriptedModel, SnapshotStream, to_model_messages,
};
pub use code::{CodeFormat, ExtractionResult, FileBlock};
pub use error::{Error, Result};
pub use extract::{extract, extract_partial};
pub use session::{Session, SessionSummary};
pub use tracker::{Emission, EmissionTracker};
pub use update::{Artifact, TaskState, TaskUpdate};
