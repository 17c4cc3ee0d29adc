use serde::{Deserialize, Serialize};

use crate::tracker::Emission;

/// Lifecycle state reported to the task layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Working,
    Failed,
    Completed,
}

/// A finished file handed to the task layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub index: usize,
    pub name: String,
    pub text: String,
    /// Always `true` for emitted files: nothing more will follow.
    pub last_chunk: bool,
}

impl From<Emission> for Artifact {
    fn from(e: Emission) -> Self {
        Self {
            index: e.index,
            name: e.filename,
            text: e.content,
            last_chunk: true,
        }
    }
}

/// One update yielded while a task runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TaskUpdate {
    Status {
        state: TaskState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Artifact(Artifact),
}

impl TaskUpdate {
    fn status(state: TaskState, message: impl Into<String>) -> Self {
        TaskUpdate::Status {
            state,
            message: Some(message.into()),
        }
    }

    pub fn working(message: impl Into<String>) -> Self {
        Self::status(TaskState::Working, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::status(TaskState::Failed, message)
    }

    pub fn completed(message: impl Into<String>) -> Self {
        Self::status(TaskState::Completed, message)
    }

    /// The state carried by a status update.
    pub fn state(&self) -> Option<TaskState> {
        match self {
            TaskUpdate::Status { state, .. } => Some(*state),
            TaskUpdate::Artifact(_) => None,
        }
    }
}
