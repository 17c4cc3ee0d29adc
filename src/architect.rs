//! The architecture agent: turns a conversation into streamed design
//! documents.
//!
//! The model itself sits behind the [`Model`] trait. [`Architect`] maps
//! the conversation, asks the model for output in the [`CodeFormat`], runs
//! a [`Session`] over the snapshots it streams back, and reports progress
//! as [`TaskUpdate`]s.

use serde::{Deserialize, Serialize};

use crate::code::CodeFormat;
use crate::error::{Error, Result};
use crate::session::{Session, SessionSummary};
use crate::update::{Artifact, TaskUpdate};

const SYSTEM_PROMPT: &str = "You are an expert software architect. Provide high-quality architecture designs, diagrams, and technical specifications according to the output instructions provided below. You may generate multiple files as needed, including architecture diagrams, technical specifications, and implementation guidelines.";
const WORKING_MESSAGE: &str = "Analyzing architecture requirements...";
const NO_INPUT_MESSAGE: &str = "No input message found.";
const NO_FILES_MESSAGE: &str = "Completed, but no files were generated.";

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Who said something in the task's conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One piece of a conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Part {
    Text { text: String },
    Data { data: serde_json::Value },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl HistoryMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::text(Role::User, text)
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::text(Role::Agent, text)
    }

    fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::Text { text: text.into() }],
        }
    }
}

/// Who said something, as the model sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMessage {
    pub role: ModelRole,
    pub content: Vec<String>,
}

/// Keep only text parts, drop messages left with none, and map roles.
pub fn to_model_messages(history: &[HistoryMessage]) -> Vec<ModelMessage> {
    history
        .iter()
        .map(|m| ModelMessage {
            role: match m.role {
                Role::Agent => ModelRole::Model,
                Role::User => ModelRole::User,
            },
            content: m
                .parts
                .iter()
                .filter_map(|p| match p {
                    Part::Text { text } if !text.is_empty() => Some(text.clone()),
                    _ => None,
                })
                .collect(),
        })
        .filter(|m| !m.content.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Model boundary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub system: String,
    /// Output-format instructions appended to the system prompt.
    pub instructions: String,
    pub messages: Vec<ModelMessage>,
}

/// Accumulated-text snapshots, each holding everything generated so far.
pub type SnapshotStream<'a> = Box<dyn Iterator<Item = Result<String>> + 'a>;

/// A text-generation backend that streams its response.
pub trait Model {
    fn stream(&mut self, request: &GenerateRequest) -> Result<SnapshotStream<'_>>;
}

/// A [`Model`] that replays fixed snapshots. Useful for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct ScriptedModel {
    snapshots: Vec<String>,
    fail_after: Option<(usize, String)>,
    refusal: Option<String>,
    requests: Vec<GenerateRequest>,
}

impl ScriptedModel {
    pub fn new(snapshots: Vec<String>) -> Self {
        Self {
            snapshots,
            ..Self::default()
        }
    }

    /// Replay `text` as it would stream in, `lines` lines per snapshot.
    pub fn from_lines(text: &str, lines: usize) -> Self {
        let ends: Vec<usize> = text
            .match_indices('\n')
            .map(|(at, _)| at + 1)
            .chain(std::iter::once(text.len()))
            .collect();

        let mut snapshots: Vec<String> = ends
            .chunks(lines.max(1))
            .filter_map(|chunk| chunk.last())
            .map(|&end| text[..end].to_string())
            .collect();
        snapshots.dedup();

        Self::new(snapshots)
    }

    /// Replay `text` in steps of about `bytes` bytes, cutting anywhere a
    /// token stream might, mid-line included.
    pub fn from_chunks(text: &str, bytes: usize) -> Self {
        let mut snapshots = Vec::new();
        let mut end = 0;
        while end < text.len() {
            end = (end + bytes.max(1)).min(text.len());
            while !text.is_char_boundary(end) {
                end += 1;
            }
            snapshots.push(text[..end].to_string());
        }
        Self::new(snapshots)
    }

    /// Break the stream with `msg` after `n` snapshots.
    pub fn failing_after(mut self, n: usize, msg: impl Into<String>) -> Self {
        self.fail_after = Some((n, msg.into()));
        self
    }

    /// Refuse every request with `msg` before streaming anything.
    pub fn refusing(mut self, msg: impl Into<String>) -> Self {
        self.refusal = Some(msg.into());
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> &[GenerateRequest] {
        &self.requests
    }
}

impl Model for ScriptedModel {
    fn stream(&mut self, request: &GenerateRequest) -> Result<SnapshotStream<'_>> {
        self.requests.push(request.clone());
        if let Some(msg) = &self.refusal {
            return Err(Error::model(msg.clone()));
        }

        let snapshots = self.snapshots.iter().cloned().map(Ok::<String, Error>);
        match &self.fail_after {
            Some((n, msg)) => {
                let failure = std::iter::once(Err(Error::stream(msg.clone())));
                Ok(Box::new(snapshots.take(*n).chain(failure)))
            }
            None => Ok(Box::new(snapshots)),
        }
    }
}

// ---------------------------------------------------------------------------
// Architect
// ---------------------------------------------------------------------------

pub struct Architect<M: Model> {
    model: M,
    system_prompt: String,
    working_message: String,
}

impl<M: Model> Architect<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            system_prompt: SYSTEM_PROMPT.to_string(),
            working_message: WORKING_MESSAGE.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Status text reported once generation starts.
    pub fn with_working_message(mut self, message: impl Into<String>) -> Self {
        self.working_message = message.into();
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Run one task over `history`, reporting every update to `on_update`.
    ///
    /// Each file is reported as an [`TaskUpdate::Artifact`] once final; the
    /// last update is always a `Completed` or `Failed` status.
    pub fn run(
        &mut self,
        history: &[HistoryMessage],
        mut on_update: impl FnMut(TaskUpdate),
    ) -> Result<SessionSummary> {
        let messages = to_model_messages(history);
        if messages.is_empty() {
            tracing::warn!("no history messages with text, nothing to design");
            on_update(TaskUpdate::failed(NO_INPUT_MESSAGE));
            return Err(Error::NoInput);
        }

        on_update(TaskUpdate::working(self.working_message.as_str()));

        let request = GenerateRequest {
            system: self.system_prompt.clone(),
            instructions: CodeFormat.instructions().to_string(),
            messages,
        };
        tracing::info!(messages = request.messages.len(), "starting generation");

        let stream = match self.model.stream(&request) {
            Ok(stream) => stream,
            Err(err) => {
                on_update(TaskUpdate::failed(err.to_string()));
                return Err(err);
            }
        };

        let outcome = {
            let mut session = Session::new()
                .on_emit(|e| on_update(TaskUpdate::Artifact(Artifact::from(e.clone()))));
            session.run(stream)
        };

        match outcome {
            Ok(summary) => {
                let files = summary.generated_files();
                let message = if files.is_empty() {
                    NO_FILES_MESSAGE.to_string()
                } else {
                    format!("Generated architecture documents: {}", files.join(", "))
                };
                on_update(TaskUpdate::completed(message));
                Ok(summary)
            }
            Err(err) => {
                on_update(TaskUpdate::failed(err.to_string()));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::TaskState;

    const RESPONSE: &str = "Here is the design.\n\n\
        ```mermaid architecture.mmd\n\
        graph TD\n\
        A-->B\n\
        ```\n\n\
        ```markdown technical-spec.md\n\
        # Spec\n\
        ```\n";

    fn collect<M: Model>(
        architect: &mut Architect<M>,
        history: &[HistoryMessage],
    ) -> (Vec<TaskUpdate>, Result<SessionSummary>) {
        let mut updates = Vec::new();
        let result = architect.run(history, |u| updates.push(u));
        (updates, result)
    }

    // --- history mapping ---

    #[test]
    fn maps_roles_and_keeps_text_parts() {
        let history = vec![
            HistoryMessage::user("Design a chat app."),
            HistoryMessage {
                role: Role::Agent,
                parts: vec![
                    Part::Data {
                        data: serde_json::json!({"k": 1}),
                    },
                    Part::Text {
                        text: "Sure.".into(),
                    },
                ],
            },
        ];

        let messages = to_model_messages(&history);
        assert_eq!(
            messages,
            vec![
                ModelMessage {
                    role: ModelRole::User,
                    content: vec!["Design a chat app.".into()],
                },
                ModelMessage {
                    role: ModelRole::Model,
                    content: vec!["Sure.".into()],
                },
            ]
        );
    }

    #[test]
    fn drops_messages_without_text() {
        let history = vec![HistoryMessage {
            role: Role::User,
            parts: vec![Part::Data {
                data: serde_json::Value::Null,
            }],
        }];
        assert!(to_model_messages(&history).is_empty());
        assert!(to_model_messages(&[HistoryMessage::agent("")]).is_empty());
    }

    #[test]
    fn agent_message_maps_to_model_role() {
        let messages = to_model_messages(&[HistoryMessage::agent("Done.")]);
        assert_eq!(messages[0].role, ModelRole::Model);
    }

    #[test]
    fn history_deserializes_from_task_json() {
        let json = r#"{"role":"user","parts":[{"type":"text","text":"hi"}]}"#;
        let message: HistoryMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message, HistoryMessage::user("hi"));
    }

    // --- scripted model ---

    #[test]
    fn from_lines_builds_cumulative_snapshots() {
        let model = ScriptedModel::from_lines("a\nb\nc", 2);
        assert_eq!(model.snapshots, vec!["a\nb\n", "a\nb\nc"]);
    }

    #[test]
    fn from_lines_with_trailing_newline() {
        let model = ScriptedModel::from_lines("a\nb\n", 1);
        assert_eq!(model.snapshots, vec!["a\n", "a\nb\n"]);
    }

    #[test]
    fn from_chunks_cuts_on_char_boundaries() {
        let model = ScriptedModel::from_chunks("ab\u{e9}c", 2);
        assert_eq!(model.snapshots, vec!["ab", "ab\u{e9}", "ab\u{e9}c"]);
    }

    // --- run ---

    #[test]
    fn empty_history_fails_without_calling_model() {
        let mut architect = Architect::new(ScriptedModel::from_lines(RESPONSE, 1));
        let (updates, result) = collect(&mut architect, &[]);

        assert!(matches!(result, Err(Error::NoInput)));
        assert_eq!(updates, vec![TaskUpdate::failed("No input message found.")]);
        assert!(architect.model().requests().is_empty());
    }

    #[test]
    fn streams_artifacts_then_completes() {
        let mut architect = Architect::new(ScriptedModel::from_lines(RESPONSE, 1));
        let (updates, result) = collect(&mut architect, &[HistoryMessage::user("Design it.")]);

        assert!(result.is_ok());
        assert_eq!(updates.len(), 4);
        assert_eq!(
            updates[0],
            TaskUpdate::working("Analyzing architecture requirements...")
        );
        assert_eq!(
            updates[1],
            TaskUpdate::Artifact(Artifact {
                index: 0,
                name: "architecture.mmd".into(),
                text: "graph TD\nA-->B\n".into(),
                last_chunk: true,
            })
        );
        assert_eq!(
            updates[2],
            TaskUpdate::Artifact(Artifact {
                index: 1,
                name: "technical-spec.md".into(),
                text: "# Spec\n".into(),
                last_chunk: true,
            })
        );
        assert_eq!(
            updates[3],
            TaskUpdate::completed(
                "Generated architecture documents: architecture.mmd, technical-spec.md"
            )
        );
    }

    #[test]
    fn token_sized_stream_reports_whole_files() {
        for bytes in [1, 3, 4, 7] {
            let mut architect = Architect::new(ScriptedModel::from_chunks(RESPONSE, bytes));
            let (updates, result) =
                collect(&mut architect, &[HistoryMessage::user("Design it.")]);
            assert!(result.is_ok());

            let names: Vec<&str> = updates
                .iter()
                .filter_map(|u| match u {
                    TaskUpdate::Artifact(a) => Some(a.name.as_str()),
                    _ => None,
                })
                .collect();
            assert_eq!(names, vec!["architecture.mmd", "technical-spec.md"], "bytes {bytes}");
        }
    }

    #[test]
    fn request_carries_prompt_instructions_and_messages() {
        let mut architect = Architect::new(ScriptedModel::from_lines(RESPONSE, 3))
            .with_system_prompt("Be brief.");
        collect(&mut architect, &[HistoryMessage::user("Design it.")])
            .1
            .unwrap();

        let request = &architect.model().requests()[0];
        assert_eq!(request.system, "Be brief.");
        assert_eq!(request.instructions, CodeFormat.instructions());
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn custom_working_message() {
        let mut architect =
            Architect::new(ScriptedModel::from_lines(RESPONSE, 1)).with_working_message("On it");
        let (updates, _) = collect(&mut architect, &[HistoryMessage::user("Design it.")]);
        assert_eq!(updates[0], TaskUpdate::working("On it"));
    }

    #[test]
    fn prose_only_response_completes_without_files() {
        let model = ScriptedModel::new(vec!["I need more details.".into()]);
        let mut architect = Architect::new(model);
        let (updates, result) = collect(&mut architect, &[HistoryMessage::user("?")]);

        assert!(result.unwrap().emissions.is_empty());
        assert_eq!(
            updates.last(),
            Some(&TaskUpdate::completed("Completed, but no files were generated."))
        );
    }

    #[test]
    fn model_refusal_reports_failed() {
        let model = ScriptedModel::from_lines(RESPONSE, 1).refusing("quota exceeded");
        let mut architect = Architect::new(model);
        let (updates, result) = collect(&mut architect, &[HistoryMessage::user("Design it.")]);

        assert!(matches!(result, Err(Error::Model(msg)) if msg == "quota exceeded"));
        assert_eq!(
            updates,
            vec![
                TaskUpdate::working("Analyzing architecture requirements..."),
                TaskUpdate::failed("model error: quota exceeded"),
            ]
        );
        assert_eq!(architect.model().requests().len(), 1);
    }

    #[test]
    fn aborted_stream_emits_partial_files_then_fails() {
        let model = ScriptedModel::from_lines(RESPONSE, 1).failing_after(6, "socket closed");
        let mut architect = Architect::new(model);
        let (updates, result) = collect(&mut architect, &[HistoryMessage::user("Design it.")]);

        assert!(matches!(result, Err(Error::Stream(_))));

        let artifacts: Vec<&Artifact> = updates
            .iter()
            .filter_map(|u| match u {
                TaskUpdate::Artifact(a) => Some(a),
                _ => None,
            })
            .collect();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].name, "architecture.mmd");
        assert_eq!(artifacts[0].text, "graph TD\nA-->B\n");

        let last = updates.last().unwrap();
        assert_eq!(last.state(), Some(TaskState::Failed));
        assert_eq!(
            last,
            &TaskUpdate::failed("stream aborted: socket closed")
        );
    }
}
