use serde::{Deserialize, Serialize};

use crate::extract::{extract, extract_partial};

/// One fenced code block found in model output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileBlock {
    /// Free text before the opening fence, trimmed.
    #[serde(default)]
    pub preamble: String,
    /// Second token on the opening fence line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// First token on the opening fence line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Raw text between the fences. An unterminated last line has no `\n`.
    pub content: String,
    /// Set once the closing fence has been seen.
    pub done: bool,
}

impl FileBlock {
    /// The filename, or `""` when the fence line didn't carry one.
    pub fn name(&self) -> &str {
        self.filename.as_deref().unwrap_or_default()
    }
}

/// Everything one extraction pass found in a piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub files: Vec<FileBlock>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub postamble: String,
}

impl ExtractionResult {
    /// Returns the first file's preamble.
    pub fn preamble(&self) -> &str {
        self.files.first().map_or("", |f| f.preamble.as_str())
    }

    /// Returns the first file's filename.
    pub fn filename(&self) -> &str {
        self.files.first().map_or("", FileBlock::name)
    }

    /// Returns the first file's language.
    pub fn language(&self) -> &str {
        self.files
            .first()
            .and_then(|f| f.language.as_deref())
            .unwrap_or_default()
    }

    /// Returns the first file's content.
    pub fn content(&self) -> &str {
        self.files.first().map_or("", |f| f.content.as_str())
    }

    /// Filenames of every block in appearance order.
    pub fn filenames(&self) -> Vec<&str> {
        self.files.iter().map(FileBlock::name).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

const INSTRUCTIONS: &str = "\n\n=== Output Instructions

Output architecture documents in a markdown code block using the following format:

```mermaid architecture.mmd
// architecture diagram goes here
```

or

```markdown technical-spec.md
# Technical Specification
// specification content goes here
```

- Always put the language and the filename on the opening fence line, in that order.
- Use Mermaid syntax for architecture diagrams and Markdown for technical specifications.
- Put every file in its own code block and separate blocks with two newlines.
- Pick filenames that describe the content (e.g. 'architecture.mmd', 'technical-spec.md', 'database-schema.sql').

Start each architecture document with a short description of its context and purpose, for example:

```mermaid architecture.mmd
%% System Architecture for E-commerce Platform
%% High-level components and how they talk to each other
graph TD
    Client[Client] -->|HTTP| API[API Gateway]
    API -->|gRPC| Auth[Auth Service]
    API -->|gRPC| Product[Product Service]
    API -->|gRPC| Order[Order Service]
```
";

/// The `code` output format: what the model is told to produce and how
/// its output is read back.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeFormat;

impl CodeFormat {
    pub const NAME: &'static str = "code";
    pub const CONTENT_TYPE: &'static str = "text/plain";

    /// Instructions appended to the system prompt.
    pub fn instructions(&self) -> &'static str {
        INSTRUCTIONS
    }

    /// Parse a finished response.
    pub fn parse_message(&self, text: &str) -> ExtractionResult {
        extract(text)
    }

    /// Parse the text accumulated so far in a stream that is still going.
    pub fn parse_chunk(&self, accumulated: &str) -> ExtractionResult {
        extract_partial(accumulated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(filename: Option<&str>, content: &str) -> FileBlock {
        FileBlock {
            preamble: "intro".into(),
            filename: filename.map(String::from),
            language: Some("markdown".into()),
            content: content.into(),
            done: true,
        }
    }

    #[test]
    fn accessors_read_first_file() {
        let result = ExtractionResult {
            files: vec![block(Some("a.md"), "A\n"), block(Some("b.md"), "B\n")],
            postamble: String::new(),
        };
        assert_eq!(result.preamble(), "intro");
        assert_eq!(result.filename(), "a.md");
        assert_eq!(result.language(), "markdown");
        assert_eq!(result.content(), "A\n");
        assert_eq!(result.filenames(), vec!["a.md", "b.md"]);
    }

    #[test]
    fn accessors_default_to_empty() {
        let result = ExtractionResult::default();
        assert!(result.is_empty());
        assert_eq!(result.preamble(), "");
        assert_eq!(result.filename(), "");
        assert_eq!(result.language(), "");
        assert_eq!(result.content(), "");
    }

    #[test]
    fn unnamed_block_reports_empty_name() {
        let result = ExtractionResult {
            files: vec![block(None, "x\n")],
            postamble: String::new(),
        };
        assert_eq!(result.filenames(), vec![""]);
    }

    #[test]
    fn serializes_camel_case_and_skips_absent_fields() {
        let result = ExtractionResult {
            files: vec![block(None, "x\n")],
            postamble: String::new(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "files": [{
                    "preamble": "intro",
                    "language": "markdown",
                    "content": "x\n",
                    "done": true
                }]
            })
        );
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let json = r#"{"files":[{"content":"x\n","done":false}]}"#;
        let result: ExtractionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.files[0].filename, None);
        assert_eq!(result.files[0].preamble, "");
        assert_eq!(result.postamble, "");
    }

    #[test]
    fn format_metadata() {
        assert_eq!(CodeFormat::NAME, "code");
        assert_eq!(CodeFormat::CONTENT_TYPE, "text/plain");
        assert!(CodeFormat.instructions().contains("```mermaid architecture.mmd"));
    }

    #[test]
    fn format_parses_through_extractor() {
        let text = "```mermaid a.mmd\ngraph TD\n```\n";
        assert_eq!(CodeFormat.parse_message(text), CodeFormat.parse_chunk(text));
        assert_eq!(CodeFormat.parse_chunk(text).filename(), "a.mmd");
    }

    #[test]
    fn chunk_waits_for_complete_fence_line() {
        let text = "```mermaid a.mmd\ngraph TD\n```";
        assert!(CodeFormat.parse_message(text).files[0].done);
        assert!(!CodeFormat.parse_chunk(text).files[0].done);
        assert!(CodeFormat.parse_chunk("```mermaid a.m").is_empty());
    }
}
