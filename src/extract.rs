//! Tolerant extraction of fenced code blocks from model output.
//!
//! Extraction keeps no state between calls and is re-run on every snapshot
//! of a growing response. [`extract`] reads its input as finished text: an
//! unterminated block at the tail is reported with `done == false` and
//! whatever content has arrived so far. [`extract_partial`] reads a
//! snapshot that is still growing and holds back a last line that may yet
//! turn into a fence, so a half-written fence header never opens a block.

use crate::code::{ExtractionResult, FileBlock};

const FENCE: &str = "```";

/// Split the text after an opening fence into `(language, filename)`.
///
/// The header is cut at its first run of whitespace; the filename is the
/// first token after that cut. Empty tokens come back as `None`.
fn parse_fence_header(header: &str) -> (Option<String>, Option<String>) {
    let (language, rest) = match header.find(char::is_whitespace) {
        Some(at) => (&header[..at], &header[at..]),
        None => (header, ""),
    };
    let filename = rest.split_whitespace().next();

    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
    (non_empty(language), filename.and_then(non_empty))
}

/// Whether an unterminated line is, or may still grow into, a fence line.
fn may_become_fence(line: &str) -> bool {
    let trimmed = line.trim();
    FENCE.starts_with(trimmed) || trimmed.starts_with(FENCE)
}

/// Re-derive every file described by fenced blocks in `text`.
///
/// Text outside blocks becomes the next block's preamble until some block
/// has produced content; from then on it all lands in the postamble, gaps
/// between back-to-back blocks included. Text with no block at all is
/// reported whole as the postamble.
///
/// Content is the raw text between the fences: every line keeps its
/// newline, and an unterminated last line is taken as is.
pub fn extract(text: &str) -> ExtractionResult {
    let mut files: Vec<FileBlock> = Vec::new();
    let mut preamble = String::new();
    let mut postamble = String::new();
    let mut in_block = false;

    for piece in text.split_inclusive('\n') {
        let line = piece.strip_suffix('\n').unwrap_or(piece);

        if let Some(header) = line.trim().strip_prefix(FENCE) {
            if in_block {
                if let Some(file) = files.last_mut() {
                    file.done = true;
                }
            } else {
                let (language, filename) = parse_fence_header(header);
                files.push(FileBlock {
                    preamble: preamble.trim().to_string(),
                    filename,
                    language,
                    content: String::new(),
                    done: false,
                });
                preamble.clear();
            }
            in_block = !in_block;
            continue;
        }

        let sink = match files.last_mut() {
            Some(file) if in_block => &mut file.content,
            Some(file) if !file.content.is_empty() => &mut postamble,
            _ => &mut preamble,
        };
        sink.push_str(piece);
    }

    if files.is_empty() {
        postamble = preamble;
    }

    ExtractionResult {
        files,
        postamble: postamble.trim().to_string(),
    }
}

/// Like [`extract`], for a snapshot of a response that is still streaming.
///
/// A last line without its newline is left out when it could still become
/// a fence line (`` ` ``, ```` ``` ````, ```` ```markdown tech ````), so a
/// block only opens or closes once its fence line is complete. Any other
/// unterminated line is kept. Results for successive snapshots only ever
/// grow: files keep their name, language and preamble, and content is only
/// appended to.
pub fn extract_partial(text: &str) -> ExtractionResult {
    let settled = match text.rfind('\n') {
        Some(at) => &text[..=at],
        None => "",
    };

    if may_become_fence(&text[settled.len()..]) {
        extract(settled)
    } else {
        extract(text)
    }
}
