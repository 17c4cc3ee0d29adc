use crate::code::{CodeFormat, ExtractionResult};
use crate::error::Result;
use crate::tracker::{Emission, EmissionTracker};

/// What a finished session saw.
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    /// Every emission, in the order it was reported.
    pub emissions: Vec<Emission>,
    /// Extraction of the last snapshot, i.e. the complete response.
    pub last: ExtractionResult,
    /// Number of snapshots consumed.
    pub snapshots: usize,
}

impl SessionSummary {
    /// Filenames found in the complete response.
    pub fn generated_files(&self) -> Vec<String> {
        self.last.filenames().into_iter().map(String::from).collect()
    }
}

/// Drives one streaming session: re-extract each snapshot, track which
/// files are final, report them.
pub struct Session<'a> {
    format: CodeFormat,
    on_emit: Option<Box<dyn FnMut(&Emission) + 'a>>,
}

impl<'a> Session<'a> {
    pub fn new() -> Self {
        Self {
            format: CodeFormat,
            on_emit: None,
        }
    }

    /// Register a callback that fires for each file as soon as it is final.
    pub fn on_emit(mut self, cb: impl FnMut(&Emission) + 'a) -> Self {
        self.on_emit = Some(Box::new(cb));
        self
    }

    fn report(&mut self, released: &[Emission]) {
        if let Some(cb) = &mut self.on_emit {
            for e in released {
                cb(e);
            }
        }
    }

    /// Consume accumulated-text snapshots until the stream ends.
    ///
    /// Snapshots are parsed as still growing, so a half-written fence line
    /// at the tail is ignored until it completes. Once the stream ends, the
    /// last snapshot is parsed again as finished text before the remaining
    /// files are released.
    ///
    /// A stream error ends the session early, but files seen so far are
    /// still finalized and reported before the error is returned. The last
    /// snapshot is not re-read as finished text in that case.
    pub fn run<I>(&mut self, snapshots: I) -> Result<SessionSummary>
    where
        I: IntoIterator<Item = Result<String>>,
    {
        let mut tracker = EmissionTracker::new();
        let mut summary = SessionSummary::default();
        let mut failure = None;
        let mut text = String::new();

        for snapshot in snapshots {
            text = match snapshot {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(error = %err, "snapshot stream aborted, finalizing partial output");
                    failure = Some(err);
                    break;
                }
            };

            summary.snapshots += 1;
            summary.last = self.format.parse_chunk(&text);

            let released = tracker.push(&summary.last);
            self.report(&released);
            summary.emissions.extend(released);
        }

        if failure.is_none() && summary.snapshots > 0 {
            summary.last = self.format.parse_message(&text);
            let released = tracker.push(&summary.last);
            self.report(&released);
            summary.emissions.extend(released);
        }

        let released = tracker.finish();
        self.report(&released);
        summary.emissions.extend(released);

        tracing::debug!(
            snapshots = summary.snapshots,
            files = tracker.len(),
            "session finished"
        );

        match failure {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }
}

impl Default for Session<'_> {
    fn default() -> Self {
        Self::new()
    }
}
