use artifact_line::{Architect, HistoryMessage, ScriptedModel};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Canned response, used when no file is given
// ---------------------------------------------------------------------------

const SAMPLE: &str = "Here is a first cut at the chat service.

```mermaid architecture.mmd
%% Chat service, high level
graph TD
    Client[Client] -->|WebSocket| Gateway[Gateway]
    Gateway --> Rooms[Room Service]
    Rooms --> Store[(Message Store)]
```

```markdown technical-spec.md
# Technical Specification

Rooms fan messages out to every connected member.
```

Happy to go deeper on any component.
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Usage: architect_replay [response.md] [bytes-per-snapshot]
    let mut args = std::env::args().skip(1);
    let response = match args.next() {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE.to_string(),
    };
    let bytes: usize = args.next().map(|n| n.parse()).transpose()?.unwrap_or(8);

    let mut architect = Architect::new(ScriptedModel::from_chunks(&response, bytes));
    let history = [HistoryMessage::user("Design a real-time chat application.")];

    let mut failed = None;
    let result = architect.run(&history, |update| match serde_json::to_string(&update) {
        Ok(json) => println!("{json}"),
        Err(e) => failed = Some(e),
    });

    if let Some(e) = failed {
        return Err(e.into());
    }
    let summary = result?;
    eprintln!(
        "{} snapshots, {} files emitted",
        summary.snapshots,
        summary.emissions.len()
    );
    Ok(())
}
