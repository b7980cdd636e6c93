//! JSON-lines command scripts
//!
//! Each non-blank line that does not start with `#` is one command, e.g.
//! `{"op": "add_node", "value": "A"}`. Lines are applied in order to a single
//! loaded graph, which is saved once at the end.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use super::note;
use crate::AppContext;
use aedra_core::{Command, GraphStore, Outcome};

#[derive(Args)]
pub struct RunArgs {
    /// Script file, or `-` for stdin
    pub file: PathBuf,

    /// Report failing lines and continue instead of aborting
    #[arg(long)]
    pub keep_going: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScriptSummary {
    pub applied: usize,
    pub ignored: usize,
    pub failed: usize,
}

pub async fn run(args: &RunArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let reader: Box<dyn Read> = if args.file.as_os_str() == "-" {
        Box::new(std::io::stdin())
    } else {
        let file = std::fs::File::open(&args.file)
            .with_context(|| format!("opening script {}", args.file.display()))?;
        Box::new(file)
    };
    let commands = parse_script(BufReader::new(reader))?;
    tracing::info!("Running {} commands against graph '{}'", commands.len(), ctx.graph);

    let (mut store, events) = ctx.open_graph().await?;
    let summary = apply_script(&mut store, commands, args.keep_going, |outcome| {
        tracing::trace!("Applied: {:?}", outcome);
        Ok(())
    })?;

    // Only a persisted run is reported to event consumers
    ctx.save_graph(&store).await?;
    ctx.print_events(&events.drain())?;
    note(
        ctx,
        format!(
            "Applied {} commands ({} ignored, {} failed)",
            summary.applied, summary.ignored, summary.failed
        ),
    );
    Ok(())
}

/// Parse a script into `(line number, command)` pairs
pub fn parse_script(reader: impl BufRead) -> anyhow::Result<Vec<(usize, Command)>> {
    let mut commands = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let command: Command = serde_json::from_str(trimmed)
            .with_context(|| format!("line {}: invalid command", index + 1))?;
        commands.push((index + 1, command));
    }
    Ok(commands)
}

/// Apply parsed commands in order, calling `after_each` once per successful command.
///
/// Without `keep_going`, the first hard failure aborts the run with the
/// offending line number.
pub fn apply_script(
    store: &mut GraphStore,
    commands: Vec<(usize, Command)>,
    keep_going: bool,
    mut after_each: impl FnMut(&Outcome) -> anyhow::Result<()>,
) -> anyhow::Result<ScriptSummary> {
    let mut summary = ScriptSummary::default();
    for (line, command) in commands {
        match store.apply(command) {
            Ok(outcome) => {
                summary.applied += 1;
                after_each(&outcome)?;
            }
            Err(e) if e.is_ignored() => {
                tracing::warn!("line {}: ignored: {}", line, e);
                summary.ignored += 1;
            }
            Err(e) if keep_going => {
                tracing::error!("line {}: {}", line, e);
                eprintln!("line {}: {}", line, e);
                summary.failed += 1;
            }
            Err(e) => return Err(anyhow::Error::new(e).context(format!("line {}", line))),
        }
    }
    Ok(summary)
}
