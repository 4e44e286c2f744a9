use super::{describe_schema_error, is_markup, print_skipped};
use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use colored::{ColoredString, Colorize};
use mailcraft_editor::{
    ChangeStatus, DirectoryStore, EditSession, PendingChange, Pipeline, PipelineResult, Transition,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Args)]
pub struct ChangesArgs {
    #[command(subcommand)]
    pub command: ChangesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ChangesCommand {
    /// Register a generated template as a batch of pending changes
    Propose {
        project: String,

        /// Generated markup (.html) or document (.json)
        candidate: PathBuf,

        /// Reason recorded on every change of the batch
        #[arg(short, long)]
        rationale: Option<String>,
    },

    /// Show the changes waiting for review
    List {
        project: String,

        /// Include resolved and superseded changes
        #[arg(short, long)]
        all: bool,
    },

    /// Apply a pending change, or a whole batch
    Accept(Resolve),

    /// Discard a pending change, or a whole batch
    Reject(Resolve),
}

#[derive(Debug, Args)]
pub struct Resolve {
    pub project: String,

    /// Change to resolve
    #[arg(required_unless_present = "batch", conflicts_with = "batch")]
    pub change: Option<String>,

    /// Resolve every pending change of this batch
    #[arg(short, long)]
    pub batch: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Decision {
    Accept,
    Reject,
}

pub fn changes(args: ChangesArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let mut store = DirectoryStore::new(config.store_dir(cwd));
    debug!(store = %store.root().display(), "opened project store");

    match args.command {
        ChangesCommand::Propose {
            project,
            candidate,
            rationale,
        } => {
            let mut session = EditSession::open(&store, &project)?;
            let result = propose(
                &config,
                &mut session,
                &cwd.join(candidate),
                rationale.as_deref(),
            )?;
            session.save(&mut store)?;
            report_proposal(&result);
        }
        ChangesCommand::List { project, all } => {
            let session = EditSession::open(&store, &project)?;
            list(&session, all);
        }
        ChangesCommand::Accept(target) => {
            let mut session = EditSession::open(&store, &target.project)?;
            resolve(&mut session, &target, Decision::Accept)?;
            session.save(&mut store)?;
        }
        ChangesCommand::Reject(target) => {
            let mut session = EditSession::open(&store, &target.project)?;
            resolve(&mut session, &target, Decision::Reject)?;
            session.save(&mut store)?;
        }
    }

    Ok(())
}

fn propose(
    config: &Config,
    session: &mut EditSession,
    candidate: &Path,
    rationale: Option<&str>,
) -> Result<PipelineResult> {
    let source = fs::read_to_string(candidate)
        .with_context(|| format!("Cannot read {}", candidate.display()))?;
    let pipeline = Pipeline::new(config.parse_options());

    if is_markup(candidate) {
        let result = pipeline.ingest_markup(session, &source, rationale)?;
        print_skipped(&result.skipped);
        return Ok(result);
    }

    let payload: serde_json::Value = serde_json::from_str(&source)
        .map_err(|e| describe_schema_error(candidate, e.into()))?;
    Ok(pipeline.ingest_payload(session, &payload, rationale)?)
}

fn report_proposal(result: &PipelineResult) {
    match &result.batch_id {
        Some(batch) => {
            let summary = result.diff.summary();
            println!(
                "{} Proposed batch {} with {} changes",
                "📝".bright_blue(),
                batch.bright_white(),
                result.changes
            );
            println!(
                "  elements: {} added, {} removed, {} modified, {} moved",
                summary.added, summary.removed, summary.modified, summary.moved
            );
        }
        None => println!("{}", "✅ Candidate matches the current template".green()),
    }
}

fn list(session: &EditSession, all: bool) {
    let changes: Vec<&PendingChange> = if all {
        session.changes().history().iter().collect()
    } else {
        session.changes().actionable()
    };

    if changes.is_empty() {
        println!("{}", "No pending changes".dimmed());
        return;
    }

    let mut batch: Option<&str> = None;
    for change in changes {
        if batch != Some(change.batch_id.as_str()) {
            batch = Some(change.batch_id.as_str());
            let current = session.changes().current_batch() == batch;
            println!(
                "{} {}{}",
                "batch".bright_blue().bold(),
                change.batch_id.bright_white(),
                if current { "" } else { " (superseded)" }
            );
        }
        println!(
            "  {} {:<16} {:<16} {}",
            status(change.status),
            change.change_type.to_string(),
            change.target_id,
            change.id.dimmed()
        );
        if let Some(rationale) = &change.ai_rationale {
            println!("      {}", rationale.dimmed());
        }
    }
}

fn status(status: ChangeStatus) -> ColoredString {
    match status {
        ChangeStatus::Pending => "pending ".yellow(),
        ChangeStatus::Accepted => "accepted".green(),
        ChangeStatus::Rejected => "rejected".red(),
    }
}

fn resolve(session: &mut EditSession, target: &Resolve, decision: Decision) -> Result<()> {
    let verb = match decision {
        Decision::Accept => "Accepted",
        Decision::Reject => "Rejected",
    };

    if let Some(batch) = &target.batch {
        let count = match decision {
            Decision::Accept => session.accept_batch(batch)?,
            Decision::Reject => session.reject_batch(batch)?,
        };
        println!(
            "  {} {} {} changes of batch {}",
            "✓".green(),
            verb,
            count,
            batch.bright_white()
        );
        return Ok(());
    }

    let change = target
        .change
        .as_deref()
        .ok_or_else(|| anyhow!("Name a change or pass --batch"))?;
    let transition = match decision {
        Decision::Accept => session.accept_one(change)?,
        Decision::Reject => session.reject_one(change)?,
    };

    match transition {
        Transition::Applied => println!("  {} {} {}", "✓".green(), verb, change.bright_white()),
        Transition::Unchanged => println!("  {} {} was already resolved", "·".dimmed(), change),
    }
    Ok(())
}
