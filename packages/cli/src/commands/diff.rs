use super::load_template;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::{ColoredString, Colorize};
use mailcraft_diff::{
    diff_templates_with_options, DiffOptions, DiffStatus, Move, TemplateDiffResult,
};
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Old version (.json document or .html markup)
    pub old: PathBuf,

    /// New version (.json document or .html markup)
    pub new: PathBuf,

    /// Print the full diff as JSON
    #[arg(long)]
    pub json: bool,

    /// Leave unchanged entities out of the result
    #[arg(long)]
    pub changed_only: bool,
}

pub fn diff(args: DiffArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let old = load_template(&cwd.join(&args.old), &config)?;
    let new = load_template(&cwd.join(&args.new), &config)?;

    let options = DiffOptions {
        report_unchanged: !args.changed_only,
    };
    let result = diff_templates_with_options(&old, &new, &options);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    Ok(())
}

fn print_summary(result: &TemplateDiffResult) {
    if !result.has_changes {
        println!("{}", "✅ No changes".green().bold());
        return;
    }

    for field in result.template_changes.keys() {
        println!("  {} template {}", "~".yellow(), field.bright_white());
    }

    for section in result.sections.iter().filter(|s| s.is_changed()) {
        println!(
            "  {} section {}{}",
            marker(section.status),
            section.id.bright_white(),
            describe_move(section.moved.as_ref())
        );
        for field in section.changes.keys() {
            println!("      {} {}", "~".yellow(), field);
        }
        for element in section.elements.iter().filter(|e| e.is_changed()) {
            println!(
                "    {} {} {}{}",
                marker(element.status),
                element.element_type.dimmed(),
                element.id,
                describe_move(element.moved.as_ref())
            );
        }
    }

    for collision in &result.collisions {
        println!(
            "  {} id {} ({:?}): {}",
            "⚠️".yellow(),
            collision.id.bright_white(),
            collision.kind,
            collision.detail
        );
    }

    let summary = result.summary();
    println!();
    println!(
        "Elements: {} added, {} removed, {} modified, {} moved",
        summary.added.to_string().green(),
        summary.removed.to_string().red(),
        summary.modified.to_string().yellow(),
        summary.moved.to_string().cyan()
    );
}

fn marker(status: DiffStatus) -> ColoredString {
    match status {
        DiffStatus::Added => "+".green(),
        DiffStatus::Removed => "-".red(),
        DiffStatus::Modified => "~".yellow(),
        DiffStatus::Unchanged => "→".cyan(),
    }
}

fn describe_move(moved: Option<&Move>) -> String {
    match moved {
        Some(m) if m.changed_parent() => format!(
            " (moved from {} to {})",
            m.from_parent.as_deref().unwrap_or("template"),
            m.to_parent.as_deref().unwrap_or("template")
        ),
        Some(m) => format!(" (moved {} → {})", m.from_index, m.to_index),
        None => String::new(),
    }
}
