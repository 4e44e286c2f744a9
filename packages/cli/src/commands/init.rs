use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use mailcraft_document::{starter_template, IDGenerator};
use mailcraft_editor::{DirectoryStore, EditorError, ProjectStore};
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Project to seed with a starter template
    #[arg(short, long, default_value = "default")]
    pub project: String,

    /// Name of the starter template
    #[arg(short, long, default_value = "Untitled email")]
    pub name: String,

    /// Force overwrite existing config and template
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Mailcraft project...".bright_blue().bold());

    let config = Config::default();
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    let mut store = DirectoryStore::new(config.store_dir(cwd));
    let exists = match store.load_template(&args.project) {
        Ok(_) => true,
        Err(EditorError::ProjectNotFound(_)) => false,
        Err(err) => return Err(err.into()),
    };

    if exists && !args.force {
        println!(
            "  {} Project {} already has a template",
            "⚠️".yellow(),
            args.project.bright_white()
        );
    } else {
        let template = starter_template(&args.name, &mut IDGenerator::new());
        store.save_template(&args.project, &template)?;
        store.save_changes(&args.project, &[])?;
        println!(
            "  {} Created project {} in {}/",
            "✓".green(),
            args.project.bright_white(),
            config.store_dir
        );
    }

    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: mailcraft changes propose {} <generated.html>", args.project);
    println!("  2. Run: mailcraft changes list {}", args.project);
    println!("  3. Accept or reject the proposed changes");

    Ok(())
}
