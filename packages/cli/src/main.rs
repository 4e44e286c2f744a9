mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    changes, diff, init, parse, render, validate, ChangesArgs, DiffArgs, InitArgs, ParseArgs,
    RenderArgs, ValidateArgs,
};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Mailcraft CLI - email templates as reviewable documents
#[derive(Parser, Debug)]
#[command(name = "mailcraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Show debug logs (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a config file and a starter template
    Init(InitArgs),

    /// Read email markup into a template document
    Parse(ParseArgs),

    /// Check a template document against the schema
    Validate(ValidateArgs),

    /// Render template documents to email markup
    Render(RenderArgs),

    /// Compare two versions of a template
    Diff(DiffArgs),

    /// Propose, list and review changes of a project
    Changes(ChangesArgs),
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| run(cli.command, &cwd));

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

fn run(command: Command, cwd: &Path) -> anyhow::Result<()> {
    match command {
        Command::Init(args) => init(args, cwd),
        Command::Parse(args) => parse(args, cwd),
        Command::Validate(args) => validate(args, cwd),
        Command::Render(args) => render(args, cwd),
        Command::Diff(args) => diff(args, cwd),
        Command::Changes(args) => changes(args, cwd),
    }
}
