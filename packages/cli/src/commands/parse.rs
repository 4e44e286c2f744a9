use super::{print_skipped, write_output};
use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use mailcraft_parser::{parse_strict, parse_with_options};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Markup file to read
    pub input: PathBuf,

    /// Write the template here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Fail on any fragment that cannot be imported
    #[arg(long)]
    pub strict: bool,
}

pub fn parse(args: ParseArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let input = cwd.join(&args.input);
    let markup = fs::read_to_string(&input)
        .with_context(|| format!("Cannot read {}", input.display()))?;

    let template = if args.strict {
        parse_strict(&markup).map_err(|e| anyhow!("{}: {}", input.display(), e))?
    } else {
        let report = parse_with_options(&markup, &config.parse_options())
            .map_err(|e| anyhow!("{}: {}", input.display(), e))?;
        print_skipped(&report.skipped);
        report.template
    };

    let json = if config.pretty {
        serde_json::to_string_pretty(&template)?
    } else {
        serde_json::to_string(&template)?
    };

    let output = args.output.as_ref().map(|p| cwd.join(p));
    write_output(output.as_deref(), &json)?;

    if let Some(output) = output {
        eprintln!(
            "  {} {} → {} ({} sections)",
            "✓".green(),
            args.input.display(),
            output.display(),
            template.sections.len()
        );
    }

    Ok(())
}
