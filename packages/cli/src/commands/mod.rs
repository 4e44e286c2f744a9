pub mod changes;
pub mod diff;
pub mod init;
pub mod parse;
pub mod render;
pub mod validate;

pub use changes::{changes, ChangesArgs};
pub use diff::{diff, DiffArgs};
pub use init::{init, InitArgs};
pub use parse::{parse, ParseArgs};
pub use render::{render, RenderArgs};
pub use validate::{validate, ValidateArgs};

use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use mailcraft_document::Template;
use mailcraft_parser::{parse_with_options, Skipped};
use mailcraft_schema::{validate_json, SchemaError};
use std::fs;
use std::path::Path;

/// Whether a path holds email markup rather than a JSON document
pub(crate) fn is_markup(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("html") | Some("htm")
    )
}

/// Load a template from a `.json` document or from rendered markup
pub(crate) fn load_template(path: &Path, config: &Config) -> Result<Template> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;

    if is_markup(path) {
        let report = parse_with_options(&source, &config.parse_options())
            .map_err(|e| anyhow!("{}: {}", path.display(), e))?;
        print_skipped(&report.skipped);
        return Ok(report.template);
    }

    validate_json(&source).map_err(|e| describe_schema_error(path, e))
}

pub(crate) fn describe_schema_error(path: &Path, error: SchemaError) -> anyhow::Error {
    match error {
        SchemaError::Json(e) => anyhow!("{} is not valid JSON: {}", path.display(), e),
        SchemaError::Invalid(issues) => {
            let lines: Vec<String> = issues.issues().iter().map(|i| i.to_string()).collect();
            anyhow!("{} failed validation:\n{}", path.display(), lines.join("\n"))
        }
    }
}

pub(crate) fn print_skipped(skipped: &[Skipped]) {
    for fragment in skipped {
        eprintln!(
            "  {} skipped {:?} at {}: {}",
            "⚠️".yellow(),
            fragment.kind,
            fragment.path.bright_white(),
            fragment.reason
        );
    }
}

/// Write to `path` (creating parent directories) or to stdout
pub(crate) fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, contents)?;
        }
        None => println!("{}", contents),
    }
    Ok(())
}
