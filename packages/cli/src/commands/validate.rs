use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use mailcraft_schema::{validate_json, SchemaError};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Template documents to check
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

pub fn validate(args: ValidateArgs, cwd: &Path) -> Result<()> {
    let mut failed = 0;

    for file in &args.files {
        let path = cwd.join(file);
        let source = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read {}", path.display()))?;

        match validate_json(&source) {
            Ok(template) => {
                println!(
                    "  {} {} ({} sections, {} elements)",
                    "✓".green(),
                    file.display(),
                    template.sections.len(),
                    template.elements().count()
                );
            }
            Err(SchemaError::Json(e)) => {
                failed += 1;
                println!("  {} {} - {}", "✗".red(), file.display(), e.to_string().red());
            }
            Err(SchemaError::Invalid(issues)) => {
                failed += 1;
                println!("  {} {} - {} issue(s)", "✗".red(), file.display(), issues.len());
                for issue in issues.issues() {
                    println!("    {} {}", issue.path.bright_white(), issue.message.dimmed());
                }
            }
        }
    }

    println!();
    if failed == 0 {
        println!("{} All {} files are valid", "✅".green(), args.files.len());
        Ok(())
    } else {
        Err(anyhow!("{} of {} files failed validation", failed, args.files.len()))
    }
}
