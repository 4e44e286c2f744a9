use super::load_template;
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use mailcraft_compiler_html::{compile_to_html, CompileOptions};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Template document, or a directory of them
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output to stdout instead of files
    #[arg(long)]
    pub stdout: bool,

    /// Output directory (overrides config)
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Skip indentation
    #[arg(long)]
    pub compact: bool,

    /// Emit the container table only, without the document wrapper
    #[arg(long)]
    pub fragment: bool,
}

pub fn render(args: RenderArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let root = cwd.join(&args.path);

    if !root.exists() {
        return Err(anyhow!("Path does not exist: {}", root.display()));
    }

    let mut options = config.compile_options();
    if args.compact {
        options.pretty = false;
    }
    if args.fragment {
        options.full_document = false;
    }

    let files = find_documents(&root, &config.store_dir(cwd));
    debug!(root = %root.display(), count = files.len(), "found template documents");
    if files.is_empty() {
        println!("{}", "⚠️  No template documents found".yellow());
        return Ok(());
    }

    let out_dir = args
        .out_dir
        .as_ref()
        .map(|dir| cwd.join(dir))
        .unwrap_or_else(|| config.out_dir(cwd));

    if !args.stdout {
        println!("{}", "🔨 Rendering templates...".bright_blue().bold());
    }

    let mut success_count = 0;
    let mut error_count = 0;

    for file in &files {
        let relative_path = file.strip_prefix(cwd).unwrap_or(file);
        match render_file(file, &config, &options) {
            Ok(html) if args.stdout => {
                success_count += 1;
                println!("{}", html);
            }
            Ok(html) => {
                let output_file = out_dir.join(format!("{}.html", file_stem(file)));
                fs::create_dir_all(&out_dir)?;
                fs::write(&output_file, html)?;
                success_count += 1;
                println!(
                    "  {} {} → {}",
                    "✓".green(),
                    relative_path.display(),
                    output_file.strip_prefix(cwd).unwrap_or(&output_file).display()
                );
            }
            Err(e) => {
                error_count += 1;
                eprintln!(
                    "  {} {} - {}",
                    "✗".red(),
                    relative_path.display(),
                    e.to_string().red()
                );
            }
        }
    }

    if args.stdout {
        return if error_count == 0 {
            Ok(())
        } else {
            Err(anyhow!("{} templates failed to render", error_count))
        };
    }

    println!();
    if error_count == 0 {
        println!("{} Rendered {} templates successfully", "✅".green(), success_count);
        Ok(())
    } else {
        println!(
            "{} Rendered {} templates, {} errors",
            "⚠️".yellow(),
            success_count,
            error_count
        );
        Err(anyhow!("{} templates failed to render", error_count))
    }
}

/// `.json` documents under `root`, leaving out the project store
fn find_documents(root: &Path, store_dir: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.path() != store_dir)
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .filter(|p| !p.ends_with(crate::config::DEFAULT_CONFIG_NAME))
        .collect();
    files.sort();
    files
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("template")
        .to_string()
}

fn render_file(path: &Path, config: &Config, options: &CompileOptions) -> Result<String> {
    let template = load_template(path, config)?;
    Ok(compile_to_html(&template, options)?)
}
