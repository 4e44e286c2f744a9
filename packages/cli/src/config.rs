use mailcraft_compiler_html::CompileOptions;
use mailcraft_parser::{ParseOptions, DEFAULT_CONTAINER_CLASS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "mailcraft.config.json";

/// Mailcraft configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Directory rendered markup is written to
    pub out_dir: String,

    /// Indent rendered markup
    pub pretty: bool,

    /// Class of the table holding the email content
    pub container_class: String,

    /// Image shown where an image source is still a placeholder
    pub placeholder_image_url: String,

    /// Directory holding project templates and change history
    pub store_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            out_dir: "dist".to_string(),
            pretty: true,
            container_class: DEFAULT_CONTAINER_CLASS.to_string(),
            placeholder_image_url: CompileOptions::default().placeholder_image_url,
            store_dir: ".mailcraft".to_string(),
        }
    }
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    pub fn out_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.out_dir)
    }

    pub fn store_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.store_dir)
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            pretty: self.pretty,
            placeholder_image_url: self.placeholder_image_url.clone(),
            container_class: self.container_class.clone(),
            ..CompileOptions::default()
        }
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            container_class: self.container_class.clone(),
            ..ParseOptions::default()
        }
    }
}
