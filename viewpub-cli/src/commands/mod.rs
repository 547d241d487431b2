pub mod deploy;
pub mod manifest;
pub mod validate;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use viewpub_core::{config, PublishConfig};

/// Target selection shared by `deploy` and `validate`.
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Config file [default: ~/.viewpub/config.yaml].
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the generated views.
    #[arg(long, value_name = "DIR")]
    pub views_dir: Option<PathBuf>,

    /// Publish target: local_dev, r2 or s3.
    #[arg(long, value_name = "P")]
    pub provider: Option<String>,

    /// Public base URL the views are served from.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,
}

impl TargetArgs {
    /// Config file, then flags, then the process environment for any gaps.
    pub fn load(&self) -> Result<PublishConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_at(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => config::load_default().context("failed to load ~/.viewpub/config.yaml")?,
        };

        if let Some(provider) = &self.provider {
            cfg.provider = Some(provider.clone());
        }
        if let Some(base_url) = &self.base_url {
            cfg.base_url = Some(base_url.clone());
        }
        if let Some(views_dir) = &self.views_dir {
            cfg.views_dir = Some(views_dir.clone());
        }

        Ok(cfg.resolve_env_with(|key| std::env::var(key).ok()))
    }
}

/// Itemized warnings (stdout) and errors (stderr) under a summary line.
pub(crate) fn print_findings(warnings: &[String], errors: &[String]) {
    for warning in warnings {
        println!("  {} {warning}", "warning:".yellow().bold());
    }
    for error in errors {
        eprintln!("  {} {error}", "error:".red().bold());
    }
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize result JSON")?
    );
    Ok(())
}
