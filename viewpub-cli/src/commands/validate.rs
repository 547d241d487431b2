//! `viewpub validate`: check that every expected view is live.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use viewpub_core::{PublishConfig, ValidationResult};
use viewpub_sync::{build_manifest, HttpManifestSource, ManifestSource};
use viewpub_verify::{validator::DEFAULT_CONCURRENCY, Validator, ValidatorOptions};

use super::{print_findings, print_json, TargetArgs};

/// Arguments for `viewpub validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Expected view filename; repeatable [default: every view in the views dir].
    #[arg(long = "file", value_name = "NAME")]
    pub files: Vec<String>,

    /// Expect exactly the files listed in the published manifest.
    #[arg(long, conflicts_with = "files")]
    pub from_remote: bool,

    /// Skip JSON parsing and structural checks.
    #[arg(long)]
    pub no_content: bool,

    /// Per-request timeout in seconds [default: `fetch_timeout_secs` from config].
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Requests in flight at once (1-8).
    #[arg(long, value_name = "N", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Emit the validation result as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct CheckRow {
    #[tabled(rename = "file")]
    file: String,
    #[tabled(rename = "result")]
    result: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "time")]
    time: String,
    #[tabled(rename = "note")]
    note: String,
}

impl ValidateArgs {
    pub fn run(self) -> Result<()> {
        let config = self.target.load()?;
        let base_url = config
            .base_url()
            .context("validate needs a base URL (--base-url, config or $VIEWPUB_BASE_URL)")?
            .to_string();

        let expected = self.expected_files(&config, &base_url)?;
        let options = ValidatorOptions {
            timeout: self.request_timeout(&config),
            check_content: !self.no_content,
            concurrency: self.concurrency,
            ..ValidatorOptions::default()
        };
        let validator = Validator::new(&base_url, options)?;
        let result = validator.validate(&expected);

        if self.json {
            print_json(&result)?;
        } else {
            print_report(&result);
        }

        if !result.success {
            bail!(
                "{} of {} view(s) failed validation",
                result.files_failed,
                result.total_files
            );
        }
        Ok(())
    }

    fn request_timeout(&self, config: &PublishConfig) -> Duration {
        match self.timeout {
            Some(secs) => Duration::from_secs(secs.max(1)),
            None => config.fetch_timeout(),
        }
    }

    fn expected_files(&self, config: &PublishConfig, base_url: &str) -> Result<Vec<String>> {
        if !self.files.is_empty() {
            return Ok(self.files.clone());
        }

        if self.from_remote {
            let source = HttpManifestSource::new(base_url, config.fetch_timeout());
            return match source.fetch().context("failed to read published manifest")? {
                Some(manifest) => Ok(manifest.filenames()),
                None => bail!("no manifest published at {}", source.url()),
            };
        }

        let dir = config.views_dir();
        let manifest = build_manifest(&dir)
            .with_context(|| format!("failed to list views in {}", dir.display()))?;
        Ok(manifest.filenames())
    }
}

fn print_report(result: &ValidationResult) {
    let summary = result.summary();
    if result.success {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.red());
    }

    if !result.checks.is_empty() {
        let rows: Vec<CheckRow> = result
            .checks
            .iter()
            .map(|check| CheckRow {
                file: check.filename.clone(),
                result: if !check.passed {
                    "FAIL".red().bold().to_string()
                } else if check.warnings.is_empty() {
                    "OK".green().bold().to_string()
                } else {
                    "WARN".yellow().bold().to_string()
                },
                status: check
                    .status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                time: check
                    .response_time_ms
                    .map(|ms| format!("{ms:.0}ms"))
                    .unwrap_or_else(|| "-".to_string()),
                note: check
                    .error
                    .clone()
                    .or_else(|| check.warnings.first().cloned())
                    .unwrap_or_default(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }
    print_findings(&result.warnings, &result.errors);
}
