//! `viewpub deploy`: build, diff, upload, commit.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use viewpub_core::{DeployMode, DeploymentResult};
use viewpub_sync::Deployer;

use super::{print_findings, print_json, TargetArgs};

/// Arguments for `viewpub deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Report the upload set and its size without uploading anything.
    #[arg(long, conflicts_with = "check_only")]
    pub dry_run: bool,

    /// Report the upload set only.
    #[arg(long)]
    pub check_only: bool,

    /// Emit the deployment result as JSON.
    #[arg(long)]
    pub json: bool,
}

impl DeployArgs {
    pub fn run(self) -> Result<()> {
        let config = self.target.load()?;
        let deployer = Deployer::from_config(&config).context("invalid publish configuration")?;

        let result = deployer.deploy(self.mode());
        if self.json {
            print_json(&result)?;
        } else {
            print_result(&result);
        }

        if !result.success {
            bail!("deploy failed: {}", result.message);
        }
        Ok(())
    }

    fn mode(&self) -> DeployMode {
        if self.dry_run {
            DeployMode::DryRun
        } else if self.check_only {
            DeployMode::CheckOnly
        } else {
            DeployMode::Publish
        }
    }
}

fn print_result(result: &DeploymentResult) {
    let summary = result.summary();
    if result.success {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.red());
    }

    if result.mode != DeployMode::Publish {
        for name in &result.upload_set {
            println!("  {} {name}", "+".cyan());
        }
    }
    print_findings(&result.warnings, &result.errors);
}
