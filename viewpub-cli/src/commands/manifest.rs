//! `viewpub manifest`: print the manifest a deploy would publish.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use viewpub_core::config;
use viewpub_sync::build_manifest;

use super::print_json;

/// Arguments for `viewpub manifest`.
#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// View directory [default: `views_dir` from ~/.viewpub/config.yaml].
    pub dir: Option<PathBuf>,
}

impl ManifestArgs {
    pub fn run(self) -> Result<()> {
        let dir = match self.dir {
            Some(dir) => dir,
            None => config::load_default()
                .context("failed to load ~/.viewpub/config.yaml")?
                .resolve_env_with(|key| std::env::var(key).ok())
                .views_dir(),
        };
        if !dir.is_dir() {
            bail!("view directory {} does not exist", dir.display());
        }

        let manifest = build_manifest(&dir)
            .with_context(|| format!("failed to build manifest for {}", dir.display()))?;
        print_json(&manifest)
    }
}
