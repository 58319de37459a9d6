//! CLI subcommand implementations.

pub mod export;
pub mod report;

use std::path::Path;

use anyhow::{Context, Result};
use trail_core::{Analysis, analyze};

use crate::Config;
use crate::load::load_csv;

/// Loads `file` and runs the analysis pipeline with `config`.
pub fn analyze_file(config: &Config, file: &Path) -> Result<Analysis> {
    let analysis_config = config
        .analysis_config()
        .context("invalid configuration")?;
    let rows = load_csv(file)?;
    let analysis = analyze(&rows, &analysis_config)
        .with_context(|| format!("failed to analyze {}", file.display()))?;
    Ok(analysis)
}
