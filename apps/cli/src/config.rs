//! CLI configuration loading and merging.

use anyhow::Context;
use cml_pipeline::DeployConfig;
use std::path::Path;

/// Load and merge CLI configuration.
///
/// Configuration precedence:
/// 1. CLI arguments (handled by clap)
/// 2. Explicit `--config` file
/// 3. Local config file (./.cml-deploy.toml)
/// 4. Global config file (~/.cml-deploy/config.toml)
/// 5. Defaults
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<DeployConfig> {
    DeployConfig::discover_and_load(explicit).context("Failed to load configuration")
}
