// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration for the metrics runtime.
//!
//! Handles loading, merging, and validation of configuration from multiple sources:
//! - Global config: ~/.autometer/config.json
//! - Workspace config: .autometer.json, .autometer.yaml or .autometer.yml
//! - Environment: `AUTOMETRICS_*` and `OTEL_SERVICE_NAME`
//!
//! Configuration is merged with precedence (environment > workspace > global > defaults).

mod loader;
mod merger;
mod types;

pub use loader::{
    find_workspace_root, get_global_config_dir, get_global_config_path, load_config_file,
    load_global_config, load_workspace_config, CONFIG_FILES, GLOBAL_CONFIG_DIR,
    GLOBAL_CONFIG_FILE,
};

pub use merger::{
    apply_env_overrides, merge_config, resolve, BRANCH_ENV, COMMIT_ENV, OTEL_SERVICE_NAME_ENV,
    PUSH_GATEWAY_URL_ENV, PUSH_JOB_NAME_ENV, SERVICE_NAME_ENV, VERSION_ENV,
};

pub use types::{
    ResolvedRuntimeConfig, RuntimeConfig, DEFAULT_PUSH_JOB_NAME, DEFAULT_PUSH_TIMEOUT_MS,
};

use crate::error::ConfigError;
use std::path::Path;

/// Load, merge and resolve all configuration sources for a workspace.
///
/// This is the main entry point for configuration loading.
pub fn load_config(workspace_root: &Path) -> Result<ResolvedRuntimeConfig, ConfigError> {
    load_config_with_env(workspace_root, |key| std::env::var(key).ok())
}

/// [`load_config`] with an explicit environment lookup.
pub fn load_config_with_env<F>(
    workspace_root: &Path,
    env: F,
) -> Result<ResolvedRuntimeConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let global = load_global_config()?;
    let workspace = load_workspace_config(workspace_root)?;

    let mut merged = merge_config(global, workspace);
    apply_env_overrides(&mut merged, env);
    resolve(merged)
}
