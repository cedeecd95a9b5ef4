// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration merging and resolution.
//!
//! Precedence (highest to lowest):
//! 1. Environment variables
//! 2. Workspace config (.autometer.json / .autometer.yaml)
//! 3. Global config (~/.autometer/config.json)
//! 4. Default values

use std::time::Duration;

use super::types::{RuntimeConfig, ResolvedRuntimeConfig, DEFAULT_PUSH_JOB_NAME};
use crate::error::ConfigError;
use crate::runtime::{BuildInfo, DurationBuckets, PushEndpoint};

pub const PUSH_GATEWAY_URL_ENV: &str = "AUTOMETRICS_PUSH_GATEWAY_URL";
pub const PUSH_JOB_NAME_ENV: &str = "AUTOMETRICS_PUSH_JOB_NAME";
pub const VERSION_ENV: &str = "AUTOMETRICS_VERSION";
pub const COMMIT_ENV: &str = "AUTOMETRICS_COMMIT";
pub const BRANCH_ENV: &str = "AUTOMETRICS_BRANCH";
pub const SERVICE_NAME_ENV: &str = "AUTOMETRICS_SERVICE_NAME";
pub const OTEL_SERVICE_NAME_ENV: &str = "OTEL_SERVICE_NAME";

/// Merge file configurations, later sources winning field by field.
pub fn merge_config(global: Option<RuntimeConfig>, workspace: Option<RuntimeConfig>) -> RuntimeConfig {
    let mut result = RuntimeConfig::default();

    for config in [global, workspace].into_iter().flatten() {
        apply_config(&mut result, config);
    }

    result
}

fn apply_config(result: &mut RuntimeConfig, config: RuntimeConfig) {
    fn take<T>(slot: &mut Option<T>, value: Option<T>) {
        if value.is_some() {
            *slot = value;
        }
    }

    take(&mut result.push_gateway_url, config.push_gateway_url);
    take(&mut result.push_job_name, config.push_job_name);
    take(&mut result.push_timeout_ms, config.push_timeout_ms);
    take(&mut result.histogram_buckets, config.histogram_buckets);
    take(&mut result.version, config.version);
    take(&mut result.commit, config.commit);
    take(&mut result.branch, config.branch);
    take(&mut result.service_name, config.service_name);
}

/// Override `config` from environment variables looked up through `env`.
///
/// Empty values are ignored. `AUTOMETRICS_SERVICE_NAME` wins over
/// `OTEL_SERVICE_NAME`.
pub fn apply_env_overrides<F>(config: &mut RuntimeConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).filter(|value| !value.is_empty());

    if let Some(url) = lookup(PUSH_GATEWAY_URL_ENV) {
        config.push_gateway_url = Some(url);
    }
    if let Some(job) = lookup(PUSH_JOB_NAME_ENV) {
        config.push_job_name = Some(job);
    }
    if let Some(version) = lookup(VERSION_ENV) {
        config.version = Some(version);
    }
    if let Some(commit) = lookup(COMMIT_ENV) {
        config.commit = Some(commit);
    }
    if let Some(branch) = lookup(BRANCH_ENV) {
        config.branch = Some(branch);
    }
    if let Some(service) = lookup(SERVICE_NAME_ENV).or_else(|| lookup(OTEL_SERVICE_NAME_ENV)) {
        config.service_name = Some(service);
    }
}

/// Validate `config` and fill defaults.
pub fn resolve(config: RuntimeConfig) -> Result<ResolvedRuntimeConfig, ConfigError> {
    let mut resolved = ResolvedRuntimeConfig::default();

    if let Some(url) = config.push_gateway_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "pushGatewayUrl",
                format!("expected an http(s) URL, got '{}'", url),
            ));
        }
        let job = config
            .push_job_name
            .unwrap_or_else(|| DEFAULT_PUSH_JOB_NAME.to_string());
        if job.is_empty() || job.contains('/') {
            return Err(ConfigError::invalid("pushJobName", "must be non-empty and contain no '/'"));
        }
        resolved.push_endpoint = Some(PushEndpoint::new(url, job));
    }

    if let Some(ms) = config.push_timeout_ms {
        if ms == 0 {
            return Err(ConfigError::invalid("pushTimeoutMs", "must be greater than zero"));
        }
        resolved.push_timeout = Duration::from_millis(ms);
    }

    if let Some(bounds) = config.histogram_buckets {
        validate_buckets(&bounds)?;
        resolved.buckets = DurationBuckets::new(&bounds);
    }

    resolved.build = BuildInfo {
        version: config.version.unwrap_or_default(),
        commit: config.commit.unwrap_or_default(),
        branch: config.branch.unwrap_or_default(),
        service: config.service_name.unwrap_or_default(),
    };

    Ok(resolved)
}

fn validate_buckets(bounds: &[f64]) -> Result<(), ConfigError> {
    if bounds.is_empty() {
        return Err(ConfigError::invalid("histogramBuckets", "must not be empty"));
    }
    if bounds.iter().any(|b| !b.is_finite() || *b <= 0.0) {
        return Err(ConfigError::invalid("histogramBuckets", "bounds must be positive and finite"));
    }
    if bounds.windows(2).any(|w| w[0] >= w[1]) {
        return Err(ConfigError::invalid("histogramBuckets", "bounds must be strictly increasing"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_merge_config_precedence() {
        let global = RuntimeConfig {
            push_job_name: Some("global".to_string()),
            version: Some("1.0".to_string()),
            ..Default::default()
        };
        let workspace = RuntimeConfig {
            push_job_name: Some("workspace".to_string()),
            ..Default::default()
        };

        let merged = merge_config(Some(global), Some(workspace));
        assert_eq!(merged.push_job_name.as_deref(), Some("workspace"));
        assert_eq!(merged.version.as_deref(), Some("1.0"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RuntimeConfig {
            push_job_name: Some("file".to_string()),
            ..Default::default()
        };
        apply_env_overrides(
            &mut config,
            env(&[
                (PUSH_GATEWAY_URL_ENV, "http://gw:9091"),
                (PUSH_JOB_NAME_ENV, ""),
                (COMMIT_ENV, "abc123"),
                (OTEL_SERVICE_NAME_ENV, "otel-svc"),
            ]),
        );

        assert_eq!(config.push_gateway_url.as_deref(), Some("http://gw:9091"));
        assert_eq!(config.push_job_name.as_deref(), Some("file"));
        assert_eq!(config.commit.as_deref(), Some("abc123"));
        assert_eq!(config.service_name.as_deref(), Some("otel-svc"));
    }

    #[test]
    fn test_autometrics_service_name_wins() {
        let mut config = RuntimeConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[(SERVICE_NAME_ENV, "am-svc"), (OTEL_SERVICE_NAME_ENV, "otel-svc")]),
        );
        assert_eq!(config.service_name.as_deref(), Some("am-svc"));
    }

    #[test]
    fn test_resolve_defaults() {
        let resolved = resolve(RuntimeConfig::default()).unwrap();
        assert!(resolved.push_endpoint.is_none());
        assert_eq!(resolved.build, BuildInfo::default());
    }

    #[test]
    fn test_resolve_endpoint_default_job() {
        let resolved = resolve(RuntimeConfig {
            push_gateway_url: Some("http://gw:9091".to_string()),
            ..Default::default()
        })
        .unwrap();

        let endpoint = resolved.push_endpoint.unwrap();
        assert_eq!(endpoint.job, "autometrics_job");
        assert_eq!(endpoint.job_url(), "http://gw:9091/metrics/job/autometrics_job");
    }

    #[test]
    fn test_resolve_rejects_bad_values() {
        let bad_url = RuntimeConfig {
            push_gateway_url: Some("gw:9091".to_string()),
            ..Default::default()
        };
        assert!(matches!(resolve(bad_url), Err(ConfigError::InvalidValue { .. })));

        let bad_buckets = RuntimeConfig {
            histogram_buckets: Some(vec![1.0, 0.5]),
            ..Default::default()
        };
        assert!(resolve(bad_buckets).is_err());

        let zero_timeout = RuntimeConfig {
            push_timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(resolve(zero_timeout).is_err());
    }

    #[test]
    fn test_resolve_build_info() {
        let resolved = resolve(RuntimeConfig {
            version: Some("2.0".to_string()),
            branch: Some("main".to_string()),
            service_name: Some("api".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(resolved.build.version, "2.0");
        assert_eq!(resolved.build.branch, "main");
        assert_eq!(resolved.build.service, "api");
        assert_eq!(resolved.build.commit, "");
    }
}
