// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration types for the metrics runtime.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::runtime::{BuildInfo, DurationBuckets, PushEndpoint};

/// Default push gateway job name.
pub const DEFAULT_PUSH_JOB_NAME: &str = "autometrics_job";

/// Default bound on a single push, in milliseconds.
pub const DEFAULT_PUSH_TIMEOUT_MS: u64 = 10_000;

/// Runtime configuration as read from a file.
///
/// Every field is optional; unset fields fall back to the next source and
/// finally to the defaults of [`ResolvedRuntimeConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// Base URL of the push gateway. Pushing is disabled when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_gateway_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_job_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_timeout_ms: Option<u64>,

    /// Upper bounds of the duration histogram buckets, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram_buckets: Option<Vec<f64>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct ResolvedRuntimeConfig {
    pub push_endpoint: Option<PushEndpoint>,
    pub push_timeout: Duration,
    pub buckets: DurationBuckets,
    pub build: BuildInfo,
}

impl Default for ResolvedRuntimeConfig {
    fn default() -> Self {
        Self {
            push_endpoint: None,
            push_timeout: Duration::from_millis(DEFAULT_PUSH_TIMEOUT_MS),
            buckets: DurationBuckets::default(),
            build: BuildInfo::default(),
        }
    }
}
