// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Label contract of the three metric families.
//!
//! Keys and their order are fixed; every key is always present, with an empty
//! value when it does not apply.

use super::context::{Context, Outcome};

pub const FUNCTION_LABEL: &str = "function";
pub const MODULE_LABEL: &str = "module";
pub const CALLER_FUNCTION_LABEL: &str = "caller_function";
pub const CALLER_MODULE_LABEL: &str = "caller_module";
pub const RESULT_LABEL: &str = "result";
pub const TARGET_LATENCY_LABEL: &str = "objective_latency_threshold";
pub const TARGET_SUCCESS_RATE_LABEL: &str = "objective_percentile";
pub const SLO_NAME_LABEL: &str = "objective_name";
pub const BRANCH_LABEL: &str = "branch";
pub const COMMIT_LABEL: &str = "commit";
pub const VERSION_LABEL: &str = "version";
pub const SERVICE_NAME_LABEL: &str = "service_name";

/// Kept for gravel gateway compatibility: asks the gateway to replace whole
/// families on push instead of summing them.
pub const CLEAR_MODE_LABEL: &str = "clearmode";
pub const CLEAR_MODE_FAMILY: &str = "family";

/// Ordered label pairs of one series.
pub type LabelSet = Vec<(String, String)>;

/// Objective label values, empty unless the call carries a named SLO.
#[derive(Debug, Default)]
struct Objectives {
    slo_name: String,
    latency_target: String,
    latency_objective: String,
    success_objective: String,
}

impl Objectives {
    fn of(ctx: &Context) -> Self {
        let Some(alert) = ctx.alert().filter(|alert| !alert.service_name.is_empty()) else {
            return Self::default();
        };

        let mut objectives = Self {
            slo_name: alert.service_name.clone(),
            ..Self::default()
        };
        if let Some(latency) = &alert.latency {
            objectives.latency_target = format_float(latency.target.as_secs_f64());
            objectives.latency_objective = format_float(latency.objective);
        }
        if let Some(success) = &alert.success {
            objectives.success_objective = format_float(success.objective);
        }
        objectives
    }
}

/// Shortest decimal form without exponent: `0.25`, `99.9`, `90`.
pub fn format_float(value: f64) -> String {
    format!("{}", value)
}

fn pair(key: &str, value: &str) -> (String, String) {
    (key.to_string(), value.to_string())
}

fn caller_pairs(ctx: &Context) -> [(String, String); 4] {
    let call = ctx.call();
    [
        pair(FUNCTION_LABEL, &call.function),
        pair(MODULE_LABEL, &call.module),
        pair(CALLER_FUNCTION_LABEL, &call.caller_function),
        pair(CALLER_MODULE_LABEL, &call.caller_module),
    ]
}

fn build_pairs(ctx: &Context) -> [(String, String); 5] {
    let build = ctx.build();
    [
        pair(BRANCH_LABEL, &build.branch),
        pair(COMMIT_LABEL, &build.commit),
        pair(VERSION_LABEL, &build.version),
        pair(SERVICE_NAME_LABEL, &build.service),
        pair(CLEAR_MODE_LABEL, CLEAR_MODE_FAMILY),
    ]
}

/// Labels of the `function_calls` counter.
pub fn counter_labels(ctx: &Context, outcome: Outcome) -> LabelSet {
    let objectives = Objectives::of(ctx);
    let mut labels = Vec::with_capacity(12);
    labels.extend(caller_pairs(ctx));
    labels.push(pair(RESULT_LABEL, outcome.as_str()));
    labels.push(pair(TARGET_SUCCESS_RATE_LABEL, &objectives.success_objective));
    labels.push(pair(SLO_NAME_LABEL, &objectives.slo_name));
    labels.extend(build_pairs(ctx));
    labels
}

/// Labels of the `function_calls_duration_seconds` histogram.
pub fn histogram_labels(ctx: &Context) -> LabelSet {
    let objectives = Objectives::of(ctx);
    let mut labels = Vec::with_capacity(12);
    labels.extend(caller_pairs(ctx));
    labels.push(pair(TARGET_LATENCY_LABEL, &objectives.latency_target));
    labels.push(pair(TARGET_SUCCESS_RATE_LABEL, &objectives.latency_objective));
    labels.push(pair(SLO_NAME_LABEL, &objectives.slo_name));
    labels.extend(build_pairs(ctx));
    labels
}

/// Labels of the `function_calls_concurrent` gauge.
pub fn gauge_labels(ctx: &Context) -> LabelSet {
    let mut labels = Vec::with_capacity(9);
    labels.extend(caller_pairs(ctx));
    labels.extend(build_pairs(ctx));
    labels
}
