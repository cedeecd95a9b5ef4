// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The three metric families and their registries.

use std::fmt;
use std::sync::Arc;

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::exemplar::{CounterWithExemplar, HistogramWithExemplars};
use prometheus_client::metrics::family::{Family, MetricConstructor};
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::{Registry, Unit};

use super::labels::LabelSet;

pub const FUNCTION_CALLS_COUNT_NAME: &str = "function_calls";
pub const FUNCTION_CALLS_DURATION_NAME: &str = "function_calls_duration";
pub const FUNCTION_CALLS_CONCURRENT_NAME: &str = "function_calls_concurrent";

/// Default latency buckets, in seconds.
pub const DEFAULT_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Which families a snapshot covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The concurrency gauge only.
    Concurrency,
    /// Counter, histogram and gauge.
    All,
}

/// Creates duration histograms with the configured bucket bounds.
#[derive(Debug, Clone)]
pub struct DurationBuckets(Arc<[f64]>);

impl DurationBuckets {
    pub fn new(bounds: &[f64]) -> Self {
        Self(bounds.into())
    }

    pub fn bounds(&self) -> &[f64] {
        &self.0
    }
}

impl Default for DurationBuckets {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKETS)
    }
}

impl MetricConstructor<HistogramWithExemplars<LabelSet>> for DurationBuckets {
    fn new_metric(&self) -> HistogramWithExemplars<LabelSet> {
        HistogramWithExemplars::new(self.0.iter().copied())
    }
}

type CallCounter = Family<LabelSet, CounterWithExemplar<LabelSet>>;
type DurationHistogram = Family<LabelSet, HistogramWithExemplars<LabelSet>, DurationBuckets>;
type ConcurrencyGauge = Family<LabelSet, Gauge>;

/// Call counter, duration histogram and concurrency gauge.
///
/// Two registries share the gauge so that entry-time pushes can send it alone.
#[derive(Debug)]
pub struct MetricFamilies {
    calls: CallCounter,
    durations: DurationHistogram,
    concurrent: ConcurrencyGauge,
    registry: Registry,
    concurrency_registry: Registry,
}

impl MetricFamilies {
    pub fn new(buckets: DurationBuckets) -> Self {
        let calls = CallCounter::default();
        let durations = DurationHistogram::new_with_constructor(buckets);
        let concurrent = ConcurrencyGauge::default();

        let mut registry = Registry::default();
        registry.register(
            FUNCTION_CALLS_COUNT_NAME,
            "Autometrics counter for tracking function calls",
            calls.clone(),
        );
        registry.register_with_unit(
            FUNCTION_CALLS_DURATION_NAME,
            "Autometrics histogram for tracking function call duration",
            Unit::Seconds,
            durations.clone(),
        );
        registry.register(
            FUNCTION_CALLS_CONCURRENT_NAME,
            "Autometrics gauge for tracking function calls concurrency",
            concurrent.clone(),
        );

        let mut concurrency_registry = Registry::default();
        concurrency_registry.register(
            FUNCTION_CALLS_CONCURRENT_NAME,
            "Autometrics gauge for tracking function calls concurrency",
            concurrent.clone(),
        );

        Self {
            calls,
            durations,
            concurrent,
            registry,
            concurrency_registry,
        }
    }

    pub fn add_concurrent(&self, labels: &LabelSet, delta: i64) {
        self.concurrent.get_or_create(labels).inc_by(delta);
    }

    /// Current gauge value for `labels`; creates the series at zero when absent.
    pub fn concurrent_calls(&self, labels: &LabelSet) -> i64 {
        self.concurrent.get_or_create(labels).get()
    }

    pub fn record_call(&self, labels: &LabelSet, exemplar: Option<LabelSet>) {
        self.calls.get_or_create(labels).inc_by(1, exemplar);
    }

    /// Current counter value for `labels`; creates the series at zero when absent.
    pub fn call_count(&self, labels: &LabelSet) -> u64 {
        self.calls.get_or_create(labels).get().0
    }

    pub fn observe_duration(&self, labels: &LabelSet, seconds: f64, exemplar: Option<LabelSet>) {
        self.durations.get_or_create(labels).observe(seconds, exemplar);
    }

    /// OpenMetrics text of the families in `scope`.
    pub fn encode(&self, scope: Scope) -> Result<String, fmt::Error> {
        let mut out = String::new();
        let registry = match scope {
            Scope::Concurrency => &self.concurrency_registry,
            Scope::All => &self.registry,
        };
        encode(&mut out, registry)?;
        Ok(out)
    }
}

impl Default for MetricFamilies {
    fn default() -> Self {
        Self::new(DurationBuckets::default())
    }
}
