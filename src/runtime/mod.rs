// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Metrics runtime for instrumented functions.
//!
//! Each instrumented call goes through two hooks:
//!
//! - **entry** ([`Autometrics::on_enter`]): completes the call [`Context`]
//!   and bumps the concurrency gauge
//! - **exit** ([`Autometrics::on_exit`]): counts the call with its result,
//!   observes its duration and releases the gauge
//!
//! Both hooks may trigger a best-effort push to a push gateway through the
//! [`PushDispatcher`]. Samples carry trace/span exemplars.
//!
//! # Usage
//!
//! ```rust,ignore
//! use autometer::call_info;
//! use autometer::runtime::{Autometrics, Context};
//!
//! let recorder = Autometrics::new(&autometer::config::load_config(&root)?);
//!
//! fn handle(recorder: &Autometrics) -> Result<(), MyError> {
//!     let mut guard = recorder.instrument(Context::new(call_info!("handle")));
//!     guard.record_result(do_work())
//! }
//! ```

mod context;
mod exemplars;
mod ids;
mod labels;
mod metrics;
mod push;
mod recorder;

pub use context::{BuildInfo, CallInfo, Context, Outcome};
pub use exemplars::{exemplars, PARENT_SPAN_ID_EXEMPLAR, SPAN_ID_EXEMPLAR, TRACE_ID_EXEMPLAR};
pub use ids::{SpanId, TraceId};
pub use labels::{
    counter_labels, format_float, gauge_labels, histogram_labels, LabelSet, CLEAR_MODE_FAMILY,
    CLEAR_MODE_LABEL,
};
pub use metrics::{
    DurationBuckets, MetricFamilies, Scope, DEFAULT_BUCKETS, FUNCTION_CALLS_CONCURRENT_NAME,
    FUNCTION_CALLS_COUNT_NAME, FUNCTION_CALLS_DURATION_NAME,
};
pub use push::{PushAttempt, PushDispatcher, PushEndpoint};
pub use recorder::{Autometrics, CallMarker, InstrumentGuard};
