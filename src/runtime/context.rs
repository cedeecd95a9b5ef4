// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Per-call instrumentation context.
//!
//! A [`Context`] is built at the call site with the same options the Go
//! generator emits (`WithTraceID`, `WithConcurrentCalls`, `WithSloName`, ...)
//! and is completed by the recorder on entry with caller, build and tracing
//! information.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ids::{SpanId, TraceId};
use crate::slo::{AlertConfiguration, LatencyObjective, SuccessObjective};

/// Identity of the instrumented function and of its caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CallInfo {
    pub function: String,
    pub module: String,
    pub caller_function: String,
    pub caller_module: String,
}

impl CallInfo {
    pub fn new(function: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            module: module.into(),
            caller_function: String::new(),
            caller_module: String::new(),
        }
    }

    /// Set the caller explicitly instead of reading it from the call stack.
    pub fn with_caller(mut self, function: impl Into<String>, module: impl Into<String>) -> Self {
        self.caller_function = function.into();
        self.caller_module = module.into();
        self
    }

    pub fn has_caller(&self) -> bool {
        !self.caller_function.is_empty()
    }
}

/// Build [`CallInfo`] for a function in the current module.
///
/// ```rust,ignore
/// let ctx = Context::new(call_info!("handle_request"));
/// ```
#[macro_export]
macro_rules! call_info {
    ($function:expr) => {
        $crate::runtime::CallInfo::new($function, module_path!())
    };
}

/// Build identity reported on every series.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub commit: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub service: String,
}

/// Result label of a finished call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Outcome {
    #[default]
    Ok,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }

    pub fn from_error(error: Option<&dyn std::error::Error>) -> Self {
        if error.is_some() {
            Self::Error
        } else {
            Self::Ok
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options and identity of one instrumented call.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    pub(crate) call: CallInfo,
    pub(crate) build: BuildInfo,
    pub(crate) trace_id: Option<TraceId>,
    pub(crate) span_id: Option<SpanId>,
    pub(crate) parent_span_id: Option<SpanId>,
    pub(crate) track_concurrent_calls: bool,
    pub(crate) track_caller_name: bool,
    pub(crate) alert: Option<AlertConfiguration>,
}

impl Context {
    pub fn new(call: CallInfo) -> Self {
        Self {
            call,
            build: BuildInfo::default(),
            trace_id: None,
            span_id: None,
            parent_span_id: None,
            track_concurrent_calls: true,
            track_caller_name: true,
            alert: None,
        }
    }

    /// Continue an existing trace.
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Span of the caller; becomes the parent span once the call starts.
    pub fn with_span_id(mut self, span_id: SpanId) -> Self {
        self.span_id = Some(span_id);
        self
    }

    pub fn with_concurrent_calls(mut self, track: bool) -> Self {
        self.track_concurrent_calls = track;
        self
    }

    pub fn with_caller_name(mut self, track: bool) -> Self {
        self.track_caller_name = track;
        self
    }

    pub fn with_slo_name(mut self, name: impl Into<String>) -> Self {
        self.alert_mut().service_name = name.into();
        self
    }

    pub fn with_alert_latency(mut self, target: Duration, objective: f64) -> Self {
        self.alert_mut().latency = Some(LatencyObjective { target, objective });
        self
    }

    pub fn with_alert_success(mut self, objective: f64) -> Self {
        self.alert_mut().success = Some(SuccessObjective { objective });
        self
    }

    pub fn with_alert(mut self, alert: AlertConfiguration) -> Self {
        self.alert = Some(alert);
        self
    }

    fn alert_mut(&mut self) -> &mut AlertConfiguration {
        self.alert.get_or_insert_with(AlertConfiguration::default)
    }

    pub fn call(&self) -> &CallInfo {
        &self.call
    }

    pub fn build(&self) -> &BuildInfo {
        &self.build
    }

    pub fn trace_id(&self) -> Option<TraceId> {
        self.trace_id
    }

    pub fn span_id(&self) -> Option<SpanId> {
        self.span_id
    }

    pub fn parent_span_id(&self) -> Option<SpanId> {
        self.parent_span_id
    }

    pub fn tracks_concurrent_calls(&self) -> bool {
        self.track_concurrent_calls
    }

    pub fn tracks_caller_name(&self) -> bool {
        self.track_caller_name
    }

    pub fn alert(&self) -> Option<&AlertConfiguration> {
        self.alert.as_ref()
    }

    /// Keep or start a trace, move the incoming span to the parent slot and
    /// open a new span for this call.
    pub(crate) fn fill_tracing_info(&mut self) {
        if self.trace_id.is_none() {
            self.trace_id = Some(TraceId::random());
        }
        if let Some(incoming) = self.span_id.take() {
            self.parent_span_id = Some(incoming);
        }
        self.span_id = Some(SpanId::random());
    }
}
