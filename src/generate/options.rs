// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Runtime option synthesis.
//!
//! Turns a [`RuntimeContextInfo`] into the `NewContext(...)` expression that
//! the injected wrapper passes to `PreInstrument`. Directive order is fixed so
//! that regenerating a function produces byte-identical output.

use std::time::Duration;

use super::detect::go_quote;
use super::types::RuntimeContextInfo;

/// One option passed to the runtime context constructor.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    TraceId(String),
    SpanId(String),
    ConcurrentCalls(bool),
    CallerName(bool),
    SloName(String),
    AlertLatency { target: Duration, objective: f64 },
    AlertSuccess(f64),
}

impl Directive {
    /// Go source for this directive.
    pub fn render(&self, prefix: &str) -> String {
        match self {
            Self::TraceId(getter) => format!("{}WithTraceID({})", prefix, getter),
            Self::SpanId(getter) => format!("{}WithSpanID({})", prefix, getter),
            Self::ConcurrentCalls(on) => format!("{}WithConcurrentCalls({})", prefix, on),
            Self::CallerName(on) => format!("{}WithCallerName({})", prefix, on),
            Self::SloName(name) => format!("{}WithSloName({})", prefix, go_quote(name)),
            Self::AlertLatency { target, objective } => format!(
                "{}WithAlertLatency({} * time.Nanosecond, {})",
                prefix,
                target.as_nanos(),
                objective
            ),
            Self::AlertSuccess(objective) => format!("{}WithAlertSuccess({})", prefix, objective),
        }
    }
}

/// The `NewContext(<ctx>, <directives>...)` call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextConstructor {
    prefix: String,
    context: String,
    directives: Vec<Directive>,
}

impl ContextConstructor {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// First positional argument: the parent context expression.
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Render one argument per line, continuation lines indented one level
    /// deeper than `indent`.
    pub fn render(&self, indent: &str) -> String {
        let mut out = format!("{}NewContext(\n", self.prefix);
        out.push_str(&format!("{}\t{},\n", indent, self.context));
        for directive in &self.directives {
            out.push_str(&format!("{}\t{},\n", indent, directive.render(&self.prefix)));
        }
        out.push_str(indent);
        out.push(')');
        out
    }
}

/// Build the ordered directive list for `info`.
pub fn synthesize(info: &RuntimeContextInfo, prefix: &str) -> ContextConstructor {
    let mut directives = Vec::new();

    if let Some(getter) = &info.trace_id_getter {
        directives.push(Directive::TraceId(getter.clone()));
    }
    if let Some(getter) = &info.span_id_getter {
        directives.push(Directive::SpanId(getter.clone()));
    }

    directives.push(Directive::ConcurrentCalls(info.track_concurrent_calls));
    directives.push(Directive::CallerName(info.track_caller_name));

    if let Some(alert) = &info.alert {
        directives.push(Directive::SloName(alert.service_name.clone()));
        if let Some(latency) = &alert.latency {
            directives.push(Directive::AlertLatency {
                target: latency.target,
                objective: latency.objective,
            });
        }
        if let Some(success) = &alert.success {
            directives.push(Directive::AlertSuccess(success.objective));
        }
    }

    ContextConstructor {
        prefix: prefix.to_string(),
        context: info
            .context_expression
            .clone()
            .unwrap_or_else(|| "nil".to_string()),
        directives,
    }
}
