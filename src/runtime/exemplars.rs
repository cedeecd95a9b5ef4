// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Exemplar labels linking a sample to the trace that produced it.

use super::context::Context;
use super::labels::LabelSet;

pub const TRACE_ID_EXEMPLAR: &str = "trace_id";
pub const SPAN_ID_EXEMPLAR: &str = "span_id";
pub const PARENT_SPAN_ID_EXEMPLAR: &str = "parent_id";

/// Lower-case hex trace, span and parent span ids of `ctx`. Absent ids are omitted.
pub fn exemplars(ctx: &Context) -> LabelSet {
    let mut labels = Vec::with_capacity(3);
    if let Some(trace_id) = ctx.trace_id() {
        labels.push((TRACE_ID_EXEMPLAR.to_string(), trace_id.to_hex()));
    }
    if let Some(span_id) = ctx.span_id() {
        labels.push((SPAN_ID_EXEMPLAR.to_string(), span_id.to_hex()));
    }
    if let Some(parent) = ctx.parent_span_id() {
        labels.push((PARENT_SPAN_ID_EXEMPLAR.to_string(), parent.to_hex()));
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::context::CallInfo;
    use crate::runtime::ids::{SpanId, TraceId};

    #[test]
    fn test_no_ids() {
        let ctx = Context::new(CallInfo::new("f", "m"));
        assert!(exemplars(&ctx).is_empty());
    }

    #[test]
    fn test_all_ids() {
        let mut ctx = Context::new(CallInfo::new("f", "m"))
            .with_trace_id(TraceId::from_bytes([0xab; 16]))
            .with_span_id(SpanId::from_bytes([1, 2, 3, 4, 5, 6, 7, 8]));
        ctx.fill_tracing_info();

        let labels = exemplars(&ctx);
        let keys: Vec<&str> = labels.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["trace_id", "span_id", "parent_id"]);
        assert_eq!(labels[0].1, "ab".repeat(16));
        assert_eq!(labels[2].1, "0102030405060708");
        assert_eq!(labels[1].1.len(), 16);
    }
}
