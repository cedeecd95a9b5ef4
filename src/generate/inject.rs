// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Injection and removal of the instrumentation wrapper.
//!
//! The wrapper is a single `defer` statement placed first in the function body:
//!
//! ```go
//! defer am.Instrument(am.PreInstrument(am.NewContext(
//!     ctx,
//!     am.WithConcurrentCalls(true),
//!     am.WithCallerName(true),
//! )), &err) //autometrics:defer
//! ```
//!
//! `PreInstrument` runs eagerly at function entry; the deferred `Instrument`
//! runs on every exit path and reads the named error return through its address.

use std::ops::Range;

use crate::error::GenerateError;

use super::options::ContextConstructor;
use super::types::{FunctionBody, ResultField, Statement, TypeDescriptor, SENTINEL};

/// Name of the `error` result to report failures from.
///
/// Returns `None` when the function has no `error` result or leaves it unnamed.
pub fn error_return_variable(results: &[ResultField]) -> Result<Option<String>, GenerateError> {
    let Some(field) = results
        .iter()
        .find(|field| matches!(&field.ty, TypeDescriptor::Ident(name) if name == "error"))
    else {
        return Ok(None);
    };

    match field.names.as_slice() {
        [] => Ok(None),
        [name] => Ok(Some(name.clone())),
        names => Err(GenerateError::AmbiguousErrorReturn(names.len())),
    }
}

/// Source text of the wrapper statement.
pub fn render_wrapper(
    constructor: &ContextConstructor,
    error_variable: Option<&str>,
    indent: &str,
) -> String {
    let prefix = constructor.prefix();
    let error_argument = match error_variable {
        Some(name) => format!("&{}", name),
        None => "nil".to_string(),
    };
    format!(
        "defer {p}Instrument({p}PreInstrument({ctor}), {err}) {sentinel}",
        p = prefix,
        ctor = constructor.render(indent),
        err = error_argument,
        sentinel = SENTINEL,
    )
}

/// Insert the wrapper as the first statement, or replace a previous one.
pub fn inject(
    body: &FunctionBody,
    error_variable: Option<&str>,
    constructor: &ContextConstructor,
) -> Result<FunctionBody, GenerateError> {
    let first = body
        .statements()
        .first()
        .ok_or_else(|| GenerateError::MalformedFunctionBody(body.text().to_string()))?;

    let wrapper = render_wrapper(constructor, error_variable, body.indent());
    let start = first.range.start;
    let statement = Statement {
        kind: "defer_statement".to_string(),
        range: start..start + wrapper.len(),
        end_comment: Some(SENTINEL.to_string()),
    };

    if first.is_sentinel() {
        tracing::debug!("replacing existing instrumentation wrapper");
        return Ok(body.splice(first.range.clone(), &wrapper, Some(statement)));
    }

    let inserted = format!("{}\n\n{}", wrapper, body.indent());
    Ok(body.splice(start..start, &inserted, Some(statement)))
}

/// Remove a previously injected wrapper. Bodies without one are returned unchanged.
///
/// Only the wrapper line and the blank lines after it are deleted; comments
/// between the wrapper and the next statement stay.
pub fn remove_injection(body: &FunctionBody) -> Result<FunctionBody, GenerateError> {
    let first = body
        .statements()
        .first()
        .ok_or_else(|| GenerateError::MalformedFunctionBody(body.text().to_string()))?;

    if !first.is_sentinel() {
        return Ok(body.clone());
    }

    tracing::debug!("removing instrumentation wrapper");
    Ok(body.splice(wrapper_span(body.text(), first), "", None))
}

/// Span to delete for the wrapper `statement` of `text`.
fn wrapper_span(text: &str, statement: &Statement) -> Range<usize> {
    let mut end = text[statement.range.end..]
        .find('\n')
        .map(|i| statement.range.end + i + 1)
        .unwrap_or(statement.range.end);
    while let Some(i) = text[end..].find('\n') {
        if !text[end..end + i].trim().is_empty() {
            break;
        }
        end += i + 1;
    }

    let rest = &text[end..];
    let content = rest.trim_start_matches([' ', '\t']);
    if content.starts_with('}') {
        // Nothing left in the block: drop the wrapper's whole line.
        let line_start = text[..statement.range.start]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(statement.range.start);
        return line_start..end;
    }
    // Keep the wrapper's indentation for whatever follows it.
    statement.range.start..end + (rest.len() - content.len())
}
