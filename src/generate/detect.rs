// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Context detection from a function signature.
//!
//! Walks the parameters in order and stops at the first one whose type is a
//! known context carrier: a plain `context.Context`, a `net/http` request, or
//! the request context of a supported web framework. The match decides which
//! expression the generated code passes as parent context and, for frameworks
//! that keep tracing ids in their own key/value store, how to read them.

use crate::error::GenerateError;

use super::types::{FunctionSignature, ImportAliasMap, RuntimeContextInfo, TypeDescriptor};

/// Key under which tracing middlewares store the trace id.
pub const MIDDLEWARE_TRACE_ID_KEY: &str = "autometricsTraceID";

/// Key under which tracing middlewares store the span id.
pub const MIDDLEWARE_SPAN_ID_KEY: &str = "autometricsSpanID";

/// Supported context-carrying parameter types, in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextShape {
    /// `context.Context`
    Vanilla,
    /// `net/http.Request`
    NetHttp,
    /// `github.com/gin-gonic/gin.Context`
    Gin,
    /// `github.com/gobuffalo/buffalo.Context`, which embeds a `context.Context`
    Buffalo,
    /// `github.com/labstack/echo/v4.Context`
    EchoV4,
}

impl ContextShape {
    pub const ALL: [ContextShape; 5] = [
        ContextShape::Vanilla,
        ContextShape::NetHttp,
        ContextShape::Gin,
        ContextShape::Buffalo,
        ContextShape::EchoV4,
    ];

    /// Canonical import path of the package declaring the type.
    pub fn import_path(self) -> &'static str {
        match self {
            Self::Vanilla => "context",
            Self::NetHttp => "net/http",
            Self::Gin => "github.com/gin-gonic/gin",
            Self::Buffalo => "github.com/gobuffalo/buffalo",
            Self::EchoV4 => "github.com/labstack/echo/v4",
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Self::NetHttp => "Request",
            _ => "Context",
        }
    }

    /// Whether `ty` (already unwrapped from a pointer) names this shape.
    fn matches(self, ty: &TypeDescriptor, imports: &ImportAliasMap) -> bool {
        match ty {
            TypeDescriptor::Ident(name) => {
                name == self.type_name() && imports.is_wildcard(self.import_path())
            }
            TypeDescriptor::Qualified { package, name } => {
                name == self.type_name() && imports.resolve(package) == Some(self.import_path())
            }
            _ => false,
        }
    }

    /// Record what the generated code needs for a parameter of this shape.
    ///
    /// An unnamed parameter cannot be referenced, so the context is left unset.
    fn apply(self, param: &str, prefix: &str, info: &mut RuntimeContextInfo) {
        info.context_expression = None;
        info.trace_id_getter = None;
        info.span_id_getter = None;

        if param == "_" {
            tracing::warn!(
                "an unnamed {}.{} has been detected; name it so its context can be reused \
                 for tracing, then generate again",
                self.import_path(),
                self.type_name()
            );
            return;
        }

        match self {
            Self::Vanilla | Self::Buffalo => {
                info.context_expression = Some(param.to_string());
            }
            Self::NetHttp => {
                info.context_expression = Some(format!("{}.Context()", param));
            }
            Self::Gin => {
                info.trace_id_getter = Some(decode_getter(prefix, param, "GetString", MIDDLEWARE_TRACE_ID_KEY));
                info.span_id_getter = Some(decode_getter(prefix, param, "GetString", MIDDLEWARE_SPAN_ID_KEY));
            }
            Self::EchoV4 => {
                info.trace_id_getter = Some(decode_getter(prefix, param, "Get", MIDDLEWARE_TRACE_ID_KEY));
                info.span_id_getter = Some(decode_getter(prefix, param, "Get", MIDDLEWARE_SPAN_ID_KEY));
            }
        }
    }
}

fn decode_getter(prefix: &str, param: &str, method: &str, key: &str) -> String {
    format!("{}DecodeString({}.{}({}))", prefix, param, method, go_quote(key))
}

/// Quote a string as a Go interpreted string literal.
pub(crate) fn go_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => quoted.push_str(&format!("\\x{:02x}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Classify one parameter type.
///
/// One level of pointer indirection is unwrapped. A pointer to anything other
/// than a plain or qualified identifier cannot be classified.
pub fn classify(
    param: &str,
    ty: &TypeDescriptor,
    imports: &ImportAliasMap,
) -> Result<Option<ContextShape>, GenerateError> {
    let target = match ty {
        TypeDescriptor::Pointer(inner) => match inner.as_ref() {
            TypeDescriptor::Ident(_) | TypeDescriptor::Qualified { .. } => inner.as_ref(),
            other => {
                return Err(GenerateError::unsupported(
                    param,
                    format!(
                        "expecting the type being pointed to to be an identifier, got {} instead",
                        other.describe()
                    ),
                ))
            }
        },
        TypeDescriptor::Ident(_) | TypeDescriptor::Qualified { .. } => ty,
        TypeDescriptor::Other(_) => return Ok(None),
    };

    Ok(ContextShape::ALL
        .into_iter()
        .find(|shape| shape.matches(target, imports)))
}

/// Fill `info` with the context expression and tracing accessors for `signature`.
///
/// `prefix` is the namespace prefix of the autometrics runtime package in the
/// file (`am.`, or empty for a dot import). Returns the shape that matched.
pub fn detect_context(
    info: &mut RuntimeContextInfo,
    signature: &FunctionSignature,
    imports: &ImportAliasMap,
    prefix: &str,
) -> Result<Option<ContextShape>, GenerateError> {
    for param in &signature.params {
        if let Some(shape) = classify(&param.name, &param.ty, imports)? {
            tracing::debug!(param = %param.name, shape = ?shape, "detected context parameter");
            shape.apply(&param.name, prefix, info);
            return Ok(Some(shape));
        }
    }

    info.context_expression = None;
    Ok(None)
}
