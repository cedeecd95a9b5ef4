// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Go source instrumentation.
//!
//! Rewrites a Go function so that its first statement is a deferred call into
//! the autometrics runtime package:
//!
//! 1. [`detect`] inspects the parameters for a context-carrying type
//! 2. [`options`] turns what was found into a `NewContext(...)` expression
//! 3. [`inject`] places (or replaces) the `defer` wrapper in the body
//!
//! [`Generator`] runs the three steps for one function of a source file and
//! splices the rewritten body back into the file text.
//!
//! # Example
//!
//! ```rust,ignore
//! use autometer::generate::{Generator, GeneratorOptions};
//!
//! let mut generator = Generator::new()?;
//! let output = generator.instrument(&source, "Handle", &GeneratorOptions::default())?;
//! ```

pub mod detect;
pub mod inject;
pub mod options;
pub mod parse;
pub mod types;

pub use detect::{classify, detect_context, ContextShape};
pub use inject::{error_return_variable, inject, remove_injection, render_wrapper};
pub use options::{synthesize, ContextConstructor, Directive};
pub use parse::GoParser;
pub use types::{
    FunctionBody, FunctionDecl, FunctionSignature, ImportAliasMap, Parameter, ResultField,
    RuntimeContextInfo, SourceFile, Statement, TypeDescriptor, SENTINEL,
};

use crate::error::GenerateError;
use crate::slo::AlertConfiguration;

/// Import paths of the runtime packages the generated code calls into.
pub const RUNTIME_IMPORT_PATHS: &[&str] = &[
    "github.com/autometrics-dev/autometrics-go/prometheus/autometrics",
    "github.com/autometrics-dev/autometrics-go/otel/autometrics",
];

/// Options for instrumenting one function.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorOptions {
    pub track_concurrent_calls: bool,
    pub track_caller_name: bool,
    pub alert: Option<AlertConfiguration>,
    /// Name the runtime package is imported under; looked up in the file's
    /// imports when unset. `_` or `.` means no namespace prefix.
    pub impl_import_name: Option<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            track_concurrent_calls: true,
            track_caller_name: true,
            alert: None,
            impl_import_name: None,
        }
    }
}

impl GeneratorOptions {
    pub fn with_alert(mut self, alert: AlertConfiguration) -> Self {
        self.alert = Some(alert);
        self
    }

    pub fn with_impl_import_name(mut self, name: impl Into<String>) -> Self {
        self.impl_import_name = Some(name.into());
        self
    }
}

/// Namespace prefix for calls into the runtime package.
pub fn namespace_prefix(import_name: &str) -> String {
    match import_name {
        "_" | "." | "" => String::new(),
        name => format!("{}.", name),
    }
}

fn resolve_prefix(
    imports: &ImportAliasMap,
    options: &GeneratorOptions,
) -> Result<String, GenerateError> {
    if let Some(name) = &options.impl_import_name {
        return Ok(namespace_prefix(name));
    }
    RUNTIME_IMPORT_PATHS
        .iter()
        .find_map(|path| imports.alias_of(path))
        .map(namespace_prefix)
        .ok_or(GenerateError::MissingRuntimeImport)
}

/// Instruments functions of Go source files.
pub struct Generator {
    parser: GoParser,
}

impl Generator {
    pub fn new() -> Result<Self, GenerateError> {
        Ok(Self {
            parser: GoParser::new()?,
        })
    }

    /// Parse `source` without rewriting it.
    pub fn parse(&mut self, source: &str) -> Result<SourceFile, GenerateError> {
        self.parser.parse(source)
    }

    /// Add or refresh the instrumentation wrapper of `function`.
    ///
    /// `function` is a function name or `Receiver.Method`.
    pub fn instrument(
        &mut self,
        source: &str,
        function: &str,
        options: &GeneratorOptions,
    ) -> Result<String, GenerateError> {
        let file = self.parser.parse(source)?;
        let decl = file
            .function(function)
            .ok_or_else(|| GenerateError::FunctionNotFound(function.to_string()))?;
        let (body, range) = body_of(decl)?;

        let prefix = resolve_prefix(&file.imports, options)?;
        let mut info = RuntimeContextInfo::new(
            options.track_concurrent_calls,
            options.track_caller_name,
            options.alert.clone(),
        );
        detect_context(&mut info, &decl.signature, &file.imports, &prefix)?;

        let constructor = synthesize(&info, &prefix);
        let error_variable = error_return_variable(&decl.results)?;
        let rewritten = inject(body, error_variable.as_deref(), &constructor)?;

        tracing::info!(function = %decl.qualified_name(), "instrumented function");
        Ok(splice_source(source, range, rewritten.text()))
    }

    /// Remove the instrumentation wrapper of `function`, if any.
    pub fn remove(&mut self, source: &str, function: &str) -> Result<String, GenerateError> {
        let file = self.parser.parse(source)?;
        let decl = file
            .function(function)
            .ok_or_else(|| GenerateError::FunctionNotFound(function.to_string()))?;
        let (body, range) = body_of(decl)?;

        let rewritten = remove_injection(body)?;
        tracing::info!(function = %decl.qualified_name(), "removed instrumentation");
        Ok(splice_source(source, range, rewritten.text()))
    }
}

fn body_of(decl: &FunctionDecl) -> Result<(&FunctionBody, std::ops::Range<usize>), GenerateError> {
    match (&decl.body, &decl.body_range) {
        (Some(body), Some(range)) => Ok((body, range.clone())),
        _ => Err(GenerateError::MissingBody(decl.qualified_name())),
    }
}

fn splice_source(source: &str, range: std::ops::Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(source.len() + replacement.len());
    out.push_str(&source[..range.start]);
    out.push_str(replacement);
    out.push_str(&source[range.end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_prefix() {
        assert_eq!(namespace_prefix("am"), "am.");
        assert_eq!(namespace_prefix("_"), "");
        assert_eq!(namespace_prefix("."), "");
    }

    #[test]
    fn test_resolve_prefix_from_imports() {
        let mut imports = ImportAliasMap::new();
        imports.insert_default(RUNTIME_IMPORT_PATHS[0]);
        let prefix = resolve_prefix(&imports, &GeneratorOptions::default()).unwrap();
        assert_eq!(prefix, "autometrics.");
    }

    #[test]
    fn test_resolve_prefix_override() {
        let options = GeneratorOptions::default().with_impl_import_name("metrics");
        assert_eq!(resolve_prefix(&ImportAliasMap::new(), &options).unwrap(), "metrics.");
    }

    #[test]
    fn test_resolve_prefix_missing() {
        assert_eq!(
            resolve_prefix(&ImportAliasMap::new(), &GeneratorOptions::default()),
            Err(GenerateError::MissingRuntimeImport)
        );
    }

    #[test]
    fn test_splice_source() {
        assert_eq!(splice_source("abcdef", 2..4, "XY"), "abXYef");
    }
}
