// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Type definitions for the Go source model used by the generator.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::slo::AlertConfiguration;

/// End-of-line marker carried by every injected `defer` statement.
pub const SENTINEL: &str = "//autometrics:defer";

/// Alias used in Go for wildcard (dot) imports.
pub const WILDCARD_ALIAS: &str = ".";

/// Syntactic shape of a parameter or result type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    /// `Context`
    Ident(String),
    /// `context.Context`
    Qualified { package: String, name: String },
    /// `*T`
    Pointer(Box<TypeDescriptor>),
    /// Anything else (slices, maps, funcs, generics...), tagged with the
    /// tree-sitter node kind.
    Other(String),
}

impl TypeDescriptor {
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Qualified {
            package: package.into(),
            name: name.into(),
        }
    }

    pub fn pointer(inner: TypeDescriptor) -> Self {
        Self::Pointer(Box::new(inner))
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Ident(name) => name.clone(),
            Self::Qualified { package, name } => format!("{}.{}", package, name),
            Self::Pointer(inner) => format!("*{}", inner.describe()),
            Self::Other(kind) => kind.clone(),
        }
    }
}

/// One parameter of a function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name; `_` for discarded or unnamed parameters.
    pub name: String,
    pub ty: TypeDescriptor,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Ordered parameter list of a function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionSignature {
    pub params: Vec<Parameter>,
}

impl FunctionSignature {
    pub fn new(params: Vec<Parameter>) -> Self {
        Self { params }
    }
}

/// One field of a result list. `(a, b int)` is one field with two names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultField {
    pub names: Vec<String>,
    pub ty: TypeDescriptor,
}

impl ResultField {
    pub fn unnamed(ty: TypeDescriptor) -> Self {
        Self {
            names: Vec::new(),
            ty,
        }
    }

    pub fn named<I, S>(names: I, ty: TypeDescriptor) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            ty,
        }
    }
}

/// Import alias table of a Go file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportAliasMap {
    aliases: BTreeMap<String, String>,
    wildcards: Vec<String>,
}

impl ImportAliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an import. `alias` is `.` for dot imports; blank imports are ignored.
    pub fn insert(&mut self, alias: impl Into<String>, path: impl Into<String>) {
        let alias = alias.into();
        let path = path.into();
        match alias.as_str() {
            "_" => {}
            WILDCARD_ALIAS => {
                if !self.wildcards.contains(&path) {
                    self.wildcards.push(path);
                }
            }
            _ => {
                self.aliases.insert(alias, path);
            }
        }
    }

    /// Register an import without an explicit alias, keyed by its package name.
    pub fn insert_default(&mut self, path: impl Into<String>) {
        let path = path.into();
        let alias = default_package_name(&path).to_string();
        self.insert(alias, path);
    }

    /// Canonical path imported under `alias`.
    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    /// Whether `path` is imported with a dot import.
    pub fn is_wildcard(&self, path: &str) -> bool {
        self.wildcards.iter().any(|p| p == path)
    }

    /// Find how `path` is referred to in the file: `Some(".")` for a dot import.
    pub fn alias_of(&self, path: &str) -> Option<&str> {
        if self.is_wildcard(path) {
            return Some(WILDCARD_ALIAS);
        }
        self.aliases
            .iter()
            .find(|(_, p)| p.as_str() == path)
            .map(|(alias, _)| alias.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty() && self.wildcards.is_empty()
    }
}

/// Go package name implied by an import path.
///
/// `github.com/labstack/echo/v4` is imported as `echo`, not `v4`.
pub fn default_package_name(path: &str) -> &str {
    let mut segments = path.rsplit('/');
    let last = segments.next().unwrap_or(path);
    if is_major_version(last) {
        if let Some(previous) = segments.next() {
            return previous;
        }
    }
    last
}

fn is_major_version(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}

/// Generation state for one function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeContextInfo {
    /// Expression passed as the parent context; `None` renders as `nil`.
    pub context_expression: Option<String>,
    pub trace_id_getter: Option<String>,
    pub span_id_getter: Option<String>,
    pub track_concurrent_calls: bool,
    pub track_caller_name: bool,
    pub alert: Option<AlertConfiguration>,
}

impl RuntimeContextInfo {
    pub fn new(
        track_concurrent_calls: bool,
        track_caller_name: bool,
        alert: Option<AlertConfiguration>,
    ) -> Self {
        Self {
            track_concurrent_calls,
            track_caller_name,
            alert,
            ..Default::default()
        }
    }
}

/// A statement of a function body, located by byte offsets into the body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// tree-sitter node kind, e.g. `defer_statement`.
    pub kind: String,
    /// Span of the statement, including a same-line trailing comment.
    pub range: Range<usize>,
    /// Same-line trailing comment, verbatim.
    pub end_comment: Option<String>,
}

impl Statement {
    /// Whether this is a previously injected instrumentation wrapper.
    pub fn is_sentinel(&self) -> bool {
        self.kind == "defer_statement"
            && self
                .end_comment
                .as_deref()
                .is_some_and(|c| c.trim() == SENTINEL)
    }

    fn shifted(&self, delta: isize) -> Self {
        let shift = |offset: usize| offset.saturating_add_signed(delta);
        Self {
            kind: self.kind.clone(),
            range: shift(self.range.start)..shift(self.range.end),
            end_comment: self.end_comment.clone(),
        }
    }
}

/// The block of a function, braces included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionBody {
    text: String,
    statements: Vec<Statement>,
}

impl FunctionBody {
    pub fn new(text: impl Into<String>, statements: Vec<Statement>) -> Self {
        Self {
            text: text.into(),
            statements,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Source text of a statement.
    pub fn statement_text(&self, statement: &Statement) -> &str {
        &self.text[statement.range.clone()]
    }

    /// Source text of every statement, in order.
    pub fn statement_texts(&self) -> Vec<&str> {
        self.statements
            .iter()
            .map(|s| self.statement_text(s))
            .collect()
    }

    /// Leading whitespace of the first statement's line.
    pub fn indent(&self) -> &str {
        let Some(first) = self.statements.first() else {
            return "\t";
        };
        let before = &self.text[..first.range.start];
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let indent = &before[line_start..];
        if indent.chars().all(|c| c == ' ' || c == '\t') && !indent.is_empty() {
            indent
        } else {
            "\t"
        }
    }

    /// Replace `range` of the body text, keeping statement spans in sync.
    ///
    /// Statements overlapping `range` are dropped; `inserted` (if any) is placed
    /// at `range.start` in the statement list.
    pub(crate) fn splice(
        &self,
        range: Range<usize>,
        replacement: &str,
        inserted: Option<Statement>,
    ) -> FunctionBody {
        let mut text = String::with_capacity(self.text.len() + replacement.len());
        text.push_str(&self.text[..range.start]);
        text.push_str(replacement);
        text.push_str(&self.text[range.end..]);

        let delta = replacement.len() as isize - (range.end - range.start) as isize;
        let mut statements = Vec::with_capacity(self.statements.len() + 1);
        let mut inserted = inserted;
        for statement in &self.statements {
            if statement.range.end <= range.start {
                statements.push(statement.clone());
            } else if statement.range.start >= range.end {
                if let Some(new) = inserted.take() {
                    statements.push(new);
                }
                statements.push(statement.shifted(delta));
            }
        }
        if let Some(new) = inserted {
            statements.push(new);
        }

        FunctionBody { text, statements }
    }
}

/// A function or method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub name: String,
    /// Receiver type name for methods, without pointer.
    pub receiver: Option<String>,
    pub signature: FunctionSignature,
    pub results: Vec<ResultField>,
    pub body: Option<FunctionBody>,
    /// Byte range of the body in the enclosing file.
    pub body_range: Option<Range<usize>>,
}

impl FunctionDecl {
    /// `Name` for functions, `Receiver.Name` for methods.
    pub fn qualified_name(&self) -> String {
        match &self.receiver {
            Some(receiver) => format!("{}.{}", receiver, self.name),
            None => self.name.clone(),
        }
    }

    /// Match against `Name` or `Receiver.Name`.
    pub fn matches(&self, query: &str) -> bool {
        if query.contains('.') {
            self.qualified_name() == query
        } else {
            self.receiver.is_none() && self.name == query
        }
    }
}

/// A parsed Go file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFile {
    pub package: String,
    pub imports: ImportAliasMap,
    pub functions: Vec<FunctionDecl>,
}

impl SourceFile {
    pub fn function(&self, query: &str) -> Option<&FunctionDecl> {
        self.functions.iter().find(|f| f.matches(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_package_name() {
        assert_eq!(default_package_name("context"), "context");
        assert_eq!(default_package_name("net/http"), "http");
        assert_eq!(default_package_name("github.com/labstack/echo/v4"), "echo");
        assert_eq!(default_package_name("github.com/gin-gonic/gin"), "gin");
        assert_eq!(default_package_name("gopkg.in/yaml.v3"), "yaml.v3");
    }

    #[test]
    fn test_import_alias_map() {
        let mut imports = ImportAliasMap::new();
        imports.insert_default("net/http");
        imports.insert(".", "context");
        imports.insert("_", "embed");
        imports.insert("am", "github.com/autometrics-dev/autometrics-go/prometheus/autometrics");

        assert_eq!(imports.resolve("http"), Some("net/http"));
        assert_eq!(imports.resolve("embed"), None);
        assert!(imports.is_wildcard("context"));
        assert_eq!(imports.alias_of("context"), Some("."));
        assert_eq!(
            imports.alias_of("github.com/autometrics-dev/autometrics-go/prometheus/autometrics"),
            Some("am")
        );
    }

    #[test]
    fn test_statement_sentinel() {
        let statement = Statement {
            kind: "defer_statement".to_string(),
            range: 0..10,
            end_comment: Some(SENTINEL.to_string()),
        };
        assert!(statement.is_sentinel());

        let plain = Statement {
            end_comment: Some("// cleanup".to_string()),
            ..statement.clone()
        };
        assert!(!plain.is_sentinel());

        let other = Statement {
            kind: "expression_statement".to_string(),
            ..statement
        };
        assert!(!other.is_sentinel());
    }

    #[test]
    fn test_body_indent() {
        let body = FunctionBody::new(
            "{\n    return nil\n}",
            vec![Statement {
                kind: "return_statement".to_string(),
                range: 6..16,
                end_comment: None,
            }],
        );
        assert_eq!(body.indent(), "    ");
        assert_eq!(body.statement_texts(), vec!["return nil"]);
    }

    #[test]
    fn test_body_splice_shifts_statements() {
        let body = FunctionBody::new(
            "{\n\tx := 1\n\treturn x\n}",
            vec![
                Statement {
                    kind: "short_var_declaration".to_string(),
                    range: 3..9,
                    end_comment: None,
                },
                Statement {
                    kind: "return_statement".to_string(),
                    range: 11..19,
                    end_comment: None,
                },
            ],
        );

        let spliced = body.splice(3..3, "y := 2\n\t", None);
        assert_eq!(spliced.text(), "{\n\ty := 2\n\tx := 1\n\treturn x\n}");
        assert_eq!(spliced.statement_texts(), vec!["x := 1", "return x"]);
    }

    #[test]
    fn test_function_matches() {
        let decl = FunctionDecl {
            name: "Serve".to_string(),
            receiver: Some("Server".to_string()),
            signature: FunctionSignature::default(),
            results: Vec::new(),
            body: None,
            body_range: None,
        };
        assert!(decl.matches("Server.Serve"));
        assert!(!decl.matches("Serve"));
        assert_eq!(decl.qualified_name(), "Server.Serve");
    }
}
