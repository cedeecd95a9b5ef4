// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tree-sitter based Go source parsing.
//!
//! Extracts the import table and every function declaration of a Go file into
//! the generator's source model. Bodies keep their original text so that a
//! rewritten body can be spliced back without reformatting the file.

use std::time::Instant;

use tree_sitter::{Node, Parser};

use crate::error::GenerateError;

use super::types::{
    FunctionBody, FunctionDecl, FunctionSignature, ImportAliasMap, Parameter, ResultField,
    SourceFile, Statement, TypeDescriptor,
};

/// Go parser using tree-sitter.
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    /// Create a new parser for Go sources.
    pub fn new() -> Result<Self, GenerateError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| GenerateError::Parse(format!("Failed to set Go language: {}", e)))?;
        Ok(Self { parser })
    }

    /// Parse a Go source file.
    pub fn parse(&mut self, source: &str) -> Result<SourceFile, GenerateError> {
        let start = Instant::now();

        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| GenerateError::Parse("Failed to parse source".to_string()))?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(GenerateError::Parse(format!(
                "Syntax error near line {}",
                first_error_line(&root)
            )));
        }

        let bytes = source.as_bytes();
        let mut file = SourceFile::default();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "package_clause" => {
                    if let Some(name) = child.named_child(0) {
                        file.package = node_text(&name, bytes);
                    }
                }
                "import_declaration" => extract_imports(&child, bytes, &mut file.imports),
                "function_declaration" | "method_declaration" => {
                    file.functions.push(extract_function(&child, bytes));
                }
                _ => {}
            }
        }

        tracing::debug!(
            functions = file.functions.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "parsed Go source"
        );

        Ok(file)
    }
}

fn first_error_line(node: &Node) -> usize {
    if node.is_error() || node.is_missing() {
        return node.start_position().row + 1;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            return first_error_line(&child);
        }
    }
    node.start_position().row + 1
}

fn node_text(node: &Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}

/// Extract Go imports.
fn extract_imports(node: &Node, source: &[u8], imports: &mut ImportAliasMap) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_spec" => extract_import_spec(&child, source, imports),
            "import_spec_list" => {
                let mut inner = child.walk();
                for spec in child.named_children(&mut inner) {
                    if spec.kind() == "import_spec" {
                        extract_import_spec(&spec, source, imports);
                    }
                }
            }
            _ => {}
        }
    }
}

fn extract_import_spec(spec: &Node, source: &[u8], imports: &mut ImportAliasMap) {
    let Some(path_node) = spec.child_by_field_name("path") else {
        return;
    };
    let path = node_text(&path_node, source)
        .trim_matches(|c| c == '"' || c == '`')
        .to_string();

    match spec.child_by_field_name("name") {
        Some(name) => imports.insert(node_text(&name, source), path),
        None => imports.insert_default(path),
    }
}

fn extract_function(node: &Node, source: &[u8]) -> FunctionDecl {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(&n, source))
        .unwrap_or_default();

    let receiver = node
        .child_by_field_name("receiver")
        .and_then(|r| receiver_type(&r, source));

    let signature = node
        .child_by_field_name("parameters")
        .map(|p| FunctionSignature::new(parameters(&p, source)))
        .unwrap_or_default();

    let results = node
        .child_by_field_name("result")
        .map(|r| result_fields(&r, source))
        .unwrap_or_default();

    let body_node = node.child_by_field_name("body");
    let body = body_node.map(|b| function_body(&b, source));
    let body_range = body_node.map(|b| b.byte_range());

    FunctionDecl {
        name,
        receiver,
        signature,
        results,
        body,
        body_range,
    }
}

fn receiver_type(receiver: &Node, source: &[u8]) -> Option<String> {
    let mut cursor = receiver.walk();
    let declaration = receiver
        .named_children(&mut cursor)
        .find(|c| c.kind() == "parameter_declaration")?;
    let ty = declaration.child_by_field_name("type")?;
    let mut descriptor = type_descriptor(&ty, source);
    while let TypeDescriptor::Pointer(inner) = descriptor {
        descriptor = *inner;
    }
    match descriptor {
        TypeDescriptor::Ident(name) => Some(name),
        TypeDescriptor::Other(_) => {
            // Generic receivers: `(s *Stack[T])`
            let text = node_text(&ty, source);
            let trimmed = text.trim_start_matches('*');
            Some(trimmed.split('[').next().unwrap_or(trimmed).to_string())
        }
        other => Some(other.describe()),
    }
}

fn parameters(list: &Node, source: &[u8]) -> Vec<Parameter> {
    let mut params = Vec::new();
    let mut cursor = list.walk();
    for declaration in list.named_children(&mut cursor) {
        match declaration.kind() {
            "parameter_declaration" => {
                let ty = declaration
                    .child_by_field_name("type")
                    .map(|t| type_descriptor(&t, source))
                    .unwrap_or_else(|| TypeDescriptor::Other("missing".to_string()));
                let names = field_names(&declaration, source);
                if names.is_empty() {
                    params.push(Parameter::new("_", ty));
                } else {
                    for name in names {
                        params.push(Parameter::new(name, ty.clone()));
                    }
                }
            }
            "variadic_parameter_declaration" => {
                let name = declaration
                    .child_by_field_name("name")
                    .map(|n| node_text(&n, source))
                    .unwrap_or_else(|| "_".to_string());
                params.push(Parameter::new(
                    name,
                    TypeDescriptor::Other(declaration.kind().to_string()),
                ));
            }
            _ => {}
        }
    }
    params
}

fn result_fields(result: &Node, source: &[u8]) -> Vec<ResultField> {
    if result.kind() != "parameter_list" {
        return vec![ResultField::unnamed(type_descriptor(result, source))];
    }

    let mut fields = Vec::new();
    let mut cursor = result.walk();
    for declaration in result.named_children(&mut cursor) {
        if declaration.kind() != "parameter_declaration" {
            continue;
        }
        let ty = declaration
            .child_by_field_name("type")
            .map(|t| type_descriptor(&t, source))
            .unwrap_or_else(|| TypeDescriptor::Other("missing".to_string()));
        fields.push(ResultField::named(field_names(&declaration, source), ty));
    }
    fields
}

fn field_names(declaration: &Node, source: &[u8]) -> Vec<String> {
    let mut cursor = declaration.walk();
    declaration
        .children_by_field_name("name", &mut cursor)
        .map(|n| node_text(&n, source))
        .collect()
}

fn type_descriptor(node: &Node, source: &[u8]) -> TypeDescriptor {
    match node.kind() {
        "type_identifier" => TypeDescriptor::Ident(node_text(node, source)),
        "qualified_type" => {
            let package = node
                .child_by_field_name("package")
                .map(|n| node_text(&n, source))
                .unwrap_or_default();
            let name = node
                .child_by_field_name("name")
                .map(|n| node_text(&n, source))
                .unwrap_or_default();
            TypeDescriptor::Qualified { package, name }
        }
        "pointer_type" => match node.named_child(0) {
            Some(inner) => TypeDescriptor::pointer(type_descriptor(&inner, source)),
            None => TypeDescriptor::Other(node.kind().to_string()),
        },
        kind => TypeDescriptor::Other(kind.to_string()),
    }
}

/// Collect the statements of a block, attaching same-line trailing comments.
fn function_body(block: &Node, source: &[u8]) -> FunctionBody {
    let base = block.start_byte();
    let text = node_text(block, source);

    let mut items = Vec::new();
    let mut cursor = block.walk();
    for child in block.named_children(&mut cursor) {
        if child.kind() == "statement_list" {
            let mut inner = child.walk();
            items.extend(child.named_children(&mut inner));
        } else {
            items.push(child);
        }
    }

    let mut statements: Vec<Statement> = Vec::new();
    let mut last_row = None;
    for item in items {
        if item.kind() == "comment" {
            let same_line = last_row == Some(item.start_position().row);
            if let Some(previous) = statements.last_mut().filter(|_| same_line) {
                if previous.end_comment.is_none() {
                    previous.end_comment = Some(node_text(&item, source));
                    previous.range.end = item.end_byte() - base;
                }
            }
            continue;
        }
        if item.kind() == "empty_statement" {
            continue;
        }
        last_row = Some(item.end_position().row);
        statements.push(Statement {
            kind: item.kind().to_string(),
            range: (item.start_byte() - base)..(item.end_byte() - base),
            end_comment: None,
        });
    }

    FunctionBody::new(text, statements)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"package main

import (
	"context"
	. "net/http"
	_ "embed"
	am "github.com/autometrics-dev/autometrics-go/prometheus/autometrics"
	"github.com/labstack/echo/v4"
)

// Handle handles things.
func Handle(ctx context.Context, w ResponseWriter, r *Request) (n int, err error) {
	n = 1 // one
	return n, nil
}

func (s *Server) Serve(a, b int, opts ...string) error {
	return nil
}

func External() int
"#;

    #[test]
    fn test_parser_new() {
        assert!(GoParser::new().is_ok());
    }

    #[test]
    fn test_parse_imports() {
        let mut parser = GoParser::new().unwrap();
        let file = parser.parse(SOURCE).unwrap();

        assert_eq!(file.package, "main");
        assert_eq!(file.imports.resolve("context"), Some("context"));
        assert!(file.imports.is_wildcard("net/http"));
        assert_eq!(file.imports.resolve("embed"), None);
        assert_eq!(
            file.imports.resolve("am"),
            Some("github.com/autometrics-dev/autometrics-go/prometheus/autometrics")
        );
        assert_eq!(file.imports.resolve("echo"), Some("github.com/labstack/echo/v4"));
    }

    #[test]
    fn test_parse_function_signature() {
        let mut parser = GoParser::new().unwrap();
        let file = parser.parse(SOURCE).unwrap();

        let handle = file.function("Handle").unwrap();
        assert_eq!(
            handle.signature.params,
            vec![
                Parameter::new("ctx", TypeDescriptor::qualified("context", "Context")),
                Parameter::new("w", TypeDescriptor::ident("ResponseWriter")),
                Parameter::new("r", TypeDescriptor::pointer(TypeDescriptor::ident("Request"))),
            ]
        );
        assert_eq!(
            handle.results,
            vec![
                ResultField::named(["n"], TypeDescriptor::ident("int")),
                ResultField::named(["err"], TypeDescriptor::ident("error")),
            ]
        );
    }

    #[test]
    fn test_parse_method_and_grouped_params() {
        let mut parser = GoParser::new().unwrap();
        let file = parser.parse(SOURCE).unwrap();

        let serve = file.function("Server.Serve").unwrap();
        assert_eq!(serve.receiver.as_deref(), Some("Server"));
        let names: Vec<&str> = serve.signature.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "opts"]);
        assert_eq!(
            serve.signature.params[2].ty,
            TypeDescriptor::Other("variadic_parameter_declaration".to_string())
        );
        assert_eq!(serve.results, vec![ResultField::unnamed(TypeDescriptor::ident("error"))]);
        assert!(file.function("Serve").is_none());
    }

    #[test]
    fn test_parse_body_statements() {
        let mut parser = GoParser::new().unwrap();
        let file = parser.parse(SOURCE).unwrap();

        let handle = file.function("Handle").unwrap();
        let body = handle.body.as_ref().unwrap();
        assert_eq!(body.statement_texts(), vec!["n = 1 // one", "return n, nil"]);
        assert_eq!(body.statements()[0].end_comment.as_deref(), Some("// one"));
        assert_eq!(body.indent(), "\t");

        let range = handle.body_range.clone().unwrap();
        assert_eq!(&SOURCE[range], body.text());
    }

    #[test]
    fn test_parse_external_function() {
        let mut parser = GoParser::new().unwrap();
        let file = parser.parse(SOURCE).unwrap();

        let external = file.function("External").unwrap();
        assert!(external.body.is_none());
        assert!(external.body_range.is_none());
    }

    #[test]
    fn test_parse_syntax_error() {
        let mut parser = GoParser::new().unwrap();
        let result = parser.parse("package main\n\nfunc Broken( {\n");
        assert!(matches!(result, Err(GenerateError::Parse(_))));
    }
}
