//! Tests for the reference statement parser.
mod common;
use common::*;
use flowsync::prelude::*;
use flowsync::syntax::{ElseBody, ExprKind, StatementKind, parse_block};
use rstest::rstest;

fn statement_kind(body: &str) -> StatementKind {
    let module = parse(&in_main(body));
    let function = module.function("main").expect("main should exist");
    function.body.statements[0].kind.clone()
}

#[test]
fn test_function_signature() {
    let module = parse(SAMPLE);
    let function = module.function("process").expect("process should exist");

    assert_eq!(function.params.len(), 2);
    assert_eq!(function.params[0].type_name, "int[]");
    assert_eq!(function.params[0].name, "nums");
    assert_eq!(function.params[1].type_name, "int");
    assert_eq!(function.return_type.as_deref(), Some("int"));
    assert_eq!(
        function.signature_source,
        "function process(int[] nums, int limit) returns int"
    );
    assert_eq!(function.signature_range, range((2, 0), (2, 51)));
    assert_eq!(function.range, range((2, 0), (27, 1)));
    assert_eq!(function.body.statements.len(), 7);
}

#[test]
fn test_imports_and_prefixes() {
    let module = parse("import ballerina/io;\nimport ballerina/lang.value;\n\npublic function main() {\n}\n");

    assert_eq!(module.import_ids(), vec!["ballerina/io", "ballerina/lang.value"]);
    assert_eq!(module.imports[0].prefix(), "io");
    assert_eq!(module.imports[1].prefix(), "value");
    assert_eq!(module.imports[0].range, range((0, 0), (0, 20)));
    assert!(module.function("main").is_some());
    assert!(module.diagnostics.is_empty());
}

#[rstest]
#[case("int x = 1;")]
#[case("final string s = \"a\";")]
#[case("map<json> m;")]
#[case("http:Client|error c = new;")]
#[case("int[] xs = [1, 2];")]
fn test_variable_declarations(#[case] body: &str) {
    assert!(
        matches!(statement_kind(body), StatementKind::VarDecl { .. }),
        "'{}' should be a declaration",
        body
    );
}

#[test]
fn test_declaration_parts() {
    match statement_kind("final map<json> m = {};") {
        StatementKind::VarDecl {
            is_final,
            type_name,
            name,
            init,
        } => {
            assert!(is_final);
            assert_eq!(type_name, "map<json>");
            assert_eq!(name, "m");
            assert_eq!(init.map(|e| e.source), Some("{}".to_string()));
        }
        other => panic!("Expected a declaration, got {:?}", other),
    }
}

#[rstest]
#[case("x = 1;", "x")]
#[case("xs[0] = 1;", "xs[0]")]
#[case("p.name = \"n\";", "p.name")]
fn test_assignments(#[case] body: &str, #[case] expected_target: &str) {
    match statement_kind(body) {
        StatementKind::Assign { target, .. } => assert_eq!(target, expected_target),
        other => panic!("Expected an assignment for '{}', got {:?}", body, other),
    }
}

#[test]
fn test_call_classification() {
    let call = |body: &str| match statement_kind(body) {
        StatementKind::Expression(expr) => expr.unchecked().kind.clone(),
        other => panic!("Expected an expression for '{}', got {:?}", body, other),
    };

    assert!(matches!(
        call("foo(1, bar(2, 3));"),
        ExprKind::FunctionCall { module: None, ref name, ref args } if name == "foo" && args.len() == 2
    ));
    assert!(matches!(
        call("io:println(\"a, b\");"),
        ExprKind::FunctionCall { module: Some(ref m), ref args, .. } if m == "io" && args.len() == 1
    ));
    assert!(matches!(
        call("check c->get(\"/x\");"),
        ExprKind::RemoteCall { ref target, ref method, .. } if target == "c" && method == "get"
    ));
    assert!(matches!(
        call("c->/users/[id].get();"),
        ExprKind::ResourceCall { ref path, ref method, .. } if path == "/users/[id]" && method == "get"
    ));
    assert!(matches!(call("a.b();"), ExprKind::Other));
    assert!(matches!(call("x + 1;"), ExprKind::Other));
}

#[test]
fn test_check_wrappers() {
    match statement_kind("checkpanic foo();") {
        StatementKind::Expression(expr) => match expr.kind {
            ExprKind::Check { panic, inner } => {
                assert!(panic);
                assert_eq!(inner.source, "foo()");
            }
            other => panic!("Expected a check expression, got {:?}", other),
        },
        other => panic!("Expected an expression, got {:?}", other),
    }
}

#[rstest]
#[case("return;")]
#[case("break;")]
#[case("continue;")]
#[case("panic error(\"x\");")]
#[case("fail error(\"x\");")]
#[case("while true {\n}")]
#[case("foreach var item in items {\n}")]
#[case("do {\n} on fail {\n}")]
#[case("lock {\n}")]
fn test_statement_keywords_parse_cleanly(#[case] body: &str) {
    let module = parse(&in_main(body));
    assert!(module.diagnostics.is_empty(), "'{}' produced {:?}", body, module.diagnostics);
    assert!(!matches!(statement_kind(body), StatementKind::Invalid));
}

#[test]
fn test_keyword_used_as_assignment_target() {
    assert!(matches!(statement_kind("panic = 1;"), StatementKind::Assign { .. }));
}

#[test]
fn test_else_if_chain_nests() {
    let StatementKind::If(stmt) = statement_kind("if a {\n} else if b {\n} else {\n}") else {
        panic!("Expected an if statement");
    };
    assert_eq!(stmt.condition.source, "a");

    let Some(ElseBody::If(nested)) = stmt.else_body else {
        panic!("Expected an else-if");
    };
    assert_eq!(nested.range, range((2, 11), (4, 5)));
    let StatementKind::If(inner) = &nested.kind else {
        panic!("Nested else-if should be an if statement");
    };
    assert_eq!(inner.condition.source, "b");
    assert!(matches!(inner.else_body, Some(ElseBody::Block(_))));
}

#[test]
fn test_parenthesized_condition() {
    let StatementKind::If(stmt) = statement_kind("if ((a || b) && c) {\n}") else {
        panic!("Expected an if statement");
    };
    assert_eq!(stmt.condition.unparenthesized(), "(a || b) && c");

    let StatementKind::If(stmt) = statement_kind("if (a) || (b) {\n}") else {
        panic!("Expected an if statement");
    };
    assert_eq!(stmt.condition.unparenthesized(), "(a) || (b)");
}

#[test]
fn test_on_fail_binding() {
    let StatementKind::Do { on_fail, .. } = statement_kind("do {\n} on fail error e {\n}") else {
        panic!("Expected a do statement");
    };
    let on_fail = on_fail.expect("on fail clause");
    assert_eq!(on_fail.error_type.as_deref(), Some("error"));
    assert_eq!(on_fail.error_var.as_deref(), Some("e"));
}

#[test]
fn test_comment_runs() {
    let module = parse(&in_main("// one\n// two\nint x = 1; // trailing\n// three"));
    let statements = &module.function("main").expect("main").body.statements;
    let comments: Vec<Vec<String>> = statements
        .iter()
        .filter_map(|s| match &s.kind {
            StatementKind::Comment(lines) => Some(lines.clone()),
            _ => None,
        })
        .collect();

    assert_eq!(
        comments,
        vec![
            vec!["one".to_string(), "two".to_string()],
            vec!["trailing".to_string(), "three".to_string()],
        ]
    );
}

#[test]
fn test_broken_statement_is_recovered() {
    let module = parse(&in_main("int x = ;\nreturn;"));
    let statements = &module.function("main").expect("main").body.statements;

    assert_eq!(statements.len(), 2);
    assert!(matches!(statements[0].kind, StatementKind::Invalid));
    assert_eq!(statements[0].source, "int x = ;");
    assert!(matches!(statements[1].kind, StatementKind::Return(None)));

    assert_eq!(module.diagnostics.len(), 1);
    let diagnostic = &module.diagnostics[0];
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.code.as_deref(), Some("syntax"));
    assert_eq!(diagnostic.range, range((1, 4), (1, 13)));
}

#[test]
fn test_recovery_skips_nested_braces() {
    let module = parse(&in_main("if {\n    int y = 1;\n}\nreturn;"));
    let statements = &module.function("main").expect("main").body.statements;

    assert_eq!(statements.len(), 2);
    assert!(matches!(statements[0].kind, StatementKind::Invalid));
    assert!(matches!(statements[1].kind, StatementKind::Return(None)));
}

#[rstest]
#[case("function main() {\n    int x = 1;\n")]
#[case("function main( {\n}\n")]
#[case("int x = 1;\n")]
#[case("function main() {\n    string s = \"open;\n}\n")]
fn test_unrecoverable_errors(#[case] source: &str) {
    assert!(parse_module(source, FILE).is_err(), "'{}' should not parse", source);
}

#[test]
fn test_unterminated_block_reports_position() {
    let error = parse_module("function main() {\n    int x = 1;\n", FILE)
        .expect_err("Unterminated block");
    assert_eq!((error.line, error.col), (0, 16));
    assert!(error.message.contains("Unterminated block"));
}

#[test]
fn test_columns_are_utf16() {
    let module = parse(&in_main("string s = \"😀\"; int y = 1;"));
    let statements = &module.function("main").expect("main").body.statements;

    assert_eq!(statements[0].range, range((1, 4), (1, 20)));
    assert_eq!(statements[1].range, range((1, 21), (1, 31)));
    assert_eq!(statements[1].source, "int y = 1;");
}

#[test]
fn test_parse_block_rejects_trailing_tokens() {
    assert!(parse_block("{\n}", FILE).is_ok());
    assert!(parse_block("{\n} x", FILE).is_err());
}
