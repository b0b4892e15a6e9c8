//! Tests for the node model: builder, templates, ids and display.
mod common;
use common::*;
use flowsync::model::{Properties, keys, labels};
use flowsync::prelude::*;
use flowsync::semantic::{Symbol, SymbolKind};
use rstest::rstest;

#[test]
fn test_builder_requires_a_kind() {
    let result = NodeBuilder::new().label("nothing").build();
    assert_eq!(
        result,
        Err(FlowError::IncompleteNode {
            field: "kind".to_string()
        })
    );
}

#[test]
fn test_builder_rejects_children_with_branches() {
    let child = leaf(NodeKind::Break, "break;", (2, 4), (2, 10));
    let result = NodeBuilder::new()
        .kind(NodeKind::If)
        .child(child.clone())
        .branch(branch("then", vec![child], (1, 7), (3, 1)))
        .build();

    assert_eq!(
        result,
        Err(FlowError::ConflictingNodeShape { kind: NodeKind::If })
    );
}

#[test]
fn test_builder_resets_after_build() {
    let mut builder = NodeBuilder::new();
    builder
        .kind(NodeKind::Variable)
        .property(keys::NAME, Property::identifier("x"))
        .flag(NodeFlags::FINAL);
    let first = builder.build().expect("First node should build");

    assert_eq!(first.label, "Variable");
    assert!(first.has_flag(NodeFlags::FINAL));
    assert_eq!(builder.current_kind(), None);
    assert!(!builder.has_property(keys::NAME));
    assert!(builder.build().is_err());
}

#[test]
fn test_ids_follow_range_or_content() {
    let a = leaf(NodeKind::Break, "break;", (2, 4), (2, 10));
    let b = leaf(NodeKind::Break, "break;", (2, 4), (2, 10));
    let moved = leaf(NodeKind::Break, "break;", (3, 4), (3, 10));
    assert_eq!(a.id, b.id);
    assert_ne!(a.id, moved.id);

    let catalog = TypeCatalog::builtin();
    let ctx = TemplateContext::new(&catalog);
    let fresh = node_template(NodeKind::Variable, &ctx).expect("VARIABLE template");
    let again = node_template(NodeKind::Variable, &ctx).expect("VARIABLE template");
    assert_eq!(fresh.id, again.id);

    let mut edited = NodeBuilder::new();
    edited
        .kind(NodeKind::Variable)
        .property(keys::NAME, Property::identifier("other"));
    assert_ne!(edited.build().expect("Node should build").id, fresh.id);
}

#[test]
fn test_flags_combine() {
    let flags = NodeFlags::CHECKED | NodeFlags::REMOTE;
    assert!(flags.contains(NodeFlags::CHECKED));
    assert!(flags.contains(NodeFlags::REMOTE));
    assert!(!flags.contains(NodeFlags::FINAL));
    assert!(NodeFlags::NONE.is_empty());
}

#[test]
fn test_mark_suggested_reaches_descendants() {
    let child = leaf(NodeKind::Break, "break;", (2, 4), (2, 10));
    let mut node = NodeBuilder::new()
        .kind(NodeKind::While)
        .branch(branch("body", vec![child], (1, 10), (3, 1)))
        .build()
        .expect("WHILE should build");

    node.mark_suggested(true);
    assert!(suggested_flags(std::slice::from_ref(&node)).iter().all(|(_, s)| *s == Some(true)));
}

#[test]
fn test_branch_lookup_ignores_case() {
    let node = NodeBuilder::new()
        .kind(NodeKind::If)
        .branch(branch("Then", Vec::new(), (1, 7), (2, 1)))
        .build()
        .expect("IF should build");

    assert!(node.branch(labels::THEN).is_some());
    assert!(node.branch(labels::ELSE).is_none());
}

#[rstest]
#[case(NodeKind::If, &["condition"], &["then"])]
#[case(NodeKind::While, &["condition"], &["body"])]
#[case(NodeKind::Foreach, &["type", "name", "collection"], &["body"])]
#[case(NodeKind::ErrorHandler, &[], &["body", "on fail"])]
#[case(NodeKind::Lock, &[], &["body"])]
#[case(NodeKind::Variable, &["type", "name", "value"], &[])]
#[case(NodeKind::Assign, &["name", "value"], &[])]
#[case(NodeKind::Return, &["expression"], &[])]
#[case(NodeKind::Stop, &[], &[])]
#[case(NodeKind::Fail, &["expression"], &[])]
#[case(NodeKind::Comment, &["comment"], &[])]
fn test_template_shapes(#[case] kind: NodeKind, #[case] properties: &[&str], #[case] branches: &[&str]) {
    let catalog = TypeCatalog::builtin();
    let node = node_template(kind, &TemplateContext::new(&catalog)).expect("Template should exist");

    assert_eq!(node.kind, kind);
    assert!(node.source_range.is_none());
    assert!(node.source_code.is_empty());
    assert_eq!(node.properties.keys().collect::<Vec<_>>(), properties);
    let labels: Vec<&str> = node.branches.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, branches);
    assert!(node.branches.iter().all(|b| b.kind == NodeKind::Block && b.children.is_empty()));
}

#[rstest]
#[case(NodeKind::Start)]
#[case(NodeKind::Block)]
#[case(NodeKind::FunctionCall)]
#[case(NodeKind::HttpApiPostCall)]
fn test_kinds_without_template(#[case] kind: NodeKind) {
    let catalog = TypeCatalog::builtin();
    assert_eq!(
        node_template(kind, &TemplateContext::new(&catalog)),
        Err(FlowError::NoTemplate(kind))
    );
}

#[test]
fn test_template_names_avoid_visible_symbols() {
    let catalog = TypeCatalog::builtin();
    let visible = vec![
        Symbol {
            kind: SymbolKind::Variable,
            module: None,
            name: "var1".to_string(),
            type_signature: Some(TypeDescriptor::Int),
        },
        Symbol {
            kind: SymbolKind::Variable,
            module: None,
            name: "var2".to_string(),
            type_signature: Some(TypeDescriptor::Int),
        },
    ];
    let ctx = TemplateContext::new(&catalog).with_visible(visible);

    let node = node_template(NodeKind::Variable, &ctx).expect("VARIABLE template");
    assert_eq!(node.property_value(keys::NAME), Some("var3"));
    assert_eq!(ctx.unique_name("item"), "item1");
}

#[test]
fn test_template_names_from_symbol_table() {
    let catalog = TypeCatalog::builtin();
    let module = parse(&in_main("int var1 = 1;\nint var2 = 2;"));
    let symbols = SymbolTable::new().with_module(&module, &catalog);
    let visible = symbols.visible_symbols(LinePosition::new(3, 0));
    let ctx = TemplateContext::new(&catalog).with_visible(visible);

    assert_eq!(ctx.unique_name("var"), "var3");
}

#[test]
fn test_method_template_needs_a_connection() {
    let catalog = TypeCatalog::builtin();
    let symbol = Symbol {
        kind: SymbolKind::RemoteMethod,
        module: None,
        name: "send".to_string(),
        type_signature: None,
    };
    let ctx = TemplateContext::new(&catalog);

    assert_eq!(
        call_template(&symbol, None, None, &ctx),
        Err(FlowError::IncompleteNode {
            field: "connection".to_string()
        })
    );

    let node = call_template(&symbol, Some("client"), None, &ctx).expect("Remote template");
    assert_eq!(node.kind, NodeKind::RemoteActionCall);
    assert!(node.has_flag(NodeFlags::REMOTE));
    assert_eq!(node.property_value(keys::CONNECTION), Some("client"));
    assert!(node.property(keys::TYPE).is_none());
}

#[test]
fn test_variable_symbol_has_no_call_template() {
    let catalog = TypeCatalog::builtin();
    let symbol = Symbol {
        kind: SymbolKind::Variable,
        module: None,
        name: "x".to_string(),
        type_signature: Some(TypeDescriptor::Int),
    };
    assert_eq!(
        call_template(&symbol, None, None, &TemplateContext::new(&catalog)),
        Err(FlowError::NoTemplate(NodeKind::FunctionCall))
    );
}

#[test]
fn test_properties_keep_insertion_order() {
    let mut properties = Properties::new()
        .with("b", Property::expression("1"))
        .with("a", Property::expression("2"));
    properties.insert("b", Property::expression("3"));

    assert_eq!(properties.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    assert_eq!(properties.value("b"), Some("3"));

    let json = serde_json::to_string(&properties).expect("Properties should serialize");
    assert!(json.find("\"b\"") < json.find("\"a\""));
    let back: Properties = serde_json::from_str(&json).expect("Properties should deserialize");
    assert_eq!(back, properties);
}

#[test]
fn test_property_defaults_on_deserialize() {
    let property: Property = serde_json::from_str(r#"{"valueKind":"EXPRESSION","value":"x"}"#)
        .expect("Property should deserialize");

    assert!(property.editable);
    assert!(!property.optional);
    assert!(property.imports.is_empty());
}

#[rstest]
#[case(NodeKind::HttpApiGetCall, "HTTP_API_GET_CALL")]
#[case(NodeKind::ErrorHandler, "ERROR_HANDLER")]
#[case(NodeKind::Start, "START")]
fn test_kind_names(#[case] kind: NodeKind, #[case] name: &str) {
    assert_eq!(kind.to_string(), name);
    assert_eq!(
        serde_json::to_value(kind).expect("Kind should serialize"),
        serde_json::Value::String(name.to_string())
    );
}

#[test]
fn test_display_tree() {
    let nodes = analyze_main("if (x) {\n    int y = 1;\n}");
    let rendered = DisplayFlow { nodes: &nodes }.to_string();

    assert_eq!(
        rendered,
        "└── IF 'If' [condition=x] @1:4\n    └── BLOCK 'then' @1:11\n        └── VARIABLE 'Variable' [type=int, name=y, value=1] @2:8\n"
    );
}

#[test]
fn test_display_marks_suggestions_and_diagnostics() {
    let mut node = leaf(NodeKind::Expression, "foo(", (1, 4), (1, 8));
    node.suggested = Some(true);
    node.diagnostics.push(flowsync::diagnostics::NodeDiagnostic {
        severity: Severity::Error,
        message: "missing ')'".to_string(),
    });
    let rendered = DisplayFlow { nodes: std::slice::from_ref(&node) }.to_string();

    assert_eq!(
        rendered,
        "└── EXPRESSION 'Custom Expression' @1:4 (suggested)\n      ! Error: missing ')'\n"
    );
}
