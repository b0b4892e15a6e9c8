//! Tests for marking new nodes after an edit.
mod common;
use common::*;
use flowsync::prelude::*;

fn reconcile(before: &str, after: &str) -> Vec<FlowNode> {
    let old = analyze(&in_main(before), "main");
    let module = parse(&in_main(after));
    let new = analyze(&in_main(after), "main");
    Reconciler::from_diagnostics(&module.diagnostics).reconcile(&old.nodes, new.nodes)
}

#[test]
fn test_unchanged_tree_has_nothing_suggested() {
    let model = analyze(SAMPLE, "process");
    let nodes = Reconciler::new(Vec::new()).reconcile(&model.nodes, model.nodes.clone());

    assert_eq!(nodes.len(), model.nodes.len());
    assert!(suggested_flags(&nodes).iter().all(|(_, s)| *s == Some(false)));
}

#[test]
fn test_appended_statement_is_suggested() {
    let nodes = reconcile("int x = 1;", "int x = 1;\nreturn;");

    assert_eq!(
        suggested_flags(&nodes),
        vec![
            (NodeKind::Start, Some(false)),
            (NodeKind::Variable, Some(false)),
            (NodeKind::Stop, Some(true)),
        ]
    );
}

#[test]
fn test_inserted_statement_does_not_shift_the_match() {
    let nodes = reconcile("int x = 1;\nint z = 3;", "int x = 1;\nint y = 2;\nint z = 3;");

    assert_eq!(
        suggested_flags(&nodes),
        vec![
            (NodeKind::Start, Some(false)),
            (NodeKind::Variable, Some(false)),
            (NodeKind::Variable, Some(true)),
            (NodeKind::Variable, Some(false)),
        ]
    );
}

#[test]
fn test_inserted_if_is_suggested_with_its_branch() {
    let nodes = reconcile(
        "int x = 1;\nint z = 3;",
        "int x = 1;\nif (x > 0) {\n    int y = 2;\n}\nint z = 3;",
    );

    assert_eq!(
        suggested_flags(&nodes),
        vec![
            (NodeKind::Start, Some(false)),
            (NodeKind::Variable, Some(false)),
            (NodeKind::If, Some(true)),
            (NodeKind::Block, Some(true)),
            (NodeKind::Variable, Some(true)),
            (NodeKind::Variable, Some(false)),
        ]
    );
}

#[test]
fn test_modified_statement_leaves_followers_suggested() {
    let nodes = reconcile("int a = 1;\nint b = 2;\nint c = 3;", "int a = 1;\nint b = 20;\nint c = 3;");

    assert_eq!(
        suggested_flags(&nodes),
        vec![
            (NodeKind::Start, Some(false)),
            (NodeKind::Variable, Some(false)),
            (NodeKind::Variable, Some(true)),
            (NodeKind::Variable, Some(true)),
        ]
    );
}

#[test]
fn test_whitespace_changes_still_match() {
    let nodes = reconcile("int x = 1;", "int   x =\n        1;");
    assert!(suggested_flags(&nodes).iter().all(|(_, s)| *s == Some(false)));
}

#[test]
fn test_only_the_new_branch_statement_is_suggested() {
    let nodes = reconcile(
        "if (x) {\n    int a = 1;\n}",
        "if (x) {\n    int a = 1;\n    int b = 2;\n}",
    );

    assert_eq!(
        suggested_flags(&nodes),
        vec![
            (NodeKind::Start, Some(false)),
            (NodeKind::If, Some(false)),
            (NodeKind::Block, Some(false)),
            (NodeKind::Variable, Some(false)),
            (NodeKind::Variable, Some(true)),
        ]
    );
}

#[test]
fn test_new_else_branch_is_suggested_whole() {
    let nodes = reconcile(
        "if (x) {\n    break;\n}",
        "if (x) {\n    break;\n} else {\n    continue;\n}",
    );

    assert_eq!(
        suggested_flags(&nodes),
        vec![
            (NodeKind::Start, Some(false)),
            (NodeKind::If, Some(false)),
            (NodeKind::Block, Some(false)),
            (NodeKind::Break, Some(false)),
            (NodeKind::Block, Some(true)),
            (NodeKind::Continue, Some(true)),
        ]
    );
}

#[test]
fn test_erroneous_insertion_is_dropped_with_its_followers() {
    let nodes = reconcile("int x = 1;", "int x = 1;\nint y = ;\nint z = 2;");

    assert_eq!(
        suggested_flags(&nodes),
        vec![
            (NodeKind::Start, Some(false)),
            (NodeKind::Variable, Some(false)),
        ]
    );
}

#[test]
fn test_matched_node_ends_the_error_streak() {
    let nodes = reconcile(
        "int x = 1;\nreturn;",
        "int x = 1;\nint y = ;\nint w = 3;\nreturn;",
    );

    assert_eq!(
        suggested_flags(&nodes),
        vec![
            (NodeKind::Start, Some(false)),
            (NodeKind::Variable, Some(false)),
            (NodeKind::Stop, Some(false)),
        ]
    );
}

#[test]
fn test_errors_before_a_node_do_not_drop_it() {
    let mut reconciler = Reconciler::new(vec![range((1, 0), (1, 5))]);
    let nodes = reconciler.reconcile(
        &[],
        vec![leaf(NodeKind::Expression, "foo();", (2, 4), (2, 10))],
    );

    assert_eq!(suggested_flags(&nodes), vec![(NodeKind::Expression, Some(true))]);
}

#[test]
fn test_nodes_without_range_are_suggested() {
    let catalog = TypeCatalog::builtin();
    let stop = node_template(NodeKind::Stop, &TemplateContext::new(&catalog)).expect("STOP template");
    let nodes = Reconciler::new(vec![range((0, 0), (9, 0))]).reconcile(&[], vec![stop]);

    assert_eq!(nodes[0].suggested, Some(true));
}

#[test]
fn test_reconciled_nodes_serialize_suggested() {
    let nodes = reconcile("int x = 1;", "int x = 1;\nreturn;");
    let json = serde_json::to_value(&nodes).expect("Nodes should serialize");

    assert_eq!(json[1]["suggested"], false);
    assert_eq!(json[2]["suggested"], true);
}
