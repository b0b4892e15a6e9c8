//! Tests for attaching diagnostics to flow nodes.
mod common;
use common::*;
use flowsync::diagnostics::{CorrelatorOptions, Cursor};
use flowsync::prelude::*;

fn messages(node: &FlowNode) -> Vec<&str> {
    node.diagnostics.iter().map(|d| d.message.as_str()).collect()
}

fn if_node(start: (usize, usize), end: (usize, usize), then: FlowNode) -> FlowNode {
    NodeBuilder::new()
        .kind(NodeKind::If)
        .source_range(range(start, end))
        .branch(then)
        .build()
        .expect("IF should build")
}

fn correlate(diagnostics: Vec<Diagnostic>, nodes: &mut [FlowNode]) {
    DiagnosticCorrelator::new(diagnostics)
        .expect("Diagnostics should be sorted")
        .correlate_tree(nodes);
}

#[test]
fn test_diagnostics_go_to_enclosing_siblings() {
    let mut nodes = vec![
        leaf(NodeKind::Expression, "a", (1, 0), (3, 1)),
        leaf(NodeKind::Expression, "b", (5, 0), (8, 1)),
        leaf(NodeKind::Expression, "c", (9, 0), (12, 1)),
    ];
    correlate(
        vec![
            error_at("unused", (2, 4), (2, 10)),
            error_at("type error", (10, 8), (10, 20)),
        ],
        &mut nodes,
    );

    assert_eq!(messages(&nodes[0]), vec!["unused"]);
    assert!(nodes[1].diagnostics.is_empty());
    assert_eq!(messages(&nodes[2]), vec!["type error"]);
}

#[test]
fn test_descendant_claims_contained_diagnostic() {
    let child = leaf(NodeKind::Variable, "int y = z;", (2, 4), (2, 14));
    let then = branch("then", vec![child], (1, 7), (3, 1));
    let mut nodes = vec![if_node((1, 0), (3, 1), then)];

    correlate(vec![error_at("undefined symbol 'z'", (2, 12), (2, 13))], &mut nodes);

    let if_node = &nodes[0];
    assert!(if_node.diagnostics.is_empty());
    let then = if_node.branch("then").expect("then branch");
    assert!(then.diagnostics.is_empty());
    assert_eq!(messages(&then.children[0]), vec!["undefined symbol 'z'"]);
}

#[test]
fn test_same_span_diagnostic_shadows_descendants() {
    let child = leaf(NodeKind::Variable, "int y = z;", (2, 4), (2, 14));
    let then = branch("then", vec![child], (1, 7), (3, 1));
    let mut nodes = vec![if_node((1, 0), (3, 1), then)];

    correlate(
        vec![
            error_at("unreachable code", (1, 0), (3, 1)),
            error_at("undefined symbol 'z'", (2, 12), (2, 13)),
        ],
        &mut nodes,
    );

    assert_eq!(messages(&nodes[0]), vec!["unreachable code"]);
    let then = nodes[0].branch("then").expect("then branch");
    assert!(then.children[0].diagnostics.is_empty());
}

#[test]
fn test_condition_diagnostic_goes_to_the_if() {
    let child = leaf(NodeKind::Break, "break;", (2, 4), (2, 10));
    let then = branch("then", vec![child], (1, 7), (3, 1));
    let mut nodes = vec![if_node((1, 0), (3, 1), then)];

    correlate(vec![error_at("expected boolean", (1, 4), (1, 5))], &mut nodes);

    assert_eq!(messages(&nodes[0]), vec!["expected boolean"]);
    let then = nodes[0].branch("then").expect("then branch");
    assert!(then.diagnostics.is_empty());
    assert!(then.children[0].diagnostics.is_empty());
}

#[test]
fn test_diagnostic_after_last_child_goes_to_parent() {
    let child = leaf(NodeKind::Break, "break;", (2, 4), (2, 10));
    let then = branch("then", vec![child], (1, 7), (4, 1));
    let mut nodes = vec![if_node((1, 0), (4, 1), then)];

    correlate(vec![error_at("missing semicolon", (3, 4), (3, 8))], &mut nodes);

    let then = nodes[0].branch("then").expect("then branch");
    assert_eq!(messages(then), vec!["missing semicolon"]);
    assert!(nodes[0].diagnostics.is_empty());
}

#[test]
fn test_spanning_diagnostic_reaches_every_covered_sibling() {
    let mut nodes = vec![
        leaf(NodeKind::Expression, "a", (1, 4), (1, 10)),
        leaf(NodeKind::Expression, "b", (2, 4), (2, 10)),
        leaf(NodeKind::Expression, "c", (4, 4), (4, 10)),
    ];
    correlate(vec![error_at("unreachable", (1, 0), (2, 12))], &mut nodes);

    assert_eq!(messages(&nodes[0]), vec!["unreachable"]);
    assert_eq!(messages(&nodes[1]), vec!["unreachable"]);
    assert!(nodes[2].diagnostics.is_empty());
}

#[test]
fn test_unsorted_diagnostics_are_rejected() {
    let result = DiagnosticCorrelator::new(vec![
        error_at("late", (5, 0), (5, 3)),
        error_at("early", (2, 0), (2, 3)),
    ]);

    assert_eq!(
        result.err(),
        Some(FlowError::MalformedDiagnosticOrder {
            previous: LinePosition::new(5, 0),
            current: LinePosition::new(2, 0),
        })
    );
}

#[test]
fn test_warnings_are_opt_in() {
    let warning = Diagnostic::new(Severity::Warning, "unused variable", range((1, 4), (1, 8)));

    let mut nodes = vec![leaf(NodeKind::Variable, "int x;", (1, 0), (1, 10))];
    correlate(vec![warning.clone()], &mut nodes);
    assert!(nodes[0].diagnostics.is_empty());

    let mut nodes = vec![leaf(NodeKind::Variable, "int x;", (1, 0), (1, 10))];
    DiagnosticCorrelator::with_options(vec![warning], CorrelatorOptions { include_warnings: true })
        .expect("Diagnostics should be sorted")
        .correlate_tree(&mut nodes);
    assert_eq!(nodes[0].diagnostics[0].severity, Severity::Warning);
}

#[test]
fn test_hints_are_never_attached() {
    let hint = Diagnostic::new(Severity::Hint, "consider final", range((1, 4), (1, 8)));
    let correlator = DiagnosticCorrelator::with_options(vec![hint], CorrelatorOptions { include_warnings: true })
        .expect("Diagnostics should be sorted");
    assert!(correlator.is_empty());
}

#[test]
fn test_diagnostics_for_other_files_are_skipped() {
    let other = Diagnostic::error("elsewhere", LineRange::from_coords("other.bal", (9, 0), (9, 4)));
    let mut nodes = vec![leaf(NodeKind::Expression, "a", (1, 0), (3, 1))];

    correlate(vec![other, error_at("here", (2, 0), (2, 4))], &mut nodes);

    assert_eq!(messages(&nodes[0]), vec!["here"]);
}

#[test]
fn test_cursor_is_threaded_by_value() {
    let correlator = DiagnosticCorrelator::new(vec![
        error_at("first", (1, 2), (1, 4)),
        error_at("second", (3, 2), (3, 4)),
    ])
    .expect("Diagnostics should be sorted");

    let start = Cursor::default();
    let (after_first, attached) = correlator.correlate(start, &range((1, 0), (1, 10)), true);
    assert_eq!(after_first.index, 1);
    assert_eq!(attached.len(), 1);

    // Replaying from the same cursor gives the same answer.
    let (again, _) = correlator.correlate(start, &range((1, 0), (1, 10)), true);
    assert_eq!(again, after_first);

    let (after_second, attached) = correlator.correlate(after_first, &range((3, 0), (3, 10)), true);
    assert_eq!(after_second.index, 2);
    assert_eq!(attached[0].message, "second");
}

#[test]
fn test_analyzed_tree_gets_parser_diagnostics() {
    let model = analyze(&in_main("if (x) {\n    int y = ;\n}"), "main");
    let if_node = &model.nodes[1];

    assert!(if_node.diagnostics.is_empty());
    let then = if_node.branch("then").expect("then branch");
    assert_eq!(then.children[0].kind, NodeKind::Expression);
    assert_eq!(then.children[0].diagnostics.len(), 1);
}
