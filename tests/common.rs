//! Common test utilities for building sources, symbol tables and flow nodes.
use flowsync::diagnostics::Diagnostic;
use flowsync::prelude::*;
use flowsync::syntax::Module;
use flowsync::types::FunctionParam;

pub const FILE: &str = "main.bal";

/// A function with one of each statement kind the analyzer models.
#[allow(dead_code)]
pub const SAMPLE: &str = r#"import ballerina/io;

function process(int[] nums, int limit) returns int {
    // running total
    int total = 0;
    foreach int n in nums {
        if (n > limit) {
            break;
        } else if (n < 0) {
            continue;
        } else {
            total = total + n;
        }
    }
    while (total > 100) {
        total = total - 100;
    }
    do {
        int checked = check compute(total, limit);
        io:println(checked);
    } on fail error e {
        panic e;
    }
    lock {
        total = total + 1;
    }
    return total;
}
"#;

/// Wraps statements in `function main() { ... }`, one statement per line.
#[allow(dead_code)]
pub fn in_main(body: &str) -> String {
    let lines: Vec<String> = body.lines().map(|l| format!("    {}", l)).collect();
    format!("function main() {{\n{}\n}}\n", lines.join("\n"))
}

#[allow(dead_code)]
pub fn parse(source: &str) -> Module {
    parse_module(source, FILE).expect("Source should parse")
}

/// Library symbols: `compute(int a, int b) returns int|error` and `ballerina/io:println`.
#[allow(dead_code)]
pub fn library_symbols() -> SymbolTable {
    SymbolTable::new()
        .with_function(
            None,
            "compute",
            vec![
                FunctionParam::new("a", TypeDescriptor::Int),
                FunctionParam::new("b", TypeDescriptor::Int),
            ],
            TypeDescriptor::union(vec![TypeDescriptor::Int, TypeDescriptor::error()]),
        )
        .with_function(
            Some(ModuleId::new("ballerina", "io")),
            "println",
            vec![FunctionParam::new("values", TypeDescriptor::Any)],
            TypeDescriptor::Nil,
        )
        .with_connectors(&ConnectorIndex::standard())
}

/// Analyzes `function_name` with the library symbols and the module's own diagnostics.
#[allow(dead_code)]
pub fn analyze(source: &str, function_name: &str) -> FlowModel {
    let module = parse(source);
    let catalog = TypeCatalog::builtin();
    let connectors = ConnectorIndex::standard();
    let symbols = library_symbols().with_module(&module, &catalog);
    let function = module
        .function(function_name)
        .expect("Function should exist");

    Analyzer::builder(&symbols, &catalog)
        .with_connector_index(&connectors)
        .with_diagnostics(module.diagnostics.clone())
        .build()
        .analyze_function(function)
        .expect("Analysis should succeed")
}

/// The body nodes (without START) of `main` in `in_main(body)`.
#[allow(dead_code)]
pub fn analyze_main(body: &str) -> Vec<FlowNode> {
    analyze(&in_main(body), "main").body().to_vec()
}

#[allow(dead_code)]
pub fn range(start: (usize, usize), end: (usize, usize)) -> LineRange {
    LineRange::from_coords(FILE, start, end)
}

#[allow(dead_code)]
pub fn error_at(message: &str, start: (usize, usize), end: (usize, usize)) -> Diagnostic {
    Diagnostic::error(message, range(start, end))
}

/// A leaf node with a range and captured source text.
#[allow(dead_code)]
pub fn leaf(kind: NodeKind, source: &str, start: (usize, usize), end: (usize, usize)) -> FlowNode {
    NodeBuilder::new()
        .kind(kind)
        .source_range(range(start, end))
        .source_code(source)
        .build()
        .expect("Leaf should build")
}

/// A BLOCK branch node.
#[allow(dead_code)]
pub fn branch(label: &str, children: Vec<FlowNode>, start: (usize, usize), end: (usize, usize)) -> FlowNode {
    NodeBuilder::new()
        .kind(NodeKind::Block)
        .label(label)
        .source_range(range(start, end))
        .children(children)
        .build()
        .expect("Branch should build")
}

#[allow(dead_code)]
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Every node in pre-order with its `suggested` flag.
#[allow(dead_code)]
pub fn suggested_flags(nodes: &[FlowNode]) -> Vec<(NodeKind, Option<bool>)> {
    FlowNode::flatten(nodes)
        .into_iter()
        .map(|n| (n.kind, n.suggested))
        .collect()
}
