//! Source to flow model.
//!
//! The analyzer walks a parsed function body depth-first and emits one [`FlowNode`]
//! per recognized statement. Compound statements (`if`, `while`, `foreach`, `do`,
//! `lock`) become nodes with labelled BLOCK branches. Diagnostics, when supplied, are
//! attached afterwards in the same depth-first order.

use crate::diagnostics::{CorrelatorOptions, Diagnostic, DiagnosticCorrelator};
use crate::error::FlowError;
use crate::model::{FlowNode, NodeBuilder, NodeKind, Properties, Property, keys};
use crate::semantic::{ConnectorIndex, ModuleId, SemanticModel};
use crate::syntax::{Block, FunctionDef};
use crate::types::TypeCatalog;
use serde::{Deserialize, Serialize};

mod walker;

use walker::FlowWalker;

/// The diagram of one function body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowModel {
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    pub nodes: Vec<FlowNode>,
    pub has_return: bool,
}

impl FlowModel {
    /// Top-level nodes without the leading START node.
    pub fn body(&self) -> &[FlowNode] {
        match self.nodes.first() {
            Some(first) if first.kind == NodeKind::Start => &self.nodes[1..],
            _ => &self.nodes,
        }
    }

    pub fn find(&self, id: &str) -> Option<&FlowNode> {
        FlowNode::flatten(&self.nodes).into_iter().find(|n| n.id == id)
    }
}

pub struct Analyzer<'a> {
    semantic: &'a dyn SemanticModel,
    catalog: &'a TypeCatalog,
    connectors: Option<&'a ConnectorIndex>,
    current_module: Option<&'a ModuleId>,
    diagnostics: Vec<Diagnostic>,
    options: CorrelatorOptions,
}

pub struct AnalyzerBuilder<'a> {
    semantic: &'a dyn SemanticModel,
    catalog: &'a TypeCatalog,
    connectors: Option<&'a ConnectorIndex>,
    current_module: Option<&'a ModuleId>,
    diagnostics: Vec<Diagnostic>,
    options: CorrelatorOptions,
}

impl<'a> AnalyzerBuilder<'a> {
    pub fn new(semantic: &'a dyn SemanticModel, catalog: &'a TypeCatalog) -> Self {
        Self {
            semantic,
            catalog,
            connectors: None,
            current_module: None,
            diagnostics: Vec::new(),
            options: CorrelatorOptions::default(),
        }
    }

    /// Enables dedicated node kinds for the index's connector actions.
    pub fn with_connector_index(mut self, index: &'a ConnectorIndex) -> Self {
        self.connectors = Some(index);
        self
    }

    pub fn with_current_module(mut self, module: &'a ModuleId) -> Self {
        self.current_module = Some(module);
        self
    }

    /// Diagnostics to correlate onto the produced nodes, sorted by start position.
    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn include_warnings(mut self, include: bool) -> Self {
        self.options.include_warnings = include;
        self
    }

    pub fn build(self) -> Analyzer<'a> {
        Analyzer {
            semantic: self.semantic,
            catalog: self.catalog,
            connectors: self.connectors,
            current_module: self.current_module,
            diagnostics: self.diagnostics,
            options: self.options,
        }
    }
}

impl<'a> Analyzer<'a> {
    pub fn builder(semantic: &'a dyn SemanticModel, catalog: &'a TypeCatalog) -> AnalyzerBuilder<'a> {
        AnalyzerBuilder::new(semantic, catalog)
    }

    /// The diagram of a function: a START node followed by the body's nodes.
    pub fn analyze_function(&self, function: &FunctionDef) -> Result<FlowModel, FlowError> {
        let mut nodes = vec![start_node(function)?];

        let mut walker = self.walker();
        nodes.extend(walker.block(&function.body)?);
        walker.finish()?;

        self.correlate(&mut nodes)?;
        Ok(FlowModel {
            file_name: function.range.file.clone(),
            function_name: Some(function.name.clone()),
            nodes,
            has_return: walker.has_return,
        })
    }

    /// The diagram of a bare block, without a START node.
    pub fn analyze_block(&self, block: &Block) -> Result<FlowModel, FlowError> {
        let mut walker = self.walker();
        let mut nodes = walker.block(block)?;
        walker.finish()?;

        self.correlate(&mut nodes)?;
        Ok(FlowModel {
            file_name: block.range.file.clone(),
            function_name: None,
            nodes,
            has_return: walker.has_return,
        })
    }

    fn walker(&self) -> FlowWalker<'_> {
        FlowWalker::new(
            self.semantic,
            self.catalog,
            self.connectors,
            self.current_module,
        )
    }

    fn correlate(&self, nodes: &mut [FlowNode]) -> Result<(), FlowError> {
        if self.diagnostics.is_empty() {
            return Ok(());
        }
        let correlator = DiagnosticCorrelator::with_options(self.diagnostics.clone(), self.options)?;
        correlator.correlate_tree(nodes);
        Ok(())
    }
}

fn start_node(function: &FunctionDef) -> Result<FlowNode, FlowError> {
    let parameters: Properties = function
        .params
        .iter()
        .map(|p| (p.name.clone(), Property::type_name(&p.type_name)))
        .collect();

    let mut builder = NodeBuilder::new();
    builder
        .kind(NodeKind::Start)
        .label(&function.name)
        .source_range(function.signature_range.clone())
        .source_code(&function.signature_source)
        .property(keys::NAME, Property::identifier(&function.name))
        .property(keys::PARAMETERS, Property::repeatable(parameters));
    if let Some(return_type) = &function.return_type {
        builder.property(keys::RETURN_TYPE, Property::type_name(return_type));
    }
    builder.build()
}
