//! One synchronization cycle: diagram edit in, updated document and diagram out.

use crate::analyzer::{Analyzer, FlowModel};
use crate::diagnostics::Diagnostic;
use crate::document::TextDocument;
use crate::error::FlowError;
use crate::generator::{DEFAULT_INDENT_WIDTH, Generator, GeneratorContext, SourceEdits};
use crate::model::{FlowNode, NodeKind, keys};
use crate::position::{LinePosition, to_offset};
use crate::reconciler::Reconciler;
use crate::semantic::{ConnectorIndex, ModuleId, SymbolTable};
use crate::syntax::{self, Module};
use crate::types::TypeCatalog;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub edits: SourceEdits,
    pub model: FlowModel,
}

/// Owns a document and keeps it in step with the diagrams derived from it.
///
/// Every cycle re-parses the document, so the session holds no derived state
/// between calls. `&mut self` serializes cycles on one document.
pub struct SyncSession {
    document: TextDocument,
    symbols: SymbolTable,
    connectors: ConnectorIndex,
    catalog: TypeCatalog,
    current_module: Option<ModuleId>,
    diagnostics: Vec<Diagnostic>,
    generator: Generator,
}

pub struct SyncSessionBuilder {
    document: TextDocument,
    symbols: SymbolTable,
    connectors: ConnectorIndex,
    catalog: TypeCatalog,
    current_module: Option<ModuleId>,
    diagnostics: Vec<Diagnostic>,
}

impl SyncSessionBuilder {
    pub fn new(document: TextDocument) -> Self {
        Self {
            document,
            symbols: SymbolTable::new(),
            connectors: ConnectorIndex::standard(),
            catalog: TypeCatalog::builtin(),
            current_module: None,
            diagnostics: Vec::new(),
        }
    }

    /// Symbols from outside the document (library functions, client classes).
    pub fn with_symbols(mut self, symbols: SymbolTable) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn with_connector_index(mut self, connectors: ConnectorIndex) -> Self {
        self.connectors = connectors;
        self
    }

    pub fn with_type_catalog(mut self, catalog: TypeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_current_module(mut self, module: ModuleId) -> Self {
        self.current_module = Some(module);
        self
    }

    /// Host diagnostics for the document as it is now. They are dropped once an
    /// edit is applied, since their ranges no longer hold.
    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn build(self) -> SyncSession {
        SyncSession {
            symbols: self.symbols.with_connectors(&self.connectors),
            document: self.document,
            connectors: self.connectors,
            catalog: self.catalog,
            current_module: self.current_module,
            diagnostics: self.diagnostics,
            generator: Generator::new(),
        }
    }
}

impl SyncSession {
    pub fn builder(document: TextDocument) -> SyncSessionBuilder {
        SyncSessionBuilder::new(document)
    }

    pub fn document(&self) -> &TextDocument {
        &self.document
    }

    /// The diagram of `function_name` in the current document.
    pub fn diagram(&self, function_name: &str) -> Result<FlowModel, FlowError> {
        let module = syntax::parse_module(self.document.text(), &self.document.file_name())?;
        let extra = self.diagnostics.clone();
        self.analyze(&module, function_name, extra)
    }

    /// Writes `node` into the document and returns the edits with the new diagram.
    ///
    /// A node without a source range is inserted at `insert_at`. On any failure the
    /// document is left as it was.
    pub fn apply_node(
        &mut self,
        function_name: &str,
        node: &FlowNode,
        insert_at: Option<LinePosition>,
    ) -> Result<SyncOutcome, FlowError> {
        tracing::info!("[FLOWSYNC] Phase 1: Analyzing '{}' before the edit", function_name);
        let module = syntax::parse_module(self.document.text(), &self.document.file_name())?;
        let before = self.analyze(&module, function_name, self.diagnostics.clone())?;

        tracing::info!("[FLOWSYNC] Phase 2: Generating source for {} '{}'", node.kind, node.label);
        let ctx = self.generator_context(&module, &before, insert_at);
        let edits = self.generator.generate(node, &ctx)?;

        tracing::info!("[FLOWSYNC] Phase 3: Applying {} edit(s)", edits.for_file(self.document.path()).len());
        let edited = self.document.with_edits(edits.for_file(self.document.path()))?;

        tracing::info!("[FLOWSYNC] Phase 4: Re-parsing the edited document");
        let reparsed = syntax::parse_module(edited.text(), &edited.file_name()).map_err(|e| {
            tracing::warn!("[FLOWSYNC] Edited document does not parse, keeping the previous text: {}", e);
            FlowError::Syntax(e)
        })?;

        let function_name = match node.kind {
            NodeKind::Start => node.property_value(keys::NAME).unwrap_or(function_name),
            _ => function_name,
        };
        let after = self.analyze(&reparsed, function_name, Vec::new())?;

        tracing::info!("[FLOWSYNC] Phase 5: Reconciling {} node(s)", after.nodes.len());
        let mut reconciler = Reconciler::from_diagnostics(&reparsed.diagnostics);
        let nodes = reconciler.reconcile(&before.nodes, after.nodes);

        self.document = edited;
        self.diagnostics.clear();
        Ok(SyncOutcome {
            edits,
            model: FlowModel { nodes, ..after },
        })
    }

    fn analyze(
        &self,
        module: &Module,
        function_name: &str,
        extra: Vec<Diagnostic>,
    ) -> Result<FlowModel, FlowError> {
        let function = module
            .function(function_name)
            .ok_or_else(|| FlowError::FunctionNotFound(function_name.to_string()))?;
        let symbols = self.symbols.clone().with_module(module, &self.catalog);

        let mut diagnostics: Vec<Diagnostic> = module.diagnostics.iter().cloned().chain(extra).collect();
        diagnostics.sort_by_key(|d| d.range.start());

        let mut builder = Analyzer::builder(&symbols, &self.catalog)
            .with_connector_index(&self.connectors)
            .with_diagnostics(diagnostics);
        if let Some(current) = &self.current_module {
            builder = builder.with_current_module(current);
        }
        builder.build().analyze_function(function)
    }

    /// A new node goes on its own line after the statement ending at `insert_at`, or
    /// one level deeper than the line holding the opening brace.
    fn generator_context(
        &self,
        module: &Module,
        before: &FlowModel,
        insert_at: Option<LinePosition>,
    ) -> GeneratorContext {
        let mut ctx = GeneratorContext::new(self.document.path())
            .with_existing_imports(module.import_ids());
        if let Some(current) = &self.current_module {
            ctx = ctx.with_current_module(current.clone());
        }
        let Some(at) = insert_at else {
            return ctx;
        };

        let sibling = FlowNode::flatten(&before.nodes)
            .into_iter()
            .filter(|n| n.kind != NodeKind::Block)
            .filter_map(|n| n.source_range.as_ref())
            .find(|r| r.end() == at);
        let column = match sibling {
            Some(range) => range.start_col,
            None => self.line_indent(at.line) + DEFAULT_INDENT_WIDTH,
        };
        ctx.insert_at(at)
            .with_sibling_at_position(sibling.is_some())
            .with_block_open_at_position(sibling.is_none() && self.follows_block_open(at))
            .with_indent_column(column)
    }

    /// Whether only whitespace separates `at` from a preceding `{`.
    fn follows_block_open(&self, at: LinePosition) -> bool {
        let text = self.document.text();
        to_offset(text, at).is_some_and(|offset| text[..offset].trim_end().ends_with('{'))
    }

    fn line_indent(&self, line: usize) -> usize {
        self.document
            .text()
            .lines()
            .nth(line)
            .map(|l| l.len() - l.trim_start().len())
            .unwrap_or(0)
    }
}
