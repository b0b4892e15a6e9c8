//! # flowsync - Source and Flow Diagram Synchronization
//!
//! **flowsync** keeps a function's source text and its flow diagram in step, in both
//! directions. The diagram is an ordered tree of [`FlowNode`](model::FlowNode)s (if/else,
//! loops, calls, variables, returns) that an editor can display and change; every change
//! is written back to the source as precise text edits.
//!
//! ## Core Workflow
//!
//! 1.  **Parse**: [`syntax::parse_module`] turns source text into a statement tree. Broken
//!     statements are recovered from and reported as diagnostics.
//! 2.  **Analyze**: an [`Analyzer`](analyzer::Analyzer) walks a function body with a
//!     [`SemanticModel`](semantic::SemanticModel) for symbol lookups and produces a
//!     [`FlowModel`](analyzer::FlowModel). Diagnostics are correlated onto nodes.
//! 3.  **Generate**: the [`Generator`](generator::Generator) renders an edited node back
//!     to source and returns the [`TextEdit`](generator::TextEdit)s that apply it.
//! 4.  **Reconcile**: after the edits are applied and the document re-analyzed, the
//!     [`Reconciler`](reconciler::Reconciler) marks which nodes are new (`suggested`).
//!
//! [`SyncSession`](sync::SyncSession) runs the whole cycle over an in-memory document.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowsync::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let source = "function main() {\n    int x = 1;\n}\n";
//!     let mut session = SyncSession::builder(TextDocument::new("main.bal", source)).build();
//!
//!     // Diagram of `main`
//!     let model = session.diagram("main")?;
//!     println!("{}", DisplayFlow { nodes: &model.nodes });
//!
//!     // Add a `return;` after `int x = 1;`
//!     let catalog = TypeCatalog::builtin();
//!     let stop = node_template(NodeKind::Stop, &TemplateContext::new(&catalog))?;
//!     let outcome = session.apply_node("main", &stop, Some(LinePosition::new(1, 14)))?;
//!
//!     println!("{}", session.document().text());
//!     println!("{}", DisplayFlow { nodes: &outcome.model.nodes });
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod generator;
pub mod model;
pub mod position;
pub mod prelude;
pub mod reconciler;
pub mod semantic;
pub mod sync;
pub mod syntax;
pub mod types;
