//! Prelude module for convenient imports
//!
//! Re-exports the types needed to analyze, edit and synchronize a document, so a
//! caller can start with a single `use flowsync::prelude::*;`.
//!
//! # Example
//!
//! ```rust,no_run
//! use flowsync::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let source = std::fs::read_to_string("path/to/main.bal")?;
//! let module = parse_module(&source, "main.bal")?;
//! let function = module.function("main").ok_or("no main function")?;
//!
//! let catalog = TypeCatalog::builtin();
//! let symbols = SymbolTable::new().with_module(&module, &catalog);
//! let model = Analyzer::builder(&symbols, &catalog).build().analyze_function(function)?;
//!
//! println!("{}", DisplayFlow { nodes: &model.nodes });
//! # Ok(())
//! # }
//! ```

// Analysis and synchronization
pub use crate::analyzer::{Analyzer, FlowModel};
pub use crate::document::TextDocument;
pub use crate::generator::{Generator, GeneratorContext, SourceEdits, TextEdit};
pub use crate::reconciler::Reconciler;
pub use crate::sync::{SyncOutcome, SyncSession};

// Flow model
pub use crate::model::template::{TemplateContext, call_template, node_template};
pub use crate::model::{DisplayFlow, FlowNode, NodeBuilder, NodeFlags, NodeKind, Property};

// Source, symbols and types
pub use crate::diagnostics::{Diagnostic, DiagnosticCorrelator, Severity};
pub use crate::position::{LinePosition, LineRange};
pub use crate::semantic::{ConnectorIndex, ModuleId, SemanticModel, SymbolTable};
pub use crate::syntax::parse_module;
pub use crate::types::{TypeCatalog, TypeDescriptor, TypeFormatter};

// Error types
pub use crate::error::{FlowError, GenerationError, SyntaxError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
