//! Flow node to source text.
//!
//! Generation is pure: the same node and context always produce byte-identical edits.
//! An existing node (one with a source range) is replaced in place; a new node is
//! inserted at the position the caller supplies.

use crate::error::GenerationError;
use crate::model::FlowNode;
use crate::position::{LinePosition, Span};
use crate::semantic::ModuleId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

mod templates;
mod tokens;

pub const DEFAULT_INDENT_WIDTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub range: Span,
    pub new_text: String,
}

impl TextEdit {
    pub fn new(range: Span, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }

    pub fn insert(at: LinePosition, new_text: impl Into<String>) -> Self {
        Self::new(Span::point(at), new_text)
    }
}

/// Edits per file, plus the modules that the edits import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEdits {
    pub edits: BTreeMap<PathBuf, Vec<TextEdit>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
}

impl SourceEdits {
    pub fn for_file(&self, path: &Path) -> &[TextEdit] {
        self.edits.get(path).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.values().all(Vec::is_empty)
    }
}

/// Where and how a node is written.
#[derive(Debug, Clone, Default)]
pub struct GeneratorContext {
    path: PathBuf,
    insert_at: Option<LinePosition>,
    sibling_at_position: bool,
    after_block_open: bool,
    indent_column: Option<usize>,
    existing_imports: Vec<String>,
    current_module: Option<ModuleId>,
}

impl GeneratorContext {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Position for a node that is not in the document yet.
    pub fn insert_at(mut self, position: LinePosition) -> Self {
        self.insert_at = Some(position);
        self
    }

    /// A statement already ends at the insert position; the new one goes on its own line.
    pub fn with_sibling_at_position(mut self, sibling: bool) -> Self {
        self.sibling_at_position = sibling;
        self
    }

    /// The insert position directly follows a block's `{`; the new statement goes on
    /// its own line.
    pub fn with_block_open_at_position(mut self, after_open: bool) -> Self {
        self.after_block_open = after_open;
        self
    }

    /// Column of the statement's first line. Defaults to the node's start column.
    pub fn with_indent_column(mut self, column: usize) -> Self {
        self.indent_column = Some(column);
        self
    }

    /// Imports the document already has, in `org/name` form.
    pub fn with_existing_imports(mut self, imports: Vec<String>) -> Self {
        self.existing_imports = imports;
        self
    }

    pub fn with_current_module(mut self, module: ModuleId) -> Self {
        self.current_module = Some(module);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Clone)]
pub struct Generator {
    indent_width: usize,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    pub fn new() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
        }
    }

    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    /// The node's source text with its first line at column zero.
    pub fn render(&self, node: &FlowNode) -> Result<String, GenerationError> {
        templates::render(node, self.indent_width)
    }

    pub fn generate(
        &self,
        node: &FlowNode,
        ctx: &GeneratorContext,
    ) -> Result<SourceEdits, GenerationError> {
        let text = self.render(node)?;

        let edit = match &node.source_range {
            Some(range) => {
                let column = ctx.indent_column.unwrap_or(range.start_col);
                TextEdit::new(range.span(), tokens::reindent(&text, column))
            }
            None => {
                let at = ctx
                    .insert_at
                    .ok_or(GenerationError::MissingInsertPosition { kind: node.kind })?;
                let column = ctx.indent_column.unwrap_or(at.offset);
                let body = tokens::reindent(&text, column);
                let new_text = if ctx.sibling_at_position || ctx.after_block_open {
                    format!("\n{}{}", " ".repeat(column), body)
                } else {
                    body
                };
                TextEdit::insert(at, new_text)
            }
        };
        tracing::debug!(
            "[GENERATOR] {} '{}' -> edit at {}",
            node.kind,
            node.label,
            edit.range.start
        );

        let imports = self.missing_imports(node, ctx);
        let mut edits = Vec::with_capacity(2);
        if !imports.is_empty() {
            let text: String = imports
                .iter()
                .map(|module| format!("import {};\n", module))
                .collect();
            edits.push(TextEdit::insert(LinePosition::default(), text));
        }
        edits.push(edit);

        let mut out = SourceEdits {
            edits: BTreeMap::new(),
            imports,
        };
        out.edits.insert(ctx.path.clone(), edits);
        Ok(out)
    }

    /// Modules referenced anywhere in the node that the document does not import yet.
    fn missing_imports(&self, node: &FlowNode, ctx: &GeneratorContext) -> Vec<String> {
        let mut wanted: Vec<String> = Vec::new();
        node.walk(&mut |n| {
            for (_, property) in n.properties.iter() {
                for module in &property.imports {
                    if !wanted.contains(module) {
                        wanted.push(module.clone());
                    }
                }
            }
        });

        wanted
            .into_iter()
            .filter(|module| match ModuleId::parse(module) {
                Some(id) => !id.is_langlib() && ctx.current_module.as_ref() != Some(&id),
                None => false,
            })
            .filter(|module| !ctx.existing_imports.contains(module))
            .collect()
    }
}
