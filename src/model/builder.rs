use super::{FlowNode, NodeFlags, NodeKind, Properties, Property, node_id};
use crate::diagnostics::NodeDiagnostic;
use crate::error::FlowError;
use crate::position::LineRange;

/// Accumulates one node. Setters chain through `&mut Self`; [`build`](Self::build)
/// seals the node and leaves the builder empty for the next one.
#[derive(Debug, Default, Clone)]
pub struct NodeBuilder {
    kind: Option<NodeKind>,
    label: Option<String>,
    source_range: Option<LineRange>,
    source_code: String,
    properties: Properties,
    children: Vec<FlowNode>,
    branches: Vec<FlowNode>,
    diagnostics: Vec<NodeDiagnostic>,
    flags: NodeFlags,
    returning: bool,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&mut self, kind: NodeKind) -> &mut Self {
        self.kind = Some(kind);
        self
    }

    pub fn current_kind(&self) -> Option<NodeKind> {
        self.kind
    }

    pub fn label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = Some(label.into());
        self
    }

    pub fn source_range(&mut self, range: LineRange) -> &mut Self {
        self.source_range = Some(range);
        self
    }

    pub fn source_code(&mut self, code: impl Into<String>) -> &mut Self {
        self.source_code = code.into();
        self
    }

    pub fn property(&mut self, key: &str, property: Property) -> &mut Self {
        self.properties.insert(key, property);
        self
    }

    pub fn properties(&mut self, properties: Properties) -> &mut Self {
        for (key, property) in properties.iter() {
            self.properties.insert(key, property.clone());
        }
        self
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn child(&mut self, node: FlowNode) -> &mut Self {
        self.children.push(node);
        self
    }

    pub fn children(&mut self, nodes: Vec<FlowNode>) -> &mut Self {
        self.children.extend(nodes);
        self
    }

    pub fn branch(&mut self, branch: FlowNode) -> &mut Self {
        self.branches.push(branch);
        self
    }

    pub fn diagnostic(&mut self, diagnostic: NodeDiagnostic) -> &mut Self {
        self.diagnostics.push(diagnostic);
        self
    }

    pub fn flag(&mut self, flag: NodeFlags) -> &mut Self {
        self.flags.insert(flag);
        self
    }

    pub fn clear_flag(&mut self, flag: NodeFlags) -> &mut Self {
        self.flags.remove(flag);
        self
    }

    pub fn returning(&mut self) -> &mut Self {
        self.returning = true;
        self
    }

    /// Seals the node. The builder is reset whether or not this succeeds.
    pub fn build(&mut self) -> Result<FlowNode, FlowError> {
        let parts = std::mem::take(self);
        let kind = parts.kind.ok_or_else(|| FlowError::IncompleteNode {
            field: "kind".to_string(),
        })?;
        if !parts.children.is_empty() && !parts.branches.is_empty() {
            return Err(FlowError::ConflictingNodeShape { kind });
        }

        let label = parts.label.unwrap_or_else(|| kind.label().to_string());
        let id = node_id(kind, &label, parts.source_range.as_ref(), &parts.properties);
        Ok(FlowNode {
            id,
            kind,
            label,
            source_range: parts.source_range,
            source_code: parts.source_code,
            properties: parts.properties,
            children: parts.children,
            branches: parts.branches,
            diagnostics: parts.diagnostics,
            suggested: None,
            returning: parts.returning,
            flags: parts.flags,
        })
    }
}
