//! The flow node model: what the diagram shows for a function body.

mod builder;
mod display;
mod property;
pub mod template;

pub use builder::NodeBuilder;
pub use display::DisplayFlow;
pub use property::{Properties, Property, ValueKind};

use crate::diagnostics::NodeDiagnostic;
use crate::position::LineRange;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::BitOr;

/// Canonical property keys. Any other key on a call node is a call argument.
pub mod keys {
    pub const TYPE: &str = "type";
    pub const NAME: &str = "name";
    pub const VALUE: &str = "value";
    pub const EXPRESSION: &str = "expression";
    pub const CONDITION: &str = "condition";
    pub const STATEMENT: &str = "statement";
    pub const COLLECTION: &str = "collection";
    pub const COMMENT: &str = "comment";
    pub const FUNCTION: &str = "function";
    pub const MODULE: &str = "module";
    pub const CONNECTION: &str = "connection";
    pub const METHOD: &str = "method";
    pub const RESOURCE_PATH: &str = "resourcePath";
    pub const PARAMETERS: &str = "parameters";
    pub const RETURN_TYPE: &str = "returnType";
    pub const ERROR_TYPE: &str = "errorType";
    pub const ERROR_VARIABLE: &str = "errorVariable";

    /// Keys that describe a call rather than pass an argument to it.
    pub const CALL_STRUCTURE: &[&str] = &[
        TYPE,
        NAME,
        FUNCTION,
        MODULE,
        CONNECTION,
        METHOD,
        RESOURCE_PATH,
    ];
}

/// Branch labels.
pub mod labels {
    pub const THEN: &str = "then";
    pub const ELSE: &str = "else";
    pub const BODY: &str = "body";
    pub const ON_FAIL: &str = "on fail";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Start,
    If,
    Return,
    Stop,
    Block,
    FunctionCall,
    RemoteActionCall,
    ResourceActionCall,
    HttpApiGetCall,
    HttpApiPostCall,
    Variable,
    Assign,
    While,
    Foreach,
    Break,
    Continue,
    ErrorHandler,
    Lock,
    Panic,
    Fail,
    Expression,
    Comment,
}

impl NodeKind {
    /// Default display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::If => "If",
            Self::Return => "Return",
            Self::Stop => "Stop",
            Self::Block => "Block",
            Self::FunctionCall => "Call",
            Self::RemoteActionCall => "Remote Action",
            Self::ResourceActionCall => "Resource Action",
            Self::HttpApiGetCall => "GET",
            Self::HttpApiPostCall => "POST",
            Self::Variable => "Variable",
            Self::Assign => "Assign",
            Self::While => "While",
            Self::Foreach => "Foreach",
            Self::Break => "Break",
            Self::Continue => "Continue",
            Self::ErrorHandler => "Error Handler",
            Self::Lock => "Lock",
            Self::Panic => "Panic",
            Self::Fail => "Fail",
            Self::Expression => "Custom Expression",
            Self::Comment => "Comment",
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(
            self,
            Self::FunctionCall
                | Self::RemoteActionCall
                | Self::ResourceActionCall
                | Self::HttpApiGetCall
                | Self::HttpApiPostCall
        )
    }

    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RemoteActionCall | Self::HttpApiGetCall | Self::HttpApiPostCall
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "START",
            Self::If => "IF",
            Self::Return => "RETURN",
            Self::Stop => "STOP",
            Self::Block => "BLOCK",
            Self::FunctionCall => "FUNCTION_CALL",
            Self::RemoteActionCall => "REMOTE_ACTION_CALL",
            Self::ResourceActionCall => "RESOURCE_ACTION_CALL",
            Self::HttpApiGetCall => "HTTP_API_GET_CALL",
            Self::HttpApiPostCall => "HTTP_API_POST_CALL",
            Self::Variable => "VARIABLE",
            Self::Assign => "ASSIGN",
            Self::While => "WHILE",
            Self::Foreach => "FOREACH",
            Self::Break => "BREAK",
            Self::Continue => "CONTINUE",
            Self::ErrorHandler => "ERROR_HANDLER",
            Self::Lock => "LOCK",
            Self::Panic => "PANIC",
            Self::Fail => "FAIL",
            Self::Expression => "EXPRESSION",
            Self::Comment => "COMMENT",
        };
        f.write_str(name)
    }
}

/// Bit flags carried by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeFlags(u8);

impl NodeFlags {
    pub const NONE: NodeFlags = NodeFlags(0);
    pub const CHECKED: NodeFlags = NodeFlags(1);
    pub const CHECKPANIC: NodeFlags = NodeFlags(1 << 1);
    pub const FINAL: NodeFlags = NodeFlags(1 << 2);
    pub const REMOTE: NodeFlags = NodeFlags(1 << 3);
    pub const RESOURCE: NodeFlags = NodeFlags(1 << 4);

    pub fn contains(&self, other: NodeFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: NodeFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: NodeFlags) {
        self.0 &= !other.0;
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for NodeFlags {
    type Output = NodeFlags;

    fn bitor(self, rhs: NodeFlags) -> NodeFlags {
        NodeFlags(self.0 | rhs.0)
    }
}

/// One node of the diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    #[serde(default)]
    pub source_range: Option<LineRange>,
    /// The node's original source text; empty for nodes not yet in the document.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_code: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FlowNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<FlowNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<NodeDiagnostic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested: Option<bool>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub returning: bool,
    #[serde(default, skip_serializing_if = "NodeFlags::is_empty")]
    pub flags: NodeFlags,
}

impl FlowNode {
    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    pub fn property_value(&self, key: &str) -> Option<&str> {
        self.properties.value(key)
    }

    pub fn branch(&self, label: &str) -> Option<&FlowNode> {
        self.branches
            .iter()
            .find(|b| b.label.eq_ignore_ascii_case(label))
    }

    pub fn branch_mut(&mut self, label: &str) -> Option<&mut FlowNode> {
        self.branches
            .iter_mut()
            .find(|b| b.label.eq_ignore_ascii_case(label))
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty() && self.branches.is_empty()
    }

    pub fn has_flag(&self, flag: NodeFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Sets `suggested` on this node and every descendant.
    pub fn mark_suggested(&mut self, suggested: bool) {
        self.suggested = Some(suggested);
        for child in self.children.iter_mut().chain(self.branches.iter_mut()) {
            child.mark_suggested(suggested);
        }
    }

    /// Depth-first, pre-order visit of this node and its descendants.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a FlowNode)) {
        visit(self);
        for child in self.children.iter().chain(self.branches.iter()) {
            child.walk(visit);
        }
    }

    /// All nodes of a forest in pre-order.
    pub fn flatten(nodes: &[FlowNode]) -> Vec<&FlowNode> {
        let mut out = Vec::new();
        for node in nodes {
            node.walk(&mut |n| out.push(n));
        }
        out
    }
}

/// Stable id: derived from kind and range, or from kind, label and values for new nodes.
pub(crate) fn node_id(
    kind: NodeKind,
    label: &str,
    range: Option<&LineRange>,
    properties: &Properties,
) -> String {
    let mut hasher = DefaultHasher::new();
    kind.hash(&mut hasher);
    match range {
        Some(range) => range.hash(&mut hasher),
        None => {
            label.hash(&mut hasher);
            for (key, property) in properties.iter() {
                key.hash(&mut hasher);
                property.value.hash(&mut hasher);
            }
        }
    }
    format!("{:016x}", hasher.finish())
}
