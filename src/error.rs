use crate::model::NodeKind;
use crate::position::LinePosition;
use thiserror::Error;

/// Errors raised while building, analyzing or synchronizing flow models.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("Node builder was sealed without a '{field}'")]
    IncompleteNode { field: String },

    #[error("Node '{kind}' was given both children and branches")]
    ConflictingNodeShape { kind: NodeKind },

    #[error("No template exists for node kind '{0}'")]
    NoTemplate(NodeKind),

    #[error("Builder stack underflow: stepped out of a block that was never entered")]
    BuilderStackUnderflow,

    #[error("Builder stack unbalanced: {depth} block(s) entered but never left")]
    UnbalancedBuilderStack { depth: usize },

    #[error(
        "Diagnostics are not sorted: a diagnostic at {current} follows one at {previous}"
    )]
    MalformedDiagnosticOrder {
        previous: LinePosition,
        current: LinePosition,
    },

    #[error("Function '{0}' was not found in the document")]
    FunctionNotFound(String),

    #[error("Invalid text edit: {0}")]
    InvalidEdit(String),

    #[error("Failed to load index data: {0}")]
    Index(String),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Errors raised while turning a flow node back into source text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Node '{kind}' is missing the required property '{property}'")]
    MissingProperty { kind: NodeKind, property: String },

    #[error("Node kind '{0}' cannot be generated on its own")]
    UnsupportedKind(NodeKind),

    #[error("Node '{kind}' has no source range and no insert position was supplied")]
    MissingInsertPosition { kind: NodeKind },
}

/// An unrecoverable error from the reference statement parser.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Syntax error at {line}:{col}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, position: LinePosition) -> Self {
        Self {
            message: message.into(),
            line: position.line,
            col: position.offset,
        }
    }
}
