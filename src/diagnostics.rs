//! Diagnostics and their correlation onto flow nodes.
//!
//! The correlator walks a sorted diagnostic stream alongside the depth-first node
//! order with a single cursor that never rewinds. The cursor is a plain value passed
//! into and returned out of every step, so a traversal can be resumed or replayed
//! from any point.

use crate::error::FlowError;
use crate::model::FlowNode;
use crate::position::LineRange;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

/// A diagnostic reported by the host compiler (or the reference parser).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub range: LineRange,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>, range: LineRange) -> Self {
        Self {
            severity,
            message: message.into(),
            code: None,
            range,
        }
    }

    pub fn error(message: impl Into<String>, range: LineRange) -> Self {
        Self::new(Severity::Error, message, range)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// The part of a diagnostic that is attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDiagnostic {
    pub severity: Severity,
    pub message: String,
}

impl From<&Diagnostic> for NodeDiagnostic {
    fn from(diagnostic: &Diagnostic) -> Self {
        Self {
            severity: diagnostic.severity,
            message: diagnostic.message.clone(),
        }
    }
}

/// Position in the diagnostic stream plus whether an enclosing node already took one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub index: usize,
    pub annotated: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelatorOptions {
    pub include_warnings: bool,
}

#[derive(Debug, Clone)]
pub struct DiagnosticCorrelator {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCorrelator {
    /// Keeps error diagnostics only. Fails when they are not sorted by start position.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Result<Self, FlowError> {
        Self::with_options(diagnostics, CorrelatorOptions::default())
    }

    pub fn with_options(
        diagnostics: Vec<Diagnostic>,
        options: CorrelatorOptions,
    ) -> Result<Self, FlowError> {
        let diagnostics: Vec<Diagnostic> = diagnostics
            .into_iter()
            .filter(|d| {
                d.severity == Severity::Error
                    || (options.include_warnings && d.severity == Severity::Warning)
            })
            .collect();

        if let Some((previous, current)) = diagnostics
            .iter()
            .tuple_windows()
            .find(|(a, b)| a.range.file == b.range.file && b.range.start() < a.range.start())
        {
            return Err(FlowError::MalformedDiagnosticOrder {
                previous: previous.range.start(),
                current: current.range.start(),
            });
        }

        Ok(Self { diagnostics })
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Decides what the node at `range` receives when it is entered.
    pub fn correlate(
        &self,
        cursor: Cursor,
        range: &LineRange,
        is_leaf: bool,
    ) -> (Cursor, Vec<NodeDiagnostic>) {
        let mut next = cursor;
        let mut attached = Vec::new();

        while let Some(diagnostic) = self.diagnostics.get(next.index) {
            let d = &diagnostic.range;
            if d.file != range.file {
                tracing::warn!(
                    "[CORRELATOR] Skipping diagnostic for '{}' while visiting '{}'",
                    d.file,
                    range.file
                );
                next.index += 1;
                continue;
            }
            if d.end() < range.start() {
                next.index += 1;
                continue;
            }

            if d.same_span(range) {
                attached.push(NodeDiagnostic::from(diagnostic));
                next.index += 1;
                if !is_leaf {
                    next.annotated = true;
                }
            } else if range.contains(d) {
                if !is_leaf {
                    // A descendant claims it, or `finish` attaches it here.
                    break;
                }
                if !next.annotated {
                    attached.push(NodeDiagnostic::from(diagnostic));
                }
                next.index += 1;
            } else if d.contains(range) {
                // Spans several statements: siblings may still match, so no advance.
                if !next.annotated {
                    attached.push(NodeDiagnostic::from(diagnostic));
                }
                if !is_leaf {
                    next.annotated = true;
                }
                break;
            } else {
                break;
            }
        }

        debug_assert!(next.index >= cursor.index, "diagnostic cursor rewound");
        (next, attached)
    }

    /// Runs after a node's descendants: attaches whatever inside the node is still unclaimed.
    pub fn finish(&self, cursor: Cursor, range: &LineRange) -> (Cursor, Vec<NodeDiagnostic>) {
        let mut next = cursor;
        let mut attached = Vec::new();
        while let Some(diagnostic) = self.diagnostics.get(next.index) {
            if !range.contains(&diagnostic.range) || diagnostic.range.same_span(range) {
                break;
            }
            if !next.annotated {
                attached.push(NodeDiagnostic::from(diagnostic));
            }
            next.index += 1;
        }
        (next, attached)
    }

    /// Annotates a finished tree in depth-first order.
    pub fn correlate_tree(&self, nodes: &mut [FlowNode]) {
        if self.diagnostics.is_empty() {
            return;
        }
        self.correlate_children(Cursor::default(), None, nodes, &mut Vec::new());
    }

    /// Visits sibling nodes. Diagnostics that lie in `parent` but end before the next
    /// sibling starts (a condition, a stray token between statements) go to `parent`.
    fn correlate_children(
        &self,
        mut cursor: Cursor,
        parent: Option<&LineRange>,
        nodes: &mut [FlowNode],
        claimed: &mut Vec<NodeDiagnostic>,
    ) -> Cursor {
        for node in nodes.iter_mut() {
            if let (Some(parent), Some(range)) = (parent, node.source_range.as_ref()) {
                while let Some(diagnostic) = self.diagnostics.get(cursor.index) {
                    if !(diagnostic.range.ends_before(range) && parent.contains(&diagnostic.range)) {
                        break;
                    }
                    if !cursor.annotated {
                        claimed.push(NodeDiagnostic::from(diagnostic));
                    }
                    cursor.index += 1;
                }
            }
            cursor = self.correlate_node(cursor, parent, node);
        }
        cursor
    }

    fn correlate_node(&self, cursor: Cursor, parent: Option<&LineRange>, node: &mut FlowNode) -> Cursor {
        let Some(range) = node.source_range.clone() else {
            // Not in the document yet: only its descendants can carry diagnostics.
            let mut claimed = Vec::new();
            let after = self.correlate_children(cursor, parent, &mut node.children, &mut claimed);
            let after = self.correlate_children(after, parent, &mut node.branches, &mut claimed);
            node.diagnostics.append(&mut claimed);
            return after;
        };

        let is_leaf = node.is_leaf();
        let (entered, mut attached) = self.correlate(cursor, &range, is_leaf);

        if is_leaf {
            node.diagnostics.append(&mut attached);
            return Cursor {
                annotated: cursor.annotated,
                ..entered
            };
        }

        let inner = self.correlate_children(entered, Some(&range), &mut node.children, &mut attached);
        let inner = self.correlate_children(inner, Some(&range), &mut node.branches, &mut attached);
        let (done, mut rest) = self.finish(inner, &range);
        attached.append(&mut rest);
        node.diagnostics.append(&mut attached);

        Cursor {
            index: done.index,
            annotated: cursor.annotated,
        }
    }
}
