//! Marks which nodes of a freshly analyzed tree are new since the previous sync.
//!
//! Nodes are matched by their captured source text. A node with no textual match
//! is treated as inserted and marked `suggested`, unless it overlaps one of the
//! post-edit error ranges, in which case it is dropped so a half-written edit is
//! not shown as diagram content.

use crate::diagnostics::Diagnostic;
use crate::model::FlowNode;
use crate::position::LineRange;

#[derive(Debug, Clone)]
pub struct Reconciler {
    error_ranges: Vec<LineRange>,
    error_index: usize,
    in_error_streak: bool,
}

impl Reconciler {
    /// `error_ranges` must be sorted by start position.
    pub fn new(error_ranges: Vec<LineRange>) -> Self {
        Self {
            error_ranges,
            error_index: 0,
            in_error_streak: false,
        }
    }

    /// Uses the ranges of the error diagnostics, sorted.
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        let mut ranges: Vec<LineRange> = diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| d.range.clone())
            .collect();
        ranges.sort_by_key(|r| r.start());
        Self::new(ranges)
    }

    /// Returns `new` with `suggested` set on every kept node.
    pub fn reconcile(&mut self, old: &[FlowNode], new: Vec<FlowNode>) -> Vec<FlowNode> {
        let mut out = Vec::with_capacity(new.len());
        let mut old_index = 0;

        for mut node in new {
            let Some(previous) = old.get(old_index) else {
                out.extend(self.inserted(node));
                continue;
            };

            if same_source(previous, &node) {
                node.mark_suggested(false);
                self.in_error_streak = false;
                old_index += 1;
                out.push(node);
            } else if !previous.branches.is_empty() && !node.branches.is_empty() {
                node.suggested = Some(false);
                self.reconcile_branches(previous, &mut node);
                old_index += 1;
                out.push(node);
            } else {
                out.extend(self.inserted(node));
            }
        }
        out
    }

    fn reconcile_branches(&mut self, previous: &FlowNode, node: &mut FlowNode) {
        for branch in node.branches.iter_mut() {
            match previous.branch(&branch.label) {
                Some(old_branch) => {
                    branch.suggested = Some(false);
                    let children = std::mem::take(&mut branch.children);
                    branch.children = self.reconcile(&old_branch.children, children);
                }
                None => branch.mark_suggested(true),
            }
        }
    }

    /// A node with no counterpart: suggested, or dropped when it carries an error.
    fn inserted(&mut self, mut node: FlowNode) -> Option<FlowNode> {
        if self.in_error_streak {
            tracing::debug!("[RECONCILER] Dropping {} '{}' after an erroneous node", node.kind, node.label);
            return None;
        }

        if let Some(range) = &node.source_range {
            while self
                .error_ranges
                .get(self.error_index)
                .is_some_and(|error| error.file == range.file && error.ends_before(range))
            {
                self.error_index += 1;
            }
            if let Some(error) = self.error_ranges.get(self.error_index) {
                if error.intersects(range) {
                    tracing::debug!(
                        "[RECONCILER] Dropping {} '{}': overlaps error at {}",
                        node.kind,
                        node.label,
                        error
                    );
                    self.in_error_streak = true;
                    self.error_index += 1;
                    return None;
                }
            }
        }

        node.mark_suggested(true);
        Some(node)
    }
}

fn same_source(a: &FlowNode, b: &FlowNode) -> bool {
    !a.source_code.is_empty() && normalized(&a.source_code).eq(normalized(&b.source_code))
}

fn normalized(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
}
