use super::FlowNode;
use std::fmt;

/// Renders a flow model as an indented tree for terminals and debugging.
pub struct DisplayFlow<'a> {
    pub nodes: &'a [FlowNode],
}

impl<'a> fmt::Display for DisplayFlow<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            self.fmt_as_tree(node, f, "", i + 1 == self.nodes.len())?;
        }
        Ok(())
    }
}

impl<'a> DisplayFlow<'a> {
    fn fmt_as_tree(
        &self,
        node: &FlowNode,
        f: &mut fmt::Formatter<'_>,
        prefix: &str,
        is_last: bool,
    ) -> fmt::Result {
        let node_marker = if is_last { "└── " } else { "├── " };
        write!(f, "{}{}{} '{}'", prefix, node_marker, node.kind, node.label)?;

        let values: Vec<String> = node
            .properties
            .iter()
            .filter(|(_, p)| !p.is_blank())
            .map(|(k, p)| format!("{}={}", k, p.value))
            .collect();
        if !values.is_empty() {
            write!(f, " [{}]", values.join(", "))?;
        }
        if let Some(range) = &node.source_range {
            write!(f, " @{}:{}", range.start_line, range.start_col)?;
        }
        match node.suggested {
            Some(true) => write!(f, " (suggested)")?,
            Some(false) | None => {}
        }
        writeln!(f)?;

        for diagnostic in &node.diagnostics {
            writeln!(
                f,
                "{}{}  ! {:?}: {}",
                prefix,
                if is_last { "    " } else { "│   " },
                diagnostic.severity,
                diagnostic.message
            )?;
        }

        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        let nested: Vec<&FlowNode> = node.children.iter().chain(node.branches.iter()).collect();
        for (i, child) in nested.iter().enumerate() {
            self.fmt_as_tree(child, f, &child_prefix, i + 1 == nested.len())?;
        }
        Ok(())
    }
}
