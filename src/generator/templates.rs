//! One serialization template per node kind.

use super::tokens::TokenBuilder;
use crate::error::GenerationError;
use crate::model::{FlowNode, NodeFlags, NodeKind, keys, labels};

/// Renders `node` with its first line at column zero.
pub(super) fn render(node: &FlowNode, width: usize) -> Result<String, GenerationError> {
    let mut tb = TokenBuilder::new(width);
    let nested = |child: &FlowNode| render(child, width);

    match node.kind {
        NodeKind::Start => {
            let name = optional(node, keys::NAME).unwrap_or(&node.label);
            let params: Vec<String> = node
                .property(keys::PARAMETERS)
                .map(|p| {
                    p.properties
                        .iter()
                        .map(|(name, ty)| format!("{} {}", ty.value.trim(), name))
                        .collect()
                })
                .unwrap_or_default();
            tb.keyword("function")
                .name(name)
                .join("(")
                .token(&params.join(", "))
                .punct(")");
            if let Some(return_type) = optional(node, keys::RETURN_TYPE) {
                tb.keyword("returns").expression(return_type);
            }
        }
        NodeKind::Variable => {
            if node.has_flag(NodeFlags::FINAL) {
                tb.keyword("final");
            }
            tb.typed_binding(required(node, keys::TYPE)?, required(node, keys::NAME)?);
            if let Some(value) = optional(node, keys::VALUE) {
                tb.token("=").expression(value);
            }
            tb.end_of_statement();
        }
        NodeKind::Assign => {
            tb.name(required(node, keys::NAME)?)
                .token("=")
                .expression(required(node, keys::VALUE)?)
                .end_of_statement();
        }
        NodeKind::Expression => {
            let text = optional(node, keys::EXPRESSION)
                .or_else(|| optional(node, keys::STATEMENT))
                .ok_or_else(|| missing(node, keys::EXPRESSION))?
                .trim();
            tb.expression(text);
            if !text.ends_with(';') && !text.ends_with('}') {
                tb.end_of_statement();
            }
        }
        NodeKind::Return => match optional(node, keys::TYPE) {
            // An expression statement whose value is kept alive as a typed discard.
            Some(type_name) => {
                tb.typed_binding(type_name, "_")
                    .token("=")
                    .expression(required(node, keys::EXPRESSION)?)
                    .end_of_statement();
            }
            None => {
                tb.keyword("return");
                if let Some(value) = optional(node, keys::EXPRESSION) {
                    tb.expression(value);
                }
                tb.end_of_statement();
            }
        },
        NodeKind::Stop => {
            tb.keyword("return").end_of_statement();
        }
        NodeKind::Break => {
            tb.keyword("break").end_of_statement();
        }
        NodeKind::Continue => {
            tb.keyword("continue").end_of_statement();
        }
        NodeKind::Panic | NodeKind::Fail => {
            let keyword = if node.kind == NodeKind::Panic { "panic" } else { "fail" };
            tb.keyword(keyword)
                .expression(required(node, keys::EXPRESSION)?)
                .end_of_statement();
        }
        NodeKind::If => if_chain(node, &mut tb, &nested)?,
        NodeKind::While => {
            tb.keyword("while")
                .token(&parenthesized(required(node, keys::CONDITION)?))
                .body(&required_branch(node, labels::BODY)?.children, &nested)?;
            on_fail(node, &mut tb, &nested)?;
        }
        NodeKind::Foreach => {
            tb.keyword("foreach")
                .typed_binding(required(node, keys::TYPE)?, required(node, keys::NAME)?)
                .keyword("in")
                .expression(required(node, keys::COLLECTION)?)
                .body(&required_branch(node, labels::BODY)?.children, &nested)?;
            on_fail(node, &mut tb, &nested)?;
        }
        NodeKind::ErrorHandler => {
            tb.keyword("do")
                .body(&required_branch(node, labels::BODY)?.children, &nested)?;
            on_fail(node, &mut tb, &nested)?;
        }
        NodeKind::Lock => {
            tb.keyword("lock")
                .body(&required_branch(node, labels::BODY)?.children, &nested)?;
            on_fail(node, &mut tb, &nested)?;
        }
        NodeKind::Comment => {
            let comment = required(node, keys::COMMENT)?;
            let lines: Vec<String> = comment
                .lines()
                .map(|line| match line.trim() {
                    "" => "//".to_string(),
                    text => format!("// {}", text),
                })
                .collect();
            tb.token(&lines.join("\n"));
        }
        NodeKind::FunctionCall
        | NodeKind::RemoteActionCall
        | NodeKind::ResourceActionCall
        | NodeKind::HttpApiGetCall
        | NodeKind::HttpApiPostCall => call(node, &mut tb)?,
        NodeKind::Block => return Err(GenerationError::UnsupportedKind(node.kind)),
    }

    Ok(tb.finish())
}

fn if_chain(
    node: &FlowNode,
    tb: &mut TokenBuilder,
    nested: &dyn Fn(&FlowNode) -> Result<String, GenerationError>,
) -> Result<(), GenerationError> {
    tb.keyword("if")
        .token(&parenthesized(required(node, keys::CONDITION)?))
        .body(&required_branch(node, labels::THEN)?.children, nested)?;

    let Some(otherwise) = node.branch(labels::ELSE) else {
        return Ok(());
    };
    tb.keyword("else");
    match otherwise.children.as_slice() {
        [single] if single.kind == NodeKind::If => {
            tb.token(&nested(single)?);
        }
        children => {
            tb.body(children, nested)?;
        }
    }
    Ok(())
}

fn on_fail(
    node: &FlowNode,
    tb: &mut TokenBuilder,
    nested: &dyn Fn(&FlowNode) -> Result<String, GenerationError>,
) -> Result<(), GenerationError> {
    let Some(branch) = node.branch(labels::ON_FAIL) else {
        return Ok(());
    };
    tb.keyword("on").keyword("fail");
    let error_type = optional(branch, keys::ERROR_TYPE);
    let error_var = optional(branch, keys::ERROR_VARIABLE);
    match (error_type, error_var) {
        (Some(ty), Some(var)) => {
            tb.typed_binding(ty, var);
        }
        (None, None) => {}
        (Some(_), None) => return Err(missing(node, keys::ERROR_VARIABLE)),
        (None, Some(_)) => return Err(missing(node, keys::ERROR_TYPE)),
    }
    tb.body(&branch.children, nested)?;
    Ok(())
}

/// `[<type> ][<name> = ][check ]<callee>(<args>);`
fn call(node: &FlowNode, tb: &mut TokenBuilder) -> Result<(), GenerationError> {
    match (optional(node, keys::TYPE), optional(node, keys::NAME)) {
        (Some(ty), Some(name)) => {
            tb.typed_binding(ty, name).token("=");
        }
        (None, Some(name)) => {
            tb.name(name).token("=");
        }
        (Some(_), None) => return Err(missing(node, keys::NAME)),
        (None, None) => {}
    }

    if node.has_flag(NodeFlags::CHECKPANIC) {
        tb.keyword("checkpanic");
    } else if node.has_flag(NodeFlags::CHECKED) {
        tb.keyword("check");
    }

    match node.kind {
        NodeKind::FunctionCall => {
            let function = required(node, keys::FUNCTION)?;
            match optional(node, keys::MODULE) {
                Some(module) => tb.name(module).join(":").name(function),
                None => tb.name(function),
            };
        }
        NodeKind::ResourceActionCall => {
            tb.name(required(node, keys::CONNECTION)?)
                .join("->")
                .token(required(node, keys::RESOURCE_PATH)?.trim())
                .join(".")
                .name(required(node, keys::METHOD)?);
        }
        _ => {
            tb.name(required(node, keys::CONNECTION)?)
                .join("->")
                .name(required(node, keys::METHOD)?);
        }
    }

    tb.join("(");
    let mut first = true;
    let mut named = false;
    for (key, property) in node
        .properties
        .iter()
        .filter(|(key, _)| !keys::CALL_STRUCTURE.contains(key))
    {
        if property.is_blank() {
            if property.optional {
                // Later arguments can no longer be positional.
                named = true;
                continue;
            }
            return Err(missing(node, key));
        }
        if !first {
            tb.punct(",");
        }
        first = false;
        if named {
            tb.name(key).token("=");
        }
        tb.expression(&property.value);
    }
    tb.punct(")").end_of_statement();
    Ok(())
}

fn parenthesized(condition: &str) -> String {
    format!("({})", condition.trim())
}

/// A present, non-blank property value.
fn required<'n>(node: &'n FlowNode, key: &str) -> Result<&'n str, GenerationError> {
    optional(node, key).ok_or_else(|| missing(node, key))
}

fn optional<'n>(node: &'n FlowNode, key: &str) -> Option<&'n str> {
    node.property(key)
        .filter(|p| !p.is_blank())
        .map(|p| p.value.as_str())
}

fn required_branch<'n>(node: &'n FlowNode, label: &str) -> Result<&'n FlowNode, GenerationError> {
    node.branch(label).ok_or_else(|| missing(node, label))
}

fn missing(node: &FlowNode, property: &str) -> GenerationError {
    GenerationError::MissingProperty {
        kind: node.kind,
        property: property.to_string(),
    }
}
