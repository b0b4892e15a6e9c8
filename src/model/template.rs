//! Fresh, not-yet-materialized nodes for the editor's "add node" actions.

use super::{FlowNode, NodeBuilder, NodeFlags, NodeKind, Properties, Property, keys, labels};
use crate::error::FlowError;
use crate::semantic::{ConnectorIndex, ModuleId, Symbol, SymbolKind};
use crate::types::{FunctionParam, TypeCatalog, TypeDescriptor, TypeFormatter};

/// What a template may consult: the symbols in scope where the node will be inserted.
pub struct TemplateContext<'a> {
    pub visible: Vec<Symbol>,
    pub catalog: &'a TypeCatalog,
    pub current_module: Option<&'a ModuleId>,
}

impl<'a> TemplateContext<'a> {
    pub fn new(catalog: &'a TypeCatalog) -> Self {
        Self {
            visible: Vec::new(),
            catalog,
            current_module: None,
        }
    }

    pub fn with_visible(mut self, visible: Vec<Symbol>) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_current_module(mut self, module: &'a ModuleId) -> Self {
        self.current_module = Some(module);
        self
    }

    /// `base1`, `base2`, ... skipping names already in scope.
    pub fn unique_name(&self, base: &str) -> String {
        (1..)
            .map(|n| format!("{}{}", base, n))
            .find(|candidate| !self.visible.iter().any(|s| &s.name == candidate))
            .unwrap_or_else(|| base.to_string())
    }

    fn formatter(&self) -> TypeFormatter<'_> {
        TypeFormatter::new(self.catalog, self.current_module)
    }
}

/// A range-less node of `kind` with default properties and empty branches.
pub fn node_template(kind: NodeKind, ctx: &TemplateContext) -> Result<FlowNode, FlowError> {
    let mut builder = NodeBuilder::new();
    builder.kind(kind);

    match kind {
        NodeKind::If => {
            builder
                .property(keys::CONDITION, Property::expression("").with_placeholder("true"))
                .branch(empty_branch(labels::THEN)?);
        }
        NodeKind::While => {
            builder
                .property(keys::CONDITION, Property::expression("").with_placeholder("true"))
                .branch(empty_branch(labels::BODY)?);
        }
        NodeKind::Foreach => {
            builder
                .property(keys::TYPE, Property::type_name("var"))
                .property(keys::NAME, Property::identifier(ctx.unique_name("item")))
                .property(keys::COLLECTION, Property::expression(""))
                .branch(empty_branch(labels::BODY)?);
        }
        NodeKind::ErrorHandler => {
            let on_fail = Properties::new()
                .with(keys::ERROR_TYPE, Property::type_name("error"))
                .with(keys::ERROR_VARIABLE, Property::identifier(ctx.unique_name("err")));
            builder
                .branch(empty_branch(labels::BODY)?)
                .branch(branch_with(labels::ON_FAIL, on_fail)?);
        }
        NodeKind::Lock => {
            builder.branch(empty_branch(labels::BODY)?);
        }
        NodeKind::Variable => {
            let ty = TypeDescriptor::Int;
            builder
                .property(keys::TYPE, Property::type_name(ctx.formatter().format(&ty)))
                .property(keys::NAME, Property::identifier(ctx.unique_name("var")))
                .property(keys::VALUE, Property::expression(ctx.catalog.default_value(&ty)));
        }
        NodeKind::Assign => {
            builder
                .property(keys::NAME, Property::identifier(""))
                .property(keys::VALUE, Property::expression(""));
        }
        NodeKind::Return => {
            builder
                .property(keys::EXPRESSION, Property::expression("").optional())
                .returning();
        }
        NodeKind::Stop => {
            builder.returning();
        }
        NodeKind::Panic | NodeKind::Fail => {
            builder.property(
                keys::EXPRESSION,
                Property::expression("").with_placeholder("error(\"\")"),
            );
        }
        NodeKind::Expression => {
            builder.property(keys::EXPRESSION, Property::expression(""));
        }
        NodeKind::Comment => {
            builder.property(keys::COMMENT, Property::string(""));
        }
        NodeKind::Break | NodeKind::Continue => {}
        NodeKind::Start
        | NodeKind::Block
        | NodeKind::FunctionCall
        | NodeKind::RemoteActionCall
        | NodeKind::ResourceActionCall
        | NodeKind::HttpApiGetCall
        | NodeKind::HttpApiPostCall => return Err(FlowError::NoTemplate(kind)),
    }

    builder.build()
}

/// A range-less call node for a function or connector action.
///
/// `connection` names the client variable and is required for method symbols.
pub fn call_template(
    symbol: &Symbol,
    connection: Option<&str>,
    index: Option<&ConnectorIndex>,
    ctx: &TemplateContext,
) -> Result<FlowNode, FlowError> {
    let mut builder = NodeBuilder::new();

    match symbol.kind {
        SymbolKind::Function => {
            builder
                .kind(NodeKind::FunctionCall)
                .property(keys::FUNCTION, Property::identifier(&symbol.name).read_only());
            if let Some(module) = symbol.module.as_ref().filter(|m| Some(*m) != ctx.current_module)
            {
                builder.property(
                    keys::MODULE,
                    Property::identifier(module.prefix())
                        .read_only()
                        .with_import(module.to_string()),
                );
            }
        }
        SymbolKind::Method | SymbolKind::RemoteMethod | SymbolKind::ResourceMethod => {
            let connection = connection.ok_or_else(|| FlowError::IncompleteNode {
                field: keys::CONNECTION.to_string(),
            })?;
            let kind = match (symbol.kind, symbol.module.as_ref(), index) {
                (SymbolKind::ResourceMethod, _, _) => NodeKind::ResourceActionCall,
                (_, Some(module), Some(index)) => index
                    .specialized_kind(module, &symbol.name)
                    .unwrap_or(NodeKind::RemoteActionCall),
                _ => NodeKind::RemoteActionCall,
            };
            builder
                .kind(kind)
                .property(keys::CONNECTION, Property::identifier(connection))
                .property(keys::METHOD, Property::identifier(&symbol.name).read_only());
            if kind == NodeKind::ResourceActionCall {
                builder
                    .property(keys::RESOURCE_PATH, Property::string("/"))
                    .flag(NodeFlags::RESOURCE);
            } else {
                builder.flag(NodeFlags::REMOTE);
            }
        }
        _ => return Err(FlowError::NoTemplate(NodeKind::FunctionCall)),
    }
    builder.label(&symbol.name);

    for param in symbol.params() {
        builder.property(&param.name, parameter_property(param, "", ctx.catalog, ctx.current_module));
    }

    if let Some(returns) = symbol.return_type().filter(|t| **t != TypeDescriptor::Nil) {
        let formatter = ctx.formatter();
        builder
            .property(keys::TYPE, Property::type_name(formatter.format_ignoring_error(returns)))
            .property(keys::NAME, Property::identifier(ctx.unique_name("var")));
        if can_fail(returns) {
            builder.flag(NodeFlags::CHECKED);
        }
    }

    builder.build()
}

/// The property for one call argument, typed after its parameter.
pub(crate) fn parameter_property(
    param: &FunctionParam,
    value: &str,
    catalog: &TypeCatalog,
    current_module: Option<&ModuleId>,
) -> Property {
    let formatter = TypeFormatter::new(catalog, current_module);
    let mut property = Property::expression(value)
        .with_type_constraint(formatter.format(&param.ty))
        .with_placeholder(catalog.default_value(&param.ty));
    if param.defaultable {
        property = property.optional();
    }
    property
}

fn can_fail(ty: &TypeDescriptor) -> bool {
    match ty {
        TypeDescriptor::Error { .. } => true,
        TypeDescriptor::Union { members } => members.iter().any(TypeDescriptor::is_error),
        _ => false,
    }
}

fn empty_branch(label: &str) -> Result<FlowNode, FlowError> {
    branch_with(label, Properties::new())
}

fn branch_with(label: &str, properties: Properties) -> Result<FlowNode, FlowError> {
    NodeBuilder::new()
        .kind(NodeKind::Block)
        .label(label)
        .properties(properties)
        .build()
}
