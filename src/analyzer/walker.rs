use crate::error::FlowError;
use crate::model::template::parameter_property;
use crate::model::{FlowNode, NodeBuilder, NodeFlags, NodeKind, Properties, Property, keys, labels};
use crate::semantic::{ConnectorIndex, ModuleId, SemanticModel, Symbol, SymbolKind};
use crate::syntax::{Block, ElseBody, Expr, ExprKind, IfStmt, OnFail, Statement, StatementKind};
use crate::types::TypeCatalog;

/// What became of an expression that might be a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExprOutcome {
    /// A call node kind and its properties were set on the current builder.
    Recognized,
    /// Not a call this walker models; the statement's generic rule applies.
    Unrecognized,
    /// A remote or resource call on something that is not a client method.
    Skip,
}

/// Depth-first walker with an explicit builder stack.
///
/// `current` accumulates the node for the statement being visited. Entering a branch
/// block parks it on `stack` and starts a fresh builder for the block's statements;
/// leaving the block restores it and attaches the branch.
pub(super) struct FlowWalker<'a> {
    semantic: &'a dyn SemanticModel,
    catalog: &'a TypeCatalog,
    connectors: Option<&'a ConnectorIndex>,
    current_module: Option<&'a ModuleId>,
    current: NodeBuilder,
    stack: Vec<NodeBuilder>,
    pub(super) has_return: bool,
}

impl<'a> FlowWalker<'a> {
    pub(super) fn new(
        semantic: &'a dyn SemanticModel,
        catalog: &'a TypeCatalog,
        connectors: Option<&'a ConnectorIndex>,
        current_module: Option<&'a ModuleId>,
    ) -> Self {
        Self {
            semantic,
            catalog,
            connectors,
            current_module,
            current: NodeBuilder::new(),
            stack: Vec::new(),
            has_return: false,
        }
    }

    /// Fails if a branch was entered but never left.
    pub(super) fn finish(&self) -> Result<(), FlowError> {
        if self.stack.is_empty() {
            Ok(())
        } else {
            Err(FlowError::UnbalancedBuilderStack {
                depth: self.stack.len(),
            })
        }
    }

    pub(super) fn block(&mut self, block: &Block) -> Result<Vec<FlowNode>, FlowError> {
        let mut nodes = Vec::with_capacity(block.statements.len());
        for statement in &block.statements {
            if let Some(node) = self.statement(statement)? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    fn step_in(&mut self) {
        let parent = std::mem::take(&mut self.current);
        self.stack.push(parent);
    }

    fn step_out(&mut self, branch: FlowNode) -> Result<(), FlowError> {
        self.current = self.stack.pop().ok_or(FlowError::BuilderStackUnderflow)?;
        self.current.branch(branch);
        Ok(())
    }

    /// Walks `block` as the branch `label` of the node being built.
    fn branch(&mut self, label: &str, block: &Block, properties: Properties) -> Result<(), FlowError> {
        self.step_in();
        let children = self.block(block)?;
        let branch = NodeBuilder::new()
            .kind(NodeKind::Block)
            .label(label)
            .source_range(block.range.clone())
            .source_code(&block.source)
            .properties(properties)
            .children(children)
            .build()?;
        self.step_out(branch)
    }

    fn on_fail_branch(&mut self, on_fail: Option<&OnFail>) -> Result<(), FlowError> {
        let Some(on_fail) = on_fail else {
            return Ok(());
        };
        let mut properties = Properties::new();
        if let Some(error_type) = &on_fail.error_type {
            properties.insert(keys::ERROR_TYPE, Property::type_name(error_type));
        }
        if let Some(error_var) = &on_fail.error_var {
            properties.insert(keys::ERROR_VARIABLE, Property::identifier(error_var));
        }
        self.branch(labels::ON_FAIL, &on_fail.body, properties)
    }

    fn statement(&mut self, statement: &Statement) -> Result<Option<FlowNode>, FlowError> {
        self.current
            .source_range(statement.range.clone())
            .source_code(&statement.source);

        match &statement.kind {
            StatementKind::VarDecl {
                is_final,
                type_name,
                name,
                init,
            } => {
                self.current
                    .property(keys::TYPE, Property::type_name(type_name))
                    .property(keys::NAME, Property::identifier(name));
                let outcome = match init {
                    Some(init) => self.call(init)?,
                    None => ExprOutcome::Unrecognized,
                };
                if outcome != ExprOutcome::Recognized {
                    self.current.kind(NodeKind::Variable).property(
                        keys::VALUE,
                        Property::expression(init.as_ref().map_or("", |e| e.source.as_str())),
                    );
                }
                if *is_final {
                    self.current.flag(NodeFlags::FINAL);
                }
            }
            StatementKind::Assign { target, value } => {
                self.current.property(keys::NAME, Property::identifier(target));
                if self.call(value)? != ExprOutcome::Recognized {
                    self.current
                        .kind(NodeKind::Assign)
                        .property(keys::VALUE, Property::expression(&value.source));
                }
            }
            StatementKind::Return(value) => {
                self.has_return = true;
                match value {
                    Some(value) => {
                        self.current
                            .kind(NodeKind::Return)
                            .property(keys::EXPRESSION, Property::expression(&value.source));
                    }
                    None => {
                        self.current.kind(NodeKind::Stop);
                    }
                }
                self.current.returning();
            }
            StatementKind::If(stmt) => self.if_node(stmt)?,
            StatementKind::While {
                condition,
                body,
                on_fail,
            } => {
                self.current.kind(NodeKind::While).property(
                    keys::CONDITION,
                    Property::expression(condition.unparenthesized()),
                );
                self.branch(labels::BODY, body, Properties::new())?;
                self.on_fail_branch(on_fail.as_ref())?;
            }
            StatementKind::Foreach {
                type_name,
                name,
                collection,
                body,
                on_fail,
            } => {
                self.current
                    .kind(NodeKind::Foreach)
                    .property(keys::TYPE, Property::type_name(type_name))
                    .property(keys::NAME, Property::identifier(name))
                    .property(keys::COLLECTION, Property::expression(&collection.source));
                self.branch(labels::BODY, body, Properties::new())?;
                self.on_fail_branch(on_fail.as_ref())?;
            }
            StatementKind::Do { body, on_fail } => {
                self.current.kind(NodeKind::ErrorHandler);
                self.branch(labels::BODY, body, Properties::new())?;
                self.on_fail_branch(on_fail.as_ref())?;
            }
            StatementKind::Lock { body, on_fail } => {
                self.current.kind(NodeKind::Lock);
                self.branch(labels::BODY, body, Properties::new())?;
                self.on_fail_branch(on_fail.as_ref())?;
            }
            StatementKind::Break => {
                self.current.kind(NodeKind::Break);
            }
            StatementKind::Continue => {
                self.current.kind(NodeKind::Continue);
            }
            StatementKind::Panic(value) => {
                self.current
                    .kind(NodeKind::Panic)
                    .property(keys::EXPRESSION, Property::expression(&value.source));
            }
            StatementKind::Fail(value) => {
                self.current
                    .kind(NodeKind::Fail)
                    .property(keys::EXPRESSION, Property::expression(&value.source));
            }
            StatementKind::Expression(expr) => match self.call(expr)? {
                ExprOutcome::Recognized => {}
                ExprOutcome::Unrecognized => {
                    self.current
                        .kind(NodeKind::Expression)
                        .property(keys::STATEMENT, Property::expression(&expr.source));
                }
                ExprOutcome::Skip => {
                    tracing::debug!(
                        "[ANALYZER] Dropping statement at {}: '{}' is not a client action",
                        statement.range,
                        expr.source
                    );
                    self.current = NodeBuilder::new();
                    return Ok(None);
                }
            },
            StatementKind::Comment(lines) => {
                self.current
                    .kind(NodeKind::Comment)
                    .property(keys::COMMENT, Property::string(lines.join("\n")));
            }
            StatementKind::Invalid => {
                self.current
                    .kind(NodeKind::Expression)
                    .property(keys::STATEMENT, Property::expression(&statement.source));
            }
        }

        self.current.build().map(Some)
    }

    /// `else if` chains nest: the else branch holds exactly one IF node.
    fn if_node(&mut self, stmt: &IfStmt) -> Result<(), FlowError> {
        self.current.kind(NodeKind::If).property(
            keys::CONDITION,
            Property::expression(stmt.condition.unparenthesized()),
        );
        self.branch(labels::THEN, &stmt.then_block, Properties::new())?;

        match &stmt.else_body {
            Some(ElseBody::Block(block)) => {
                self.branch(labels::ELSE, block, Properties::new())?;
            }
            Some(ElseBody::If(nested)) => {
                self.step_in();
                let child = self.statement(nested)?;
                let branch = NodeBuilder::new()
                    .kind(NodeKind::Block)
                    .label(labels::ELSE)
                    .source_range(nested.range.clone())
                    .source_code(&nested.source)
                    .children(child.into_iter().collect())
                    .build()?;
                self.step_out(branch)?;
            }
            None => {}
        }
        Ok(())
    }

    /// Turns a (possibly checked) call into a call node on the current builder.
    fn call(&mut self, expr: &Expr) -> Result<ExprOutcome, FlowError> {
        let call = expr.unchecked();
        let check = match &expr.kind {
            ExprKind::Check { panic: true, .. } => NodeFlags::CHECKPANIC,
            ExprKind::Check { panic: false, .. } => NodeFlags::CHECKED,
            _ => NodeFlags::NONE,
        };

        let (symbol, args) = match &call.kind {
            ExprKind::FunctionCall { module, name, args } => {
                let Some(symbol) = self
                    .semantic
                    .resolve(call)
                    .filter(|s| s.kind == SymbolKind::Function)
                else {
                    tracing::debug!("[ANALYZER] Unresolved function '{}'", name);
                    return Ok(ExprOutcome::Unrecognized);
                };
                self.current
                    .kind(NodeKind::FunctionCall)
                    .label(name)
                    .property(keys::FUNCTION, Property::identifier(name).read_only());
                if let Some(prefix) = module {
                    let mut property = Property::identifier(prefix).read_only();
                    if let Some(module) = &symbol.module {
                        property = property.with_import(module.to_string());
                    }
                    self.current.property(keys::MODULE, property);
                }
                (symbol, args)
            }
            ExprKind::RemoteCall {
                target,
                method,
                args,
            } => {
                let Some(symbol) = self.client_method(call) else {
                    return Ok(ExprOutcome::Skip);
                };
                let kind = symbol
                    .module
                    .as_ref()
                    .zip(self.connectors)
                    .and_then(|(module, index)| index.specialized_kind(module, method))
                    .unwrap_or(NodeKind::RemoteActionCall);
                self.current
                    .kind(kind)
                    .label(method)
                    .property(keys::CONNECTION, Property::identifier(target))
                    .property(keys::METHOD, Property::identifier(method).read_only())
                    .flag(NodeFlags::REMOTE);
                (symbol, args)
            }
            ExprKind::ResourceCall {
                target,
                path,
                method,
                args,
            } => {
                let Some(symbol) = self.client_method(call) else {
                    return Ok(ExprOutcome::Skip);
                };
                self.current
                    .kind(NodeKind::ResourceActionCall)
                    .label(method)
                    .property(keys::CONNECTION, Property::identifier(target))
                    .property(keys::RESOURCE_PATH, Property::string(path))
                    .property(keys::METHOD, Property::identifier(method).read_only())
                    .flag(NodeFlags::RESOURCE);
                (symbol, args)
            }
            ExprKind::Check { .. } | ExprKind::Other => return Ok(ExprOutcome::Unrecognized),
        };

        self.arguments(&symbol, args);
        if !check.is_empty() {
            self.current.flag(check);
        }
        Ok(ExprOutcome::Recognized)
    }

    fn client_method(&self, call: &Expr) -> Option<Symbol> {
        match self.semantic.resolve(call) {
            Some(symbol) if symbol.kind.is_method() => Some(symbol),
            other => {
                tracing::debug!(
                    "[ANALYZER] '{}' resolves to {:?}, not a client method",
                    call.source,
                    other.map(|s| s.kind)
                );
                None
            }
        }
    }

    /// One property per parameter, in declaration order. Positional arguments fill
    /// parameters left to right and `name = value` arguments the parameter of that
    /// name. Omitted defaultable parameters become empty optional properties.
    fn arguments(&mut self, symbol: &Symbol, args: &[Expr]) {
        let params = symbol.params();
        let mut positional = Vec::new();
        let mut named = Vec::new();
        for (i, arg) in args.iter().enumerate() {
            match arg.named_argument() {
                Some((name, value)) => named.push((i, name, value)),
                None => positional.push(arg.source.trim()),
            }
        }

        for (i, param) in params.iter().enumerate() {
            let value = positional.get(i).copied().or_else(|| {
                named
                    .iter()
                    .find(|(_, name, _)| *name == param.name)
                    .map(|(_, _, value)| *value)
            });
            if keys::CALL_STRUCTURE.contains(&param.name.as_str()) {
                if let Some(value) = value {
                    self.current.property(&format!("arg{}", i), Property::expression(value));
                }
                continue;
            }
            let property = match value {
                Some(value) => parameter_property(param, value, self.catalog, self.current_module),
                None if param.defaultable => {
                    parameter_property(param, "", self.catalog, self.current_module)
                }
                None => continue,
            };
            self.current.property(&param.name, property);
        }

        for (i, value) in positional.iter().enumerate().skip(params.len()) {
            self.current.property(&format!("arg{}", i), Property::expression(*value));
        }
        for (i, name, value) in named {
            if params.iter().any(|p| p.name == name) {
                continue;
            }
            tracing::debug!("[ANALYZER] '{}' is not a parameter of '{}'", name, symbol.name);
            if keys::CALL_STRUCTURE.contains(&name) {
                self.current.property(
                    &format!("arg{}", i),
                    Property::expression(format!("{} = {}", name, value)),
                );
            } else {
                self.current.property(name, Property::expression(value));
            }
        }
    }
}
