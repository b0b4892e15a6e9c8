//! Symbol resolution consumed by the analyzer.
//!
//! [`SemanticModel`] is the seam to a host compiler. [`SymbolTable`] is an in-memory
//! implementation that is filled from JSON, from a [`ConnectorIndex`] and from the
//! declarations of a parsed module.

mod index;

pub use index::{Connector, ConnectorIndex, ConnectorMethod};

use crate::error::FlowError;
use crate::position::{LinePosition, LineRange};
use crate::syntax::{Block, ElseBody, Expr, ExprKind, Module, OnFail, StatementKind};
use crate::types::{FunctionParam, TypeCatalog, TypeDescriptor};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
    Method,
    RemoteMethod,
    ResourceMethod,
    Class,
    Type,
    Constant,
}

impl SymbolKind {
    pub fn is_method(&self) -> bool {
        matches!(self, Self::Method | Self::RemoteMethod | Self::ResourceMethod)
    }
}

/// An `org/name` module reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId {
    pub org: String,
    pub name: String,
}

impl ModuleId {
    pub fn new(org: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            name: name.into(),
        }
    }

    /// Parses `org/name`.
    pub fn parse(text: &str) -> Option<Self> {
        let (org, name) = text.split_once('/')?;
        (!org.is_empty() && !name.is_empty()).then(|| Self::new(org, name))
    }

    /// The name the module is referred to by in source: the last dotted segment.
    pub fn prefix(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Language library modules are always available without an import.
    pub fn is_langlib(&self) -> bool {
        self.org == "ballerina" && self.name.starts_with("lang.")
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub kind: SymbolKind,
    #[serde(default)]
    pub module: Option<ModuleId>,
    pub name: String,
    #[serde(default)]
    pub type_signature: Option<TypeDescriptor>,
}

impl Symbol {
    /// Declared parameters, for function and method symbols.
    pub fn params(&self) -> &[FunctionParam] {
        self.type_signature
            .as_ref()
            .and_then(TypeDescriptor::signature)
            .map(|(params, _)| params)
            .unwrap_or_default()
    }

    pub fn return_type(&self) -> Option<&TypeDescriptor> {
        self.type_signature
            .as_ref()
            .and_then(TypeDescriptor::signature)
            .map(|(_, returns)| returns)
    }
}

/// Resolution capability the analyzer needs from a host compiler.
pub trait SemanticModel {
    /// The symbol an expression refers to (for calls: the invoked function or method).
    fn resolve(&self, expr: &Expr) -> Option<Symbol>;
    /// Symbols in scope at a position.
    fn visible_symbols(&self, position: LinePosition) -> Vec<Symbol>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEntry {
    #[serde(default)]
    pub module: Option<ModuleId>,
    pub name: String,
    pub params: Vec<FunctionParam>,
    pub returns: TypeDescriptor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(default)]
    pub declared_at: LinePosition,
    /// The block or function the declaration is visible in; `None` for module-level
    /// and host-supplied variables.
    #[serde(default)]
    pub scope: Option<LineRange>,
}

impl VariableEntry {
    /// Declared before `position` and in a scope that encloses it.
    pub fn is_visible_at(&self, position: LinePosition) -> bool {
        self.declared_at <= position
            && self
                .scope
                .as_ref()
                .is_none_or(|scope| scope.contains_position(position))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassEntry {
    #[serde(default)]
    pub module: Option<ModuleId>,
    pub name: String,
    pub methods: Vec<MethodEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub params: Vec<FunctionParam>,
    pub returns: TypeDescriptor,
}

/// An immutable-after-construction symbol table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolTable {
    #[serde(default)]
    functions: Vec<FunctionEntry>,
    #[serde(default)]
    variables: Vec<VariableEntry>,
    #[serde(default)]
    classes: Vec<ClassEntry>,
    /// Import prefix -> module, filled from the analyzed document.
    #[serde(skip)]
    prefixes: AHashMap<String, ModuleId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        serde_json::from_str(json).map_err(|e| FlowError::Index(e.to_string()))
    }

    pub fn with_function(
        mut self,
        module: Option<ModuleId>,
        name: &str,
        params: Vec<FunctionParam>,
        returns: TypeDescriptor,
    ) -> Self {
        self.functions.push(FunctionEntry {
            module,
            name: name.to_string(),
            params,
            returns,
        });
        self
    }

    pub fn with_variable(mut self, name: &str, ty: TypeDescriptor, declared_at: LinePosition) -> Self {
        self.variables.push(VariableEntry {
            name: name.to_string(),
            ty,
            declared_at,
            scope: None,
        });
        self
    }

    pub fn with_class(mut self, class: ClassEntry) -> Self {
        self.classes.push(class);
        self
    }

    /// Registers every connector of the index as a class with its methods.
    pub fn with_connectors(mut self, index: &ConnectorIndex) -> Self {
        for connector in index.connectors() {
            self.classes.push(ClassEntry {
                module: Some(connector.module.clone()),
                name: connector.name.clone(),
                methods: connector
                    .methods
                    .iter()
                    .map(|m| MethodEntry {
                        name: m.name.clone(),
                        kind: m.kind,
                        params: m.params.clone(),
                        returns: m.returns.clone(),
                    })
                    .collect(),
            });
        }
        self
    }

    /// Adds the document's imports, parameters and local variable declarations.
    pub fn with_module(mut self, module: &Module, catalog: &TypeCatalog) -> Self {
        for import in &module.imports {
            self.prefixes.insert(
                import.prefix().to_string(),
                ModuleId::new(import.org.clone(), import.module.clone()),
            );
        }

        let prefixes = self.prefixes.clone();
        let resolve = move |prefix: &str| prefixes.get(prefix).cloned();

        for function in &module.functions {
            for param in &function.params {
                let ty = catalog.parse_type(&param.type_name, &resolve);
                self.variables.push(VariableEntry {
                    name: param.name.clone(),
                    ty,
                    declared_at: param.range.start(),
                    scope: Some(function.range.clone()),
                });
            }
            collect_locals(&function.body, catalog, &resolve, &mut self.variables);

            if !self.functions.iter().any(|f| f.module.is_none() && f.name == function.name) {
                let params = function
                    .params
                    .iter()
                    .map(|p| {
                        FunctionParam::new(p.name.clone(), catalog.parse_type(&p.type_name, &resolve))
                    })
                    .collect();
                let returns = function
                    .return_type
                    .as_deref()
                    .map_or(TypeDescriptor::Nil, |t| catalog.parse_type(t, &resolve));
                self.functions.push(FunctionEntry {
                    module: None,
                    name: function.name.clone(),
                    params,
                    returns,
                });
            }
        }
        self
    }

    fn function(&self, prefix: Option<&str>, name: &str) -> Option<&FunctionEntry> {
        self.functions.iter().find(|f| {
            f.name == name
                && match (prefix, f.module.as_ref()) {
                    (None, None) => true,
                    (Some(prefix), Some(module)) => module.prefix() == prefix,
                    _ => false,
                }
        })
    }

    /// The innermost declaration of `name` visible at `position`.
    ///
    /// Scopes nest, so among the visible declarations the innermost one is also the
    /// one declared last.
    fn variable(&self, name: &str, position: LinePosition) -> Option<&VariableEntry> {
        self.variables
            .iter()
            .filter(|v| v.name == name && v.is_visible_at(position))
            .max_by_key(|v| v.declared_at)
    }

    fn method(
        &self,
        target: &str,
        method: &str,
        resource: bool,
        position: LinePosition,
    ) -> Option<Symbol> {
        let variable = self.variable(target, position)?;
        let (module, class_name) = match &variable.ty {
            TypeDescriptor::Named { module, name } => (module.as_ref(), name.as_str()),
            _ => return None,
        };
        let class = self
            .classes
            .iter()
            .find(|c| c.name == class_name && c.module.as_ref() == module)?;
        let entry = class.methods.iter().find(|m| {
            m.name == method && (m.kind == SymbolKind::ResourceMethod) == resource
        })?;

        Some(Symbol {
            kind: entry.kind,
            module: class.module.clone(),
            name: entry.name.clone(),
            type_signature: Some(TypeDescriptor::Function {
                params: entry.params.clone(),
                returns: Box::new(entry.returns.clone()),
            }),
        })
    }
}

impl SemanticModel for SymbolTable {
    fn resolve(&self, expr: &Expr) -> Option<Symbol> {
        match &expr.kind {
            ExprKind::Check { inner, .. } => self.resolve(inner),
            ExprKind::FunctionCall { module, name, .. } => {
                let entry = self.function(module.as_deref(), name)?;
                Some(Symbol {
                    kind: SymbolKind::Function,
                    module: entry
                        .module
                        .clone()
                        .or_else(|| module.as_ref().and_then(|p| self.prefixes.get(p).cloned())),
                    name: entry.name.clone(),
                    type_signature: Some(TypeDescriptor::Function {
                        params: entry.params.clone(),
                        returns: Box::new(entry.returns.clone()),
                    }),
                })
            }
            ExprKind::RemoteCall { target, method, .. } => {
                self.method(target, method, false, expr.range.start())
            }
            ExprKind::ResourceCall { target, method, .. } => {
                self.method(target, method, true, expr.range.start())
            }
            ExprKind::Other => {
                let variable = self.variable(expr.source.trim(), expr.range.start())?;
                Some(Symbol {
                    kind: SymbolKind::Variable,
                    module: None,
                    name: variable.name.clone(),
                    type_signature: Some(variable.ty.clone()),
                })
            }
        }
    }

    fn visible_symbols(&self, position: LinePosition) -> Vec<Symbol> {
        let variables = self
            .variables
            .iter()
            .filter(|v| v.is_visible_at(position))
            .map(|v| Symbol {
                kind: SymbolKind::Variable,
                module: None,
                name: v.name.clone(),
                type_signature: Some(v.ty.clone()),
            });
        let functions = self.functions.iter().map(|f| Symbol {
            kind: SymbolKind::Function,
            module: f.module.clone(),
            name: f.name.clone(),
            type_signature: Some(TypeDescriptor::Function {
                params: f.params.clone(),
                returns: Box::new(f.returns.clone()),
            }),
        });
        variables.chain(functions).collect()
    }
}

/// Records the declarations of `block`, each scoped to the block that holds it.
fn collect_locals(
    block: &Block,
    catalog: &TypeCatalog,
    resolve: &dyn Fn(&str) -> Option<ModuleId>,
    out: &mut Vec<VariableEntry>,
) {
    let declare = |out: &mut Vec<VariableEntry>, name: &str, ty: TypeDescriptor, at: LinePosition, scope: &Block| {
        out.push(VariableEntry {
            name: name.to_string(),
            ty,
            declared_at: at,
            scope: Some(scope.range.clone()),
        })
    };
    let on_fail = |out: &mut Vec<VariableEntry>, handler: Option<&OnFail>| {
        let Some(handler) = handler else {
            return;
        };
        if let Some(name) = &handler.error_var {
            let ty = handler
                .error_type
                .as_deref()
                .map_or_else(TypeDescriptor::error, |t| catalog.parse_type(t, resolve));
            declare(out, name, ty, handler.body.range.start(), &handler.body);
        }
        collect_locals(&handler.body, catalog, resolve, out);
    };

    for statement in &block.statements {
        match &statement.kind {
            StatementKind::VarDecl {
                type_name, name, ..
            } => declare(
                out,
                name,
                catalog.parse_type(type_name, resolve),
                statement.range.start(),
                block,
            ),
            StatementKind::Foreach {
                type_name,
                name,
                body,
                on_fail: handler,
                ..
            } => {
                declare(
                    out,
                    name,
                    catalog.parse_type(type_name, resolve),
                    body.range.start(),
                    body,
                );
                collect_locals(body, catalog, resolve, out);
                on_fail(out, handler.as_ref());
            }
            StatementKind::If(stmt) => {
                collect_locals(&stmt.then_block, catalog, resolve, out);
                let mut else_body = stmt.else_body.as_ref();
                while let Some(body) = else_body {
                    match body {
                        ElseBody::Block(block) => {
                            collect_locals(block, catalog, resolve, out);
                            else_body = None;
                        }
                        ElseBody::If(nested) => match &nested.kind {
                            StatementKind::If(nested) => {
                                collect_locals(&nested.then_block, catalog, resolve, out);
                                else_body = nested.else_body.as_ref();
                            }
                            _ => else_body = None,
                        },
                    }
                }
            }
            StatementKind::While {
                body,
                on_fail: handler,
                ..
            }
            | StatementKind::Do {
                body,
                on_fail: handler,
            }
            | StatementKind::Lock {
                body,
                on_fail: handler,
            } => {
                collect_locals(body, catalog, resolve, out);
                on_fail(out, handler.as_ref());
            }
            _ => {}
        }
    }
}
