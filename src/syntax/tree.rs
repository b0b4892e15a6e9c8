use crate::diagnostics::Diagnostic;
use crate::position::LineRange;

/// A parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub file_name: String,
    pub imports: Vec<Import>,
    pub functions: Vec<FunctionDef>,
    /// Problems the parser recovered from, in source order.
    pub diagnostics: Vec<Diagnostic>,
}

impl Module {
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Import strings in `org/module` form.
    pub fn import_ids(&self) -> Vec<String> {
        self.imports
            .iter()
            .map(|i| format!("{}/{}", i.org, i.module))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub org: String,
    pub module: String,
    pub range: LineRange,
}

impl Import {
    /// The prefix the module is referred to by (`ballerina/lang.value` -> `value`).
    pub fn prefix(&self) -> &str {
        self.module.rsplit('.').next().unwrap_or(&self.module)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
    pub body: Block,
    /// From the `function` keyword to the end of the body.
    pub range: LineRange,
    /// From the `function` keyword to the end of the signature.
    pub signature_range: LineRange,
    pub signature_source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub type_name: String,
    pub name: String,
    pub range: LineRange,
}

/// A brace-delimited statement sequence. The range spans both braces.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub range: LineRange,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub range: LineRange,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    VarDecl {
        is_final: bool,
        type_name: String,
        name: String,
        init: Option<Expr>,
    },
    Assign {
        target: String,
        value: Expr,
    },
    Return(Option<Expr>),
    If(IfStmt),
    While {
        condition: Expr,
        body: Block,
        on_fail: Option<OnFail>,
    },
    Foreach {
        type_name: String,
        name: String,
        collection: Expr,
        body: Block,
        on_fail: Option<OnFail>,
    },
    Do {
        body: Block,
        on_fail: Option<OnFail>,
    },
    Lock {
        body: Block,
        on_fail: Option<OnFail>,
    },
    Break,
    Continue,
    Panic(Expr),
    Fail(Expr),
    Expression(Expr),
    /// One or more consecutive line comments, without the `//` markers.
    Comment(Vec<String>),
    /// A statement the parser skipped over after a syntax error.
    Invalid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Block,
    pub else_body: Option<ElseBody>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseBody {
    /// `else if ...`; the statement is always of kind `If`.
    If(Box<Statement>),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnFail {
    pub error_type: Option<String>,
    pub error_var: Option<String>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub range: LineRange,
    pub source: String,
}

impl Expr {
    /// Source text with one layer of enclosing parentheses removed.
    pub fn unparenthesized(&self) -> &str {
        let text = self.source.trim();
        if text.starts_with('(') && text.ends_with(')') && wraps_whole(text) {
            text[1..text.len() - 1].trim()
        } else {
            text
        }
    }

    /// Splits a named call argument, `name = value`, into its name and value.
    pub fn named_argument(&self) -> Option<(&str, &str)> {
        let (name, value) = self.source.trim().split_once('=')?;
        let name = name.trim_end();
        let mut chars = name.chars();
        let is_identifier = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_')
            && chars.all(|c| c.is_alphanumeric() || c == '_');
        // `==` and `=>` are not bindings.
        (is_identifier && !value.starts_with(['=', '>'])).then(|| (name, value.trim()))
    }

    /// The call underneath any `check`/`checkpanic` wrapper.
    pub fn unchecked(&self) -> &Expr {
        match &self.kind {
            ExprKind::Check { inner, .. } => inner.unchecked(),
            _ => self,
        }
    }
}

fn wraps_whole(text: &str) -> bool {
    let mut depth = 0usize;
    for (i, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i != text.len() - 1 {
                    return false;
                }
            }
            _ => {}
        }
    }
    true
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Check {
        panic: bool,
        inner: Box<Expr>,
    },
    FunctionCall {
        module: Option<String>,
        name: String,
        args: Vec<Expr>,
    },
    RemoteCall {
        target: String,
        method: String,
        args: Vec<Expr>,
    },
    ResourceCall {
        target: String,
        path: String,
        method: String,
        args: Vec<Expr>,
    },
    Other,
}
