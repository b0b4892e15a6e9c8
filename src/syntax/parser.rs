use super::lexer::{Token, TokenKind, tokenize};
use super::tree::*;
use crate::diagnostics::Diagnostic;
use crate::error::SyntaxError;
use crate::position::{LineIndex, LineRange};

/// Parses a whole document.
///
/// Statement-level syntax errors are recovered from: the offending statement is kept
/// as [`StatementKind::Invalid`] and reported in [`Module::diagnostics`]. Errors that
/// leave no statement boundary to resync on (an unterminated block, a broken function
/// header) abort the parse.
pub fn parse_module(text: &str, file_name: &str) -> Result<Module, SyntaxError> {
    let mut parser = Parser::new(text, file_name)?;
    parser.module()
}

/// Parses a single brace-delimited block, mainly useful for tests and tooling.
pub fn parse_block(text: &str, file_name: &str) -> Result<Block, SyntaxError> {
    let mut parser = Parser::new(text, file_name)?;
    let block = parser.block()?;
    if let Some(extra) = parser.peek() {
        return Err(parser.error_at(extra, "Unexpected tokens after block"));
    }
    Ok(block)
}

struct Parser<'s> {
    src: &'s str,
    file: String,
    index: LineIndex,
    tokens: Vec<Token>,
    pos: usize,
    last_end: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'s> Parser<'s> {
    fn new(src: &'s str, file: &str) -> Result<Self, SyntaxError> {
        let index = LineIndex::new(src);
        let tokens = tokenize(src, &index)?;
        Ok(Self {
            src,
            file: file.to_string(),
            index,
            tokens,
            pos: 0,
            last_end: 0,
            diagnostics: Vec::new(),
        })
    }

    // --- Token access ---

    fn text(&self, token: Token) -> &'s str {
        &self.src[token.start..token.end]
    }

    fn raw_peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn skip_comments(&mut self) {
        while self
            .raw_peek()
            .is_some_and(|t| t.kind == TokenKind::Comment)
        {
            self.pos += 1;
        }
    }

    /// The n-th upcoming token, ignoring comments.
    fn peek_nth(&self, n: usize) -> Option<Token> {
        self.tokens[self.pos.min(self.tokens.len())..]
            .iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .nth(n)
            .copied()
    }

    fn peek(&self) -> Option<Token> {
        self.peek_nth(0)
    }

    fn bump(&mut self) -> Option<Token> {
        self.skip_comments();
        let token = self.raw_peek()?;
        self.pos += 1;
        self.last_end = token.end;
        Some(token)
    }

    fn at(&self, text: &str) -> bool {
        self.peek().is_some_and(|t| self.is(t, text))
    }

    fn is(&self, token: Token, text: &str) -> bool {
        token.kind != TokenKind::Str && self.text(token) == text
    }

    fn eat(&mut self, text: &str) -> bool {
        if self.at(text) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, text: &str) -> Result<Token, SyntaxError> {
        match self.peek() {
            Some(token) if self.is(token, text) => {
                self.bump();
                Ok(token)
            }
            Some(token) => Err(self.error_at(
                token,
                &format!("Expected '{}', found '{}'", text, self.text(token)),
            )),
            None => Err(self.error_eof(&format!("Expected '{}'", text))),
        }
    }

    fn expect_ident(&mut self) -> Result<Token, SyntaxError> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Ident => {
                self.bump();
                Ok(token)
            }
            Some(token) => Err(self.error_at(
                token,
                &format!("Expected identifier, found '{}'", self.text(token)),
            )),
            None => Err(self.error_eof("Expected identifier")),
        }
    }

    fn range(&self, start: usize, end: usize) -> LineRange {
        LineRange::new(
            self.file.clone(),
            self.index.position_of(self.src, start),
            self.index.position_of(self.src, end),
        )
    }

    fn error_at(&self, token: Token, message: &str) -> SyntaxError {
        SyntaxError::new(message, self.index.position_of(self.src, token.start))
    }

    fn error_eof(&self, message: &str) -> SyntaxError {
        SyntaxError::new(
            format!("{} before end of input", message),
            self.index.position_of(self.src, self.src.len()),
        )
    }

    // --- Module level ---

    fn module(&mut self) -> Result<Module, SyntaxError> {
        let mut imports = Vec::new();
        let mut functions = Vec::new();

        while let Some(token) = self.peek() {
            match self.text(token) {
                "import" => imports.push(self.import()?),
                "public" | "isolated" => {
                    self.bump();
                }
                "function" => functions.push(self.function()?),
                other => {
                    return Err(self.error_at(
                        token,
                        &format!("Expected 'import' or 'function', found '{}'", other),
                    ));
                }
            }
        }

        Ok(Module {
            file_name: self.file.clone(),
            imports,
            functions,
            diagnostics: std::mem::take(&mut self.diagnostics),
        })
    }

    fn import(&mut self) -> Result<Import, SyntaxError> {
        let keyword = self.expect("import")?;
        let org = self.expect_ident()?;
        self.expect("/")?;
        let first = self.expect_ident()?;
        let mut module_end = first.end;
        while self.eat(".") {
            module_end = self.expect_ident()?.end;
        }
        self.expect(";")?;
        Ok(Import {
            org: self.text(org).to_string(),
            module: self.src[first.start..module_end].to_string(),
            range: self.range(keyword.start, self.last_end),
        })
    }

    fn function(&mut self) -> Result<FunctionDef, SyntaxError> {
        let keyword = self.expect("function")?;
        let name = self.expect_ident()?;
        self.expect("(")?;

        let mut params = Vec::new();
        if !self.at(")") {
            loop {
                let start = self.peek().map_or(self.src.len(), |t| t.start);
                let type_name = self.type_text()?;
                let param = self.expect_ident()?;
                params.push(Param {
                    type_name,
                    name: self.text(param).to_string(),
                    range: self.range(start, param.end),
                });
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect(")")?;

        let return_type = if self.eat("returns") {
            Some(self.type_text()?)
        } else {
            None
        };
        let signature_end = self.last_end;
        let body = self.block()?;

        Ok(FunctionDef {
            name: self.text(name).to_string(),
            params,
            return_type,
            body,
            range: self.range(keyword.start, self.last_end),
            signature_range: self.range(keyword.start, signature_end),
            signature_source: self.src[keyword.start..signature_end].to_string(),
        })
    }

    // --- Types ---

    fn type_text(&mut self) -> Result<String, SyntaxError> {
        let start = self.peek().map(|t| t.start);
        if self.scan_type() {
            if let Some(start) = start {
                return Ok(self.src[start..self.last_end].to_string());
            }
        }
        match self.peek() {
            Some(token) => Err(self.error_at(token, "Expected a type")),
            None => Err(self.error_eof("Expected a type")),
        }
    }

    /// Consumes a type if one starts here. The position is only meaningful on success.
    fn scan_type(&mut self) -> bool {
        loop {
            if !self.scan_type_atom() {
                return false;
            }
            loop {
                if self.at("?") {
                    self.bump();
                } else if self.at("[") {
                    self.bump();
                    if self.peek().is_some_and(|t| t.kind == TokenKind::Number) || self.at("*")
                    {
                        self.bump();
                    }
                    if !self.eat("]") {
                        return false;
                    }
                } else {
                    break;
                }
            }
            if !self.eat("|") {
                return true;
            }
        }
    }

    fn scan_type_atom(&mut self) -> bool {
        if self.eat("(") {
            return self.scan_type() && self.eat(")");
        }
        match self.peek() {
            Some(token) if token.kind == TokenKind::Ident => {
                self.bump();
            }
            _ => return false,
        }
        if self.at(":") && self.peek_nth(1).is_some_and(|t| t.kind == TokenKind::Ident) {
            self.bump();
            self.bump();
        }
        if self.at("<") {
            let mut depth = 0usize;
            while let Some(token) = self.bump() {
                match self.text(token) {
                    "<" => depth += 1,
                    ">" => {
                        depth -= 1;
                        if depth == 0 {
                            return true;
                        }
                    }
                    ";" | "{" | "}" => return false,
                    _ => {}
                }
            }
            return false;
        }
        true
    }

    // --- Blocks and statements ---

    fn block(&mut self) -> Result<Block, SyntaxError> {
        let open = self.expect("{")?;
        let mut statements = Vec::new();

        loop {
            if let Some(comment) = self.comment_run() {
                statements.push(comment);
                continue;
            }
            match self.peek() {
                None => return Err(self.error_at(open, "Unterminated block")),
                Some(token) if self.is(token, "}") => break,
                Some(_) => {
                    let start = self.pos;
                    match self.statement() {
                        Ok(statement) => statements.push(statement),
                        Err(error) => statements.push(self.recover(start, error)?),
                    }
                }
            }
        }

        let close = self.expect("}")?;
        Ok(Block {
            statements,
            range: self.range(open.start, close.end),
            source: self.src[open.start..close.end].to_string(),
        })
    }

    /// Groups line comments on consecutive lines into one statement.
    fn comment_run(&mut self) -> Option<Statement> {
        let first = self.raw_peek().filter(|t| t.kind == TokenKind::Comment)?;
        let mut last = first;
        let mut lines = vec![comment_body(self.text(first))];
        self.pos += 1;

        while let Some(next) = self.raw_peek().filter(|t| t.kind == TokenKind::Comment) {
            let prev_line = self.index.position_of(self.src, last.start).line;
            if self.index.position_of(self.src, next.start).line != prev_line + 1 {
                break;
            }
            lines.push(comment_body(self.text(next)));
            last = next;
            self.pos += 1;
        }
        self.last_end = last.end;

        Some(Statement {
            kind: StatementKind::Comment(lines),
            range: self.range(first.start, last.end),
            source: self.src[first.start..last.end].to_string(),
        })
    }

    /// Skips the rest of a broken statement and records the error as a diagnostic.
    fn recover(&mut self, start: usize, error: SyntaxError) -> Result<Statement, SyntaxError> {
        self.pos = start;
        self.skip_comments();
        let first = self.raw_peek().ok_or_else(|| error.clone())?;

        let mut depth = 0usize;
        let mut last = first;
        while let Some(token) = self.raw_peek() {
            let text = self.text(token);
            if token.kind == TokenKind::Punct && text == "}" {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            if token.kind == TokenKind::Punct && text == "{" {
                depth += 1;
            }
            self.pos += 1;
            last = token;
            if depth == 0 && token.kind == TokenKind::Punct && (text == ";" || text == "}") {
                break;
            }
        }
        if self.pos == start {
            self.pos += 1;
        }
        self.last_end = last.end;

        let range = self.range(first.start, last.end);
        self.diagnostics
            .push(Diagnostic::error(error.message.clone(), range.clone()).with_code("syntax"));
        tracing::debug!("[PARSER] Recovered from '{}' at {}", error.message, range);

        Ok(Statement {
            kind: StatementKind::Invalid,
            range,
            source: self.src[first.start..last.end].to_string(),
        })
    }

    fn statement(&mut self) -> Result<Statement, SyntaxError> {
        let first = self.peek().ok_or_else(|| self.error_eof("Expected statement"))?;

        let kind = match self.text(first) {
            "return" => {
                self.bump();
                if self.eat(";") {
                    StatementKind::Return(None)
                } else {
                    let value = self.expr_until(&[";"])?;
                    self.expect(";")?;
                    StatementKind::Return(Some(value))
                }
            }
            "if" => StatementKind::If(self.if_statement()?),
            "while" => {
                self.bump();
                let condition = self.expr_until(&["{"])?;
                let body = self.block()?;
                let on_fail = self.on_fail()?;
                StatementKind::While {
                    condition,
                    body,
                    on_fail,
                }
            }
            "foreach" => {
                self.bump();
                let type_name = self.type_text()?;
                let name = self.expect_ident()?;
                self.expect("in")?;
                let collection = self.expr_until(&["{"])?;
                let body = self.block()?;
                let on_fail = self.on_fail()?;
                StatementKind::Foreach {
                    type_name,
                    name: self.text(name).to_string(),
                    collection,
                    body,
                    on_fail,
                }
            }
            "do" => {
                self.bump();
                let body = self.block()?;
                let on_fail = self.on_fail()?;
                StatementKind::Do { body, on_fail }
            }
            "lock" => {
                self.bump();
                let body = self.block()?;
                let on_fail = self.on_fail()?;
                StatementKind::Lock { body, on_fail }
            }
            "break" | "continue" => {
                self.bump();
                self.expect(";")?;
                if self.is(first, "break") {
                    StatementKind::Break
                } else {
                    StatementKind::Continue
                }
            }
            "panic" | "fail" if !self.peek_nth(1).is_some_and(|t| self.is(t, "=")) => {
                self.bump();
                let value = self.expr_until(&[";"])?;
                self.expect(";")?;
                if self.is(first, "panic") {
                    StatementKind::Panic(value)
                } else {
                    StatementKind::Fail(value)
                }
            }
            _ => self.simple_statement()?,
        };

        Ok(Statement {
            kind,
            range: self.range(first.start, self.last_end),
            source: self.src[first.start..self.last_end].to_string(),
        })
    }

    fn if_statement(&mut self) -> Result<IfStmt, SyntaxError> {
        self.expect("if")?;
        let condition = self.expr_until(&["{"])?;
        let then_block = self.block()?;

        let else_body = if self.eat("else") {
            match self.peek() {
                Some(token) if self.is(token, "if") => {
                    let nested = self.if_statement()?;
                    Some(ElseBody::If(Box::new(Statement {
                        kind: StatementKind::If(nested),
                        range: self.range(token.start, self.last_end),
                        source: self.src[token.start..self.last_end].to_string(),
                    })))
                }
                _ => Some(ElseBody::Block(self.block()?)),
            }
        } else {
            None
        };

        Ok(IfStmt {
            condition,
            then_block,
            else_body,
        })
    }

    fn on_fail(&mut self) -> Result<Option<OnFail>, SyntaxError> {
        if !(self.at("on") && self.peek_nth(1).is_some_and(|t| self.is(t, "fail"))) {
            return Ok(None);
        }
        self.bump();
        self.bump();

        let (error_type, error_var) = if self.at("{") {
            (None, None)
        } else {
            let type_name = self.type_text()?;
            let var = self.expect_ident()?;
            (Some(type_name), Some(self.text(var).to_string()))
        };
        let body = self.block()?;
        Ok(Some(OnFail {
            error_type,
            error_var,
            body,
        }))
    }

    fn simple_statement(&mut self) -> Result<StatementKind, SyntaxError> {
        let is_final = self.eat("final");

        let checkpoint = (self.pos, self.last_end);
        let type_start = self.peek().map(|t| t.start);
        if self.scan_type() {
            let type_end = self.last_end;
            let binding = self.peek().filter(|t| t.kind == TokenKind::Ident);
            let follows = self.peek_nth(1);
            if let (Some(name), Some(start), Some(follow)) = (binding, type_start, follows) {
                if self.is(follow, "=") || self.is(follow, ";") {
                    self.bump();
                    let init = if self.eat("=") {
                        Some(self.expr_until(&[";"])?)
                    } else {
                        None
                    };
                    self.expect(";")?;
                    return Ok(StatementKind::VarDecl {
                        is_final,
                        type_name: self.src[start..type_end].to_string(),
                        name: self.text(name).to_string(),
                        init,
                    });
                }
            }
        }
        (self.pos, self.last_end) = checkpoint;

        if is_final {
            return Err(match self.peek() {
                Some(token) => self.error_at(token, "Expected a variable declaration after 'final'"),
                None => self.error_eof("Expected a variable declaration"),
            });
        }

        if let Some(target_end) = self.assignment_target_end() {
            let start = self.peek().map_or(target_end, |t| t.start);
            let target = self.src[start..target_end].trim().to_string();
            while self.bump().is_some_and(|t| !self.is(t, "=")) {}
            let value = self.expr_until(&[";"])?;
            self.expect(";")?;
            return Ok(StatementKind::Assign { target, value });
        }

        let value = self.expr_until(&[";"])?;
        self.expect(";")?;
        Ok(StatementKind::Expression(value))
    }

    /// End offset of the left-hand side when a top-level `=` occurs before the `;`.
    fn assignment_target_end(&self) -> Option<usize> {
        let mut depth = 0usize;
        let mut prev_end = None;
        for token in self.tokens[self.pos..]
            .iter()
            .filter(|t| t.kind != TokenKind::Comment)
        {
            if token.kind == TokenKind::Punct {
                match self.text(*token) {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => {
                        if depth == 0 {
                            return None;
                        }
                        depth -= 1;
                    }
                    ";" if depth == 0 => return None,
                    "=" if depth == 0 => return prev_end,
                    _ => {}
                }
            }
            prev_end = Some(token.end);
        }
        None
    }

    // --- Expressions ---

    /// Collects tokens up to one of `stops` at nesting depth zero.
    fn expr_until(&mut self, stops: &[&str]) -> Result<Expr, SyntaxError> {
        let mut collected = Vec::new();
        let mut depth = 0usize;

        loop {
            let Some(token) = self.peek() else {
                return Err(self.error_eof("Unterminated expression"));
            };
            if token.kind == TokenKind::Punct {
                let text = self.text(token);
                if depth == 0 && stops.contains(&text) {
                    break;
                }
                match text {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => {
                        if depth == 0 {
                            return Err(self.error_at(token, &format!("Unexpected '{}'", text)));
                        }
                        depth -= 1;
                    }
                    ";" => return Err(self.error_at(token, "Unexpected ';'")),
                    _ => {}
                }
            }
            self.bump();
            collected.push(token);
        }

        if collected.is_empty() {
            return Err(match self.peek() {
                Some(token) => self.error_at(token, "Expected an expression"),
                None => self.error_eof("Expected an expression"),
            });
        }
        Ok(self.classify(&collected))
    }

    fn classify(&self, tokens: &[Token]) -> Expr {
        let start = tokens[0].start;
        let end = tokens[tokens.len() - 1].end;
        Expr {
            kind: self.classify_kind(tokens),
            range: self.range(start, end),
            source: self.src[start..end].to_string(),
        }
    }

    fn classify_kind(&self, tokens: &[Token]) -> ExprKind {
        let first = self.text(tokens[0]);
        if tokens.len() > 1 && (first == "check" || first == "checkpanic") {
            return ExprKind::Check {
                panic: first == "checkpanic",
                inner: Box::new(self.classify(&tokens[1..])),
            };
        }

        let Some(open) = self.call_open_paren(tokens) else {
            return ExprKind::Other;
        };
        let head = &tokens[..open];
        let args = self.split_args(&tokens[open + 1..tokens.len() - 1]);
        let ident = |t: &Token| t.kind == TokenKind::Ident;

        match head {
            [name] if ident(name) => ExprKind::FunctionCall {
                module: None,
                name: self.text(*name).to_string(),
                args,
            },
            [module, colon, name] if ident(module) && self.is(*colon, ":") && ident(name) => {
                ExprKind::FunctionCall {
                    module: Some(self.text(*module).to_string()),
                    name: self.text(*name).to_string(),
                    args,
                }
            }
            [target, arrow, method]
                if ident(target) && self.is(*arrow, "->") && ident(method) =>
            {
                ExprKind::RemoteCall {
                    target: self.text(*target).to_string(),
                    method: self.text(*method).to_string(),
                    args,
                }
            }
            [target, arrow, slash, .., dot, method]
                if ident(target)
                    && self.is(*arrow, "->")
                    && self.is(*slash, "/")
                    && self.is(*dot, ".")
                    && ident(method) =>
            {
                ExprKind::ResourceCall {
                    target: self.text(*target).to_string(),
                    path: self.src[slash.start..dot.start].to_string(),
                    method: self.text(*method).to_string(),
                    args,
                }
            }
            _ => ExprKind::Other,
        }
    }

    /// Index of the `(` matching a trailing `)`, if the expression ends in a call.
    fn call_open_paren(&self, tokens: &[Token]) -> Option<usize> {
        let last = *tokens.last()?;
        if !self.is(last, ")") {
            return None;
        }
        let mut depth = 0usize;
        for (i, token) in tokens.iter().enumerate().rev() {
            if token.kind != TokenKind::Punct {
                continue;
            }
            match self.text(*token) {
                ")" => depth += 1,
                "(" => {
                    depth -= 1;
                    if depth == 0 {
                        return (i > 0).then_some(i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn split_args(&self, tokens: &[Token]) -> Vec<Expr> {
        let mut args = Vec::new();
        let mut depth = 0usize;
        let mut group_start = 0;

        for (i, token) in tokens.iter().enumerate() {
            if token.kind != TokenKind::Punct {
                continue;
            }
            match self.text(*token) {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => depth = depth.saturating_sub(1),
                "," if depth == 0 => {
                    if group_start < i {
                        args.push(self.classify(&tokens[group_start..i]));
                    }
                    group_start = i + 1;
                }
                _ => {}
            }
        }
        if group_start < tokens.len() {
            args.push(self.classify(&tokens[group_start..]));
        }
        args
    }
}

fn comment_body(text: &str) -> String {
    text.trim_start_matches('/').trim().to_string()
}
