use crate::error::GenerationError;
use crate::model::FlowNode;

/// Accumulates generated source one token at a time.
///
/// Tokens are separated by a single space unless the previous token was glued with
/// [`join`](Self::join) or the next one is closing punctuation. Nested bodies are
/// rendered relative to column zero and indented one level per brace.
pub(crate) struct TokenBuilder {
    out: String,
    width: usize,
    glued: bool,
}

impl TokenBuilder {
    pub(crate) fn new(width: usize) -> Self {
        Self {
            out: String::new(),
            width,
            glued: false,
        }
    }

    pub(crate) fn token(&mut self, text: &str) -> &mut Self {
        let at_line_start = self.out.is_empty() || self.out.ends_with(|c: char| c == ' ' || c == '\n');
        if !self.glued && !at_line_start {
            self.out.push(' ');
        }
        self.out.push_str(text);
        self.glued = false;
        self
    }

    pub(crate) fn keyword(&mut self, keyword: &str) -> &mut Self {
        self.token(keyword)
    }

    pub(crate) fn name(&mut self, name: &str) -> &mut Self {
        self.token(name.trim())
    }

    pub(crate) fn expression(&mut self, expression: &str) -> &mut Self {
        self.token(expression.trim())
    }

    pub(crate) fn typed_binding(&mut self, type_name: &str, name: &str) -> &mut Self {
        self.token(type_name.trim()).name(name)
    }

    /// Attaches `text` to the previous token and the next token to it.
    pub(crate) fn join(&mut self, text: &str) -> &mut Self {
        self.out.push_str(text);
        self.glued = true;
        self
    }

    /// Attaches closing punctuation to the previous token.
    pub(crate) fn punct(&mut self, text: &str) -> &mut Self {
        self.out.push_str(text);
        self.glued = false;
        self
    }

    pub(crate) fn end_of_statement(&mut self) -> &mut Self {
        self.punct(";")
    }

    /// `{`, each child on its own line one level deeper, `}`.
    pub(crate) fn body(
        &mut self,
        children: &[FlowNode],
        render: &dyn Fn(&FlowNode) -> Result<String, GenerationError>,
    ) -> Result<&mut Self, GenerationError> {
        self.token("{");
        for child in children {
            let text = render(child)?;
            self.out.push('\n');
            self.out.push_str(&indent(&text, self.width));
        }
        self.out.push_str("\n}");
        self.glued = false;
        Ok(self)
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}

/// Prefixes every line of `text` with `column` spaces.
pub(crate) fn indent(text: &str, column: usize) -> String {
    let pad = " ".repeat(column);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Indents every line but the first, which is placed by the edit position.
pub(crate) fn reindent(text: &str, column: usize) -> String {
    let pad = " ".repeat(column);
    let mut lines = text.lines();
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(&pad);
            out.push_str(line);
        }
    }
    out
}
