use super::TypeDescriptor;
use crate::semantic::ModuleId;
use ahash::AHashMap;

fn builtins() -> Vec<(&'static str, TypeDescriptor)> {
    vec![
        ("()", TypeDescriptor::Nil),
        ("boolean", TypeDescriptor::Boolean),
        ("int", TypeDescriptor::Int),
        ("float", TypeDescriptor::Float),
        ("decimal", TypeDescriptor::Decimal),
        ("string", TypeDescriptor::String),
        ("byte", TypeDescriptor::Byte),
        ("json", TypeDescriptor::Json),
        ("any", TypeDescriptor::Any),
        ("anydata", TypeDescriptor::Anydata),
    ]
}

/// Builtin type names and default values.
///
/// Construct once with [`TypeCatalog::builtin`] and share it by reference; it is never
/// mutated after construction.
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    names: Vec<(&'static str, TypeDescriptor)>,
    by_name: AHashMap<&'static str, TypeDescriptor>,
}

impl TypeCatalog {
    pub fn builtin() -> Self {
        let names = builtins();
        let mut by_name: AHashMap<&'static str, TypeDescriptor> = names
            .iter()
            .map(|(name, ty)| (*name, ty.clone()))
            .collect();
        by_name.insert("nil", TypeDescriptor::Nil);
        by_name.insert("error", TypeDescriptor::error());
        Self { names, by_name }
    }

    pub fn lookup(&self, name: &str) -> Option<&TypeDescriptor> {
        self.by_name.get(name)
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// The source spelling of a builtin type.
    pub fn name_of(&self, ty: &TypeDescriptor) -> Option<&'static str> {
        self.names
            .iter()
            .find(|(_, t)| t == ty)
            .map(|(name, _)| *name)
    }

    /// A literal that is valid for a freshly declared variable of the given type.
    pub fn default_value(&self, ty: &TypeDescriptor) -> String {
        match ty {
            TypeDescriptor::Boolean => "false",
            TypeDescriptor::Int | TypeDescriptor::Byte => "0",
            TypeDescriptor::Float => "0.0",
            TypeDescriptor::Decimal => "0d",
            TypeDescriptor::String => "\"\"",
            TypeDescriptor::Array { .. } | TypeDescriptor::Tuple { .. } => "[]",
            TypeDescriptor::Map { .. } => "{}",
            TypeDescriptor::Error { .. } => "error(\"\")",
            TypeDescriptor::Union { members } => {
                return members
                    .first()
                    .map(|m| self.default_value(m))
                    .unwrap_or_else(|| "()".to_string());
            }
            _ => "()",
        }
        .to_string()
    }

    /// Parses type text such as `int[]`, `string?`, `map<json>` or `http:Client|error`.
    ///
    /// Module prefixes are resolved through `resolve_prefix`; unresolvable prefixes and
    /// unknown names become [`TypeDescriptor::Named`] without a module.
    pub fn parse_type(
        &self,
        text: &str,
        resolve_prefix: &dyn Fn(&str) -> Option<ModuleId>,
    ) -> TypeDescriptor {
        let text = text.trim();
        let members = split_top_level(text, '|');
        if members.len() > 1 {
            return TypeDescriptor::union(
                members
                    .iter()
                    .map(|m| self.parse_type(m, resolve_prefix))
                    .collect(),
            );
        }

        if let Some(inner) = text.strip_suffix('?') {
            return TypeDescriptor::optional(self.parse_type(inner, resolve_prefix));
        }
        if encloses(text, '[', ']') {
            let members = split_top_level(&text[1..text.len() - 1], ',')
                .into_iter()
                .filter(|m| !m.trim().is_empty())
                .map(|m| self.parse_type(m, resolve_prefix))
                .collect();
            return TypeDescriptor::Tuple { members };
        }
        if let Some(rest) = text.strip_suffix(']') {
            if let Some(open) = rest.rfind('[') {
                let size = rest[open + 1..].trim().parse().ok();
                return TypeDescriptor::Array {
                    element: Box::new(self.parse_type(&rest[..open], resolve_prefix)),
                    size,
                };
            }
        }
        if text.starts_with('(') && text.ends_with(')') && text.len() > 2 {
            return self.parse_type(&text[1..text.len() - 1], resolve_prefix);
        }
        if let Some(inner) = generic_argument(text, "map") {
            return TypeDescriptor::map(self.parse_type(inner, resolve_prefix));
        }
        if let Some(inner) = generic_argument(text, "stream") {
            return TypeDescriptor::Stream {
                value: Box::new(self.parse_type(inner, resolve_prefix)),
            };
        }
        if let Some(builtin) = self.lookup(text) {
            return builtin.clone();
        }

        match text.split_once(':') {
            Some((prefix, name)) => {
                let module = resolve_prefix(prefix);
                if name.ends_with("Error") {
                    TypeDescriptor::Error {
                        module,
                        name: Some(name.to_string()),
                    }
                } else {
                    TypeDescriptor::named(module, name)
                }
            }
            None => TypeDescriptor::named(None, text),
        }
    }
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// `open` at the start of `text` is closed by the `close` at its end.
fn encloses(text: &str, open: char, close: char) -> bool {
    if !text.starts_with(open) || !text.ends_with(close) {
        return false;
    }
    let mut depth = 0usize;
    for (i, ch) in text.char_indices() {
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return i == text.len() - close.len_utf8();
            }
        }
    }
    false
}

fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        match ch {
            '(' | '<' | '[' => depth += 1,
            ')' | '>' | ']' => depth -= 1,
            c if c == separator && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + ch.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn generic_argument<'t>(text: &'t str, head: &str) -> Option<&'t str> {
    text.strip_prefix(head)?
        .trim_start()
        .strip_prefix('<')?
        .strip_suffix('>')
}
