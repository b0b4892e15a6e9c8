use super::{TypeCatalog, TypeDescriptor};
use crate::semantic::ModuleId;
use itertools::Itertools;

// Binding strength, loosest first.
const PREC_FUNCTION: u8 = 0;
const PREC_UNION: u8 = 1;
const PREC_POSTFIX: u8 = 2;
const PREC_ATOM: u8 = 3;

/// Renders type descriptors the way they would be written in source.
pub struct TypeFormatter<'a> {
    catalog: &'a TypeCatalog,
    current_module: Option<&'a ModuleId>,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(catalog: &'a TypeCatalog, current_module: Option<&'a ModuleId>) -> Self {
        Self {
            catalog,
            current_module,
        }
    }

    pub fn format(&self, ty: &TypeDescriptor) -> String {
        self.format_recursive(ty, PREC_FUNCTION)
    }

    /// Like [`format`](Self::format), but drops error members from a top-level union.
    pub fn format_ignoring_error(&self, ty: &TypeDescriptor) -> String {
        match ty {
            TypeDescriptor::Union { members } => {
                let kept: Vec<&TypeDescriptor> =
                    members.iter().filter(|m| !m.is_error()).collect();
                match kept.as_slice() {
                    [] => self.format(ty),
                    [single] => self.format(single),
                    _ => kept
                        .iter()
                        .map(|m| self.format_recursive(m, PREC_UNION))
                        .join("|"),
                }
            }
            other => self.format(other),
        }
    }

    fn format_recursive(&self, ty: &TypeDescriptor, parent_precedence: u8) -> String {
        let precedence = Self::precedence(ty);
        let body = match ty {
            TypeDescriptor::Error { module, name } => match name {
                Some(name) => self.qualified(module.as_ref(), name),
                None => "error".to_string(),
            },
            TypeDescriptor::Named { module, name } => self.qualified(module.as_ref(), name),
            TypeDescriptor::Array { element, size } => {
                let element = self.format_recursive(element, PREC_POSTFIX);
                match size {
                    Some(size) => format!("{}[{}]", element, size),
                    None => format!("{}[]", element),
                }
            }
            TypeDescriptor::Optional { inner } => {
                format!("{}?", self.format_recursive(inner, PREC_POSTFIX))
            }
            TypeDescriptor::Map { value } => format!("map<{}>", self.format(value)),
            TypeDescriptor::Stream { value } => format!("stream<{}>", self.format(value)),
            TypeDescriptor::Union { members } => members
                .iter()
                .map(|m| self.format_recursive(m, PREC_UNION))
                .join("|"),
            TypeDescriptor::Tuple { members } => {
                format!("[{}]", members.iter().map(|m| self.format(m)).join(", "))
            }
            TypeDescriptor::Function { params, returns } => {
                let params = params.iter().map(|p| self.format(&p.ty)).join(", ");
                match returns.as_ref() {
                    TypeDescriptor::Nil => format!("function ({})", params),
                    returns => format!("function ({}) returns {}", params, self.format(returns)),
                }
            }
            builtin => self
                .catalog
                .name_of(builtin)
                .unwrap_or("any")
                .to_string(),
        };

        if precedence < parent_precedence {
            format!("({})", body)
        } else {
            body
        }
    }

    /// `name` for the current module, `prefix:name` otherwise.
    fn qualified(&self, module: Option<&ModuleId>, name: &str) -> String {
        match module {
            Some(module) if Some(module) != self.current_module => {
                format!("{}:{}", module.prefix(), name)
            }
            _ => name.to_string(),
        }
    }

    fn precedence(ty: &TypeDescriptor) -> u8 {
        match ty {
            TypeDescriptor::Function { .. } => PREC_FUNCTION,
            TypeDescriptor::Union { .. } => PREC_UNION,
            TypeDescriptor::Array { .. } | TypeDescriptor::Optional { .. } => PREC_POSTFIX,
            _ => PREC_ATOM,
        }
    }
}
