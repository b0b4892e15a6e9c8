//! Semantic type descriptors and their canonical display form.

mod catalog;
mod formatter;

pub use catalog::TypeCatalog;
pub use formatter::TypeFormatter;

use crate::semantic::ModuleId;
use serde::{Deserialize, Serialize};

/// A resolved type, as reported by the semantic model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeDescriptor {
    Nil,
    Boolean,
    Int,
    Float,
    Decimal,
    String,
    Byte,
    Json,
    Any,
    Anydata,
    /// `error`, or a named error type when `name` is set.
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        module: Option<ModuleId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Named {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        module: Option<ModuleId>,
        name: String,
    },
    Array {
        element: Box<TypeDescriptor>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<usize>,
    },
    Map {
        value: Box<TypeDescriptor>,
    },
    Stream {
        value: Box<TypeDescriptor>,
    },
    Optional {
        inner: Box<TypeDescriptor>,
    },
    Union {
        members: Vec<TypeDescriptor>,
    },
    Tuple {
        members: Vec<TypeDescriptor>,
    },
    Function {
        params: Vec<FunctionParam>,
        returns: Box<TypeDescriptor>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(default)]
    pub defaultable: bool,
}

impl FunctionParam {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            defaultable: false,
        }
    }

    pub fn defaultable(mut self) -> Self {
        self.defaultable = true;
        self
    }
}

impl TypeDescriptor {
    pub fn named(module: Option<ModuleId>, name: impl Into<String>) -> Self {
        Self::Named {
            module,
            name: name.into(),
        }
    }

    pub fn error() -> Self {
        Self::Error {
            module: None,
            name: None,
        }
    }

    pub fn array(element: TypeDescriptor) -> Self {
        Self::Array {
            element: Box::new(element),
            size: None,
        }
    }

    pub fn map(value: TypeDescriptor) -> Self {
        Self::Map {
            value: Box::new(value),
        }
    }

    pub fn optional(inner: TypeDescriptor) -> Self {
        Self::Optional {
            inner: Box::new(inner),
        }
    }

    pub fn union(members: Vec<TypeDescriptor>) -> Self {
        Self::Union { members }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// The module that defines this type, for named types.
    pub fn module(&self) -> Option<&ModuleId> {
        match self {
            Self::Named { module, .. } | Self::Error { module, .. } => module.as_ref(),
            _ => None,
        }
    }

    /// Parameters and return type, when this is a function type.
    pub fn signature(&self) -> Option<(&[FunctionParam], &TypeDescriptor)> {
        match self {
            Self::Function { params, returns } => Some((params.as_slice(), returns.as_ref())),
            _ => None,
        }
    }
}
