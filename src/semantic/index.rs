use super::{ModuleId, SymbolKind};
use crate::error::FlowError;
use crate::model::NodeKind;
use crate::types::{FunctionParam, TypeDescriptor};
use serde::{Deserialize, Serialize};

/// A client class whose actions may map onto dedicated node kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub module: ModuleId,
    pub name: String,
    pub methods: Vec<ConnectorMethod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorMethod {
    pub name: String,
    pub kind: SymbolKind,
    /// Set when the action has a dedicated node kind.
    #[serde(default)]
    pub node_kind: Option<NodeKind>,
    pub params: Vec<FunctionParam>,
    pub returns: TypeDescriptor,
}

/// Read-only catalog of known connectors, loaded once and shared by reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorIndex {
    connectors: Vec<Connector>,
}

impl ConnectorIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The HTTP client with its `get` and `post` actions.
    pub fn standard() -> Self {
        let http = ModuleId::new("ballerina", "http");
        let headers = TypeDescriptor::optional(TypeDescriptor::map(TypeDescriptor::union(vec![
            TypeDescriptor::String,
            TypeDescriptor::array(TypeDescriptor::String),
        ])));
        let target_type = TypeDescriptor::named(Some(http.clone()), "TargetType");
        let response = TypeDescriptor::union(vec![
            TypeDescriptor::named(Some(http.clone()), "Response"),
            TypeDescriptor::Error {
                module: Some(http.clone()),
                name: Some("ClientError".to_string()),
            },
        ]);

        let get = ConnectorMethod {
            name: "get".to_string(),
            kind: SymbolKind::RemoteMethod,
            node_kind: Some(NodeKind::HttpApiGetCall),
            params: vec![
                FunctionParam::new("path", TypeDescriptor::String),
                FunctionParam::new("headers", headers.clone()).defaultable(),
                FunctionParam::new("targetType", target_type.clone()).defaultable(),
            ],
            returns: response.clone(),
        };
        let post = ConnectorMethod {
            name: "post".to_string(),
            kind: SymbolKind::RemoteMethod,
            node_kind: Some(NodeKind::HttpApiPostCall),
            params: vec![
                FunctionParam::new("path", TypeDescriptor::String),
                FunctionParam::new("message", TypeDescriptor::Anydata),
                FunctionParam::new("headers", headers).defaultable(),
                FunctionParam::new("targetType", target_type).defaultable(),
            ],
            returns: response,
        };

        Self {
            connectors: vec![Connector {
                module: http,
                name: "Client".to_string(),
                methods: vec![get, post],
            }],
        }
    }

    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        serde_json::from_str(json).map_err(|e| FlowError::Index(e.to_string()))
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn method(&self, module: &ModuleId, method: &str) -> Option<&ConnectorMethod> {
        self.connectors
            .iter()
            .filter(|c| &c.module == module)
            .flat_map(|c| c.methods.iter())
            .find(|m| m.name == method)
    }

    /// The dedicated node kind for an action, if the index knows one.
    pub fn specialized_kind(&self, module: &ModuleId, method: &str) -> Option<NodeKind> {
        self.method(module, method).and_then(|m| m.node_kind)
    }
}
