use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueKind {
    Identifier,
    Expression,
    Type,
    String,
    Flag,
    Repeatable,
    View,
}

/// A typed, editable value on a flow node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub value_kind: ValueKind,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_constraint: Option<String>,
    #[serde(default = "editable_default")]
    pub editable: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Nested schema for repeatable or composite values.
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    /// Modules (`org/name`) the value needs imported.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
}

fn editable_default() -> bool {
    true
}

impl Property {
    pub fn new(value_kind: ValueKind, value: impl Into<String>) -> Self {
        Self {
            value_kind,
            value: value.into(),
            type_constraint: None,
            editable: true,
            optional: false,
            placeholder: None,
            properties: Properties::new(),
            imports: Vec::new(),
        }
    }

    pub fn expression(value: impl Into<String>) -> Self {
        Self::new(ValueKind::Expression, value)
    }

    pub fn identifier(value: impl Into<String>) -> Self {
        Self::new(ValueKind::Identifier, value)
    }

    pub fn type_name(value: impl Into<String>) -> Self {
        Self::new(ValueKind::Type, value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ValueKind::String, value)
    }

    pub fn repeatable(properties: Properties) -> Self {
        Self {
            properties,
            ..Self::new(ValueKind::Repeatable, "")
        }
    }

    pub fn with_type_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.type_constraint = Some(constraint.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_import(mut self, module: impl Into<String>) -> Self {
        self.imports.push(module.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// Insertion-ordered property map. Serializes as a JSON object in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, Property)>);

impl Properties {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Inserts or replaces; a replaced entry keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, property: Property) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = property,
            None => self.0.push((key, property)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, property: Property) -> Self {
        self.insert(key, property);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Property> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, p)| p)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Property> {
        self.0.iter_mut().find(|(k, _)| k == key).map(|(_, p)| p)
    }

    /// The raw value of a property, if present.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).map(|p| p.value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<Property> {
        let position = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(position).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.0.iter().map(|(k, p)| (k.as_str(), p))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Property)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, Property)>>(iter: I) -> Self {
        let mut properties = Properties::new();
        for (key, property) in iter {
            properties.insert(key, property);
        }
        properties
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, property) in &self.0 {
            map.serialize_entry(key, property)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PropertiesVisitor;

        impl<'de> Visitor<'de> for PropertiesVisitor {
            type Value = Properties;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of property keys to properties")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Properties, A::Error> {
                let mut properties = Properties::new();
                while let Some((key, property)) = access.next_entry::<String, Property>()? {
                    properties.insert(key, property);
                }
                Ok(properties)
            }
        }

        deserializer.deserialize_map(PropertiesVisitor)
    }
}
