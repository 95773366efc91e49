//! Resource descriptors - immutable records of desired configuration

use std::collections::BTreeMap;
use std::fmt;

use crate::graph::NodeId;

/// Identifier for a resource within a graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    /// Resource type (e.g., "vpc", "db_instance")
    pub resource_type: String,
    /// Resource name (unique per type within a graph)
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Attribute value of a descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Reference to another node's attribute, resolved by the
    /// provisioning engine after the target resource exists
    Ref { target: NodeId, attribute: String },
}

impl Value {
    pub fn reference(target: NodeId, attribute: impl Into<String>) -> Self {
        Self::Ref {
            target,
            attribute: attribute.into(),
        }
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(items.into_iter().collect())
    }

    pub fn map(entries: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    pub fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
            Value::Ref { target, attribute } => {
                format!("Ref(#{}.{})", target.index(), attribute)
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// One cloud resource's desired configuration.
///
/// Descriptors are immutable once added to a graph; a changed deployment
/// is expressed by synthesizing a new graph, never by editing nodes in
/// place. Attributes are kept sorted so that synthesis output is
/// deterministic for identical inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub id: ResourceId,
    pub attributes: BTreeMap<String, Value>,
    /// Ordering-only dependencies that no attribute references
    pub depends_on: Vec<NodeId>,
}

impl Descriptor {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: BTreeMap::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Add an ordering dependency on a node that no attribute references
    pub fn with_depends_on(mut self, target: NodeId) -> Self {
        self.depends_on.push(target);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_id_display() {
        let id = ResourceId::new("vpc", "main");
        assert_eq!(id.to_string(), "vpc.main");
    }

    #[test]
    fn descriptor_builder() {
        let d = Descriptor::new("security_group", "shared")
            .with_attribute("description", "internal traffic")
            .with_attribute("allow_all_outbound", true);

        assert_eq!(
            d.attribute("description"),
            Some(&Value::String("internal traffic".to_string()))
        );
        assert_eq!(d.attribute("allow_all_outbound"), Some(&Value::Bool(true)));
        assert!(d.attribute("missing").is_none());
    }

    #[test]
    fn attributes_iterate_in_sorted_order() {
        let d = Descriptor::new("t", "n")
            .with_attribute("zeta", 1)
            .with_attribute("alpha", 2)
            .with_attribute("mid", 3);

        let keys: Vec<_> = d.attributes.keys().cloned().collect();
        assert_eq!(keys, vec!["alpha", "mid", "zeta"]);
    }
}
