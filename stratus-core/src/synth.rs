//! Synth - serializing a graph into a manifest
//!
//! The manifest is the unit of change handed to the external
//! diff-and-apply engine: the whole graph, resources in dependency
//! order, references rendered as `{"$ref", "attribute"}` objects.
//! Synthesis is deterministic: identical graphs produce byte-identical
//! manifests.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::graph::Graph;
use crate::resource::Value;

/// Serialized form of a descriptor graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version
    pub format_version: u32,
    /// Version of stratus that produced this manifest
    pub generator: String,
    /// Target account, if pinned at assembly time
    pub account: Option<String>,
    /// Target region, if pinned at assembly time
    pub region: Option<String>,
    /// Resources in dependency order
    pub resources: Vec<ManifestResource>,
}

/// One resource entry in a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestResource {
    pub resource_type: String,
    pub name: String,
    pub properties: serde_json::Value,
    /// Identifiers ("type.name") of every resource this one depends on
    pub depends_on: Vec<String>,
}

impl Manifest {
    /// Current manifest format version
    pub const CURRENT_VERSION: u32 = 1;

    /// Serialize a graph. Fails if the graph is not a DAG.
    pub fn from_graph(
        graph: &Graph,
        account: Option<String>,
        region: Option<String>,
    ) -> Result<Self, GraphError> {
        let order = graph.topo_order()?;

        let mut resources = Vec::with_capacity(graph.len());
        for id in order {
            let descriptor = graph.descriptor(id);

            let mut properties = serde_json::Map::new();
            for (key, value) in &descriptor.attributes {
                properties.insert(key.clone(), value_to_json(graph, value));
            }

            let depends_on = graph
                .dependencies_of(id)
                .into_iter()
                .map(|dep| graph.descriptor(dep).id.to_string())
                .collect();

            resources.push(ManifestResource {
                resource_type: descriptor.id.resource_type.clone(),
                name: descriptor.id.name.clone(),
                properties: serde_json::Value::Object(properties),
                depends_on,
            });
        }

        Ok(Self {
            format_version: Self::CURRENT_VERSION,
            generator: env!("CARGO_PKG_VERSION").to_string(),
            account,
            region,
            resources,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn find(&self, resource_type: &str, name: &str) -> Option<&ManifestResource> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.name == name)
    }
}

fn value_to_json(graph: &Graph, value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Int(n) => serde_json::Value::Number((*n).into()),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::List(items) => {
            serde_json::Value::Array(items.iter().map(|v| value_to_json(graph, v)).collect())
        }
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), value_to_json(graph, v)))
                .collect(),
        ),
        Value::Ref { target, attribute } => {
            serde_json::json!({
                "$ref": graph.descriptor(*target).id.to_string(),
                "attribute": attribute,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Descriptor;

    fn sample_graph() -> Graph {
        let mut graph = Graph::new();
        let vpc = graph.add(
            Descriptor::new("vpc", "main")
                .with_attribute("cidr_block", "10.0.0.0/16")
                .with_attribute("nat_gateways", 1),
        );
        graph.add(
            Descriptor::new("security_group", "shared")
                .with_attribute("vpc_id", Value::reference(vpc, "id")),
        );
        graph
    }

    #[test]
    fn manifest_orders_resources_by_dependency() {
        let manifest = Manifest::from_graph(&sample_graph(), None, None).unwrap();
        assert_eq!(manifest.resources.len(), 2);
        assert_eq!(manifest.resources[0].resource_type, "vpc");
        assert_eq!(manifest.resources[1].resource_type, "security_group");
        assert_eq!(manifest.resources[1].depends_on, vec!["vpc.main"]);
    }

    #[test]
    fn references_render_as_ref_objects() {
        let manifest = Manifest::from_graph(&sample_graph(), None, None).unwrap();
        let sg = manifest.find("security_group", "shared").unwrap();
        assert_eq!(
            sg.properties["vpc_id"],
            serde_json::json!({"$ref": "vpc.main", "attribute": "id"})
        );
    }

    #[test]
    fn synthesis_is_deterministic() {
        let a = Manifest::from_graph(&sample_graph(), None, None).unwrap();
        let b = Manifest::from_graph(&sample_graph(), None, None).unwrap();
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }

    #[test]
    fn manifest_round_trips_through_json() {
        let manifest = Manifest::from_graph(
            &sample_graph(),
            Some("123456789012".to_string()),
            Some("ap-northeast-1".to_string()),
        )
        .unwrap();

        let json = manifest.to_json().unwrap();
        let parsed: Manifest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, manifest);
        assert_eq!(parsed.format_version, Manifest::CURRENT_VERSION);
        assert_eq!(parsed.account.as_deref(), Some("123456789012"));
    }
}
