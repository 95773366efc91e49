//! Graph - explicit DAG of resource descriptors
//!
//! Nodes are immutable descriptors; edges are derived from `Value::Ref`
//! attributes plus ordering-only `depends_on` entries. There is no
//! implicit registry: a node can only be referenced through the handle
//! returned when it was added.

use std::collections::{BTreeSet, HashMap};

use crate::error::GraphError;
use crate::resource::{Descriptor, ResourceId, Value};

/// Handle to a node in a [`Graph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A descriptor bound to its position in a graph
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub descriptor: Descriptor,
}

/// Directed acyclic graph of resource descriptors
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor and return its handle.
    ///
    /// Descriptors are never modified after this point.
    pub fn add(&mut self, descriptor: Descriptor) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { id, descriptor });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn descriptor(&self, id: NodeId) -> &Descriptor {
        &self.nodes[id.0].descriptor
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Find a node by resource type and name
    pub fn find(&self, resource_type: &str, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| {
                n.descriptor.id.resource_type == resource_type && n.descriptor.id.name == name
            })
            .map(|n| n.id)
    }

    /// All nodes of a given resource type, in insertion order
    pub fn of_type(&self, resource_type: &str) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.descriptor.id.resource_type == resource_type)
            .map(|n| n.id)
            .collect()
    }

    pub fn count_of_type(&self, resource_type: &str) -> usize {
        self.of_type(resource_type).len()
    }

    /// Direct dependencies of a node: referenced attributes plus
    /// `depends_on` entries, deduplicated and sorted
    pub fn dependencies_of(&self, id: NodeId) -> Vec<NodeId> {
        let mut targets = BTreeSet::new();
        let descriptor = self.descriptor(id);
        for value in descriptor.attributes.values() {
            collect_refs(value, &mut targets);
        }
        for target in &descriptor.depends_on {
            targets.insert(*target);
        }
        targets.into_iter().collect()
    }

    /// Nodes that depend on the given node
    pub fn dependents_of(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| self.dependencies_of(n.id).contains(&id))
            .map(|n| n.id)
            .collect()
    }

    /// Dependency-respecting order: every node appears after everything
    /// it references. Deterministic for a given graph (Kahn's algorithm
    /// with lowest node index first).
    pub fn topo_order(&self) -> Result<Vec<NodeId>, GraphError> {
        let mut in_degree: HashMap<NodeId, usize> = HashMap::new();
        let mut dependents: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

        for node in &self.nodes {
            let deps = self.dependencies_of(node.id);
            in_degree.insert(node.id, deps.len());
            for dep in deps {
                dependents.entry(dep).or_default().push(node.id);
            }
        }

        let mut ready: BTreeSet<NodeId> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(id) = ready.iter().next().copied() {
            ready.remove(&id);
            order.push(id);
            if let Some(deps) = dependents.get(&id) {
                for dependent in deps {
                    let degree = in_degree.get_mut(dependent).unwrap();
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if order.len() != self.nodes.len() {
            // Some node never reached zero in-degree: it sits on a cycle
            let stuck = self
                .nodes
                .iter()
                .find(|n| !order.contains(&n.id))
                .map(|n| n.descriptor.id.clone())
                .unwrap_or_else(|| ResourceId::new("unknown", "unknown"));
            return Err(GraphError::Cycle(stuck));
        }

        Ok(order)
    }

    pub fn has_cycle(&self) -> bool {
        self.topo_order().is_err()
    }

    /// Check structural invariants: every reference points into this
    /// graph, no two nodes share a (type, name), and no cycles exist
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut seen: BTreeSet<&ResourceId> = BTreeSet::new();
        for node in &self.nodes {
            if !seen.insert(&node.descriptor.id) {
                return Err(GraphError::Duplicate(node.descriptor.id.clone()));
            }
            for target in self.dependencies_of(node.id) {
                if target.0 >= self.nodes.len() {
                    return Err(GraphError::DanglingReference {
                        source_id: node.descriptor.id.clone(),
                        target: target.0,
                    });
                }
            }
        }
        self.topo_order().map(|_| ())
    }
}

fn collect_refs(value: &Value, out: &mut BTreeSet<NodeId>) {
    match value {
        Value::Ref { target, .. } => {
            out.insert(*target);
        }
        Value::List(items) => {
            for item in items {
                collect_refs(item, out);
            }
        }
        Value::Map(map) => {
            for item in map.values() {
                collect_refs(item, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ref_to(target: NodeId) -> Value {
        Value::reference(target, "id")
    }

    #[test]
    fn add_returns_sequential_handles() {
        let mut graph = Graph::new();
        let a = graph.add(Descriptor::new("vpc", "main"));
        let b = graph.add(Descriptor::new("subnet", "isolated-a"));
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn dependencies_derived_from_refs_and_depends_on() {
        let mut graph = Graph::new();
        let vpc = graph.add(Descriptor::new("vpc", "main"));
        let sg = graph.add(Descriptor::new("security_group", "shared").with_attribute(
            "vpc_id",
            ref_to(vpc),
        ));
        let db = graph.add(
            Descriptor::new("db_instance", "database")
                .with_attribute("security_group_ids", Value::list([ref_to(sg)]))
                .with_depends_on(vpc),
        );

        assert_eq!(graph.dependencies_of(sg), vec![vpc]);
        assert_eq!(graph.dependencies_of(db), vec![vpc, sg]);
        assert_eq!(graph.dependents_of(vpc), vec![sg, db]);
    }

    #[test]
    fn topo_order_respects_edges() {
        let mut graph = Graph::new();
        let vpc = graph.add(Descriptor::new("vpc", "main"));
        let sg = graph
            .add(Descriptor::new("security_group", "shared").with_attribute("vpc_id", ref_to(vpc)));
        let db = graph
            .add(Descriptor::new("db_instance", "database").with_attribute("sg", ref_to(sg)));

        let order = graph.topo_order().unwrap();
        let pos = |id: NodeId| order.iter().position(|x| *x == id).unwrap();
        assert!(pos(vpc) < pos(sg));
        assert!(pos(sg) < pos(db));
    }

    #[test]
    fn nested_refs_are_collected() {
        let mut graph = Graph::new();
        let secret = graph.add(Descriptor::new("db_secret", "credential"));
        let func = graph.add(Descriptor::new("lambda_function", "query").with_attribute(
            "environment",
            Value::map([("RDS_SECRET_NAME", Value::reference(secret, "name"))]),
        ));

        assert_eq!(graph.dependencies_of(func), vec![secret]);
    }

    #[test]
    fn cycle_is_detected() {
        // Self-reference is the smallest cycle constructible without
        // forging handles
        let mut graph = Graph::new();
        let first = graph.add(Descriptor::new("a", "a"));
        let second =
            graph.add(Descriptor::new("b", "b").with_attribute("other", ref_to(first)));
        // Rebuild with the edge reversed as well
        let mut cyclic = Graph::new();
        let a = cyclic.add(Descriptor::new("a", "a").with_attribute("other", ref_to(second)));
        cyclic.add(Descriptor::new("b", "b").with_attribute("other", ref_to(a)));

        assert!(!graph.has_cycle());
        assert!(cyclic.has_cycle());
        assert!(matches!(cyclic.validate(), Err(GraphError::Cycle(_))));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut graph = Graph::new();
        graph.add(Descriptor::new("vpc", "main"));
        graph.add(Descriptor::new("vpc", "main"));
        assert!(matches!(graph.validate(), Err(GraphError::Duplicate(_))));
    }

    #[test]
    fn find_and_count_by_type() {
        let mut graph = Graph::new();
        let vpc = graph.add(Descriptor::new("vpc", "main"));
        graph.add(Descriptor::new("subnet", "isolated-a"));
        graph.add(Descriptor::new("subnet", "isolated-b"));

        assert_eq!(graph.find("vpc", "main"), Some(vpc));
        assert_eq!(graph.find("vpc", "other"), None);
        assert_eq!(graph.count_of_type("subnet"), 2);
    }
}
