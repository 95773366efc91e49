//! Shared vocabulary for the AWS builders

use stratus_core::graph::NodeId;
use stratus_core::resource::{Descriptor, Value};

/// Default Postgres port; the only port the shared security group opens
/// internally
pub const DATABASE_PORT: i64 = 5432;

/// Runtime/architecture pair used by every packaged function
pub const PYTHON_RUNTIME: &str = "python3.12";
pub const ARM64: &str = "arm64";

/// Subnet tier of the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubnetTier {
    /// No route to the public internet in either direction
    Isolated,
    /// Outbound-only internet access via the NAT gateway
    Egress,
    /// Directly routable
    Public,
}

impl SubnetTier {
    pub const ALL: [SubnetTier; 3] = [SubnetTier::Isolated, SubnetTier::Egress, SubnetTier::Public];

    pub fn as_str(self) -> &'static str {
        match self {
            SubnetTier::Isolated => "isolated",
            SubnetTier::Egress => "egress",
            SubnetTier::Public => "public",
        }
    }
}

/// Source scope of a security-group rule
#[derive(Debug, Clone)]
pub enum RuleSource {
    /// Any IPv4 address
    AnyIpv4,
    /// Members of another security group
    Group(NodeId),
    /// A CIDR block
    Cidr(String),
}

impl RuleSource {
    fn to_value(&self) -> Value {
        match self {
            RuleSource::AnyIpv4 => Value::map([("any_ipv4", Value::Bool(true))]),
            RuleSource::Group(sg) => {
                Value::map([("security_group", Value::reference(*sg, "id"))])
            }
            RuleSource::Cidr(cidr) => Value::map([("cidr", Value::String(cidr.clone()))]),
        }
    }
}

/// Descriptor for one ingress rule on a security group.
///
/// Rules are their own nodes rather than inline attributes so a rule can
/// reference the group it belongs to (including the self-scoped internal
/// rule) without mutating an already-added descriptor.
pub fn ingress_rule(
    name: &str,
    security_group: NodeId,
    source: RuleSource,
    protocol: &str,
    from_port: i64,
    to_port: i64,
) -> Descriptor {
    Descriptor::new("security_group_rule", name)
        .with_attribute("security_group_id", Value::reference(security_group, "id"))
        .with_attribute("direction", "ingress")
        .with_attribute("protocol", protocol)
        .with_attribute("from_port", from_port)
        .with_attribute("to_port", to_port)
        .with_attribute("source", source.to_value())
}

/// Packaging instructions shared by both function bundles: install the
/// dependency manifest into the asset output, then copy the handler in
pub fn bundling_spec() -> Value {
    Value::map([
        ("image", Value::String(format!("{PYTHON_RUNTIME}-build"))),
        (
            "command",
            Value::String(
                "pip install -r requirements.txt -t /asset-output && cp -au . /asset-output"
                    .to_string(),
            ),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_core::graph::Graph;

    #[test]
    fn ingress_rule_references_its_group() {
        let mut graph = Graph::new();
        let sg = graph.add(Descriptor::new("security_group", "shared"));
        let rule = graph.add(ingress_rule(
            "internal-database",
            sg,
            RuleSource::Group(sg),
            "tcp",
            DATABASE_PORT,
            DATABASE_PORT,
        ));

        assert_eq!(graph.dependencies_of(rule), vec![sg]);
        let descriptor = graph.descriptor(rule);
        assert_eq!(descriptor.attribute("from_port"), Some(&Value::Int(5432)));
        assert_eq!(
            descriptor.attribute("direction"),
            Some(&Value::String("ingress".to_string()))
        );
    }

    #[test]
    fn rule_sources_render_distinctly() {
        let mut graph = Graph::new();
        let sg = graph.add(Descriptor::new("security_group", "shared"));

        let any = RuleSource::AnyIpv4.to_value();
        let group = RuleSource::Group(sg).to_value();
        let cidr = RuleSource::Cidr("10.1.0.0/16".to_string()).to_value();

        assert_ne!(any, group);
        assert_ne!(group, cidr);
        assert_eq!(any, Value::map([("any_ipv4", Value::Bool(true))]));
    }
}
