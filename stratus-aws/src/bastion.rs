//! Bastion builder
//!
//! Operator-access instance in the egress-enabled tier: SSH open to any
//! IPv4 address (an operator-convenience tradeoff carried over from the
//! source deployment), membership in the downstream-access group,
//! session-manager role with no embedded credentials, and a fixed
//! first-boot command sequence that installs a database client.

use stratus_core::graph::{Graph, NodeId};
use stratus_core::resource::{Descriptor, Value};

use crate::error::BuildError;
use crate::network::Network;
use crate::quicksight::DownstreamAccess;
use crate::types::{RuleSource, SubnetTier, ingress_rule};

/// Commands run once at first boot, in order
const INIT_COMMANDS: [&str; 3] = [
    "yum update -y",
    "yum upgrade -y",
    "amazon-linux-extras install postgresql12",
];

/// Inputs to the bastion builder
#[derive(Debug, Clone)]
pub struct BastionConfig {
    pub instance_type: String,
    /// Bound on the first-boot command sequence
    pub init_timeout_secs: i64,
    /// Surface bootstrap output (and failure) through the provisioning
    /// engine's readiness signal
    pub print_init_log: bool,
}

impl Default for BastionConfig {
    fn default() -> Self {
        Self {
            instance_type: "c6g.medium".to_string(),
            init_timeout_secs: 1200,
            print_init_log: true,
        }
    }
}

/// Handles produced by the bastion builder
#[derive(Debug, Clone)]
pub struct Bastion {
    pub instance: NodeId,
    pub ssh_security_group: NodeId,
    pub role: NodeId,
}

pub fn build(
    graph: &mut Graph,
    network: &Network,
    downstream: &DownstreamAccess,
    config: &BastionConfig,
) -> Result<Bastion, BuildError> {
    let ssh_security_group = graph.add(
        Descriptor::new("security_group", "ssh")
            .with_attribute("vpc_id", Value::reference(network.vpc, "id"))
            .with_attribute("description", "Security group for SSH")
            .with_attribute("allow_all_outbound", true),
    );
    graph.add(ingress_rule(
        "ssh-any",
        ssh_security_group,
        RuleSource::AnyIpv4,
        "tcp",
        22,
        22,
    ));

    let role = graph.add(
        Descriptor::new("iam_role", "bastion")
            .with_attribute("assumed_by", "ec2.amazonaws.com")
            .with_attribute(
                "managed_policies",
                Value::list([Value::from("AmazonSSMManagedInstanceCore")]),
            ),
    );

    let instance = graph.add(
        Descriptor::new("ec2_instance", "bastion")
            .with_attribute("instance_type", config.instance_type.clone())
            .with_attribute(
                "machine_image",
                Value::map([
                    ("generation", Value::from("amazon-linux-2")),
                    ("cpu", Value::from("arm64")),
                ]),
            )
            .with_attribute(
                "subnet_id",
                Value::reference(network.subnets(SubnetTier::Egress)[0], "id"),
            )
            .with_attribute(
                "security_group_ids",
                Value::list([
                    Value::reference(downstream.security_group, "id"),
                    Value::reference(ssh_security_group, "id"),
                ]),
            )
            .with_attribute("role", Value::reference(role, "arn"))
            .with_attribute(
                "init_commands",
                Value::list(INIT_COMMANDS.iter().map(|c| Value::from(*c))),
            )
            .with_attribute(
                "init",
                Value::map([
                    ("timeout_secs", Value::Int(config.init_timeout_secs)),
                    ("include_url", Value::Bool(true)),
                    ("include_role", Value::Bool(true)),
                    ("print_log", Value::Bool(config.print_init_log)),
                ]),
            ),
    );

    Ok(Bastion {
        instance,
        ssh_security_group,
        role,
    })
}
