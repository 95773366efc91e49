//! Downstream-access builder
//!
//! Security group for the external analytics consumer (QuickSight).
//! Members of the shared group may reach members of this group on all
//! TCP ports. That is deliberately broader than the port-specific
//! internal rule: the source trades least-privilege for consumer
//! convenience here, and the grant is reproduced as-is.

use stratus_core::graph::{Graph, NodeId};
use stratus_core::resource::{Descriptor, Value};

use crate::error::BuildError;
use crate::network::Network;
use crate::types::{RuleSource, ingress_rule};

/// Handle to the downstream-access security group
#[derive(Debug, Clone)]
pub struct DownstreamAccess {
    pub security_group: NodeId,
}

pub fn build(graph: &mut Graph, network: &Network) -> Result<DownstreamAccess, BuildError> {
    let security_group = graph.add(
        Descriptor::new("security_group", "quicksight")
            .with_attribute("vpc_id", Value::reference(network.vpc, "id"))
            .with_attribute("allow_all_outbound", true),
    );

    // All TCP ports, scoped to shared-group membership
    graph.add(ingress_rule(
        "quicksight-all-tcp",
        security_group,
        RuleSource::Group(network.security_group),
        "tcp",
        0,
        65535,
    ));

    Ok(DownstreamAccess { security_group })
}
