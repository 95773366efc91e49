//! Network builder
//!
//! One VPC with three subnet tiers (isolated, egress-enabled, public)
//! across two availability zones, exactly one NAT gateway for the egress
//! tier, and the shared security group whose only ingress rule allows
//! internal traffic on the database port between its own members.

use std::net::Ipv4Addr;

use stratus_core::graph::{Graph, NodeId};
use stratus_core::resource::{Descriptor, Value};
use stratus_core::schema::parse_cidr;

use crate::error::BuildError;
use crate::types::{DATABASE_PORT, RuleSource, SubnetTier, ingress_rule};

/// Inputs to the network builder
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub cidr: String,
    /// Prefix length of every subnet
    pub subnet_mask: u8,
    /// Number of availability zones each tier spans
    pub availability_zones: usize,
    pub database_port: i64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            cidr: "10.0.0.0/16".to_string(),
            subnet_mask: 24,
            availability_zones: 2,
            database_port: DATABASE_PORT,
        }
    }
}

/// Handles to the network's nodes
#[derive(Debug, Clone)]
pub struct Network {
    pub vpc: NodeId,
    pub isolated_subnets: Vec<NodeId>,
    pub egress_subnets: Vec<NodeId>,
    pub public_subnets: Vec<NodeId>,
    pub nat_gateway: NodeId,
    /// Shared security group; members may reach each other on
    /// `database_port` and nothing else
    pub security_group: NodeId,
    pub database_port: i64,
}

impl Network {
    /// Subnet handles for a tier, for placing later resources
    pub fn subnets(&self, tier: SubnetTier) -> &[NodeId] {
        match tier {
            SubnetTier::Isolated => &self.isolated_subnets,
            SubnetTier::Egress => &self.egress_subnets,
            SubnetTier::Public => &self.public_subnets,
        }
    }
}

pub fn build(graph: &mut Graph, config: &NetworkConfig) -> Result<Network, BuildError> {
    let (base, prefix) =
        parse_cidr(&config.cidr).map_err(BuildError::InvalidCidr)?;

    // Later builders place resources into the first subnet of a tier, so
    // every tier must hold at least one
    if config.availability_zones == 0 {
        return Err(BuildError::NoAvailabilityZones);
    }

    let required = SubnetTier::ALL.len() * config.availability_zones;
    if config.subnet_mask <= prefix || config.subnet_mask > 28 {
        return Err(BuildError::InvalidCidr(format!(
            "subnet mask /{} does not fit inside {}",
            config.subnet_mask, config.cidr
        )));
    }
    let capacity = 1u64 << (config.subnet_mask - prefix);
    if capacity < required as u64 {
        return Err(BuildError::CidrExhausted {
            cidr: config.cidr.clone(),
            mask: config.subnet_mask,
            required,
        });
    }

    let vpc = graph.add(
        Descriptor::new("vpc", "main")
            .with_attribute("cidr_block", config.cidr.clone())
            .with_attribute("nat_gateways", 1),
    );

    let mut block_index = 0u32;
    let mut subnet_tier = |graph: &mut Graph, tier: SubnetTier| -> Vec<NodeId> {
        (0..config.availability_zones)
            .map(|az| {
                let cidr = subnet_block(base, config.subnet_mask, block_index);
                block_index += 1;
                graph.add(
                    Descriptor::new("subnet", subnet_name(tier, az))
                        .with_attribute("vpc_id", Value::reference(vpc, "id"))
                        .with_attribute("cidr_block", cidr)
                        .with_attribute("tier", tier.as_str())
                        .with_attribute("az_index", az as i64),
                )
            })
            .collect()
    };

    let isolated_subnets = subnet_tier(graph, SubnetTier::Isolated);
    let public_subnets = subnet_tier(graph, SubnetTier::Public);

    // Exactly one NAT egress path, homed in the first public subnet
    let nat_gateway = graph.add(
        Descriptor::new("nat_gateway", "egress")
            .with_attribute("subnet_id", Value::reference(public_subnets[0], "id")),
    );

    let egress_subnets: Vec<NodeId> = (0..config.availability_zones)
        .map(|az| {
            let cidr = subnet_block(base, config.subnet_mask, block_index);
            block_index += 1;
            graph.add(
                Descriptor::new("subnet", subnet_name(SubnetTier::Egress, az))
                    .with_attribute("vpc_id", Value::reference(vpc, "id"))
                    .with_attribute("cidr_block", cidr)
                    .with_attribute("tier", SubnetTier::Egress.as_str())
                    .with_attribute("az_index", az as i64)
                    .with_attribute("nat_gateway_id", Value::reference(nat_gateway, "id")),
            )
        })
        .collect();

    let security_group = graph.add(
        Descriptor::new("security_group", "shared")
            .with_attribute("vpc_id", Value::reference(vpc, "id"))
            .with_attribute("description", "Security group for query workloads")
            .with_attribute("allow_all_outbound", true),
    );

    // Scoped to traffic between members of the shared group; not open to
    // arbitrary sources
    graph.add(ingress_rule(
        "internal-database",
        security_group,
        RuleSource::Group(security_group),
        "tcp",
        config.database_port,
        config.database_port,
    ));

    Ok(Network {
        vpc,
        isolated_subnets,
        egress_subnets,
        public_subnets,
        nat_gateway,
        security_group,
        database_port: config.database_port,
    })
}

fn subnet_name(tier: SubnetTier, az: usize) -> String {
    let suffix = (b'a' + az as u8) as char;
    format!("{}-{}", tier.as_str(), suffix)
}

fn subnet_block(base: Ipv4Addr, mask: u8, index: u32) -> String {
    let step = 1u32 << (32 - mask);
    let addr = u32::from(base) + index * step;
    format!("{}/{}", Ipv4Addr::from(addr), mask)
}
