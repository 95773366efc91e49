//! Initializer builder
//!
//! One-shot provisioning hook that sets up the database schema: a
//! packaged function plus a custom-resource binding that the external
//! engine invokes exactly once per create operation. A non-success
//! response is a fatal deployment error; the custom resource carries an
//! ordering edge to the database instance so the hook never runs before
//! the database exists.

use stratus_core::graph::{Graph, NodeId};
use stratus_core::resource::{Descriptor, Value};

use crate::access::{AccessLayer, execution_role};
use crate::database::Database;
use crate::error::BuildError;
use crate::network::Network;
use crate::types::{ARM64, PYTHON_RUNTIME, SubnetTier, bundling_spec};

/// Handles produced by the initializer builder
#[derive(Debug, Clone)]
pub struct Initializer {
    pub function: NodeId,
    pub role: NodeId,
    pub provider: NodeId,
    pub custom_resource: NodeId,
}

/// Build the one-shot initializer. When `access` is `None` the builder
/// provisions its own credential-scoped role.
///
/// Connectivity to the database comes from membership in the shared
/// security group, whose internal rule already opens the database port
/// between members; no extra ingress rule is synthesized.
pub fn build(
    graph: &mut Graph,
    network: &Network,
    database: &Database,
    access: Option<&AccessLayer>,
) -> Result<Initializer, BuildError> {
    let (role, layer) = match access {
        Some(shared) => (shared.role, shared.layer),
        None => (
            graph.add(execution_role("initializer", database.secret, None)),
            None,
        ),
    };

    let mut function = Descriptor::new("lambda_function", "initialize-table")
        .with_attribute("code_path", "resources/initialize_lambda")
        .with_attribute("bundling", bundling_spec())
        .with_attribute("handler", "index.handler")
        .with_attribute("runtime", PYTHON_RUNTIME)
        .with_attribute("architecture", ARM64)
        .with_attribute("timeout_secs", 300)
        .with_attribute(
            "subnet_ids",
            Value::list(
                network
                    .subnets(SubnetTier::Egress)
                    .iter()
                    .map(|s| Value::reference(*s, "id")),
            ),
        )
        .with_attribute(
            "security_group_ids",
            Value::list([Value::reference(network.security_group, "id")]),
        )
        .with_attribute("role", Value::reference(role, "arn"))
        .with_attribute(
            "environment",
            Value::map([(
                "RDS_SECRET_NAME",
                Value::reference(database.secret, "name"),
            )]),
        );
    if let Some(layer) = layer {
        function = function.with_attribute("layers", Value::list([Value::reference(layer, "arn")]));
    }
    let function = graph.add(function);

    let provider = graph.add(
        Descriptor::new("custom_resource_provider", "initializer")
            .with_attribute("on_event_handler", Value::reference(function, "arn"))
            .with_attribute("log_retention_days", 7),
    );

    // Blocks provisioning until the handler reports success; must come
    // after the database instance it initializes
    let custom_resource = graph.add(
        Descriptor::new("custom_resource", "initialize-result")
            .with_attribute("service_token", Value::reference(provider, "service_token"))
            .with_depends_on(database.instance),
    );

    Ok(Initializer {
        function,
        role,
        provider,
        custom_resource,
    })
}
