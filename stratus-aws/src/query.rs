//! Query builder
//!
//! The recurring query function: read access to the database credential,
//! network connectivity to the database port through the shared security
//! group, tracing enabled, and the database endpoint exposed through its
//! environment. Role provisioning follows one of two strategies: shared
//! (an [`AccessLayer`] is passed in) or self-contained (the builder makes
//! its own credential-scoped role). They do not compose.

use stratus_core::graph::{Graph, NodeId};
use stratus_core::resource::{Descriptor, Value};

use crate::access::{AccessLayer, execution_role};
use crate::database::Database;
use crate::error::BuildError;
use crate::network::Network;
use crate::types::{ARM64, PYTHON_RUNTIME, SubnetTier, bundling_spec};

/// Handles produced by the query builder
#[derive(Debug, Clone)]
pub struct QueryFunction {
    pub function: NodeId,
    pub role: NodeId,
}

pub fn build(
    graph: &mut Graph,
    network: &Network,
    database: &Database,
    access: Option<&AccessLayer>,
) -> Result<QueryFunction, BuildError> {
    let (role, layer) = match access {
        Some(shared) => (shared.role, shared.layer),
        None => {
            // Self-contained strategy: own role, with the identity-based
            // connect grant when the engine profile supports it
            let connect = database
                .profile
                .iam_authentication()
                .then_some(database.instance);
            (
                graph.add(execution_role("query", database.secret, connect)),
                None,
            )
        }
    };

    let mut function = Descriptor::new("lambda_function", "query")
        .with_attribute("code_path", "resources/query_lambda")
        .with_attribute("bundling", bundling_spec())
        .with_attribute("handler", "index.handler")
        .with_attribute("runtime", PYTHON_RUNTIME)
        .with_attribute("architecture", ARM64)
        .with_attribute("timeout_secs", 300)
        .with_attribute("tracing", true)
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
            Value::map([
                (
                    "RDS_SECRET_NAME",
                    Value::reference(database.secret, "name"),
                ),
                (
                    "DB_HOST",
                    Value::reference(database.instance, "endpoint_address"),
                ),
                (
                    "DB_PORT",
                    Value::reference(database.instance, "endpoint_port"),
                ),
            ]),
        );
    if let Some(layer) = layer {
        function = function.with_attribute("layers", Value::list([Value::reference(layer, "arn")]));
    }
    let function = graph.add(function);

    Ok(QueryFunction { function, role })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{self, AccessConfig};
    use crate::database::{self, DatabaseConfig, EngineProfile};
    use crate::network::{self, NetworkConfig};

    fn base(graph: &mut Graph) -> (Network, Database) {
        let net = network::build(graph, &NetworkConfig::default()).unwrap();
        let db = database::build(graph, &net, &DatabaseConfig::default()).unwrap();
        (net, db)
    }

    #[test]
    fn environment_exposes_credential_and_endpoint() {
        let mut graph = Graph::new();
        let (net, db) = base(&mut graph);
        let query = build(&mut graph, &net, &db, None).unwrap();

        let descriptor = graph.descriptor(query.function);
        let Some(Value::Map(env)) = descriptor.attribute("environment") else {
            panic!("missing environment");
        };
        assert_eq!(
            env.get("RDS_SECRET_NAME"),
            Some(&Value::reference(db.secret, "name"))
        );
        assert_eq!(
            env.get("DB_HOST"),
            Some(&Value::reference(db.instance, "endpoint_address"))
        );
        assert_eq!(
            env.get("DB_PORT"),
            Some(&Value::reference(db.instance, "endpoint_port"))
        );
        assert_eq!(descriptor.attribute("tracing"), Some(&Value::Bool(true)));
    }

    #[test]
    fn self_contained_role_when_no_access_layer_is_given() {
        let mut graph = Graph::new();
        let (net, db) = base(&mut graph);
        let query = build(&mut graph, &net, &db, None).unwrap();

        assert_eq!(graph.count_of_type("iam_role"), 1);
        assert_eq!(graph.descriptor(query.role).id.name, "query-execution");

        // IAM auth profile adds the connect grant to the own role
        let Some(Value::List(statements)) = graph.descriptor(query.role).attribute("statements")
        else {
            panic!("missing statements");
        };
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn secret_only_profile_gets_no_connect_grant() {
        let mut graph = Graph::new();
        let net = network::build(&mut graph, &NetworkConfig::default()).unwrap();
        let config = DatabaseConfig {
            profile: EngineProfile::LatestVersionSecretAuth,
            ..DatabaseConfig::default()
        };
        let db = database::build(&mut graph, &net, &config).unwrap();
        let query = build(&mut graph, &net, &db, None).unwrap();

        let Some(Value::List(statements)) = graph.descriptor(query.role).attribute("statements")
        else {
            panic!("missing statements");
        };
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn shared_strategy_attaches_the_given_role_and_layer() {
        let mut graph = Graph::new();
        let (net, db) = base(&mut graph);
        let shared = access::build(&mut graph, &db, &AccessConfig::default()).unwrap();
        let query = build(&mut graph, &net, &db, Some(&shared)).unwrap();

        assert_eq!(query.role, shared.role);
        assert_eq!(graph.count_of_type("iam_role"), 1);
        assert!(
            graph
                .dependencies_of(query.function)
                .contains(&shared.layer.unwrap())
        );
    }

    #[test]
    fn function_reaches_the_database_through_the_shared_group() {
        let mut graph = Graph::new();
        let (net, db) = base(&mut graph);
        let query = build(&mut graph, &net, &db, None).unwrap();

        let deps = graph.dependencies_of(query.function);
        assert!(deps.contains(&net.security_group));
        assert!(deps.contains(&db.instance));
        for subnet in &net.egress_subnets {
            assert!(deps.contains(subnet));
        }
    }
}
