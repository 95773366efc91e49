//! Access-layer builder
//!
//! The shared execution role for the stack's functions, plus an optional
//! batteries-included runtime layer. The role's credential grant is
//! scoped to exactly the database credential's ARN, never a wildcard
//! across all secrets.

use stratus_core::graph::{Graph, NodeId};
use stratus_core::resource::{Descriptor, Value};

use crate::database::Database;
use crate::error::BuildError;

/// Managed policies attached to every function execution role
const EXECUTION_POLICIES: [&str; 2] = [
    "service-role/AWSLambdaBasicExecutionRole",
    "service-role/AWSLambdaVPCAccessExecutionRole",
];

/// Inputs to the access-layer builder
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Whether to provision the shared runtime layer
    pub include_layer: bool,
    pub layer_version: String,
    /// Include an identity-based connect grant for the `postgres` user.
    /// Set when the database profile has IAM authentication enabled.
    pub connect_grant: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            include_layer: true,
            layer_version: "1.22.0".to_string(),
            connect_grant: false,
        }
    }
}

/// Handles produced by the access-layer builder
#[derive(Debug, Clone)]
pub struct AccessLayer {
    pub role: NodeId,
    pub layer: Option<NodeId>,
}

pub fn build(
    graph: &mut Graph,
    database: &Database,
    config: &AccessConfig,
) -> Result<AccessLayer, BuildError> {
    let connect = config.connect_grant.then_some(database.instance);
    let role = graph.add(execution_role("shared", database.secret, connect));

    let layer = config.include_layer.then(|| {
        graph.add(
            Descriptor::new("lambda_layer", "powertools")
                .with_attribute("version", config.layer_version.clone())
                .with_attribute("include_extras", true)
                .with_attribute(
                    "compatible_runtimes",
                    Value::list([Value::from(crate::types::PYTHON_RUNTIME)]),
                ),
        )
    });

    Ok(AccessLayer { role, layer })
}

/// Execution role descriptor shared by the access layer and the
/// self-contained role strategies of the initializer and query builders.
///
/// The inline statement grants read on exactly one credential; when
/// `connect` names the database instance, an identity-based connect
/// statement for the `postgres` database user is added as well.
pub(crate) fn execution_role(name: &str, secret: NodeId, connect: Option<NodeId>) -> Descriptor {
    let mut statements = vec![Value::map([
        (
            "actions",
            Value::list([Value::from("secretsmanager:GetSecretValue")]),
        ),
        ("resources", Value::list([Value::reference(secret, "arn")])),
    ])];

    if let Some(instance) = connect {
        statements.push(Value::map([
            ("actions", Value::list([Value::from("rds-db:connect")])),
            (
                "resources",
                Value::list([Value::reference(instance, "connect_arn")]),
            ),
            ("db_user", Value::from("postgres")),
        ]));
    }

    Descriptor::new("iam_role", format!("{}-execution", name))
        .with_attribute("assumed_by", "lambda.amazonaws.com")
        .with_attribute("statements", Value::List(statements))
        .with_attribute(
            "managed_policies",
            Value::list(EXECUTION_POLICIES.iter().map(|p| Value::from(*p))),
        )
}
