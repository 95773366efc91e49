//! Resource schemas for construction-time validation
//!
//! Every descriptor the builders emit is validated against these schemas
//! by the assembler before synthesis. Unknown attributes are allowed;
//! missing required attributes and type mismatches abort assembly.

use stratus_core::graph::Graph;
use stratus_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::error::BuildError;

pub fn all_schemas() -> Vec<ResourceSchema> {
    vec![
        vpc(),
        subnet(),
        nat_gateway(),
        security_group(),
        security_group_rule(),
        db_instance(),
        db_secret(),
        iam_role(),
        lambda_function(),
        lambda_layer(),
        custom_resource_provider(),
        custom_resource(),
        schedule_rule(),
        ec2_instance(),
    ]
}

/// Validate every descriptor in a graph against its type's schema
pub fn validate_graph(graph: &Graph) -> Result<(), BuildError> {
    let schemas = all_schemas();
    let mut failures = Vec::new();

    for node in graph.nodes() {
        let descriptor = &node.descriptor;
        if let Some(schema) = schemas
            .iter()
            .find(|s| s.resource_type == descriptor.id.resource_type)
            && let Err(errors) = schema.validate(&descriptor.attributes)
        {
            for error in errors {
                failures.push(format!("{}: {}", descriptor.id, error));
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(BuildError::Validation(failures.join("\n")))
    }
}

fn tier() -> AttributeType {
    AttributeType::Enum(vec![
        "isolated".to_string(),
        "egress".to_string(),
        "public".to_string(),
    ])
}

fn protocol() -> AttributeType {
    AttributeType::Enum(vec![
        "tcp".to_string(),
        "udp".to_string(),
        "icmp".to_string(),
        "all".to_string(),
    ])
}

fn string_list() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::String))
}

fn vpc() -> ResourceSchema {
    ResourceSchema::new("vpc")
        .attribute(AttributeSchema::new("cidr_block", types::cidr()).required())
        .attribute(AttributeSchema::new("nat_gateways", types::positive_int()))
}

fn subnet() -> ResourceSchema {
    ResourceSchema::new("subnet")
        .attribute(AttributeSchema::new("vpc_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("cidr_block", types::cidr()).required())
        .attribute(AttributeSchema::new("tier", tier()).required())
        .attribute(AttributeSchema::new("az_index", AttributeType::Int))
        .attribute(AttributeSchema::new("nat_gateway_id", AttributeType::String))
}

fn nat_gateway() -> ResourceSchema {
    ResourceSchema::new("nat_gateway")
        .attribute(AttributeSchema::new("subnet_id", AttributeType::String).required())
}

fn security_group() -> ResourceSchema {
    ResourceSchema::new("security_group")
        .attribute(AttributeSchema::new("vpc_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("description", AttributeType::String))
        .attribute(AttributeSchema::new("allow_all_outbound", AttributeType::Bool))
}

fn security_group_rule() -> ResourceSchema {
    // `source` is a mixed-shape map (any_ipv4 | security_group | cidr);
    // it stays untyped here
    ResourceSchema::new("security_group_rule")
        .attribute(AttributeSchema::new("security_group_id", AttributeType::String).required())
        .attribute(
            AttributeSchema::new(
                "direction",
                AttributeType::Enum(vec!["ingress".to_string(), "egress".to_string()]),
            )
            .required(),
        )
        .attribute(AttributeSchema::new("protocol", protocol()).required())
        .attribute(AttributeSchema::new("from_port", types::port_number()).required())
        .attribute(AttributeSchema::new("to_port", types::port_number()).required())
}

fn db_instance() -> ResourceSchema {
    ResourceSchema::new("db_instance")
        .attribute(
            AttributeSchema::new("engine", AttributeType::Enum(vec!["postgres".to_string()]))
                .required(),
        )
        .attribute(AttributeSchema::new("engine_version", AttributeType::String))
        .attribute(AttributeSchema::new("instance_class", AttributeType::String).required())
        .attribute(AttributeSchema::new("subnet_ids", string_list()).required())
        .attribute(AttributeSchema::new("security_group_ids", string_list()).required())
        .attribute(AttributeSchema::new("port", types::port_number()).required())
        .attribute(AttributeSchema::new("multi_az", AttributeType::Bool))
        .attribute(AttributeSchema::new("backup_retention_days", types::positive_int()))
        .attribute(AttributeSchema::new("iam_authentication", AttributeType::Bool))
        .attribute(AttributeSchema::new("storage_encrypted", AttributeType::Bool))
}

fn db_secret() -> ResourceSchema {
    ResourceSchema::new("db_secret")
        .attribute(AttributeSchema::new("instance", AttributeType::String).required())
}

fn iam_role() -> ResourceSchema {
    // `statements` carries mixed-shape maps and stays untyped
    ResourceSchema::new("iam_role")
        .attribute(AttributeSchema::new("assumed_by", AttributeType::String).required())
        .attribute(AttributeSchema::new("managed_policies", string_list()))
}

fn lambda_function() -> ResourceSchema {
    ResourceSchema::new("lambda_function")
        .attribute(AttributeSchema::new("code_path", AttributeType::String).required())
        .attribute(AttributeSchema::new("handler", AttributeType::String).required())
        .attribute(
            AttributeSchema::new(
                "runtime",
                AttributeType::Enum(vec!["python3.12".to_string()]),
            )
            .required(),
        )
        .attribute(
            AttributeSchema::new(
                "architecture",
                AttributeType::Enum(vec!["arm64".to_string(), "x86_64".to_string()]),
            )
            .required(),
        )
        .attribute(AttributeSchema::new("timeout_secs", types::positive_int()).required())
        .attribute(AttributeSchema::new("subnet_ids", string_list()).required())
        .attribute(AttributeSchema::new("security_group_ids", string_list()))
        .attribute(AttributeSchema::new("role", AttributeType::String).required())
        .attribute(AttributeSchema::new(
            "environment",
            AttributeType::Map(Box::new(AttributeType::String)),
        ))
        .attribute(AttributeSchema::new("tracing", AttributeType::Bool))
        .attribute(AttributeSchema::new("layers", string_list()))
}

fn lambda_layer() -> ResourceSchema {
    ResourceSchema::new("lambda_layer")
        .attribute(AttributeSchema::new("version", AttributeType::String).required())
        .attribute(AttributeSchema::new("include_extras", AttributeType::Bool))
        .attribute(AttributeSchema::new("compatible_runtimes", string_list()))
}

fn custom_resource_provider() -> ResourceSchema {
    ResourceSchema::new("custom_resource_provider")
        .attribute(AttributeSchema::new("on_event_handler", AttributeType::String).required())
        .attribute(AttributeSchema::new("log_retention_days", types::positive_int()))
}

fn custom_resource() -> ResourceSchema {
    ResourceSchema::new("custom_resource")
        .attribute(AttributeSchema::new("service_token", AttributeType::String).required())
}

fn schedule_rule() -> ResourceSchema {
    ResourceSchema::new("schedule_rule")
        .attribute(AttributeSchema::new("schedule_expression", AttributeType::String).required())
        .attribute(AttributeSchema::new("targets", string_list()).required())
}

fn ec2_instance() -> ResourceSchema {
    ResourceSchema::new("ec2_instance")
        .attribute(AttributeSchema::new("instance_type", AttributeType::String).required())
        .attribute(AttributeSchema::new(
            "machine_image",
            AttributeType::Map(Box::new(AttributeType::String)),
        ))
        .attribute(AttributeSchema::new("subnet_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("security_group_ids", string_list()).required())
        .attribute(AttributeSchema::new("role", AttributeType::String))
        .attribute(AttributeSchema::new("init_commands", string_list()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_core::resource::Descriptor;

    #[test]
    fn every_emitted_resource_type_has_a_schema() {
        let names: Vec<String> = all_schemas()
            .into_iter()
            .map(|s| s.resource_type)
            .collect();
        for expected in [
            "vpc",
            "subnet",
            "nat_gateway",
            "security_group",
            "security_group_rule",
            "db_instance",
            "db_secret",
            "iam_role",
            "lambda_function",
            "lambda_layer",
            "custom_resource_provider",
            "custom_resource",
            "schedule_rule",
            "ec2_instance",
        ] {
            assert!(names.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn validate_graph_reports_missing_required_attributes() {
        let mut graph = Graph::new();
        // A vpc with no cidr_block
        graph.add(Descriptor::new("vpc", "broken"));

        let err = validate_graph(&graph).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("vpc.broken"));
        assert!(message.contains("cidr_block"));
    }

    #[test]
    fn validate_graph_accepts_unknown_types() {
        let mut graph = Graph::new();
        graph.add(Descriptor::new("something_else", "x"));
        assert!(validate_graph(&graph).is_ok());
    }
}
