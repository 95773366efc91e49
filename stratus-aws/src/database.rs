//! Database builder
//!
//! One managed Postgres instance placed in the isolated subnet tier and
//! attached to the shared security group, plus the engine-generated
//! credential exposed as its own node. The two engine profiles observed
//! in the deployment's history are mutually exclusive and selected once
//! at assembly time.

use stratus_core::graph::{Graph, NodeId};
use stratus_core::resource::{Descriptor, Value};

use crate::error::BuildError;
use crate::network::Network;
use crate::types::SubnetTier;

/// Engine/authentication profile. Variants must not be mixed: either the
/// pinned-version identity-auth generation or the latest-version
/// credential-only one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineProfile {
    /// Engine pinned to 16.6, IAM authentication, storage encryption
    FixedVersionIamAuth,
    /// Latest engine version, credential-based authentication only
    LatestVersionSecretAuth,
}

impl EngineProfile {
    pub fn engine_version(self) -> Option<&'static str> {
        match self {
            EngineProfile::FixedVersionIamAuth => Some("16.6"),
            EngineProfile::LatestVersionSecretAuth => None,
        }
    }

    pub fn iam_authentication(self) -> bool {
        matches!(self, EngineProfile::FixedVersionIamAuth)
    }

    pub fn storage_encrypted(self) -> bool {
        matches!(self, EngineProfile::FixedVersionIamAuth)
    }
}

/// Inputs to the database builder
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub profile: EngineProfile,
    pub instance_class: String,
    pub backup_retention_days: i64,
    pub multi_az: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            profile: EngineProfile::FixedVersionIamAuth,
            instance_class: "db.t4g.large".to_string(),
            backup_retention_days: 21,
            multi_az: false,
        }
    }
}

/// Handles to the database's nodes
#[derive(Debug, Clone)]
pub struct Database {
    pub instance: NodeId,
    /// Credential generated alongside the instance; consumers need an
    /// explicit read grant on exactly this node's ARN
    pub secret: NodeId,
    pub port: i64,
    pub profile: EngineProfile,
}

pub fn build(
    graph: &mut Graph,
    network: &Network,
    config: &DatabaseConfig,
) -> Result<Database, BuildError> {
    let profile = config.profile;

    // Placement is always the isolated tier, never public or egress
    let subnet_ids = Value::list(
        network
            .subnets(SubnetTier::Isolated)
            .iter()
            .map(|s| Value::reference(*s, "id")),
    );

    let mut descriptor = Descriptor::new("db_instance", "database")
        .with_attribute("engine", "postgres")
        .with_attribute("instance_class", config.instance_class.clone())
        .with_attribute("subnet_ids", subnet_ids)
        .with_attribute(
            "security_group_ids",
            Value::list([Value::reference(network.security_group, "id")]),
        )
        .with_attribute("port", network.database_port)
        .with_attribute("multi_az", config.multi_az)
        .with_attribute("allow_major_version_upgrade", true)
        .with_attribute("auto_minor_version_upgrade", true)
        .with_attribute("backup_retention_days", config.backup_retention_days)
        .with_attribute("iam_authentication", profile.iam_authentication())
        .with_attribute("storage_encrypted", profile.storage_encrypted());

    if let Some(version) = profile.engine_version() {
        descriptor = descriptor.with_attribute("engine_version", version);
    }

    let instance = graph.add(descriptor);

    let secret = graph.add(
        Descriptor::new("db_secret", "database-credential")
            .with_attribute("instance", Value::reference(instance, "id")),
    );

    Ok(Database {
        instance,
        secret,
        port: network.database_port,
        profile,
    })
}
