//! Stack assembler
//!
//! Instantiates the resource-group builders in dependency order (network,
//! database, access layer, initializer, query, schedule, downstream
//! access, bastion), threading handles between them, then validates the
//! graph and serializes it for the external diff-and-apply engine.

use std::env;

use stratus_core::error::GraphError;
use stratus_core::graph::Graph;
use stratus_core::synth::Manifest;

use crate::access::{self, AccessConfig, AccessLayer};
use crate::bastion::{self, Bastion, BastionConfig};
use crate::database::{self, Database, DatabaseConfig};
use crate::error::BuildError;
use crate::initializer::{self, Initializer};
use crate::network::{self, Network, NetworkConfig};
use crate::query::{self, QueryFunction};
use crate::quicksight::{self, DownstreamAccess};
use crate::schedule::{self, Schedule, ScheduleConfig};
use crate::schemas;

/// Target account and region, read from the process environment at
/// assembly time. Both are optional: an environment-agnostic manifest
/// is legal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployEnv {
    pub account: Option<String>,
    pub region: Option<String>,
}

impl DeployEnv {
    pub fn from_env() -> Self {
        Self {
            account: env::var("STRATUS_ACCOUNT").ok(),
            region: env::var("STRATUS_REGION").ok(),
        }
    }
}

/// How function execution roles are provisioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleStrategy {
    /// One shared role (and runtime layer) built by the access-layer
    /// builder and attached to both functions
    #[default]
    Shared,
    /// Each function builds its own credential-scoped role; no shared
    /// layer is provisioned
    SelfContained,
}

/// Full configuration of a deployment
#[derive(Debug, Clone, Default)]
pub struct StackConfig {
    pub env: DeployEnv,
    pub role_strategy: RoleStrategy,
    pub network: NetworkConfig,
    pub database: DatabaseConfig,
    pub access: AccessConfig,
    pub schedule: ScheduleConfig,
    pub bastion: BastionConfig,
}

/// An assembled, validated deployment graph with handles into it
#[derive(Debug, Clone)]
pub struct Stack {
    pub graph: Graph,
    pub network: Network,
    pub database: Database,
    pub access: Option<AccessLayer>,
    pub initializer: Initializer,
    pub query: QueryFunction,
    pub schedule: Schedule,
    pub downstream: DownstreamAccess,
    pub bastion: Bastion,
    env: DeployEnv,
}

impl Stack {
    /// Serialize the whole graph; the manifest is the unit of change
    pub fn manifest(&self) -> Result<Manifest, GraphError> {
        Manifest::from_graph(
            &self.graph,
            self.env.account.clone(),
            self.env.region.clone(),
        )
    }
}

/// Assemble the full stack from configuration
pub fn assemble(config: &StackConfig) -> Result<Stack, BuildError> {
    let mut graph = Graph::new();

    let network = network::build(&mut graph, &config.network)?;
    let database = database::build(&mut graph, &network, &config.database)?;

    let access = match config.role_strategy {
        RoleStrategy::Shared => {
            let access_config = AccessConfig {
                // The connect grant follows the engine profile
                connect_grant: config.database.profile.iam_authentication(),
                ..config.access.clone()
            };
            Some(access::build(&mut graph, &database, &access_config)?)
        }
        RoleStrategy::SelfContained => None,
    };

    let initializer = initializer::build(&mut graph, &network, &database, access.as_ref())?;
    let query = query::build(&mut graph, &network, &database, access.as_ref())?;
    let schedule = schedule::build(&mut graph, &query, &config.schedule)?;
    let downstream = quicksight::build(&mut graph, &network)?;
    let bastion = bastion::build(&mut graph, &network, &downstream, &config.bastion)?;

    graph.validate()?;
    schemas::validate_graph(&graph)?;

    Ok(Stack {
        graph,
        network,
        database,
        access,
        initializer,
        query,
        schedule,
        downstream,
        bastion,
        env: config.env.clone(),
    })
}
