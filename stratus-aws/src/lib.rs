//! Stratus AWS
//!
//! Resource-group builders for a private RDS Postgres analytics stack:
//! network, database, access layer, one-shot initializer, scheduled query
//! function, QuickSight-facing security group, and an operator bastion.
//! Each builder is a pure function appending immutable descriptors to a
//! [`stratus_core::graph::Graph`] and returning typed handles; the
//! assembler in [`stack`] wires them together in dependency order.

pub mod access;
pub mod bastion;
pub mod database;
pub mod error;
pub mod initializer;
pub mod network;
pub mod query;
pub mod quicksight;
pub mod schedule;
pub mod schemas;
pub mod stack;
pub mod types;

pub use error::BuildError;
pub use stack::{DeployEnv, RoleStrategy, Stack, StackConfig, assemble};
