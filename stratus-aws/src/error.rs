//! Builder errors

use stratus_core::error::GraphError;

/// Errors raised while building or validating the resource graph
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("CIDR {cidr} cannot hold {required} /{mask} subnets")]
    CidrExhausted {
        cidr: String,
        mask: u8,
        required: usize,
    },

    #[error("invalid CIDR block: {0}")]
    InvalidCidr(String),

    #[error("availability zone count must be at least 1")]
    NoAvailabilityZones,

    #[error("invalid schedule time {hour:02}:{minute:02}")]
    InvalidSchedule { hour: i64, minute: i64 },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("descriptor validation failed:\n{0}")]
    Validation(String),
}
