//! Graph-level errors

use crate::resource::ResourceId;

/// Errors detected while validating an assembled graph
#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphError {
    #[error("dependency cycle involving {0}")]
    Cycle(ResourceId),

    #[error("{source_id} references node index {target} which is not in this graph")]
    DanglingReference { source_id: ResourceId, target: usize },

    #[error("duplicate resource {0}")]
    Duplicate(ResourceId),
}
