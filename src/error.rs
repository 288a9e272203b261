use crate::graph::{ArcId, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("arc {0} does not exist")]
    UnknownArc(ArcId),
    #[error("no arc from {from} to {to}")]
    ArcNotFound { from: NodeId, to: NodeId },
    #[error("pivot limit of {limit} exceeded before reaching optimality")]
    PivotLimitExceeded { limit: usize },
    #[error("shortest path source {0} is not part of the graph")]
    SourceNotFound(NodeId),
}

pub type Result<T> = std::result::Result<T, Error>;
