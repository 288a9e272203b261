pub mod attribute;
pub mod dynamic_graph;
pub mod event;
pub mod network;

pub use attribute::Attribute;
pub use dynamic_graph::DynamicGraph;
pub use event::GraphEvent;
pub use network::Network;

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeId(pub usize);

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ArcId(pub usize);

/// Either end of an attribute lookup: a node or an arc.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Element {
    Node(NodeId),
    Arc(ArcId),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for ArcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Node(node) => write!(f, "node {node}"),
            Element::Arc(arc) => write!(f, "arc {arc}"),
        }
    }
}
