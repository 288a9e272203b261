use crate::graph::{ArcId, Attribute, Element, NodeId};

/// A single mutation of a [`DynamicGraph`](crate::graph::DynamicGraph), as delivered to subscribers.
#[derive(Clone, PartialEq, Debug)]
pub enum GraphEvent<Flow> {
    NodeAdded(NodeId),
    NodeRemoved(NodeId),
    ArcAdded { arc: ArcId, from: NodeId, to: NodeId },
    ArcRemoved(ArcId),
    AttributeChanged { element: Element, name: String, old: Option<Attribute<Flow>>, new: Option<Attribute<Flow>> },
    Cleared,
}
