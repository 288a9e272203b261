use crate::error::Result;
use crate::graph::{ArcId, Attribute, GraphEvent, NodeId};
use std::sync::mpsc::Receiver;

/// Topology and attribute store consumed by the flow engines.
///
/// Enumeration order must be deterministic: the engines number their internal arcs in the order
/// `arcs()` yields them, and pricing ties are broken by that numbering.
pub trait Network<Flow> {
    fn nodes(&self) -> impl Iterator<Item = NodeId> + '_;

    fn arcs(&self) -> impl Iterator<Item = ArcId> + '_;

    fn contains_node(&self, node: NodeId) -> bool;

    fn contains_arc(&self, arc: ArcId) -> bool;

    fn endpoints(&self, arc: ArcId) -> Option<(NodeId, NodeId)>;

    fn node_attribute(&self, node: NodeId, name: &str) -> Option<&Attribute<Flow>>;

    fn arc_attribute(&self, arc: ArcId, name: &str) -> Option<&Attribute<Flow>>;

    fn set_arc_attribute(&mut self, arc: ArcId, name: &str, value: Attribute<Flow>) -> Result<()>;

    /// Registers a new change feed; every later mutation is delivered to it in order.
    fn subscribe(&mut self) -> Receiver<GraphEvent<Flow>>;
}
