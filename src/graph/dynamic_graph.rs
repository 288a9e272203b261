use crate::error::{Error, Result};
use crate::graph::{ArcId, Attribute, Element, GraphEvent, Network, NodeId};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::mpsc::{channel, Receiver, Sender};

struct NodeData<Flow> {
    attributes: FxHashMap<String, Attribute<Flow>>,
    out_arcs: Vec<ArcId>,
    in_arcs: Vec<ArcId>,
}

struct ArcData<Flow> {
    from: NodeId,
    to: NodeId,
    attributes: FxHashMap<String, Attribute<Flow>>,
}

/// In-memory directed multigraph with named attributes and a change feed.
///
/// Identifiers are handed out in increasing order and never reused, so an id that was removed
/// stays invalid for the lifetime of the graph (including across [`clear`](Self::clear)).
pub struct DynamicGraph<Flow> {
    nodes: BTreeMap<NodeId, NodeData<Flow>>,
    arcs: BTreeMap<ArcId, ArcData<Flow>>,
    next_node_id: usize,
    next_arc_id: usize,
    subscribers: Vec<Sender<GraphEvent<Flow>>>,
}

impl<Flow> Default for DynamicGraph<Flow> {
    fn default() -> Self {
        Self { nodes: BTreeMap::new(), arcs: BTreeMap::new(), next_node_id: 0, next_arc_id: 0, subscribers: Vec::new() }
    }
}

impl<Flow> DynamicGraph<Flow>
where
    Flow: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    pub fn add_node(&mut self) -> NodeId {
        let node = NodeId(self.next_node_id);
        self.next_node_id += 1;
        self.nodes.insert(node, NodeData { attributes: FxHashMap::default(), out_arcs: Vec::new(), in_arcs: Vec::new() });
        self.broadcast(GraphEvent::NodeAdded(node));
        node
    }

    pub fn add_nodes(&mut self, num_nodes: usize) -> Vec<NodeId> {
        (0..num_nodes).map(|_| self.add_node()).collect()
    }

    pub fn add_arc(&mut self, from: NodeId, to: NodeId) -> Result<ArcId> {
        for node in [from, to] {
            if !self.nodes.contains_key(&node) {
                return Err(Error::UnknownNode(node));
            }
        }

        let arc = ArcId(self.next_arc_id);
        self.next_arc_id += 1;
        self.arcs.insert(arc, ArcData { from, to, attributes: FxHashMap::default() });
        if let Some(data) = self.nodes.get_mut(&from) {
            data.out_arcs.push(arc);
        }
        if let Some(data) = self.nodes.get_mut(&to) {
            data.in_arcs.push(arc);
        }
        self.broadcast(GraphEvent::ArcAdded { arc, from, to });
        Ok(arc)
    }

    pub fn remove_arc(&mut self, arc: ArcId) -> Result<()> {
        let data = self.arcs.remove(&arc).ok_or(Error::UnknownArc(arc))?;
        if let Some(node) = self.nodes.get_mut(&data.from) {
            node.out_arcs.retain(|&a| a != arc);
        }
        if let Some(node) = self.nodes.get_mut(&data.to) {
            node.in_arcs.retain(|&a| a != arc);
        }
        self.broadcast(GraphEvent::ArcRemoved(arc));
        Ok(())
    }

    /// Removes `node` together with every arc touching it; subscribers see the arc removals first.
    pub fn remove_node(&mut self, node: NodeId) -> Result<()> {
        let data = self.nodes.get(&node).ok_or(Error::UnknownNode(node))?;
        let mut incident: Vec<ArcId> = data.out_arcs.iter().chain(data.in_arcs.iter()).copied().collect();
        incident.sort_unstable();
        incident.dedup();

        for arc in incident {
            self.remove_arc(arc)?;
        }
        self.nodes.remove(&node);
        self.broadcast(GraphEvent::NodeRemoved(node));
        Ok(())
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.arcs.clear();
        self.broadcast(GraphEvent::Cleared);
    }

    pub fn out_arcs(&self, node: NodeId) -> Result<&[ArcId]> {
        self.nodes.get(&node).map(|data| data.out_arcs.as_slice()).ok_or(Error::UnknownNode(node))
    }

    pub fn in_arcs(&self, node: NodeId) -> Result<&[ArcId]> {
        self.nodes.get(&node).map(|data| data.in_arcs.as_slice()).ok_or(Error::UnknownNode(node))
    }

    /// First arc from `from` to `to` in id order.
    pub fn arc_between(&self, from: NodeId, to: NodeId) -> Result<ArcId> {
        let data = self.nodes.get(&from).ok_or(Error::UnknownNode(from))?;
        if !self.nodes.contains_key(&to) {
            return Err(Error::UnknownNode(to));
        }
        data.out_arcs
            .iter()
            .copied()
            .filter(|arc| self.arcs.get(arc).is_some_and(|a| a.to == to))
            .min()
            .ok_or(Error::ArcNotFound { from, to })
    }

    pub fn set_node_attribute(&mut self, node: NodeId, name: &str, value: impl Into<Attribute<Flow>>) -> Result<()> {
        let data = self.nodes.get_mut(&node).ok_or(Error::UnknownNode(node))?;
        let new = value.into();
        let old = data.attributes.insert(name.to_string(), new.clone());
        self.broadcast(GraphEvent::AttributeChanged { element: Element::Node(node), name: name.to_string(), old, new: Some(new) });
        Ok(())
    }

    pub fn set_arc_attribute(&mut self, arc: ArcId, name: &str, value: impl Into<Attribute<Flow>>) -> Result<()> {
        let data = self.arcs.get_mut(&arc).ok_or(Error::UnknownArc(arc))?;
        let new = value.into();
        let old = data.attributes.insert(name.to_string(), new.clone());
        self.broadcast(GraphEvent::AttributeChanged { element: Element::Arc(arc), name: name.to_string(), old, new: Some(new) });
        Ok(())
    }

    pub fn remove_node_attribute(&mut self, node: NodeId, name: &str) -> Result<Option<Attribute<Flow>>> {
        let data = self.nodes.get_mut(&node).ok_or(Error::UnknownNode(node))?;
        let old = data.attributes.remove(name);
        if old.is_some() {
            self.broadcast(GraphEvent::AttributeChanged { element: Element::Node(node), name: name.to_string(), old: old.clone(), new: None });
        }
        Ok(old)
    }

    pub fn remove_arc_attribute(&mut self, arc: ArcId, name: &str) -> Result<Option<Attribute<Flow>>> {
        let data = self.arcs.get_mut(&arc).ok_or(Error::UnknownArc(arc))?;
        let old = data.attributes.remove(name);
        if old.is_some() {
            self.broadcast(GraphEvent::AttributeChanged { element: Element::Arc(arc), name: name.to_string(), old: old.clone(), new: None });
        }
        Ok(old)
    }

    fn broadcast(&mut self, event: GraphEvent<Flow>) {
        // a failed send means the receiving engine was dropped
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl<Flow> Network<Flow> for DynamicGraph<Flow>
where
    Flow: Clone,
{
    fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    fn arcs(&self) -> impl Iterator<Item = ArcId> + '_ {
        self.arcs.keys().copied()
    }

    fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn contains_arc(&self, arc: ArcId) -> bool {
        self.arcs.contains_key(&arc)
    }

    fn endpoints(&self, arc: ArcId) -> Option<(NodeId, NodeId)> {
        self.arcs.get(&arc).map(|data| (data.from, data.to))
    }

    fn node_attribute(&self, node: NodeId, name: &str) -> Option<&Attribute<Flow>> {
        self.nodes.get(&node)?.attributes.get(name)
    }

    fn arc_attribute(&self, arc: ArcId, name: &str) -> Option<&Attribute<Flow>> {
        self.arcs.get(&arc)?.attributes.get(name)
    }

    fn set_arc_attribute(&mut self, arc: ArcId, name: &str, value: Attribute<Flow>) -> Result<()> {
        DynamicGraph::set_arc_attribute(self, arc, name, value)
    }

    fn subscribe(&mut self) -> Receiver<GraphEvent<Flow>> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_node_emits_arc_removals_first() {
        let mut graph = DynamicGraph::<i64>::new();
        let nodes = graph.add_nodes(3);
        let a = graph.add_arc(nodes[0], nodes[1]).unwrap();
        let b = graph.add_arc(nodes[2], nodes[0]).unwrap();
        let c = graph.add_arc(nodes[1], nodes[2]).unwrap();

        let rx = graph.subscribe();
        graph.remove_node(nodes[0]).unwrap();

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events, vec![GraphEvent::ArcRemoved(a), GraphEvent::ArcRemoved(b), GraphEvent::NodeRemoved(nodes[0])]);
        assert!(graph.contains_arc(c));
        assert_eq!(graph.num_arcs(), 1);
        assert_eq!(graph.out_arcs(nodes[2]).unwrap(), &[] as &[ArcId]);
    }

    #[test]
    fn attribute_changes_carry_old_and_new_values() {
        let mut graph = DynamicGraph::<i64>::new();
        let u = graph.add_node();
        let rx = graph.subscribe();

        graph.set_node_attribute(u, "supply", 3_i64).unwrap();
        graph.set_node_attribute(u, "supply", "three").unwrap();
        graph.remove_node_attribute(u, "supply").unwrap();
        graph.remove_node_attribute(u, "supply").unwrap();

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[1],
            GraphEvent::AttributeChanged {
                element: Element::Node(u),
                name: "supply".to_string(),
                old: Some(Attribute::Number(3)),
                new: Some(Attribute::Text("three".to_string())),
            }
        );
        assert_eq!(graph.node_attribute(u, "supply"), None);
    }

    #[test]
    fn arc_between_reports_missing_adjacency() {
        let mut graph = DynamicGraph::<i64>::new();
        let nodes = graph.add_nodes(3);
        let a = graph.add_arc(nodes[0], nodes[1]).unwrap();
        graph.add_arc(nodes[0], nodes[1]).unwrap();

        assert_eq!(graph.arc_between(nodes[0], nodes[1]), Ok(a));
        assert_eq!(graph.arc_between(nodes[1], nodes[0]), Err(Error::ArcNotFound { from: nodes[1], to: nodes[0] }));
        assert_eq!(graph.arc_between(nodes[0], NodeId(42)), Err(Error::UnknownNode(NodeId(42))));
        assert_eq!(graph.add_arc(nodes[2], NodeId(42)), Err(Error::UnknownNode(NodeId(42))));
    }

    #[test]
    fn dropped_subscribers_are_forgotten() {
        let mut graph = DynamicGraph::<i64>::new();
        let rx = graph.subscribe();
        drop(rx);
        graph.add_node();
        assert!(graph.subscribers.is_empty());
    }
}
