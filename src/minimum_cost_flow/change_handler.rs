use crate::graph::{ArcId, Element, GraphEvent, Network, NodeId};
use crate::minimum_cost_flow::network_model::{NetworkModel, Quantity, SupplyConvention};
use crate::minimum_cost_flow::network_simplex::NetworkSimplex;
use crate::minimum_cost_flow::spanning_tree_structure::SpanningTreeStructure;
use num_traits::{Bounded, NumAssign};
use std::fmt::Debug;
use std::ops::Neg;

/// An event the engine cannot map onto its basis. Triggers a full rebuild.
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub(crate) enum Inconsistency {
    #[error("event refers to node {0} which the engine never saw")]
    UnknownNode(NodeId),
    #[error("event refers to arc {0} which the engine never saw")]
    UnknownArc(ArcId),
    #[error("removed node {0} is still tied into the basis")]
    NodeStillAttached(NodeId),
}

impl<Flow> NetworkSimplex<Flow>
where
    Flow: NumAssign + Bounded + Neg<Output = Flow> + Ord + Copy + Debug,
{
    /// Applies queued events in order. Returns whether the basis changed.
    ///
    /// Added elements and changed attributes are read from the current snapshot, so an event about
    /// an element the snapshot no longer holds is skipped; its removal event follows later in
    /// the queue.
    pub(crate) fn apply_events<G: Network<Flow>>(&mut self, graph: &G, events: Vec<GraphEvent<Flow>>) -> Result<bool, Inconsistency> {
        let num_events = events.len();
        let mut changed = false;
        for event in events {
            changed |= self.apply_event(graph, event)?;
        }
        if num_events > 0 {
            log::debug!("applied {num_events} change events");
        }
        Ok(changed)
    }

    fn apply_event<G: Network<Flow>>(&mut self, graph: &G, event: GraphEvent<Flow>) -> Result<bool, Inconsistency> {
        match event {
            GraphEvent::NodeAdded(node) => Ok(self.insert_node(graph, node)),
            GraphEvent::NodeRemoved(node) => self.delete_node(node),
            GraphEvent::ArcAdded { arc, from, to } => self.insert_arc(graph, arc, from, to),
            GraphEvent::ArcRemoved(arc) => Ok(self.delete_arc(arc)),
            GraphEvent::AttributeChanged { element: Element::Node(node), name, .. } => match self.model.node_quantity(&name) {
                Some(Quantity::Supply) if graph.contains_node(node) => {
                    let u = self.node_index.get(&node).copied().ok_or(Inconsistency::UnknownNode(node))?;
                    let supply = self.model.node_supply(graph, node);
                    Ok(self.st.change_supply(u, supply))
                }
                _ => Ok(false),
            },
            GraphEvent::AttributeChanged { element: Element::Arc(arc), name, .. } => {
                let Some(quantity) = self.model.arc_quantity(&name) else {
                    return Ok(false);
                };
                if !graph.contains_arc(arc) {
                    return Ok(false);
                }
                let arc_id = self.arc_index.get(&arc).copied().ok_or(Inconsistency::UnknownArc(arc))?;
                Ok(match quantity {
                    Quantity::Cost => {
                        let cost = self.model.arc_cost(graph, arc);
                        self.st.change_cost(arc_id, cost)
                    }
                    Quantity::Capacity => {
                        let upper = self.model.arc_capacity(graph, arc);
                        self.st.change_capacity(arc_id, upper)
                    }
                    Quantity::Supply => false,
                })
            }
            GraphEvent::Cleared => {
                self.st = SpanningTreeStructure::new();
                self.node_index.clear();
                self.arc_index.clear();
                Ok(true)
            }
        }
    }

    fn insert_node<G: Network<Flow>>(&mut self, graph: &G, node: NodeId) -> bool {
        if !graph.contains_node(node) || self.node_index.contains_key(&node) {
            return false;
        }

        let supply = match self.model.convention {
            SupplyConvention::Attribute => self.model.node_supply(graph, node),
            SupplyConvention::SingleSource(source) if source == node => {
                NetworkModel::count_sinks(self.node_index.keys().copied(), source)
            }
            SupplyConvention::SingleSource(source) => {
                if let Some(&s) = self.node_index.get(&source) {
                    let supply = self.st.nodes[s].supply + Flow::one();
                    self.st.change_supply(s, supply);
                }
                -Flow::one()
            }
        };

        let u = self.st.add_node(node, supply);
        self.node_index.insert(node, u);
        true
    }

    /// The feed removes incident arcs before the node itself, so by now the node is an isolated
    /// leaf of the root and only its supply has to be taken back.
    fn delete_node(&mut self, node: NodeId) -> Result<bool, Inconsistency> {
        let Some(&u) = self.node_index.get(&node) else {
            return Ok(false);
        };

        // only reached when the collaborator did not emit the arc removals first
        if self.st.nodes[u].degree > 0 {
            let mut incident: Vec<ArcId> = self
                .arc_index
                .iter()
                .filter(|&(_, &arc_id)| self.st.arcs[arc_id].from == u || self.st.arcs[arc_id].to == u)
                .map(|(&arc, _)| arc)
                .collect();
            incident.sort_unstable();
            for arc in incident {
                self.delete_arc(arc);
            }
        }

        self.st.change_supply(u, Flow::zero());
        if let SupplyConvention::SingleSource(source) = self.model.convention {
            if let Some(&s) = self.node_index.get(&source).filter(|&&s| s != u) {
                let supply = self.st.nodes[s].supply - Flow::one();
                self.st.change_supply(s, supply);
            }
        }

        if self.st.nodes[u].parent != self.st.root || self.st.num_successors[u] != 1 {
            return Err(Inconsistency::NodeStillAttached(node));
        }
        self.st.remove_leaf(u);
        self.node_index.remove(&node);
        Ok(true)
    }

    fn insert_arc<G: Network<Flow>>(&mut self, graph: &G, arc: ArcId, from: NodeId, to: NodeId) -> Result<bool, Inconsistency> {
        if !graph.contains_arc(arc) || self.arc_index.contains_key(&arc) {
            return Ok(false);
        }
        let from = self.node_index.get(&from).copied().ok_or(Inconsistency::UnknownNode(from))?;
        let to = self.node_index.get(&to).copied().ok_or(Inconsistency::UnknownNode(to))?;

        let cost = self.model.arc_cost(graph, arc);
        let upper = self.model.arc_capacity(graph, arc);
        let arc_id = self.st.add_arc(arc, from, to, cost, upper);
        self.arc_index.insert(arc, arc_id);
        self.st.ensure_artificial_cost();
        Ok(true)
    }

    fn delete_arc(&mut self, arc: ArcId) -> bool {
        let Some(arc_id) = self.arc_index.remove(&arc) else {
            return false;
        };
        self.st.drop_arc(arc_id);
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::{DynamicGraph, Element, GraphEvent, NodeId};
    use crate::minimum_cost_flow::network_model::AttributeNames;
    use crate::minimum_cost_flow::network_simplex::NetworkSimplex;
    use crate::minimum_cost_flow::status::SolutionStatus;

    fn two_nodes() -> (DynamicGraph<i64>, NetworkSimplex<i64>, NodeId, NodeId) {
        let mut graph = DynamicGraph::<i64>::new();
        let s = graph.add_node();
        let t = graph.add_node();
        graph.set_node_attribute(s, "supply", 4_i64).unwrap();
        graph.set_node_attribute(t, "supply", -4_i64).unwrap();
        let mut simplex = NetworkSimplex::new(AttributeNames::default());
        simplex.init(&mut graph);
        (graph, simplex, s, t)
    }

    #[test]
    fn events_for_vanished_elements_are_skipped() {
        let (mut graph, mut simplex, s, t) = two_nodes();
        let arc = graph.add_arc(s, t).unwrap();
        graph.set_arc_attribute(arc, "cost", 1_i64).unwrap();
        graph.remove_arc(arc).unwrap();

        assert_eq!(simplex.compute(&graph), Ok(SolutionStatus::Infeasible));
        assert_eq!(simplex.num_rebuilds(), 1);
        assert!(simplex.flow(arc).is_err());
        assert!(simplex.diagnostics().is_empty());
    }

    #[test]
    fn unknown_attribute_names_leave_the_basis_alone() {
        let (mut graph, mut simplex, s, _) = two_nodes();
        simplex.compute(&graph).unwrap();
        let num_pivots = simplex.num_pivots();

        graph.set_node_attribute(s, "label", "source").unwrap();
        let events = vec![GraphEvent::AttributeChanged { element: Element::Node(s), name: "label".to_string(), old: None, new: None }];
        assert_eq!(simplex.apply_events(&graph, events), Ok(false));
        assert_eq!(simplex.compute(&graph), Ok(SolutionStatus::Infeasible));
        assert_eq!(simplex.num_pivots(), num_pivots);
    }

    #[test]
    fn inconsistent_event_falls_back_to_a_rebuild() {
        let (mut graph, mut simplex, s, t) = two_nodes();
        simplex.compute(&graph).unwrap();

        // an arc whose creation the engine never heard about
        let arc = graph.add_arc(s, t).unwrap();
        graph.set_arc_attribute(arc, "capacity", 10_i64).unwrap();
        simplex.events.as_ref().unwrap().try_iter().for_each(drop);
        graph.set_arc_attribute(arc, "cost", 2_i64).unwrap();

        assert_eq!(simplex.compute(&graph), Ok(SolutionStatus::Optimal));
        assert_eq!(simplex.num_rebuilds(), 2);
        assert_eq!(simplex.flow(arc), Ok(4));
        assert_eq!(simplex.objective_value(), 8);
    }
}
