use crate::error::{Error, Result};
use crate::graph::{ArcId, Network, NodeId};
use crate::minimum_cost_flow::network_model::{AttributeNames, SupplyConvention};
use crate::minimum_cost_flow::network_simplex::NetworkSimplex;
use crate::minimum_cost_flow::pricing::PricingStrategy;
use crate::minimum_cost_flow::spanning_tree_structure::ArcKind;
use crate::minimum_cost_flow::status::SolutionStatus;
use num_traits::{Bounded, NumAssign};
use std::fmt::Debug;
use std::ops::Neg;

/// Single-source shortest paths kept up to date under graph changes.
///
/// The source ships one unit to every other node over uncapacitated arcs priced by their length.
/// At the optimum, each unit follows a shortest path, so the tree arcs carrying flow form a
/// shortest-path tree and `potential(source) - potential(v)` is the distance to `v`. Nodes the
/// source cannot reach are served by the artificial root instead.
///
/// Lengths must be non-negative.
pub struct DynamicShortestPath<Flow> {
    source: NodeId,
    simplex: NetworkSimplex<Flow>,
}

impl<Flow> DynamicShortestPath<Flow>
where
    Flow: NumAssign + Bounded + Neg<Output = Flow> + Ord + Copy + Debug,
{
    pub fn new(source: NodeId, length_attribute: &str) -> Self {
        let names = AttributeNames::default().with_cost(length_attribute).uncapacitated();
        let simplex = NetworkSimplex::new(names).with_supply_convention(SupplyConvention::SingleSource(source));
        Self { source, simplex }
    }

    pub fn with_pricing(mut self, pricing: PricingStrategy) -> Self {
        self.simplex.set_pricing(pricing);
        self
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    /// The underlying flow engine, for basis-level queries.
    pub fn network_simplex(&self) -> &NetworkSimplex<Flow> {
        &self.simplex
    }

    pub fn init<G: Network<Flow>>(&mut self, graph: &mut G) {
        self.simplex.init(graph);
    }

    /// Applies pending graph changes and re-optimizes the tree.
    pub fn compute<G: Network<Flow>>(&mut self, graph: &G) -> Result<SolutionStatus> {
        let status = self.simplex.compute(graph)?;
        self.check_source()?;
        Ok(status)
    }

    fn check_source(&self) -> Result<usize> {
        self.simplex.node(self.source).map_err(|_| Error::SourceNotFound(self.source))
    }

    /// Length of a shortest path from the source, `None` when there is none.
    pub fn distance(&self, node: NodeId) -> Result<Option<Flow>> {
        let s = self.check_source()?;
        let u = self.simplex.node(node)?;
        if !self.reaches(s, u) {
            return Ok(None);
        }
        let st = &self.simplex.st;
        Ok(Some(st.nodes[s].potential - st.nodes[u].potential))
    }

    /// Last arc of a shortest path to `node`; `None` for the source and for unreachable nodes.
    pub fn predecessor_arc(&self, node: NodeId) -> Result<Option<ArcId>> {
        let s = self.check_source()?;
        let u = self.simplex.node(node)?;
        if !self.reaches(s, u) {
            return Ok(None);
        }
        Ok(self.inflow_arc(u).and_then(|arc_id| self.external_arc(arc_id)))
    }

    /// Arcs of a shortest path from the source to `node`, in travel order.
    pub fn path(&self, node: NodeId) -> Result<Option<Vec<ArcId>>> {
        let s = self.check_source()?;
        let u = self.simplex.node(node)?;
        if !self.reaches(s, u) {
            return Ok(None);
        }

        let st = &self.simplex.st;
        let mut path = Vec::new();
        let mut now = u;
        while now != s {
            let Some(arc_id) = self.inflow_arc(now) else {
                return Ok(None);
            };
            path.extend(self.external_arc(arc_id));
            now = st.arcs[arc_id].from;
        }
        path.reverse();
        Ok(Some(path))
    }

    pub fn is_reachable(&self, node: NodeId) -> Result<bool> {
        let s = self.check_source()?;
        let u = self.simplex.node(node)?;
        Ok(self.reaches(s, u))
    }

    // follows inflow arcs back from u; a unit that started at the root never reaches s
    fn reaches(&self, s: usize, u: usize) -> bool {
        let st = &self.simplex.st;
        let mut now = u;
        for _ in 0..=st.num_real_nodes {
            if now == s {
                return true;
            }
            match self.inflow_arc(now) {
                Some(arc_id) => now = st.arcs[arc_id].from,
                None => return false,
            }
        }
        false
    }

    /// The real arc delivering flow into `u`. In the tree it is either the arc to the parent or
    /// the arc to one of the children, found by hopping over whole child subtrees on the thread.
    fn inflow_arc(&self, u: usize) -> Option<usize> {
        let st = &self.simplex.st;
        let delivers = |arc_id: usize| {
            let arc = &st.arcs[arc_id];
            !arc.is_artificial() && arc.to == u && arc.flow > Flow::zero()
        };

        let parent_arc_id = st.nodes[u].parent_arc_id;
        if delivers(parent_arc_id) {
            return Some(parent_arc_id);
        }

        let last = st.last_descendent_dft[u];
        if last == u {
            return None;
        }
        let mut child = st.next_node_dft[u];
        loop {
            let arc_id = st.nodes[child].parent_arc_id;
            if delivers(arc_id) {
                return Some(arc_id);
            }
            let last_of_child = st.last_descendent_dft[child];
            if last_of_child == last {
                return None;
            }
            child = st.next_node_dft[last_of_child];
        }
    }

    fn external_arc(&self, arc_id: usize) -> Option<ArcId> {
        match self.simplex.st.arcs[arc_id].kind {
            ArcKind::Real(arc) => Some(arc),
            ArcKind::Artificial => None,
        }
    }
}
