use crate::error::{Error, Result};
use crate::graph::{ArcId, Attribute, GraphEvent, Network, NodeId};
use crate::minimum_cost_flow::network_model::{AttributeNames, Diagnostic, NetworkModel, SupplyConvention};
use crate::minimum_cost_flow::pricing::PricingStrategy;
use crate::minimum_cost_flow::spanning_tree_structure::{ArcKind, SpanningTreeStructure};
use crate::minimum_cost_flow::status::{ArcStatus, SolutionStatus};
use num_traits::{Bounded, NumAssign};
use rustc_hash::FxHashMap;
use std::fmt::Debug;
use std::ops::Neg;
use std::sync::mpsc::Receiver;

/// Incremental primal network simplex over a [`Network`].
///
/// The engine keeps its spanning-tree basis between calls to [`compute`](Self::compute). Graph
/// mutations arrive through the change feed registered by [`init`](Self::init) and are turned
/// into local repairs of the basis, after which pricing and pivoting resume from the repaired
/// tree instead of from scratch.
///
/// ```
/// use dynamic_network_algorithms::graph::DynamicGraph;
/// use dynamic_network_algorithms::minimum_cost_flow::{AttributeNames, NetworkSimplex, SolutionStatus};
///
/// let mut graph = DynamicGraph::<i64>::new();
/// let (s, t) = (graph.add_node(), graph.add_node());
/// let arc = graph.add_arc(s, t).unwrap();
/// graph.set_node_attribute(s, "supply", 3_i64).unwrap();
/// graph.set_node_attribute(t, "supply", -3_i64).unwrap();
/// graph.set_arc_attribute(arc, "cost", 2_i64).unwrap();
/// graph.set_arc_attribute(arc, "capacity", 5_i64).unwrap();
///
/// let mut simplex = NetworkSimplex::new(AttributeNames::default());
/// simplex.init(&mut graph);
/// assert_eq!(simplex.compute(&graph), Ok(SolutionStatus::Optimal));
/// assert_eq!(simplex.objective_value(), 6);
/// ```
pub struct NetworkSimplex<Flow> {
    pub(crate) st: SpanningTreeStructure<Flow>,
    pub(crate) model: NetworkModel,
    pub(crate) node_index: FxHashMap<NodeId, usize>,
    pub(crate) arc_index: FxHashMap<ArcId, usize>,
    pricing: PricingStrategy,
    pivot_limit: Option<usize>,
    pub(crate) events: Option<Receiver<GraphEvent<Flow>>>,
    status: SolutionStatus,
    dirty: bool,
    objective: Flow,
    num_pivots: usize,
    num_rebuilds: usize,
}

impl<Flow> NetworkSimplex<Flow>
where
    Flow: NumAssign + Bounded + Neg<Output = Flow> + Ord + Copy + Debug,
{
    pub fn new(names: AttributeNames) -> Self {
        Self {
            st: SpanningTreeStructure::new(),
            model: NetworkModel::new(names, SupplyConvention::Attribute),
            node_index: FxHashMap::default(),
            arc_index: FxHashMap::default(),
            pricing: PricingStrategy::default(),
            pivot_limit: None,
            events: None,
            status: SolutionStatus::Undefined,
            dirty: true,
            objective: Flow::zero(),
            num_pivots: 0,
            num_rebuilds: 0,
        }
    }

    pub fn with_pricing(mut self, pricing: PricingStrategy) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_pivot_limit(mut self, limit: usize) -> Self {
        self.pivot_limit = Some(limit);
        self
    }

    pub fn with_supply_convention(mut self, convention: SupplyConvention) -> Self {
        self.model.convention = convention;
        self
    }

    /// `None` lifts the cap. A [`compute`](Self::compute) stopped by the cap resumes where it left off.
    pub fn set_pivot_limit(&mut self, limit: Option<usize>) {
        self.pivot_limit = limit;
    }

    /// Takes effect from the next pivot on; the current basis stays valid.
    pub fn set_pricing(&mut self, pricing: PricingStrategy) {
        self.pricing = pricing;
    }

    pub fn pricing(&self) -> PricingStrategy {
        self.pricing
    }

    pub fn attribute_names(&self) -> &AttributeNames {
        &self.model.names
    }

    /// Subscribes to the change feed of `graph` and builds the initial basis from its snapshot.
    pub fn init<G: Network<Flow>>(&mut self, graph: &mut G) {
        self.events = Some(graph.subscribe());
        self.rebuild(graph);
    }

    /// Throws the incremental state away and starts over from the current snapshot: every node
    /// hangs off the root through its artificial arc and every real arc sits at its lower bound.
    pub fn rebuild<G: Network<Flow>>(&mut self, graph: &G) {
        if let Some(events) = &self.events {
            let num_dropped = events.try_iter().count();
            if num_dropped > 0 {
                log::debug!("discarding {num_dropped} pending events");
            }
        }

        self.st = SpanningTreeStructure::new();
        self.node_index.clear();
        self.arc_index.clear();
        self.model.clear_diagnostics();

        for (node, supply) in self.model.supplies(graph) {
            let u = self.st.add_node(node, supply);
            self.node_index.insert(node, u);
        }
        for arc in graph.arcs() {
            let Some((from, to)) = graph.endpoints(arc) else {
                continue;
            };
            let (Some(&from), Some(&to)) = (self.node_index.get(&from), self.node_index.get(&to)) else {
                continue;
            };
            let cost = self.model.arc_cost(graph, arc);
            let upper = self.model.arc_capacity(graph, arc);
            let arc_id = self.st.add_arc(arc, from, to, cost, upper);
            self.arc_index.insert(arc, arc_id);
        }
        self.st.ensure_artificial_cost();

        self.status = SolutionStatus::Undefined;
        self.dirty = true;
        self.num_rebuilds += 1;
        log::info!("rebuilt basis with {} nodes and {} arcs", self.node_index.len(), self.arc_index.len());
    }

    /// Brings the solution up to date with `graph`.
    ///
    /// Pending change events are applied as local repairs, then pivots run until no arc is
    /// eligible. Returns right away when nothing changed since the last call. Without a change
    /// feed (no [`init`](Self::init)), every call rebuilds from the snapshot.
    pub fn compute<G: Network<Flow>>(&mut self, graph: &G) -> Result<SolutionStatus> {
        match self.events.as_ref().map(|events| events.try_iter().collect::<Vec<_>>()) {
            None => self.rebuild(graph),
            Some(events) => match self.apply_events(graph, events) {
                Ok(changed) => self.dirty |= changed,
                Err(inconsistency) => {
                    log::warn!("{inconsistency}, rebuilding from the current graph");
                    self.rebuild(graph);
                }
            },
        }

        if !self.dirty {
            return Ok(self.status);
        }
        self.status = SolutionStatus::Undefined;

        let num_repairs = self.st.repair_primal();
        if num_repairs > 0 {
            log::debug!("primal repair took {num_repairs} forced pivots");
        }
        debug_assert!(self.st.validate_tree());
        debug_assert!(self.st.satisfy_constraints());

        let num_pivots = self.run()?;
        log::debug!("converged after {num_pivots} pivots");
        self.finish();
        Ok(self.status)
    }

    fn run(&mut self) -> Result<usize> {
        let mut num_pivots = 0;
        while let Some(entering_arc_id) = self.pricing.find_entering_arc(&self.st) {
            if let Some(limit) = self.pivot_limit {
                if num_pivots >= limit {
                    log::warn!("stopping after {limit} pivots without reaching optimality");
                    return Err(Error::PivotLimitExceeded { limit });
                }
            }

            self.st.orient_entering_arc(entering_arc_id);
            let (leaving_arc_id, apex, delta, t2_now_root, t2_new_root) = self.st.select_leaving_arc(entering_arc_id);
            log::trace!("pivot {}: arc {entering_arc_id} enters, arc {leaving_arc_id} leaves, delta {delta:?}", self.num_pivots);
            self.st.update_flow_in_cycle(entering_arc_id, delta, apex);
            self.st.pivot(leaving_arc_id, entering_arc_id, t2_now_root, t2_new_root);
            num_pivots += 1;
            self.num_pivots += 1;

            debug_assert!(self.st.validate_tree());
            debug_assert!(self.st.satisfy_constraints());
        }
        Ok(num_pivots)
    }

    fn finish(&mut self) {
        let mut objective = Flow::zero();
        let mut infeasible = false;
        for arc in self.st.arcs.iter().filter(|arc| arc.alive) {
            if arc.is_artificial() {
                infeasible |= arc.flow > Flow::zero();
            } else {
                objective += arc.cost * arc.flow;
            }
        }

        self.objective = objective;
        self.status = if infeasible { SolutionStatus::Infeasible } else { SolutionStatus::Optimal };
        self.dirty = false;
        log::info!("solution is {:?} with objective {:?}", self.status, self.objective);
    }

    pub(crate) fn node(&self, node: NodeId) -> Result<usize> {
        self.node_index.get(&node).copied().ok_or(Error::UnknownNode(node))
    }

    pub(crate) fn arc(&self, arc: ArcId) -> Result<usize> {
        self.arc_index.get(&arc).copied().ok_or(Error::UnknownArc(arc))
    }

    pub fn flow(&self, arc: ArcId) -> Result<Flow> {
        Ok(self.st.arcs[self.arc(arc)?].flow)
    }

    pub fn arc_status(&self, arc: ArcId) -> Result<ArcStatus> {
        Ok(self.st.arcs[self.arc(arc)?].status)
    }

    pub fn reduced_cost(&self, arc: ArcId) -> Result<Flow> {
        Ok(self.st.reduced_cost(&self.st.arcs[self.arc(arc)?]))
    }

    pub fn solution_status(&self) -> SolutionStatus {
        self.status
    }

    /// Total cost over real arcs. Artificial flow is not priced in.
    pub fn objective_value(&self) -> Flow {
        self.objective
    }

    /// Sum of all node supplies; nonzero means no feasible flow can exist.
    pub fn network_balance(&self) -> Flow {
        -self.st.nodes[self.st.root].supply
    }

    /// Flow the node still exchanges with the artificial root: positive for supply that could
    /// not be shipped, negative for demand that could not be met, zero when feasible.
    pub fn node_balance(&self, node: NodeId) -> Result<Flow> {
        let u = self.node(node)?;
        let arc = &self.st.arcs[self.st.nodes[u].artificial_arc_id];
        Ok(if arc.from == u { arc.flow } else { -arc.flow })
    }

    /// Same as [`node_balance`](Self::node_balance).
    pub fn infeasibility(&self, node: NodeId) -> Result<Flow> {
        self.node_balance(node)
    }

    pub fn potential(&self, node: NodeId) -> Result<Flow> {
        Ok(self.st.nodes[self.node(node)?].potential)
    }

    /// The tree arc towards the root, or `None` when the node hangs directly off the root.
    pub fn parent_arc(&self, node: NodeId) -> Result<Option<ArcId>> {
        let u = self.node(node)?;
        Ok(match self.st.arcs[self.st.nodes[u].parent_arc_id].kind {
            ArcKind::Real(arc) => Some(arc),
            ArcKind::Artificial => None,
        })
    }

    pub fn parent_node(&self, node: NodeId) -> Result<Option<NodeId>> {
        let u = self.node(node)?;
        Ok(self.st.nodes[self.st.nodes[u].parent].external)
    }

    /// Depth below the artificial root, which sits at depth 0.
    pub fn depth(&self, node: NodeId) -> Result<usize> {
        Ok(self.st.nodes[self.node(node)?].depth)
    }

    /// Pivots performed since construction, forced repair pivots excluded.
    pub fn num_pivots(&self) -> usize {
        self.num_pivots
    }

    pub fn num_rebuilds(&self) -> usize {
        self.num_rebuilds
    }

    /// Attribute values replaced by defaults since the last rebuild.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.model.diagnostics()
    }

    /// Writes the flow of every arc into the configured flow attribute, if any.
    pub fn publish_flows<G: Network<Flow>>(&self, graph: &mut G) -> Result<()> {
        let Some(name) = &self.model.names.flow else {
            return Ok(());
        };

        let mut arcs: Vec<(ArcId, usize)> = self.arc_index.iter().map(|(&arc, &arc_id)| (arc, arc_id)).collect();
        arcs.sort_unstable();
        for (arc, arc_id) in arcs {
            graph.set_arc_attribute(arc, name, Attribute::Number(self.st.arcs[arc_id].flow))?;
        }
        Ok(())
    }

    pub fn satisfy_constraints(&self) -> bool {
        self.st.satisfy_constraints()
    }

    pub fn satisfy_optimality_conditions(&self) -> bool {
        self.st.satisfy_optimality_conditions()
    }

    pub fn validate_tree(&self) -> bool {
        self.st.validate_tree()
    }
}
