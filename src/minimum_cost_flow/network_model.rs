use crate::graph::{ArcId, Attribute, Element, Network, NodeId};
use num_traits::{Bounded, NumAssign};
use std::fmt::{self, Debug};
use std::ops::Neg;

/// Names of the attributes the engine reads from (and optionally writes to) the graph.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AttributeNames {
    pub supply: String,
    pub cost: String,
    /// `None` leaves every arc uncapacitated.
    pub capacity: Option<String>,
    /// Where [`publish_flows`](crate::minimum_cost_flow::network_simplex::NetworkSimplex::publish_flows) writes results.
    pub flow: Option<String>,
}

impl Default for AttributeNames {
    fn default() -> Self {
        Self { supply: "supply".to_string(), cost: "cost".to_string(), capacity: Some("capacity".to_string()), flow: None }
    }
}

impl AttributeNames {
    pub fn with_supply(mut self, name: &str) -> Self {
        self.supply = name.to_string();
        self
    }

    pub fn with_cost(mut self, name: &str) -> Self {
        self.cost = name.to_string();
        self
    }

    pub fn with_capacity(mut self, name: &str) -> Self {
        self.capacity = Some(name.to_string());
        self
    }

    pub fn uncapacitated(mut self) -> Self {
        self.capacity = None;
        self
    }

    pub fn with_flow(mut self, name: &str) -> Self {
        self.flow = Some(name.to_string());
        self
    }
}

/// Where node supplies come from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SupplyConvention {
    /// Read from the supply attribute of each node.
    Attribute,
    /// The source ships one unit to every other live node.
    SingleSource(NodeId),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DiagnosticKind {
    Missing,
    NotNumeric,
    NegativeCapacity,
}

/// A value the adapter had to replace by its default.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    pub element: Element,
    pub attribute: String,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::Missing => write!(f, "{} has no \"{}\" attribute, using 0", self.element, self.attribute),
            DiagnosticKind::NotNumeric => write!(f, "\"{}\" of {} is not numeric, using 0", self.attribute, self.element),
            DiagnosticKind::NegativeCapacity => write!(f, "\"{}\" of {} is negative, using 0", self.attribute, self.element),
        }
    }
}

/// Which engine quantity an attribute change feeds.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Quantity {
    Supply,
    Cost,
    Capacity,
}

/// Reads supplies, costs and capacities out of the attribute store, falling back to zero.
pub struct NetworkModel {
    pub(crate) names: AttributeNames,
    pub(crate) convention: SupplyConvention,
    diagnostics: Vec<Diagnostic>,
}

impl NetworkModel {
    pub fn new(names: AttributeNames, convention: SupplyConvention) -> Self {
        Self { names, convention, diagnostics: Vec::new() }
    }

    /// Values currently replaced by a default, at most one entry per element and attribute. An
    /// entry goes away once a later read finds a usable value; `rebuild` starts over.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub(crate) fn clear_diagnostics(&mut self) {
        self.diagnostics.clear();
    }

    pub(crate) fn node_quantity(&self, name: &str) -> Option<Quantity> {
        match self.convention {
            SupplyConvention::Attribute if name == self.names.supply => Some(Quantity::Supply),
            _ => None,
        }
    }

    pub(crate) fn arc_quantity(&self, name: &str) -> Option<Quantity> {
        if name == self.names.cost {
            Some(Quantity::Cost)
        } else if self.names.capacity.as_deref() == Some(name) {
            Some(Quantity::Capacity)
        } else {
            None
        }
    }

    pub(crate) fn number<Flow>(&mut self, element: Element, name: &str, value: Option<&Attribute<Flow>>) -> Flow
    where
        Flow: NumAssign + Bounded + Neg<Output = Flow> + Ord + Copy + Debug,
    {
        match value {
            Some(Attribute::Number(value)) => {
                self.resolve(element, name);
                *value
            }
            Some(_) => self.report(element, name, DiagnosticKind::NotNumeric),
            None => self.report(element, name, DiagnosticKind::Missing),
        }
    }

    pub(crate) fn capacity<Flow>(&mut self, element: Element, value: Option<&Attribute<Flow>>) -> Flow
    where
        Flow: NumAssign + Bounded + Neg<Output = Flow> + Ord + Copy + Debug,
    {
        let Some(name) = self.names.capacity.clone() else {
            return Flow::max_value();
        };
        let capacity = self.number(element, &name, value);
        if capacity < Flow::zero() {
            return self.report(element, &name, DiagnosticKind::NegativeCapacity);
        }
        capacity
    }

    pub(crate) fn node_supply<Flow, G>(&mut self, graph: &G, node: NodeId) -> Flow
    where
        Flow: NumAssign + Bounded + Neg<Output = Flow> + Ord + Copy + Debug,
        G: Network<Flow>,
    {
        let name = self.names.supply.clone();
        self.number(Element::Node(node), &name, graph.node_attribute(node, &name))
    }

    pub(crate) fn arc_cost<Flow, G>(&mut self, graph: &G, arc: ArcId) -> Flow
    where
        Flow: NumAssign + Bounded + Neg<Output = Flow> + Ord + Copy + Debug,
        G: Network<Flow>,
    {
        let name = self.names.cost.clone();
        self.number(Element::Arc(arc), &name, graph.arc_attribute(arc, &name))
    }

    pub(crate) fn arc_capacity<Flow, G>(&mut self, graph: &G, arc: ArcId) -> Flow
    where
        Flow: NumAssign + Bounded + Neg<Output = Flow> + Ord + Copy + Debug,
        G: Network<Flow>,
    {
        let value = self.names.capacity.as_deref().and_then(|name| graph.arc_attribute(arc, name));
        self.capacity(Element::Arc(arc), value)
    }

    /// Supplies of every node of the snapshot, in graph order.
    pub(crate) fn supplies<Flow, G>(&mut self, graph: &G) -> Vec<(NodeId, Flow)>
    where
        Flow: NumAssign + Bounded + Neg<Output = Flow> + Ord + Copy + Debug,
        G: Network<Flow>,
    {
        let nodes: Vec<NodeId> = graph.nodes().collect();
        match self.convention {
            SupplyConvention::Attribute => nodes.into_iter().map(|node| (node, self.node_supply(graph, node))).collect(),
            SupplyConvention::SingleSource(source) => {
                let num_sinks: Flow = Self::count_sinks(nodes.iter().copied(), source);
                nodes.into_iter().map(|node| (node, if node == source { num_sinks } else { -Flow::one() })).collect()
            }
        }
    }

    fn report<Flow>(&mut self, element: Element, name: &str, kind: DiagnosticKind) -> Flow
    where
        Flow: NumAssign,
    {
        let diagnostic = Diagnostic { element, attribute: name.to_string(), kind };
        match self.diagnostics.iter_mut().find(|known| known.element == element && known.attribute == name) {
            Some(known) if known.kind == kind => {}
            Some(known) => {
                log::warn!("{diagnostic}");
                *known = diagnostic;
            }
            None => {
                log::warn!("{diagnostic}");
                self.diagnostics.push(diagnostic);
            }
        }
        Flow::zero()
    }

    fn resolve(&mut self, element: Element, name: &str) {
        self.diagnostics.retain(|known| known.element != element || known.attribute != name);
    }

    /// Number of nodes other than `source`, as a flow amount.
    pub(crate) fn count_sinks<Flow: NumAssign>(nodes: impl Iterator<Item = NodeId>, source: NodeId) -> Flow {
        let mut count = Flow::zero();
        for _ in nodes.filter(|&node| node != source) {
            count += Flow::one();
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DynamicGraph;

    #[test]
    fn missing_and_ill_typed_values_default_to_zero() {
        let mut graph = DynamicGraph::<i64>::new();
        let u = graph.add_node();
        let v = graph.add_node();
        let arc = graph.add_arc(u, v).unwrap();
        graph.set_node_attribute(v, "supply", "lots").unwrap();
        graph.set_arc_attribute(arc, "capacity", -4_i64).unwrap();

        let mut model = NetworkModel::new(AttributeNames::default(), SupplyConvention::Attribute);
        let supplies: Vec<(NodeId, i64)> = model.supplies(&graph);
        assert_eq!(supplies, vec![(u, 0), (v, 0)]);
        assert_eq!(model.arc_cost::<i64, _>(&graph, arc), 0);
        assert_eq!(model.arc_capacity::<i64, _>(&graph, arc), 0);

        let kinds: Vec<DiagnosticKind> = model.diagnostics().iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::Missing, DiagnosticKind::NotNumeric, DiagnosticKind::Missing, DiagnosticKind::NegativeCapacity]);
    }

    #[test]
    fn repeated_reads_keep_one_diagnostic_per_value() {
        let mut graph = DynamicGraph::<i64>::new();
        let u = graph.add_node();
        let v = graph.add_node();
        let arc = graph.add_arc(u, v).unwrap();
        let mut model = NetworkModel::new(AttributeNames::default(), SupplyConvention::Attribute);

        for _ in 0..3 {
            assert_eq!(model.arc_cost::<i64, _>(&graph, arc), 0);
        }
        assert_eq!(model.diagnostics().len(), 1);
        assert_eq!(model.diagnostics()[0].kind, DiagnosticKind::Missing);

        graph.set_arc_attribute(arc, "cost", "free").unwrap();
        assert_eq!(model.arc_cost::<i64, _>(&graph, arc), 0);
        assert_eq!(model.diagnostics().len(), 1);
        assert_eq!(model.diagnostics()[0].kind, DiagnosticKind::NotNumeric);

        graph.set_arc_attribute(arc, "cost", 7_i64).unwrap();
        assert_eq!(model.arc_cost::<i64, _>(&graph, arc), 7);
        assert!(model.diagnostics().is_empty());
    }

    #[test]
    fn uncapacitated_arcs_get_the_largest_value() {
        let mut graph = DynamicGraph::<i64>::new();
        let u = graph.add_node();
        let arc = graph.add_arc(u, u).unwrap();
        let mut model = NetworkModel::new(AttributeNames::default().uncapacitated(), SupplyConvention::Attribute);

        assert_eq!(model.arc_capacity::<i64, _>(&graph, arc), i64::MAX);
        assert!(model.diagnostics().is_empty());
        assert_eq!(model.arc_quantity("capacity"), None);
    }

    #[test]
    fn single_source_ships_one_unit_per_sink() {
        let mut graph = DynamicGraph::<i64>::new();
        let nodes = graph.add_nodes(4);
        let mut model = NetworkModel::new(AttributeNames::default(), SupplyConvention::SingleSource(nodes[2]));

        let supplies: Vec<i64> = model.supplies(&graph).into_iter().map(|(_, supply)| supply).collect();
        assert_eq!(supplies, vec![-1, -1, 3, -1]);
        assert_eq!(model.node_quantity("supply"), None);
    }
}
