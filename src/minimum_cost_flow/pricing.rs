use crate::minimum_cost_flow::spanning_tree_structure::{InternalArc, SpanningTreeStructure};
use crate::minimum_cost_flow::status::ArcStatus;
use num_traits::{Bounded, NumAssign};
use std::fmt::Debug;
use std::ops::Neg;

/// Rule used to pick the entering arc of the next pivot.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum PricingStrategy {
    /// First eligible arc in arc order.
    #[default]
    FirstNegative,
    /// Dantzig's rule: the arc with the largest violation, first one on ties.
    MostNegative,
}

impl PricingStrategy {
    pub(crate) fn find_entering_arc<Flow>(self, st: &SpanningTreeStructure<Flow>) -> Option<usize>
    where
        Flow: NumAssign + Bounded + Neg<Output = Flow> + Ord + Copy + Debug,
    {
        match self {
            PricingStrategy::FirstNegative => first_eligible_arc(st),
            PricingStrategy::MostNegative => best_eligible_arc(st),
        }
    }
}

/// How far a nonbasic arc violates its optimality condition; positive means eligible.
///
/// A nonbasic artificial arc carries no flow, so it may enter in either direction; the reverse
/// direction has reduced cost `2 * cost - rc`.
pub(crate) fn violation<Flow>(arc: &InternalArc<Flow>, st: &SpanningTreeStructure<Flow>) -> Flow
where
    Flow: NumAssign + Bounded + Neg<Output = Flow> + Ord + Copy + Debug,
{
    if !arc.alive {
        return Flow::zero();
    }
    match arc.status {
        ArcStatus::Basic => Flow::zero(),
        ArcStatus::NonbasicUpper => st.reduced_cost(arc),
        ArcStatus::NonbasicLower if arc.is_artificial() => {
            let reduced_cost = st.reduced_cost(arc);
            (-reduced_cost).max(reduced_cost - arc.cost - arc.cost)
        }
        ArcStatus::NonbasicLower => -st.reduced_cost(arc),
    }
}

fn first_eligible_arc<Flow>(st: &SpanningTreeStructure<Flow>) -> Option<usize>
where
    Flow: NumAssign + Bounded + Neg<Output = Flow> + Ord + Copy + Debug,
{
    st.arcs.iter().position(|arc| violation(arc, st) > Flow::zero())
}

fn best_eligible_arc<Flow>(st: &SpanningTreeStructure<Flow>) -> Option<usize>
where
    Flow: NumAssign + Bounded + Neg<Output = Flow> + Ord + Copy + Debug,
{
    let mut maxi_violation = Flow::zero();
    let mut entering_arc_id = None;

    for (arc_id, arc) in st.arcs.iter().enumerate() {
        let violation = violation(arc, st);
        if violation > maxi_violation {
            maxi_violation = violation;
            entering_arc_id = Some(arc_id);
        }
    }

    entering_arc_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ArcId, NodeId};

    #[test]
    fn strategies_agree_on_eligibility_but_not_on_choice() {
        let mut st = SpanningTreeStructure::<i64>::new();
        let u = st.add_node(NodeId(0), 2);
        let v = st.add_node(NodeId(1), -2);
        let cheap = st.add_arc(ArcId(0), u, v, 5, 2);
        let cheaper = st.add_arc(ArcId(1), u, v, 1, 2);
        st.ensure_artificial_cost();

        // both arcs undercut the detour through the root
        assert!(violation(&st.arcs[cheap], &st) > 0);
        assert!(violation(&st.arcs[cheaper], &st) > violation(&st.arcs[cheap], &st));
        assert_eq!(PricingStrategy::FirstNegative.find_entering_arc(&st), Some(cheap));
        assert_eq!(PricingStrategy::MostNegative.find_entering_arc(&st), Some(cheaper));
    }

    #[test]
    fn basic_and_dead_arcs_are_never_eligible() {
        let mut st = SpanningTreeStructure::<i64>::new();
        let u = st.add_node(NodeId(0), 0);
        let v = st.add_node(NodeId(1), 0);
        let arc_id = st.add_arc(ArcId(0), u, v, -3, 1);
        st.ensure_artificial_cost();
        assert!(violation(&st.arcs[arc_id], &st) > 0);

        st.remove_arc(arc_id);
        assert_eq!(violation(&st.arcs[arc_id], &st), 0);
        assert_eq!(PricingStrategy::MostNegative.find_entering_arc(&st), None);
        assert_eq!(PricingStrategy::FirstNegative.find_entering_arc(&st), None);
    }
}
