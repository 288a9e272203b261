use crate::minimum_cost_flow::spanning_tree_structure::{abs, SpanningTreeStructure};
use crate::minimum_cost_flow::status::ArcStatus;
use num_traits::{Bounded, NumAssign};
use std::fmt::Debug;
use std::ops::Neg;

impl<Flow> SpanningTreeStructure<Flow>
where
    Flow: NumAssign + Bounded + Neg<Output = Flow> + Ord + Copy + Debug,
{
    /// Shifts the potential of every node in the subtree of `sub_tree_root` by `delta` and
    /// refreshes their depths. The subtree root must already be attached.
    // O(|subtree|)
    pub(crate) fn update_subtree(&mut self, sub_tree_root: usize, delta: Flow) {
        let last = self.last_descendent_dft[sub_tree_root];
        let mut now = sub_tree_root;
        loop {
            let parent = self.nodes[now].parent;
            self.nodes[now].depth = self.nodes[parent].depth + 1;
            self.nodes[now].potential += delta;
            if now == last {
                break;
            }
            now = self.next_node_dft[now];
        }
    }

    /// Rebuilds every potential and depth from the root along the thread.
    // O(|V|)
    pub(crate) fn recompute_potentials(&mut self) {
        let root = self.root;
        self.nodes[root].potential = Flow::zero();
        self.nodes[root].depth = 0;

        let mut now = self.next_node_dft[root];
        while now != root {
            let (parent, arc_id) = (self.nodes[now].parent, self.nodes[now].parent_arc_id);
            let arc = &self.arcs[arc_id];
            let parent_potential = self.nodes[parent].potential;
            self.nodes[now].potential = if arc.from == parent { parent_potential - arc.cost } else { parent_potential + arc.cost };
            self.nodes[now].depth = self.nodes[parent].depth + 1;
            now = self.next_node_dft[now];
        }
    }

    /// Replaces the cost of a real arc. A basic arc drags the potentials of the subtree below it.
    pub(crate) fn change_cost(&mut self, arc_id: usize, cost: Flow) -> bool {
        let arc = &mut self.arcs[arc_id];
        let old = arc.cost;
        if old == cost {
            return false;
        }
        arc.cost = cost;
        let (from, to, status) = (arc.from, arc.to, arc.status);
        self.total_abs_cost = self.total_abs_cost - abs(old) + abs(cost);

        if status == ArcStatus::Basic {
            let delta = cost - old;
            if self.nodes[to].parent_arc_id == arc_id {
                self.update_subtree(to, -delta);
            } else {
                self.update_subtree(from, delta);
            }
        }

        self.ensure_artificial_cost();
        true
    }

    /// Keeps the artificial arc cost above the total absolute real cost, so that any simple path of
    /// real arcs is cheaper than a detour through the root.
    pub(crate) fn ensure_artificial_cost(&mut self) -> bool {
        if self.artificial_cost > self.total_abs_cost {
            return false;
        }

        let bound = self.total_abs_cost + Flow::one();
        let artificial_cost = bound + bound;
        log::debug!("raising artificial arc cost from {:?} to {:?}", self.artificial_cost, artificial_cost);

        self.artificial_cost = artificial_cost;
        for arc in self.arcs.iter_mut().filter(|arc| arc.alive && arc.is_artificial()) {
            arc.cost = artificial_cost;
        }
        self.recompute_potentials();
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::{ArcId, NodeId};
    use crate::minimum_cost_flow::spanning_tree_structure::SpanningTreeStructure;
    use crate::minimum_cost_flow::status::ArcStatus;

    // root <- u -> v, with u -> v basic
    fn chain() -> (SpanningTreeStructure<i64>, usize, usize, usize) {
        let mut st = SpanningTreeStructure::<i64>::new();
        let u = st.add_node(NodeId(0), 1);
        let v = st.add_node(NodeId(1), -1);
        let arc_id = st.add_arc(ArcId(0), u, v, 3, 5);

        let artificial = st.nodes[v].artificial_arc_id;
        st.detach_tree(v);
        st.arcs[artificial].status = ArcStatus::NonbasicLower;
        st.arcs[artificial].flow = 0;
        st.attach_tree(u, v, arc_id);
        st.arcs[arc_id].flow = 1;
        let u_artificial = st.nodes[u].artificial_arc_id;
        st.arcs[u_artificial].flow = 0;
        st.ensure_artificial_cost();
        st.recompute_potentials();
        (st, u, v, arc_id)
    }

    #[test]
    fn recomputed_potentials_zero_basic_reduced_costs() {
        let (st, u, v, arc_id) = chain();
        assert!(st.validate_tree());
        assert!(st.satisfy_constraints());
        assert_eq!(st.reduced_cost(&st.arcs[arc_id]), 0);
        assert_eq!(st.nodes[v].potential, st.nodes[u].potential - 3);
        assert_eq!(st.nodes[v].depth, 2);
    }

    #[test]
    fn basic_cost_change_shifts_the_subtree_only() {
        let (mut st, u, _, arc_id) = chain();
        let before_u = st.nodes[u].potential;

        assert!(st.change_cost(arc_id, 4));
        assert_eq!(st.nodes[u].potential, before_u);
        assert_eq!(st.reduced_cost(&st.arcs[arc_id]), 0);
        assert!(!st.change_cost(arc_id, 4));
    }

    #[test]
    fn artificial_cost_grows_with_real_costs() {
        let (mut st, u, _, arc_id) = chain();
        let before = st.artificial_cost;

        st.change_cost(arc_id, 1_000);
        assert!(st.artificial_cost > 1_000);
        assert!(st.artificial_cost > before);
        assert_eq!(st.nodes[u].potential, st.artificial_cost);
        assert_eq!(st.reduced_cost(&st.arcs[arc_id]), 0);
    }

    #[test]
    fn artificial_cost_is_raised_once_the_total_catches_up() {
        let (mut st, _, _, arc_id) = chain();
        assert_eq!(st.artificial_cost, 2 * (3 + 1));

        st.change_cost(arc_id, 7);
        assert_eq!(st.artificial_cost, 8);
        assert!(!st.ensure_artificial_cost());

        st.change_cost(arc_id, 8);
        assert_eq!(st.artificial_cost, 2 * (8 + 1));
        assert!(st.satisfy_optimality_conditions());
    }
}
