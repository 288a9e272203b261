use crate::minimum_cost_flow::spanning_tree_structure::SpanningTreeStructure;
use crate::minimum_cost_flow::status::ArcStatus;
use num_traits::{Bounded, NumAssign};
use std::fmt::Debug;
use std::ops::Neg;

impl<Flow> SpanningTreeStructure<Flow>
where
    Flow: NumAssign + Bounded + Neg<Output = Flow> + Ord + Copy + Debug,
{
    /// Points a nonbasic artificial arc in the direction in which it is eligible.
    pub(crate) fn orient_entering_arc(&mut self, entering_arc_id: usize) {
        let arc = &self.arcs[entering_arc_id];
        if !arc.is_artificial() || arc.status != ArcStatus::NonbasicLower {
            return;
        }
        let reduced_cost = self.reduced_cost(arc);
        if -reduced_cost < reduced_cost - arc.cost - arc.cost {
            let arc = &mut self.arcs[entering_arc_id];
            std::mem::swap(&mut arc.from, &mut arc.to);
        }
    }

    /// Ratio test on the cycle closed by the entering arc.
    ///
    /// Returns `(leaving_arc_id, apex, delta, t2_now_root, t2_new_root)`: the blocking arc, the
    /// top of the cycle, the admissible flow change, the root of the subtree cut off by the
    /// leaving arc, and the endpoint of the entering arc that becomes that subtree's new root.
    // keep strongly feasible solution
    pub(crate) fn select_leaving_arc(&self, entering_arc_id: usize) -> (usize, usize, Flow, usize, usize) {
        let entering_arc = &self.arcs[entering_arc_id];

        let (from, to) = match entering_arc.status {
            ArcStatus::Basic => panic!("status of entering arc {entering_arc_id} is invalid."),
            ArcStatus::NonbasicLower => (entering_arc.from, entering_arc.to),
            ArcStatus::NonbasicUpper => (entering_arc.to, entering_arc.from),
        };

        let (mut leaving_arc_id, mut mini_delta, mut t2_now_root, mut t2_new_root) = (entering_arc_id, entering_arc.upper, usize::MAX, usize::MAX);

        let apex = {
            let (mut u, mut v) = (from, to);
            while u != v {
                let (u_depth, v_depth) = (self.nodes[u].depth, self.nodes[v].depth);

                if u_depth >= v_depth {
                    let arc_id = self.nodes[u].parent_arc_id;
                    let arc = &self.arcs[arc_id];
                    let delta = if u == arc.to { arc.residual_capacity() } else { arc.flow };

                    // search first blocking arc
                    if delta < mini_delta {
                        (leaving_arc_id, mini_delta, t2_now_root, t2_new_root) = (arc_id, delta, u, from);
                    }
                    u = self.nodes[u].parent;
                }

                if v_depth >= u_depth {
                    let arc_id = self.nodes[v].parent_arc_id;
                    let arc = &self.arcs[arc_id];
                    let delta = if v == arc.from { arc.residual_capacity() } else { arc.flow };

                    // search last blocking arc
                    if delta <= mini_delta {
                        (leaving_arc_id, mini_delta, t2_now_root, t2_new_root) = (arc_id, delta, v, to);
                    }
                    v = self.nodes[v].parent;
                }
            }
            u
        };

        (leaving_arc_id, apex, mini_delta, t2_now_root, t2_new_root)
    }

    /// Swaps the entering arc into the basis: the subtree hanging below the leaving arc is cut
    /// off, re-rooted at `t2_new_root` and hung below the entering arc. Only that subtree's
    /// potentials and depths are touched.
    pub(crate) fn pivot(&mut self, leaving_arc_id: usize, entering_arc_id: usize, t2_now_root: usize, t2_new_root: usize) {
        if leaving_arc_id == entering_arc_id {
            self.arcs[entering_arc_id].status = match self.arcs[entering_arc_id].status {
                ArcStatus::NonbasicUpper => ArcStatus::NonbasicLower,
                ArcStatus::NonbasicLower => ArcStatus::NonbasicUpper,
                ArcStatus::Basic => panic!("status of entering arc {entering_arc_id} is invalid."),
            };
            return;
        }

        let leaving_arc = &mut self.arcs[leaving_arc_id];
        leaving_arc.status = if leaving_arc.is_lower() { ArcStatus::NonbasicLower } else { ArcStatus::NonbasicUpper };

        let entering_arc = &self.arcs[entering_arc_id];
        let attach_node = entering_arc.opposite_side(t2_new_root);
        let delta = if t2_new_root == entering_arc.from { self.reduced_cost(entering_arc) } else { -self.reduced_cost(entering_arc) };

        self.detach_tree(t2_now_root);
        self.re_rooting(t2_new_root);
        self.attach_tree(attach_node, t2_new_root, entering_arc_id);
        self.update_subtree(t2_new_root, delta);
    }

    /// Drives a basic real arc out of the basis at `target` flow regardless of the ratio test.
    ///
    /// The subtree below the arc is hung off the root through the artificial arc of its top node,
    /// which absorbs whatever the arc no longer carries; the parent side gives the same amount
    /// back along its path to the root.
    pub(crate) fn forced_pivot(&mut self, leaving_arc_id: usize, target: Flow) {
        let arc = &self.arcs[leaving_arc_id];
        debug_assert!(arc.status == ArcStatus::Basic && !arc.is_artificial());

        let child = if self.nodes[arc.to].parent_arc_id == leaving_arc_id { arc.to } else { arc.from };
        let parent = self.nodes[child].parent;
        let (upward, upward_target) = if arc.from == child { (arc.flow, target) } else { (-arc.flow, -target) };
        let rest = upward - upward_target;

        let arc = &mut self.arcs[leaving_arc_id];
        arc.flow = target;
        arc.status = if target == Flow::zero() { ArcStatus::NonbasicLower } else { ArcStatus::NonbasicUpper };

        self.update_flow_in_path(parent, -rest);
        self.detach_tree(child);

        let root = self.root;
        let artificial_arc_id = self.nodes[child].artificial_arc_id;
        let artificial = &mut self.arcs[artificial_arc_id];
        debug_assert!(artificial.status != ArcStatus::Basic && artificial.is_lower());
        if rest >= Flow::zero() {
            (artificial.from, artificial.to, artificial.flow) = (child, root, rest);
        } else {
            (artificial.from, artificial.to, artificial.flow) = (root, child, -rest);
        }
        self.attach_tree(root, child, artificial_arc_id);

        let delta = self.artificial_potential(child) - self.nodes[child].potential;
        self.update_subtree(child, delta);
    }

    /// Turns a basic artificial arc with negative flow around.
    pub(crate) fn flip_artificial_arc(&mut self, arc_id: usize) {
        let arc = &mut self.arcs[arc_id];
        std::mem::swap(&mut arc.from, &mut arc.to);
        arc.flow = -arc.flow;

        let child = if arc.from == self.root { arc.to } else { arc.from };
        let delta = self.artificial_potential(child) - self.nodes[child].potential;
        self.update_subtree(child, delta);
    }

    /// Primal repair: brings every suspect basic arc back within its bounds. Each repair either
    /// flips an artificial arc or forces a real arc out of the basis, so the pass terminates.
    pub(crate) fn repair_primal(&mut self) -> usize {
        let mut num_repairs = 0;
        while let Some(arc_id) = self.suspects.pop() {
            let arc = &self.arcs[arc_id];
            if !arc.alive || arc.status != ArcStatus::Basic || arc.is_feasible() {
                continue;
            }

            if arc.is_artificial() {
                self.flip_artificial_arc(arc_id);
            } else if arc.flow < Flow::zero() {
                self.forced_pivot(arc_id, Flow::zero());
            } else {
                let upper = arc.upper;
                self.forced_pivot(arc_id, upper);
            }
            num_repairs += 1;
        }
        num_repairs
    }

    /// Flow change on a node's supply, absorbed at the root.
    pub(crate) fn change_supply(&mut self, u: usize, supply: Flow) -> bool {
        let delta = supply - self.nodes[u].supply;
        if delta == Flow::zero() {
            return false;
        }
        self.nodes[u].supply = supply;
        let root = self.root;
        self.nodes[root].supply -= delta;
        self.update_flow_in_path(u, delta);
        true
    }

    /// New upper bound on a real arc. A nonbasic arc at its upper bound keeps following it.
    pub(crate) fn change_capacity(&mut self, arc_id: usize, upper: Flow) -> bool {
        let arc = &mut self.arcs[arc_id];
        if arc.upper == upper {
            return false;
        }
        arc.upper = upper;

        let status = arc.status;
        match status {
            ArcStatus::NonbasicLower => {}
            ArcStatus::NonbasicUpper => {
                let delta = upper - arc.flow;
                arc.flow = upper;
                let (from, to) = (arc.from, arc.to);
                self.update_flow_in_path(from, -delta);
                self.update_flow_in_path(to, delta);
            }
            ArcStatus::Basic => {
                if arc.flow > upper {
                    self.suspects.push(arc_id);
                }
            }
        }
        true
    }

    /// Takes a real arc out of the model, first driving it to zero flow outside the basis.
    pub(crate) fn drop_arc(&mut self, arc_id: usize) {
        let arc = &mut self.arcs[arc_id];
        let status = arc.status;
        match status {
            ArcStatus::NonbasicLower => {}
            ArcStatus::NonbasicUpper => {
                let flow = arc.flow;
                arc.flow = Flow::zero();
                arc.status = ArcStatus::NonbasicLower;
                let (from, to) = (arc.from, arc.to);
                self.update_flow_in_path(from, flow);
                self.update_flow_in_path(to, -flow);
            }
            ArcStatus::Basic => self.forced_pivot(arc_id, Flow::zero()),
        }
        self.remove_arc(arc_id);
    }
}
