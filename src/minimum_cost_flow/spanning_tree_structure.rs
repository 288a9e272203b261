use crate::graph::{ArcId, NodeId};
use crate::minimum_cost_flow::status::ArcStatus;
use num_traits::{Bounded, NumAssign};
use std::fmt::Debug;
use std::ops::Neg;

#[derive(Clone, Debug)]
pub struct Node<Flow> {
    pub parent: usize,
    pub parent_arc_id: usize,
    pub artificial_arc_id: usize,
    pub potential: Flow,
    pub supply: Flow,
    pub depth: usize,
    pub degree: usize, // number of live real arcs touching the node
    pub external: Option<NodeId>,
    pub alive: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArcKind {
    Real(ArcId),
    Artificial,
}

#[derive(Clone, Debug)]
pub struct InternalArc<Flow> {
    pub from: usize,
    pub to: usize,
    pub upper: Flow,
    pub cost: Flow,
    pub flow: Flow,
    pub status: ArcStatus,
    pub kind: ArcKind,
    pub alive: bool,
}

impl<Flow> InternalArc<Flow>
where
    Flow: NumAssign + Bounded + Neg<Output = Flow> + Ord + Copy + Debug,
{
    pub fn is_feasible(&self) -> bool {
        Flow::zero() <= self.flow && self.flow <= self.upper
    }

    pub fn is_lower(&self) -> bool {
        self.flow == Flow::zero()
    }

    pub fn residual_capacity(&self) -> Flow {
        self.upper - self.flow
    }

    pub fn is_artificial(&self) -> bool {
        self.kind == ArcKind::Artificial
    }

    pub fn opposite_side(&self, u: usize) -> usize {
        debug_assert!(u == self.from || u == self.to);
        u ^ self.to ^ self.from
    }
}

pub(crate) fn abs<Flow>(value: Flow) -> Flow
where
    Flow: NumAssign + Neg<Output = Flow> + Ord + Copy,
{
    if value < Flow::zero() {
        -value
    } else {
        value
    }
}

/// Arena-backed spanning-tree basis rooted at a synthetic node.
///
/// Slot 0 is the artificial root. Every live real node owns one artificial arc to the root, and
/// the basic arcs always form a spanning tree over the live nodes. The tree is stored as parent
/// pointers plus a circular depth-first thread (`next_node_dft`/`prev_node_dft`), which gives
/// O(subtree) walks and O(depth) ancestor queries. Freed slots are recycled.
pub struct SpanningTreeStructure<Flow> {
    pub(crate) root: usize,
    pub(crate) nodes: Vec<Node<Flow>>,
    pub(crate) arcs: Vec<InternalArc<Flow>>,
    free_nodes: Vec<usize>,
    free_arcs: Vec<usize>,

    pub(crate) next_node_dft: Vec<usize>,       // next nodes in depth-first thread
    pub(crate) prev_node_dft: Vec<usize>,       // previous nodes in depth-first thread
    pub(crate) last_descendent_dft: Vec<usize>, // last descendants in depth-first thread
    pub(crate) num_successors: Vec<usize>,      // the number of successors of the node in the tree

    pub(crate) artificial_cost: Flow,
    pub(crate) total_abs_cost: Flow, // sum of |cost| over live real arcs
    pub(crate) num_real_nodes: usize,
    pub(crate) suspects: Vec<usize>, // basic arcs whose flow may have left its bounds
}

impl<Flow> Default for SpanningTreeStructure<Flow>
where
    Flow: NumAssign + Bounded + Neg<Output = Flow> + Ord + Copy + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Flow> SpanningTreeStructure<Flow>
where
    Flow: NumAssign + Bounded + Neg<Output = Flow> + Ord + Copy + Debug,
{
    pub fn new() -> Self {
        let root = Node {
            parent: usize::MAX,
            parent_arc_id: usize::MAX,
            artificial_arc_id: usize::MAX,
            potential: Flow::zero(),
            supply: Flow::zero(),
            depth: 0,
            degree: 0,
            external: None,
            alive: true,
        };

        Self {
            root: 0,
            nodes: vec![root],
            arcs: Vec::new(),
            free_nodes: Vec::new(),
            free_arcs: Vec::new(),
            next_node_dft: vec![0],
            prev_node_dft: vec![0],
            last_descendent_dft: vec![0],
            num_successors: vec![1],
            artificial_cost: Flow::one(),
            total_abs_cost: Flow::zero(),
            num_real_nodes: 0,
            suspects: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn reduced_cost(&self, arc: &InternalArc<Flow>) -> Flow {
        arc.cost - self.nodes[arc.from].potential + self.nodes[arc.to].potential
    }

    /// Potential a node must have when it hangs directly off the root through its artificial arc.
    pub(crate) fn artificial_potential(&self, u: usize) -> Flow {
        let arc = &self.arcs[self.nodes[u].artificial_arc_id];
        if arc.from == u {
            self.nodes[self.root].potential + arc.cost
        } else {
            self.nodes[self.root].potential - arc.cost
        }
    }

    fn alloc_node(&mut self, node: Node<Flow>) -> usize {
        match self.free_nodes.pop() {
            Some(u) => {
                self.nodes[u] = node;
                u
            }
            None => {
                self.nodes.push(node);
                self.next_node_dft.push(usize::MAX);
                self.prev_node_dft.push(usize::MAX);
                self.last_descendent_dft.push(usize::MAX);
                self.num_successors.push(0);
                self.nodes.len() - 1
            }
        }
    }

    fn alloc_arc(&mut self, arc: InternalArc<Flow>) -> usize {
        match self.free_arcs.pop() {
            Some(arc_id) => {
                self.arcs[arc_id] = arc;
                arc_id
            }
            None => {
                self.arcs.push(arc);
                self.arcs.len() - 1
            }
        }
    }

    /// Adds a node as a leaf of the root, routing its whole supply through its artificial arc.
    pub(crate) fn add_node(&mut self, external: NodeId, supply: Flow) -> usize {
        let u = self.alloc_node(Node {
            parent: usize::MAX,
            parent_arc_id: usize::MAX,
            artificial_arc_id: usize::MAX,
            potential: Flow::zero(),
            supply,
            depth: 0,
            degree: 0,
            external: Some(external),
            alive: true,
        });

        let (from, to) = if supply >= Flow::zero() { (u, self.root) } else { (self.root, u) };
        let arc_id = self.alloc_arc(InternalArc {
            from,
            to,
            upper: Flow::max_value(),
            cost: self.artificial_cost,
            flow: abs(supply),
            status: ArcStatus::Basic,
            kind: ArcKind::Artificial,
            alive: true,
        });
        self.nodes[u].artificial_arc_id = arc_id;
        self.nodes[self.root].supply -= supply;

        self.next_node_dft[u] = u;
        self.prev_node_dft[u] = u;
        self.last_descendent_dft[u] = u;
        self.num_successors[u] = 1;
        self.attach_tree(self.root, u, arc_id);
        self.nodes[u].potential = self.artificial_potential(u);
        self.nodes[u].depth = 1;
        self.num_real_nodes += 1;
        u
    }

    /// Drops a node that has been reduced to a zero-flow leaf of the root.
    pub(crate) fn remove_leaf(&mut self, u: usize) {
        debug_assert_eq!(self.nodes[u].parent, self.root);
        debug_assert_eq!(self.num_successors[u], 1);
        debug_assert_eq!(self.nodes[u].degree, 0);

        let arc_id = self.nodes[u].artificial_arc_id;
        debug_assert!(self.arcs[arc_id].is_lower());
        self.detach_tree(u);

        self.arcs[arc_id].alive = false;
        self.free_arcs.push(arc_id);
        let supply = self.nodes[u].supply;
        self.nodes[self.root].supply += supply;
        self.nodes[u].alive = false;
        self.free_nodes.push(u);
        self.num_real_nodes -= 1;
    }

    /// Adds a real arc at its lower bound.
    pub(crate) fn add_arc(&mut self, external: ArcId, from: usize, to: usize, cost: Flow, upper: Flow) -> usize {
        let arc_id = self.alloc_arc(InternalArc {
            from,
            to,
            upper,
            cost,
            flow: Flow::zero(),
            status: ArcStatus::NonbasicLower,
            kind: ArcKind::Real(external),
            alive: true,
        });
        self.nodes[from].degree += 1;
        self.nodes[to].degree += 1;
        self.total_abs_cost += abs(cost);
        arc_id
    }

    /// Drops a real arc that has already been driven out of the basis to zero flow.
    pub(crate) fn remove_arc(&mut self, arc_id: usize) {
        let arc = &mut self.arcs[arc_id];
        debug_assert!(arc.status == ArcStatus::NonbasicLower && arc.is_lower());
        arc.alive = false;
        let (from, to, cost) = (arc.from, arc.to, arc.cost);
        self.nodes[from].degree -= 1;
        self.nodes[to].degree -= 1;
        self.total_abs_cost -= abs(cost);
        self.free_arcs.push(arc_id);
    }

    /// Routes `delta` extra units from `source` up the tree path to the root.
    ///
    /// Every arc on the path is recorded as a suspect for the primal repair pass.
    pub(crate) fn update_flow_in_path(&mut self, source: usize, delta: Flow) {
        if delta == Flow::zero() {
            return;
        }
        let mut now = source;
        while now != self.root {
            let (parent, arc_id) = (self.nodes[now].parent, self.nodes[now].parent_arc_id);
            let arc = &mut self.arcs[arc_id];
            arc.flow += if arc.from == now { delta } else { -delta };
            self.suspects.push(arc_id);
            now = parent;
        }
    }

    pub(crate) fn update_flow_in_cycle(&mut self, entering_arc_id: usize, delta: Flow, apex: usize) {
        let delta = match self.arcs[entering_arc_id].status {
            ArcStatus::NonbasicUpper => -delta,
            _ => delta,
        };
        self.arcs[entering_arc_id].flow += delta;

        let mut now = self.arcs[entering_arc_id].from;
        while now != apex {
            let arc = &mut self.arcs[self.nodes[now].parent_arc_id];
            arc.flow += if now == arc.from { -delta } else { delta };
            now = self.nodes[now].parent;
        }

        let mut now = self.arcs[entering_arc_id].to;
        while now != apex {
            let arc = &mut self.arcs[self.nodes[now].parent_arc_id];
            arc.flow += if now == arc.from { delta } else { -delta };
            now = self.nodes[now].parent;
        }
    }

    // change the root of a detached subtree to new_root
    // O(|tree|)
    pub(crate) fn re_rooting(&mut self, new_root: usize) {
        let mut ancestors = Vec::new();
        let mut now = new_root;
        while now != usize::MAX {
            ancestors.push(now);
            now = self.nodes[now].parent;
        }
        ancestors.reverse();

        for pair in ancestors.windows(2) {
            let (p, q) = (pair[0], pair[1]);
            let size_p = self.num_successors[p];
            let last_q = self.last_descendent_dft[q];

            self.nodes[p].parent = q;
            self.nodes[q].parent = usize::MAX;
            self.nodes[p].parent_arc_id = self.nodes[q].parent_arc_id;
            self.nodes[q].parent_arc_id = usize::MAX;
            self.num_successors[p] = size_p - self.num_successors[q];
            self.num_successors[q] = size_p;

            let prev_q = self.prev_node_dft[q];
            let next_last_q = self.next_node_dft[last_q];
            self.next_node_dft[prev_q] = next_last_q;
            self.prev_node_dft[next_last_q] = prev_q;
            self.next_node_dft[last_q] = q;
            self.prev_node_dft[q] = last_q;

            let mut last_p = self.last_descendent_dft[p];
            if last_p == last_q {
                self.last_descendent_dft[p] = prev_q;
                last_p = prev_q;
            }

            self.prev_node_dft[p] = last_q;
            self.next_node_dft[last_q] = p;
            self.next_node_dft[last_p] = q;
            self.prev_node_dft[q] = last_p;
            self.last_descendent_dft[q] = last_p;
        }
    }

    // cut the subtree of sub_tree_root off its parent
    pub(crate) fn detach_tree(&mut self, sub_tree_root: usize) {
        let parent = self.nodes[sub_tree_root].parent;
        self.nodes[sub_tree_root].parent = usize::MAX;
        self.nodes[sub_tree_root].parent_arc_id = usize::MAX;

        let prev_t = self.prev_node_dft[sub_tree_root];
        let last_t = self.last_descendent_dft[sub_tree_root];
        let next_last_t = self.next_node_dft[last_t];
        self.next_node_dft[prev_t] = next_last_t;
        self.prev_node_dft[next_last_t] = prev_t;
        self.next_node_dft[last_t] = sub_tree_root;
        self.prev_node_dft[sub_tree_root] = last_t;

        let sub_tree_size = self.num_successors[sub_tree_root];
        let mut now = parent;
        while now != usize::MAX {
            self.num_successors[now] -= sub_tree_size;
            if self.last_descendent_dft[now] == last_t {
                self.last_descendent_dft[now] = prev_t;
            }
            now = self.nodes[now].parent;
        }
    }

    // attach the detached subtree of sub_tree_root under attach_node through arc_id
    // O(depth)
    pub(crate) fn attach_tree(&mut self, attach_node: usize, sub_tree_root: usize, arc_id: usize) {
        self.arcs[arc_id].status = ArcStatus::Basic;

        let (p, q) = (attach_node, sub_tree_root); // p -> q
        self.nodes[q].parent = p;
        self.nodes[q].parent_arc_id = arc_id;

        let last_p = self.last_descendent_dft[attach_node];
        let next_last_p = self.next_node_dft[last_p];
        let last_q = self.last_descendent_dft[q];
        self.next_node_dft[last_p] = q;
        self.prev_node_dft[q] = last_p;
        self.prev_node_dft[next_last_p] = last_q;
        self.next_node_dft[last_q] = next_last_p;

        let sub_tree_size = self.num_successors[q];
        let mut now = attach_node;
        while now != usize::MAX {
            self.num_successors[now] += sub_tree_size;
            if self.last_descendent_dft[now] == last_p {
                self.last_descendent_dft[now] = last_q
            }
            now = self.nodes[now].parent;
        }
    }

    /// Live nodes in thread order, starting at the root.
    pub(crate) fn thread_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.num_real_nodes + 1);
        let mut now = self.root;
        loop {
            order.push(now);
            now = self.next_node_dft[now];
            if now == self.root || order.len() > self.nodes.len() {
                break;
            }
        }
        order
    }

    /// Bounds on every live arc and flow conservation at every live node, the root included.
    pub fn satisfy_constraints(&self) -> bool {
        let mut balance: Vec<Flow> = self.nodes.iter().map(|node| node.supply).collect();
        for arc in self.arcs.iter().filter(|arc| arc.alive) {
            if !arc.is_feasible() {
                return false;
            }
            balance[arc.from] -= arc.flow;
            balance[arc.to] += arc.flow;
        }
        self.nodes.iter().zip(balance).all(|(node, excess)| !node.alive || excess == Flow::zero())
    }

    pub fn satisfy_optimality_conditions(&self) -> bool {
        self.arcs.iter().filter(|arc| arc.alive).all(|arc| {
            let reduced_cost = self.reduced_cost(arc);
            match arc.status {
                ArcStatus::Basic => reduced_cost == Flow::zero(),
                ArcStatus::NonbasicLower if arc.is_artificial() => reduced_cost >= Flow::zero() && reduced_cost <= arc.cost + arc.cost,
                ArcStatus::NonbasicLower => arc.upper == Flow::zero() || reduced_cost >= Flow::zero(),
                ArcStatus::NonbasicUpper => arc.upper == Flow::zero() || reduced_cost <= Flow::zero(),
            }
        })
    }

    /// Checks parent pointers, thread, depths, subtree sizes and the basis size against each other.
    pub fn validate_tree(&self) -> bool {
        let order = self.thread_order();
        if order.len() != self.num_real_nodes + 1 || self.next_node_dft[order[order.len() - 1]] != self.root {
            return false;
        }

        let mut position = vec![usize::MAX; self.nodes.len()];
        for (i, &u) in order.iter().enumerate() {
            if !self.nodes[u].alive || position[u] != usize::MAX {
                return false;
            }
            position[u] = i;
        }

        for &u in order.iter().skip(1) {
            let node = &self.nodes[u];
            if node.parent == usize::MAX || position[node.parent] >= position[u] {
                return false;
            }
            if node.depth != self.nodes[node.parent].depth + 1 {
                return false;
            }
            let arc = &self.arcs[node.parent_arc_id];
            if !arc.alive || arc.status != ArcStatus::Basic || arc.opposite_side(u) != node.parent {
                return false;
            }
        }

        let mut num_successors = vec![1; self.nodes.len()];
        for &u in order.iter().rev() {
            if num_successors[u] != self.num_successors[u] {
                return false;
            }
            if order[position[u] + num_successors[u] - 1] != self.last_descendent_dft[u] {
                return false;
            }
            if self.nodes[u].parent != usize::MAX {
                num_successors[self.nodes[u].parent] += num_successors[u];
            }
        }

        let num_basic = self.arcs.iter().filter(|arc| arc.alive && arc.status == ArcStatus::Basic).count();
        num_basic == self.num_real_nodes
    }
}
