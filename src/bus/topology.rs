//! Edge bookkeeping for the effect chain.

use std::fmt;

use super::slot::{SlotIndex, NUM_EFFECT_SLOTS};

/*
Chain Topology
==============

A bus is a straight line of nodes between two fixed taps:

    [input tap] ──→ [slot a] ──→ [slot b] ──→ ... ──→ [output tap]

Only occupied slots take part, always in ascending slot order. With every slot
empty the taps are wired straight together.

Changing one slot only ever touches the edges around that slot:

    prev = nearest occupied slot below, or the input tap
    next = nearest occupied slot above, or the output tap

    slot was empty,    becomes X:     detach prev→next          attach prev→X, X→next
    slot held C,       becomes empty: detach prev→C, C→next     attach prev→next
    slot held C,       becomes X:     detach prev→C, C→next     attach prev→X, X→next

Every change is a `Rewire`: at most two edges out, at most two edges in. The
renderer applies a whole `Rewire` between blocks, so audio never flows
through a half-edited chain.
*/

/// Identity of a node in the bus graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    InputTap,
    OutputTap,
    Effect(u32),
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
}

impl Edge {
    pub const fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} -> {:?}", self.from, self.to)
    }
}

/// Most edges a full chain can hold: one per slot plus the final hop.
pub const MAX_EDGES: usize = NUM_EFFECT_SLOTS + 1;

/// Edge edits for a single slot mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rewire {
    pub detach: [Option<Edge>; 2],
    pub attach: [Option<Edge>; 2],
}

/// An unordered set of chain edges with fixed capacity.
///
/// Capacity is reserved up front, so edits on the render thread never
/// allocate.
#[derive(Debug, Clone)]
pub struct EdgeSet {
    edges: Vec<Edge>,
}

impl EdgeSet {
    /// An empty set (no connections at all).
    pub fn new() -> Self {
        Self {
            edges: Vec::with_capacity(MAX_EDGES + 2),
        }
    }

    /// Input tap wired straight to the output tap.
    pub fn direct() -> Self {
        Self::from_chain([])
    }

    /// The edges of a chain visiting `nodes` in order between the taps.
    pub fn from_chain(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        let mut set = Self::new();
        let mut prev = NodeId::InputTap;
        for node in nodes {
            set.connect(Edge::new(prev, node));
            prev = node;
        }
        set.connect(Edge::new(prev, NodeId::OutputTap));
        set
    }

    /// Drop every edge and wire the input tap straight to the output tap,
    /// reusing the existing storage.
    pub fn make_direct(&mut self) {
        self.edges.clear();
        self.edges.push(Edge::new(NodeId::InputTap, NodeId::OutputTap));
    }

    /// Add an edge. Returns false if it was already present.
    pub fn connect(&mut self, edge: Edge) -> bool {
        if self.contains(edge) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// Remove an edge. Returns false if it was not present.
    pub fn disconnect(&mut self, edge: Edge) -> bool {
        match self.edges.iter().position(|e| *e == edge) {
            Some(i) => {
                self.edges.swap_remove(i);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, edge: Edge) -> bool {
        self.edges.contains(&edge)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// The node `from` feeds, if any.
    pub fn successor(&self, from: NodeId) -> Option<NodeId> {
        self.edges.iter().find(|e| e.from == from).map(|e| e.to)
    }

    /// Detach, then attach, the edges of one mutation.
    pub fn apply(&mut self, rewire: &Rewire) {
        for edge in rewire.detach.iter().flatten() {
            self.disconnect(*edge);
        }
        for edge in rewire.attach.iter().flatten() {
            self.connect(*edge);
        }
    }

    /// Follow edges from the input tap. Stops at the output tap, at a dead
    /// end, or after `MAX_EDGES` hops.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            edges: self,
            cursor: Some(NodeId::InputTap),
            hops: 0,
        }
    }
}

impl Default for EdgeSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Set equality: order of insertion does not matter.
impl PartialEq for EdgeSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.edges.iter().all(|e| other.contains(*e))
    }
}

impl Eq for EdgeSet {}

/// Iterator over the nodes of a chain, taps included.
pub struct Walk<'a> {
    edges: &'a EdgeSet,
    cursor: Option<NodeId>,
    hops: usize,
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.cursor?;
        self.cursor = if current == NodeId::OutputTap || self.hops >= MAX_EDGES {
            None
        } else {
            self.hops += 1;
            self.edges.successor(current)
        };
        Some(current)
    }
}

/// Nearest occupied node below `index`, or the input tap.
pub fn find_prev(nodes: &[Option<NodeId>], index: SlotIndex) -> NodeId {
    nodes[..index.get()]
        .iter()
        .rev()
        .find_map(|node| *node)
        .unwrap_or(NodeId::InputTap)
}

/// Nearest occupied node above `index`, or the output tap.
pub fn find_next(nodes: &[Option<NodeId>], index: SlotIndex) -> NodeId {
    nodes
        .get(index.get() + 1..)
        .unwrap_or_default()
        .iter()
        .find_map(|node| *node)
        .unwrap_or(NodeId::OutputTap)
}

/// Plan the edge edits that put `replacement` into slot `index`.
///
/// `nodes` is the current occupancy, one entry per slot. Returns `None` when
/// the slot is empty and stays empty.
pub fn plan_rewire(
    nodes: &[Option<NodeId>],
    index: SlotIndex,
    replacement: Option<NodeId>,
) -> Option<Rewire> {
    let current = nodes[index.get()];
    if current.is_none() && replacement.is_none() {
        return None;
    }

    let prev = find_prev(nodes, index);
    let next = find_next(nodes, index);

    let detach = match current {
        Some(current) => [
            Some(Edge::new(prev, current)),
            Some(Edge::new(current, next)),
        ],
        None => [Some(Edge::new(prev, next)), None],
    };

    let attach = match replacement {
        Some(node) => [Some(Edge::new(prev, node)), Some(Edge::new(node, next))],
        None => [Some(Edge::new(prev, next)), None],
    };

    Some(Rewire { detach, attach })
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: NodeId = NodeId::Effect(1);
    const B: NodeId = NodeId::Effect(2);
    const C: NodeId = NodeId::Effect(3);

    fn slot(i: usize) -> SlotIndex {
        SlotIndex::new(i).unwrap()
    }

    fn occupancy(entries: &[(usize, NodeId)]) -> [Option<NodeId>; NUM_EFFECT_SLOTS] {
        let mut nodes = [None; NUM_EFFECT_SLOTS];
        for &(i, node) in entries {
            nodes[i] = Some(node);
        }
        nodes
    }

    #[test]
    fn direct_set_wires_taps_together() {
        let set = EdgeSet::direct();
        assert_eq!(set.len(), 1);
        assert!(set.contains(Edge::new(NodeId::InputTap, NodeId::OutputTap)));
    }

    #[test]
    fn make_direct_forgets_the_chain() {
        let mut set = EdgeSet::from_chain([A, B, C]);
        set.make_direct();
        assert_eq!(set, EdgeSet::direct());
        assert_eq!(set.walk().collect::<Vec<_>>(), [NodeId::InputTap, NodeId::OutputTap]);
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let mut a = EdgeSet::new();
        a.connect(Edge::new(NodeId::InputTap, A));
        a.connect(Edge::new(A, NodeId::OutputTap));

        let mut b = EdgeSet::new();
        b.connect(Edge::new(A, NodeId::OutputTap));
        b.connect(Edge::new(NodeId::InputTap, A));

        assert_eq!(a, b);
        assert_eq!(a, EdgeSet::from_chain([A]));
    }

    #[test]
    fn connect_and_disconnect_report_changes() {
        let mut set = EdgeSet::new();
        let edge = Edge::new(A, B);
        assert!(set.connect(edge));
        assert!(!set.connect(edge));
        assert!(set.disconnect(edge));
        assert!(!set.disconnect(edge));
        assert!(set.is_empty());
    }

    #[test]
    fn neighbours_scan_outward_from_slot() {
        let nodes = occupancy(&[(1, A), (4, B), (6, C)]);

        assert_eq!(find_prev(&nodes, slot(0)), NodeId::InputTap);
        assert_eq!(find_prev(&nodes, slot(4)), A);
        assert_eq!(find_prev(&nodes, slot(5)), B);
        assert_eq!(find_next(&nodes, slot(1)), B);
        assert_eq!(find_next(&nodes, slot(6)), NodeId::OutputTap);
        assert_eq!(find_next(&nodes, slot(7)), NodeId::OutputTap);
    }

    #[test]
    fn empty_to_empty_is_a_no_op() {
        let nodes = occupancy(&[(2, A)]);
        assert_eq!(plan_rewire(&nodes, slot(5), None), None);
    }

    #[test]
    fn insert_into_gap_splits_the_edge() {
        let nodes = occupancy(&[(2, A), (6, C)]);
        let rewire = plan_rewire(&nodes, slot(4), Some(B)).unwrap();

        assert_eq!(rewire.detach, [Some(Edge::new(A, C)), None]);
        assert_eq!(rewire.attach, [Some(Edge::new(A, B)), Some(Edge::new(B, C))]);
    }

    #[test]
    fn clearing_a_slot_closes_the_gap() {
        let nodes = occupancy(&[(2, A), (5, B)]);
        let mut edges = EdgeSet::from_chain([A, B]);

        let rewire = plan_rewire(&nodes, slot(2), None).unwrap();
        edges.apply(&rewire);
        assert_eq!(edges, EdgeSet::from_chain([B]));

        let nodes = occupancy(&[(5, B)]);
        let rewire = plan_rewire(&nodes, slot(5), None).unwrap();
        edges.apply(&rewire);
        assert_eq!(edges, EdgeSet::direct());
    }

    #[test]
    fn replacing_an_occupant_swaps_both_edges() {
        let nodes = occupancy(&[(0, A), (3, B)]);
        let mut edges = EdgeSet::from_chain([A, B]);

        let rewire = plan_rewire(&nodes, slot(0), Some(C)).unwrap();
        edges.apply(&rewire);
        assert_eq!(edges, EdgeSet::from_chain([C, B]));
    }

    #[test]
    fn walk_visits_chain_in_order() {
        let edges = EdgeSet::from_chain([B, A, C]);
        let visited: Vec<NodeId> = edges.walk().collect();
        assert_eq!(
            visited,
            [NodeId::InputTap, B, A, C, NodeId::OutputTap]
        );
    }

    #[test]
    fn walk_stops_at_dead_end() {
        let mut edges = EdgeSet::new();
        edges.connect(Edge::new(NodeId::InputTap, A));
        let visited: Vec<NodeId> = edges.walk().collect();
        assert_eq!(visited, [NodeId::InputTap, A]);
    }
}
