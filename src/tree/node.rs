//! Tree node representation
//!
//! A node is a model-space point with a destination flag, an ordered
//! neighbor list, and the metrics cached by the evaluation pass. The
//! neighbor list is only ever edited through the tree store's link API,
//! which maintains the symmetry invariant (A lists B iff B lists A).

use super::NodeId;

/// A single node of a shared multicast tree
#[derive(Debug, Clone)]
pub struct Node {
    /// Process-unique identifier, immutable for the node's lifetime
    pub id: NodeId,

    /// Whether this node must receive the multicast signal.
    /// Immutable per instance; changing kind replaces the node.
    pub is_destination: bool,

    x: f64,
    y: f64,

    /// Neighbor ids in insertion order, no duplicates, never `self.id`
    neighbors: Vec<NodeId>,

    // Metrics cached by the evaluation pass, reset on every mutation
    highest_power_level: f64,
    second_highest_power_level: f64,
    node_cost: f64,
    most_distant: Option<NodeId>,
    second_most_distant: Option<NodeId>,
}

impl Node {
    /// Create a node with an empty neighbor list
    pub(crate) fn new(id: NodeId, x: f64, y: f64, is_destination: bool) -> Self {
        Self {
            id,
            is_destination,
            x,
            y,
            neighbors: Vec::new(),
            highest_power_level: 0.0,
            second_highest_power_level: 0.0,
            node_cost: 0.0,
            most_distant: None,
            second_most_distant: None,
        }
    }

    /// Exact copy with the opposite kind: id, position and neighbor list
    /// are preserved, only the destination flag flips
    pub(crate) fn with_opposite_kind(&self) -> Self {
        let mut copy = self.clone();
        copy.is_destination = !self.is_destination;
        copy
    }

    /// X coordinate in model space
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Y coordinate in model space
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Euclidean distance to another node
    pub fn distance_to(&self, other: &Node) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Neighbor ids in insertion order
    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    /// Number of incident links
    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }

    /// True if exactly one link is incident
    pub fn is_leaf(&self) -> bool {
        self.neighbors.len() == 1
    }

    /// Power cost to the most distant neighbor (0 when unlinked)
    pub fn highest_power_level(&self) -> f64 {
        self.highest_power_level
    }

    /// Power cost to the second most distant neighbor (0 with fewer
    /// than two neighbors)
    pub fn second_highest_power_level(&self) -> f64 {
        self.second_highest_power_level
    }

    /// Cost attributed to this node by the last evaluation
    pub fn node_cost(&self) -> f64 {
        self.node_cost
    }

    /// Id of the most distant neighbor, if any neighbor exists
    pub fn most_distant(&self) -> Option<NodeId> {
        self.most_distant
    }

    /// Id of the second most distant neighbor, if at least two exist
    pub fn second_most_distant(&self) -> Option<NodeId> {
        self.second_most_distant
    }

    pub(crate) fn relocate(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    /// Append a neighbor id, ignoring duplicates and self references
    pub(crate) fn add_neighbor(&mut self, id: NodeId) {
        if id == self.id || self.neighbors.contains(&id) {
            return;
        }
        self.neighbors.push(id);
    }

    /// Drop a neighbor id if present
    pub(crate) fn remove_neighbor(&mut self, id: NodeId) {
        self.neighbors.retain(|&n| n != id);
    }

    pub(crate) fn clear_neighbors(&mut self) {
        self.neighbors.clear();
    }

    /// Reset cached metrics ahead of a recalculation
    pub(crate) fn reset_metrics(&mut self) {
        self.highest_power_level = 0.0;
        self.second_highest_power_level = 0.0;
        self.node_cost = 0.0;
        self.most_distant = None;
        self.second_most_distant = None;
    }

    pub(crate) fn set_power_levels(&mut self, highest: f64, second_highest: f64) {
        self.highest_power_level = highest;
        self.second_highest_power_level = second_highest;
    }

    pub(crate) fn set_most_distant(&mut self, most: Option<NodeId>, second: Option<NodeId>) {
        self.most_distant = most;
        self.second_most_distant = second;
    }

    pub(crate) fn set_node_cost(&mut self, cost: f64) {
        self.node_cost = cost;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbor_list_rejects_duplicates_and_self() {
        let mut node = Node::new(0, 0.0, 0.0, true);
        node.add_neighbor(1);
        node.add_neighbor(1);
        node.add_neighbor(0);
        assert_eq!(node.neighbors(), &[1]);
    }

    #[test]
    fn test_opposite_kind_preserves_topology() {
        let mut node = Node::new(3, 1.5, -2.5, false);
        node.add_neighbor(1);
        node.add_neighbor(2);

        let flipped = node.with_opposite_kind();
        assert!(flipped.is_destination);
        assert_eq!(flipped.id, 3);
        assert_eq!(flipped.x(), 1.5);
        assert_eq!(flipped.neighbors(), node.neighbors());
    }

    #[test]
    fn test_distance_is_euclidean() {
        let a = Node::new(0, 0.0, 0.0, true);
        let b = Node::new(1, 3.0, 4.0, false);
        assert_eq!(a.distance_to(&b), 5.0);
    }
}
