//! Structural legality of a node/link configuration
//!
//! Cost figures are only trusted on a legal multicast tree. The checks
//! run in a fixed order, cheap count comparisons first, the O(N)
//! reachability traversal last, so illegal configurations fail fast:
//!
//! 1. `node_count <= link_count` -> invalid (edge surplus implies a cycle)
//! 2. no links and at most one destination -> trivially valid
//! 3. an isolated destination while other destinations exist -> invalid
//! 4. links present but no leaf anywhere -> invalid
//! 5. no links but several destinations -> invalid
//! 6. some destination unreachable from the first -> invalid

use std::collections::{HashMap, HashSet};

use super::link::{Link, LinkKey};
use super::node::Node;
use super::NodeId;

/// Decide whether the configuration is a legal multicast tree
pub(crate) fn is_valid(
    nodes: &HashMap<NodeId, Node>,
    links: &HashMap<LinkKey, Link>,
    destination_count: usize,
) -> bool {
    // A tree on N nodes has at most N-1 edges
    if nodes.len() <= links.len() {
        return false;
    }

    // One point, nothing to transmit
    if links.is_empty() && destination_count <= 1 {
        return true;
    }

    if destination_count > 1
        && nodes
            .values()
            .any(|n| n.is_destination && n.degree() == 0)
    {
        return false;
    }

    // Any tree with >= 2 nodes has a leaf
    if !links.is_empty() && !nodes.values().any(Node::is_leaf) {
        return false;
    }

    if links.is_empty() {
        return false;
    }

    destinations_connected(nodes)
}

/// Depth-first traversal from the lowest-id destination; every other
/// destination must be reachable via neighbor edges.
fn destinations_connected(nodes: &HashMap<NodeId, Node>) -> bool {
    let start = match nodes
        .values()
        .filter(|n| n.is_destination)
        .map(|n| n.id)
        .min()
    {
        Some(id) => id,
        None => return true, // no destinations, nothing to connect
    };

    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut stack = vec![start];

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        if let Some(node) = nodes.get(&id) {
            for &neighbor in node.neighbors() {
                if !visited.contains(&neighbor) {
                    stack.push(neighbor);
                }
            }
        }
    }

    nodes
        .values()
        .filter(|n| n.is_destination)
        .all(|n| visited.contains(&n.id))
}
