//! Cost evaluation
//!
//! Two passes over a validated configuration:
//!
//! 1. **Power levels**: per node, the power costs to its two most
//!    distant neighbors under the `kappa * distance^alpha` law.
//! 2. **Subtree accounting**: rooted at a leaf link, a recursive
//!    traversal stores on every link the number of destinations on each
//!    side of the cut; per-node costs then weight the two power levels
//!    by those destination counts.
//!
//! Non-destination leaves carry no independent summand: after the main
//! pass their cost is set equal to the running total. This mirrors the
//! historical leaf attribution rule of the cost model and is preserved
//! as-is; the total itself remains the main-pass sum.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use super::link::{Link, LinkKey};
use super::node::Node;
use super::NodeId;
use crate::CostModel;

/// Outcome of scanning one node's neighborhood for its two most
/// distant neighbors.
#[derive(Debug, Default, Clone, Copy)]
struct DistanceScan {
    most: Option<(NodeId, f64)>,
    second: Option<(NodeId, f64)>,
}

impl DistanceScan {
    /// Run one neighbor through the scan. Strictly-greater comparisons:
    /// on equal distance the first-seen neighbor stays the incumbent.
    fn observe(&mut self, id: NodeId, distance: f64) {
        match self.most {
            Some((_, best)) if distance <= best => match self.second {
                Some((_, runner_up)) if distance <= runner_up => {}
                _ => self.second = Some((id, distance)),
            },
            _ => {
                self.second = self.most;
                self.most = Some((id, distance));
            }
        }
    }
}

/// Recompute every node's power levels and most-distant neighbor pair
pub(crate) fn update_power_levels(nodes: &mut HashMap<NodeId, Node>, model: &CostModel) {
    let mut scans: Vec<(NodeId, DistanceScan)> = Vec::with_capacity(nodes.len());

    for node in nodes.values() {
        let mut scan = DistanceScan::default();
        for &neighbor in node.neighbors() {
            if let Some(other) = nodes.get(&neighbor) {
                scan.observe(neighbor, node.distance_to(other));
            }
        }
        scans.push((node.id, scan));
    }

    for (id, scan) in scans {
        if let Some(node) = nodes.get_mut(&id) {
            let highest = scan.most.map_or(0.0, |(_, d)| model.power_cost(d));
            let second = scan.second.map_or(0.0, |(_, d)| model.power_cost(d));
            node.set_power_levels(highest, second);
            node.set_most_distant(scan.most.map(|(n, _)| n), scan.second.map(|(n, _)| n));
        }
    }
}

/// Run the subtree accounting pass and aggregate the total cost.
///
/// Expects power levels to be up to date and the configuration to have
/// passed validation.
pub(crate) fn evaluate(
    nodes: &mut HashMap<NodeId, Node>,
    links: &mut HashMap<LinkKey, Link>,
    destination_count: usize,
) -> f64 {
    assign_subtree_sizes(nodes, links, destination_count);

    let mut ids: Vec<NodeId> = nodes.keys().copied().collect();
    ids.sort_unstable();

    let mut total = 0.0;
    for &id in &ids {
        let (cost, skip) = match nodes.get(&id) {
            Some(node) => match node.most_distant() {
                // Unlinked nodes contribute nothing
                None => (0.0, false),
                // Non-destination leaves are attributed after the main pass
                Some(_) if !node.is_destination && node.is_leaf() => (0.0, true),
                Some(most) => {
                    let subtree = links
                        .get(&LinkKey::new(id, most))
                        .and_then(|l| l.dest_toward(most))
                        .unwrap_or(0);
                    let far = subtree as f64 * node.highest_power_level();
                    let near = destination_count.saturating_sub(subtree) as f64
                        * node.second_highest_power_level();
                    (far + near, false)
                }
            },
            None => continue,
        };

        if !skip {
            total += cost;
            if let Some(node) = nodes.get_mut(&id) {
                node.set_node_cost(cost);
            }
        }
    }

    // Leaf absorption: equal to, not added to, the total
    for node in nodes.values_mut() {
        if !node.is_destination && node.is_leaf() {
            node.set_node_cost(total);
        }
    }

    trace!(total, destination_count, "cost evaluation complete");
    total
}

/// Root the recursion at each unvisited leaf link and store, per link,
/// the destination count on both sides of the cut.
fn assign_subtree_sizes(
    nodes: &HashMap<NodeId, Node>,
    links: &mut HashMap<LinkKey, Link>,
    destination_count: usize,
) {
    let mut visited: HashSet<LinkKey> = HashSet::new();

    let mut leaves: Vec<NodeId> = nodes
        .values()
        .filter(|n| n.is_leaf())
        .map(|n| n.id)
        .collect();
    leaves.sort_unstable();

    // One rooting per connected component that has a leaf; stray
    // components without one keep zeroed sizes.
    for leaf in leaves {
        let Some(node) = nodes.get(&leaf) else { continue };
        let Some(&anchor) = node.neighbors().first() else {
            continue;
        };
        if !visited.contains(&LinkKey::new(leaf, anchor)) {
            count_destinations(nodes, links, &mut visited, leaf, anchor, destination_count);
        }
    }
}

/// Destinations in the subtree hanging off `child` when the tree is cut
/// at the `parent`-`child` link. Recurses into every other neighbor of
/// `child`; the visited set guards against revisiting shared edges.
fn count_destinations(
    nodes: &HashMap<NodeId, Node>,
    links: &mut HashMap<LinkKey, Link>,
    visited: &mut HashSet<LinkKey>,
    parent: NodeId,
    child: NodeId,
    destination_count: usize,
) -> usize {
    let key = LinkKey::new(parent, child);
    visited.insert(key);

    let Some(child_node) = nodes.get(&child) else {
        return 0;
    };

    let mut size = usize::from(child_node.is_destination);

    if child_node.degree() > 1 {
        let neighbors: Vec<NodeId> = child_node.neighbors().to_vec();
        for next in neighbors {
            if next != parent && !visited.contains(&LinkKey::new(child, next)) {
                size += count_destinations(nodes, links, visited, child, next, destination_count);
            }
        }
    }

    if let Some(link) = links.get_mut(&key) {
        link.set_dest_toward(child, size);
        link.set_dest_toward(parent, destination_count.saturating_sub(size));
    }

    size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_keeps_two_largest() {
        let mut scan = DistanceScan::default();
        scan.observe(1, 2.0);
        scan.observe(2, 5.0);
        scan.observe(3, 3.0);

        assert_eq!(scan.most, Some((2, 5.0)));
        assert_eq!(scan.second, Some((3, 3.0)));
    }

    #[test]
    fn test_scan_tie_keeps_first_seen() {
        let mut scan = DistanceScan::default();
        scan.observe(1, 4.0);
        scan.observe(2, 4.0);
        scan.observe(3, 4.0);

        assert_eq!(scan.most, Some((1, 4.0)));
        assert_eq!(scan.second, Some((2, 4.0)));
    }

    #[test]
    fn test_scan_single_neighbor_leaves_second_unset() {
        let mut scan = DistanceScan::default();
        scan.observe(9, 1.0);

        assert_eq!(scan.most, Some((9, 1.0)));
        assert_eq!(scan.second, None);
    }
}
