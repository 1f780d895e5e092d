//! Tree store: owns the node set, derives the distinct link set, and
//! orchestrates recalculation after every mutation
//!
//! The neighbor lists are the single source of truth for topology. Each
//! mutation resets cached metrics, rebuilds the deduplicated link set
//! from the neighbor lists, validates the configuration, and, if it is
//! legal, runs the cost evaluation - all synchronously on the caller's
//! thread. Callers observe the final validity and cost when the call
//! returns; an invalid configuration is reported through
//! [`Tree::is_valid`] with the cost pinned at the `-1` sentinel.

mod cost;
mod ident;
mod link;
mod node;
mod validate;

pub use ident::IdAllocator;
pub use link::{Link, LinkKey};
pub use node::Node;

use std::collections::HashMap;
use std::time::Instant;

use tracing::debug;

use crate::{CostModel, SmtError, INVALID_COST};

/// Process-unique node identifier
pub type NodeId = u32;

/// A shared multicast tree: destination and relay nodes joined by
/// undirected links, with a power-law transmission cost model.
///
/// Not thread-safe; recalculation runs on the mutating thread.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: HashMap<NodeId, Node>,
    links: HashMap<LinkKey, Link>,
    destination_count: usize,
    model: CostModel,
    cost: f64,
    calculation_time_ms: f64,
    valid: bool,
    ids: IdAllocator,
}

impl Tree {
    /// Create an empty tree with the default cost model
    pub fn new() -> Self {
        Self::with_model(CostModel::default())
    }

    /// Create an empty tree with an explicit cost model
    pub fn with_model(model: CostModel) -> Self {
        Self {
            nodes: HashMap::new(),
            links: HashMap::new(),
            destination_count: 0,
            model,
            cost: 0.0,
            calculation_time_ms: 0.0,
            valid: false,
            ids: IdAllocator::new(),
        }
    }

    /// Build a tree from parsed layout data: one coordinate per node,
    /// destinations first, and per-node neighbor lists of 0-based
    /// indices into the coordinate list.
    ///
    /// Neighbor lists are mirrored on insertion, so a link listed by
    /// only one endpoint still comes out symmetric.
    pub fn from_layout(
        coords: &[(f64, f64)],
        neighbor_lists: &[Vec<usize>],
        destinations: usize,
    ) -> Result<Self, SmtError> {
        if coords.len() != neighbor_lists.len() {
            return Err(SmtError::LayoutMismatch {
                nodes: coords.len(),
                lists: neighbor_lists.len(),
            });
        }
        if destinations > coords.len() {
            return Err(SmtError::TooManyDestinations {
                destinations,
                nodes: coords.len(),
            });
        }
        for list in neighbor_lists {
            if let Some(&index) = list.iter().find(|&&i| i >= coords.len()) {
                return Err(SmtError::NeighborOutOfRange {
                    index,
                    nodes: coords.len(),
                });
            }
        }

        let mut tree = Tree::new();
        let ids: Vec<NodeId> = coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| {
                let id = tree.ids.issue();
                tree.nodes.insert(id, Node::new(id, x, y, i < destinations));
                id
            })
            .collect();
        tree.destination_count = destinations;

        for (i, list) in neighbor_lists.iter().enumerate() {
            for &j in list {
                let (a, b) = (ids[i], ids[j]);
                if let Some(n) = tree.nodes.get_mut(&a) {
                    n.add_neighbor(b);
                }
                if let Some(n) = tree.nodes.get_mut(&b) {
                    n.add_neighbor(a);
                }
            }
        }

        tree.recalculate();
        Ok(tree)
    }

    // ---- mutation API ----

    /// Insert a node with an empty neighbor list. Always succeeds and
    /// returns the freshly allocated id.
    pub fn add_node(&mut self, x: f64, y: f64, is_destination: bool) -> NodeId {
        let id = self.ids.issue();
        self.nodes.insert(id, Node::new(id, x, y, is_destination));
        if is_destination {
            self.destination_count += 1;
        }
        self.recalculate();
        id
    }

    /// Link two nodes. No-op if either id is absent, the ids are equal,
    /// or the pair is already linked.
    pub fn add_link(&mut self, id1: NodeId, id2: NodeId) {
        if id1 == id2 || !self.nodes.contains_key(&id1) || !self.nodes.contains_key(&id2) {
            return;
        }
        if self
            .nodes
            .get(&id1)
            .is_some_and(|n| n.neighbors().contains(&id2))
        {
            return;
        }

        if let Some(n) = self.nodes.get_mut(&id1) {
            n.add_neighbor(id2);
        }
        if let Some(n) = self.nodes.get_mut(&id2) {
            n.add_neighbor(id1);
        }
        self.recalculate();
    }

    /// Unlink two nodes; absent ids or an absent link are a no-op
    pub fn remove_link(&mut self, id1: NodeId, id2: NodeId) {
        if !self.nodes.contains_key(&id1) || !self.nodes.contains_key(&id2) {
            return;
        }
        if let Some(n) = self.nodes.get_mut(&id1) {
            n.remove_neighbor(id2);
        }
        if let Some(n) = self.nodes.get_mut(&id2) {
            n.remove_neighbor(id1);
        }
        self.recalculate();
    }

    /// Delete a node and every link incident to it; absent ids are a
    /// no-op
    pub fn remove_node(&mut self, id: NodeId) {
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };
        if node.is_destination {
            self.destination_count -= 1;
        }
        for &neighbor in node.neighbors() {
            if let Some(n) = self.nodes.get_mut(&neighbor) {
                n.remove_neighbor(id);
            }
        }
        self.recalculate();
    }

    /// Move a node; positions feed directly into cost, so this
    /// recalculates too
    pub fn relocate_node(&mut self, id: NodeId, x: f64, y: f64) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        node.relocate(x, y);
        self.recalculate();
    }

    /// Replace a node with a copy of the opposite kind, preserving id,
    /// position and neighbor list
    pub fn change_kind(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let replacement = node.with_opposite_kind();
        if replacement.is_destination {
            self.destination_count += 1;
        } else {
            self.destination_count -= 1;
        }
        self.nodes.insert(id, replacement);
        self.recalculate();
    }

    /// Retune the power law; cost is recomputed over the existing tree
    pub fn set_cost_parameters(&mut self, kappa: f64, alpha: f64) {
        self.model = CostModel::new(kappa, alpha);
        self.recalculate();
    }

    /// Drop all nodes and links and reset the identifier allocator.
    /// The only place the allocator may restart.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
        self.destination_count = 0;
        self.cost = 0.0;
        self.calculation_time_ms = 0.0;
        self.valid = false;
        self.ids.reset();
    }

    // ---- bulk editing (editor conveniences) ----

    /// Turn every relay into a destination
    pub fn make_all_destinations(&mut self) {
        let relays: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| !n.is_destination)
            .map(|n| n.id)
            .collect();
        for id in relays {
            if let Some(node) = self.nodes.get(&id) {
                let replacement = node.with_opposite_kind();
                self.nodes.insert(id, replacement);
            }
        }
        self.destination_count = self.nodes.len();
        self.recalculate();
    }

    /// Turn every destination into a relay
    pub fn make_all_relays(&mut self) {
        let destinations: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.is_destination)
            .map(|n| n.id)
            .collect();
        for id in destinations {
            if let Some(node) = self.nodes.get(&id) {
                let replacement = node.with_opposite_kind();
                self.nodes.insert(id, replacement);
            }
        }
        self.destination_count = 0;
        self.recalculate();
    }

    /// Remove every link, keeping the nodes in place
    pub fn remove_all_links(&mut self) {
        for node in self.nodes.values_mut() {
            node.clear_neighbors();
        }
        self.recalculate();
    }

    /// Delete every relay node along with its links
    pub fn retain_destinations(&mut self) {
        self.retain_kind(true);
    }

    /// Delete every destination node along with its links
    pub fn retain_relays(&mut self) {
        self.retain_kind(false);
    }

    fn retain_kind(&mut self, keep_destinations: bool) {
        let doomed: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.is_destination != keep_destinations)
            .map(|n| n.id)
            .collect();
        for &id in &doomed {
            self.nodes.remove(&id);
        }
        for node in self.nodes.values_mut() {
            for &id in &doomed {
                node.remove_neighbor(id);
            }
        }
        self.destination_count = if keep_destinations { self.nodes.len() } else { 0 };
        self.recalculate();
    }

    // ---- read accessors ----

    /// All nodes, in no particular order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Node by id
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// The neighbor nodes of `id`, in neighbor-list order
    pub fn neighbors_of(&self, id: NodeId) -> Vec<&Node> {
        match self.nodes.get(&id) {
            Some(node) => node
                .neighbors()
                .iter()
                .filter_map(|n| self.nodes.get(n))
                .collect(),
            None => Vec::new(),
        }
    }

    /// All distinct links, in no particular order
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Link between two ids, if present
    pub fn link(&self, id1: NodeId, id2: NodeId) -> Option<&Link> {
        self.links.get(&LinkKey::new(id1, id2))
    }

    /// Geometric length of a link (not its power cost)
    pub fn link_length(&self, link: &Link) -> f64 {
        let (a, b) = link.endpoints();
        match (self.nodes.get(&a), self.nodes.get(&b)) {
            (Some(na), Some(nb)) => na.distance_to(nb),
            _ => 0.0,
        }
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Number of destination nodes
    pub fn destination_count(&self) -> usize {
        self.destination_count
    }

    /// Number of relay (non-destination) nodes
    pub fn non_destination_count(&self) -> usize {
        self.nodes.len() - self.destination_count
    }

    /// All destination nodes
    pub fn destinations(&self) -> Vec<&Node> {
        self.nodes.values().filter(|n| n.is_destination).collect()
    }

    /// All relay nodes
    pub fn non_destinations(&self) -> Vec<&Node> {
        self.nodes.values().filter(|n| !n.is_destination).collect()
    }

    /// The link carrying the highest power level in use, if any.
    /// Ties go to the lowest node id, so the answer is deterministic.
    pub fn heaviest_link(&self) -> Option<LinkKey> {
        let leader = self
            .nodes
            .values()
            .filter(|n| n.highest_power_level() > 0.0)
            .max_by(|a, b| {
                a.highest_power_level()
                    .total_cmp(&b.highest_power_level())
                    .then_with(|| b.id.cmp(&a.id))
            })?;
        let most = leader.most_distant()?;
        Some(LinkKey::new(leader.id, most))
    }

    /// Total tree cost; `-1` while the configuration is invalid
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Whether the last recalculation found a legal multicast tree
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Wall-clock duration of the last cost evaluation, in milliseconds
    pub fn calculation_time_ms(&self) -> f64 {
        self.calculation_time_ms
    }

    /// The active cost model
    pub fn cost_model(&self) -> CostModel {
        self.model
    }

    // ---- recalculation ----

    /// Reset caches, rebuild links, validate, and evaluate. Runs after
    /// every mutation; only the evaluation is timed.
    fn recalculate(&mut self) {
        for node in self.nodes.values_mut() {
            node.reset_metrics();
        }
        self.rebuild_links();
        cost::update_power_levels(&mut self.nodes, &self.model);

        self.valid = validate::is_valid(&self.nodes, &self.links, self.destination_count);
        if !self.valid {
            debug!(
                nodes = self.nodes.len(),
                links = self.links.len(),
                destinations = self.destination_count,
                "configuration is not a valid multicast tree"
            );
            self.cost = INVALID_COST;
            return;
        }

        let start = Instant::now();
        self.cost = cost::evaluate(&mut self.nodes, &mut self.links, self.destination_count);
        self.calculation_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            cost = self.cost,
            elapsed_ms = self.calculation_time_ms,
            "tree evaluated"
        );
    }

    /// Derive the deduplicated link set from the neighbor lists
    fn rebuild_links(&mut self) {
        self.links.clear();
        for node in self.nodes.values() {
            for &neighbor in node.neighbors() {
                let key = LinkKey::new(node.id, neighbor);
                self.links.entry(key).or_insert_with(|| Link::new(key));
            }
        }
    }

    // ---- summary surface ----

    /// Formatted value for one summary field, as shown by an output view
    pub fn field_value(&self, field: SummaryField) -> String {
        match field {
            SummaryField::AverageNodeCost => self.average_node_cost().to_string(),
            SummaryField::AverageLinkLength => self.average_link_length().to_string(),
            SummaryField::LongestLink => self.longest_link_length().to_string(),
            SummaryField::MostExpensiveNode => match self.most_expensive_node() {
                Some((id, cost)) => format!("#{id} ({cost})"),
                None => "-".to_string(),
            },
            SummaryField::TotalCost => {
                if self.cost == INVALID_COST {
                    "Invalid SMT".to_string()
                } else {
                    self.cost.to_string()
                }
            }
            SummaryField::NodeCount => self.nodes.len().to_string(),
            SummaryField::LinkCount => self.links.len().to_string(),
            SummaryField::DestinationCount => self.destination_count.to_string(),
            SummaryField::NonDestinationCount => self.non_destination_count().to_string(),
            SummaryField::CalculationTime => self.calculation_time_ms.to_string(),
        }
    }

    /// Snapshot of all summary figures
    pub fn summary(&self) -> Summary {
        Summary {
            node_count: self.nodes.len(),
            link_count: self.links.len(),
            destination_count: self.destination_count,
            non_destination_count: self.non_destination_count(),
            valid: self.valid,
            total_cost: self.cost,
            average_node_cost: self.average_node_cost(),
            average_link_length: self.average_link_length(),
            longest_link_length: self.longest_link_length(),
            most_expensive_node: self.most_expensive_node(),
            calculation_time_ms: self.calculation_time_ms,
        }
    }

    fn average_node_cost(&self) -> f64 {
        if self.cost <= 0.0 || self.nodes.is_empty() {
            0.0
        } else {
            self.cost / self.nodes.len() as f64
        }
    }

    fn average_link_length(&self) -> f64 {
        if self.links.is_empty() {
            return 0.0;
        }
        let total: f64 = self.links.values().map(|l| self.link_length(l)).sum();
        total / self.links.len() as f64
    }

    fn longest_link_length(&self) -> f64 {
        self.links
            .values()
            .map(|l| self.link_length(l))
            .fold(0.0, f64::max)
    }

    fn most_expensive_node(&self) -> Option<(NodeId, f64)> {
        self.nodes
            .values()
            .filter(|n| n.node_cost() > 0.0)
            .max_by(|a, b| a.node_cost().total_cmp(&b.node_cost()))
            .map(|n| (n.id, n.node_cost()))
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Fields of the per-tree summary shown by an external output view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryField {
    /// Total cost divided by node count (0 for invalid or empty trees)
    AverageNodeCost,
    /// Mean geometric link length
    AverageLinkLength,
    /// Longest geometric link length
    LongestLink,
    /// Id and cost of the costliest node
    MostExpensiveNode,
    /// Total tree cost, or `Invalid SMT`
    TotalCost,
    /// Number of nodes
    NodeCount,
    /// Number of distinct links
    LinkCount,
    /// Number of destinations
    DestinationCount,
    /// Number of relays
    NonDestinationCount,
    /// Duration of the last evaluation in milliseconds
    CalculationTime,
}

/// Snapshot of the summary figures of a tree
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub struct Summary {
    /// Number of nodes
    pub node_count: usize,
    /// Number of distinct links
    pub link_count: usize,
    /// Number of destinations
    pub destination_count: usize,
    /// Number of relays
    pub non_destination_count: usize,
    /// Whether the configuration was legal at the last recalculation
    pub valid: bool,
    /// Total tree cost; `-1` while invalid
    pub total_cost: f64,
    /// Total cost divided by node count (0 for invalid or empty trees)
    pub average_node_cost: f64,
    /// Mean geometric link length
    pub average_link_length: f64,
    /// Longest geometric link length
    pub longest_link_length: f64,
    /// Id and cost of the costliest node
    pub most_expensive_node: Option<(NodeId, f64)>,
    /// Duration of the last evaluation in milliseconds
    pub calculation_time_ms: f64,
}
