//! Shared helpers for integration tests

#![allow(dead_code)]

use smtree::{CostModel, NodeId, Tree};

/// One destination at the origin plus four relay leaves at distances
/// 1, 2, 3 and 4 along the axes, each linked to the center.
pub fn star_tree() -> (Tree, NodeId, Vec<NodeId>) {
    let mut tree = Tree::with_model(CostModel::new(1.0, 2.0));
    let center = tree.add_node(0.0, 0.0, true);
    let leaves = vec![
        tree.add_node(1.0, 0.0, false),
        tree.add_node(0.0, 2.0, false),
        tree.add_node(-3.0, 0.0, false),
        tree.add_node(0.0, -4.0, false),
    ];
    for &leaf in &leaves {
        tree.add_link(center, leaf);
    }
    (tree, center, leaves)
}

/// Path of `nodes` nodes spaced one unit apart on the x axis, the first
/// `destinations` of them destinations.
pub fn chain_tree(nodes: usize, destinations: usize) -> (Tree, Vec<NodeId>) {
    let mut tree = Tree::new();
    let ids: Vec<NodeId> = (0..nodes)
        .map(|i| tree.add_node(i as f64, 0.0, i < destinations))
        .collect();
    for pair in ids.windows(2) {
        tree.add_link(pair[0], pair[1]);
    }
    (tree, ids)
}
