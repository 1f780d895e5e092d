//! Property-based invariants over random mutation sequences

use std::collections::HashSet;

use proptest::prelude::*;

use smtree::{codec, NodeId, Tree, INVALID_COST};

/// One externally-visible mutation, with ids picked modulo the live set
#[derive(Debug, Clone)]
enum Op {
    AddNode { x: f64, y: f64, destination: bool },
    AddLink { a: usize, b: usize },
    RemoveLink { a: usize, b: usize },
    RemoveNode { index: usize },
    Relocate { index: usize, x: f64, y: f64 },
    ChangeKind { index: usize },
    MakeAllDestinations,
    MakeAllRelays,
    RemoveAllLinks,
    RetainDestinations,
    RetainRelays,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let coord = -100.0f64..100.0f64;
    prop_oneof![
        3 => (coord.clone(), coord.clone(), any::<bool>())
            .prop_map(|(x, y, destination)| Op::AddNode { x, y, destination }),
        3 => (0usize..16, 0usize..16).prop_map(|(a, b)| Op::AddLink { a, b }),
        1 => (0usize..16, 0usize..16).prop_map(|(a, b)| Op::RemoveLink { a, b }),
        1 => (0usize..16).prop_map(|index| Op::RemoveNode { index }),
        1 => (0usize..16, coord.clone(), coord).prop_map(|(index, x, y)| Op::Relocate {
            index,
            x,
            y
        }),
        1 => (0usize..16).prop_map(|index| Op::ChangeKind { index }),
        1 => prop_oneof![
            Just(Op::MakeAllDestinations),
            Just(Op::MakeAllRelays),
            Just(Op::RemoveAllLinks),
            Just(Op::RetainDestinations),
            Just(Op::RetainRelays),
        ],
    ]
}

fn pick(ids: &[NodeId], index: usize) -> Option<NodeId> {
    if ids.is_empty() {
        None
    } else {
        Some(ids[index % ids.len()])
    }
}

fn apply(tree: &mut Tree, ids: &mut Vec<NodeId>, op: Op) {
    match op {
        Op::AddNode { x, y, destination } => ids.push(tree.add_node(x, y, destination)),
        Op::AddLink { a, b } => {
            if let (Some(a), Some(b)) = (pick(ids, a), pick(ids, b)) {
                tree.add_link(a, b);
            }
        }
        Op::RemoveLink { a, b } => {
            if let (Some(a), Some(b)) = (pick(ids, a), pick(ids, b)) {
                tree.remove_link(a, b);
            }
        }
        Op::RemoveNode { index } => {
            if let Some(id) = pick(ids, index) {
                tree.remove_node(id);
                ids.retain(|&i| i != id);
            }
        }
        Op::Relocate { index, x, y } => {
            if let Some(id) = pick(ids, index) {
                tree.relocate_node(id, x, y);
            }
        }
        Op::ChangeKind { index } => {
            if let Some(id) = pick(ids, index) {
                tree.change_kind(id);
            }
        }
        Op::MakeAllDestinations => tree.make_all_destinations(),
        Op::MakeAllRelays => tree.make_all_relays(),
        Op::RemoveAllLinks => tree.remove_all_links(),
        Op::RetainDestinations => {
            tree.retain_destinations();
            ids.retain(|&i| tree.node(i).is_some());
        }
        Op::RetainRelays => {
            tree.retain_relays();
            ids.retain(|&i| tree.node(i).is_some());
        }
    }
}

/// True when the configuration is one connected tree over all nodes
fn is_single_tree(tree: &Tree) -> bool {
    let node_count = tree.node_count();
    if node_count == 0 || tree.link_count() + 1 != node_count {
        return false;
    }

    let start = match tree.nodes().map(|n| n.id).min() {
        Some(id) => id,
        None => return false,
    };
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        if let Some(node) = tree.node(id) {
            stack.extend(node.neighbors().iter().copied());
        }
    }
    visited.len() == node_count
}

proptest! {
    #[test]
    fn prop_engine_invariants_hold(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let mut tree = Tree::new();
        let mut ids: Vec<NodeId> = Vec::new();

        for op in ops {
            apply(&mut tree, &mut ids, op);

            // The destination count tracks the node set exactly
            let counted = tree.nodes().filter(|n| n.is_destination).count();
            prop_assert_eq!(tree.destination_count(), counted);

            // Neighbor symmetry holds at all times
            for node in tree.nodes() {
                for &neighbor in node.neighbors() {
                    let other = tree.node(neighbor);
                    prop_assert!(
                        other.is_some_and(|o| o.neighbors().contains(&node.id)),
                        "node {} lists {} but not vice versa",
                        node.id,
                        neighbor
                    );
                }
            }

            if tree.is_valid() {
                // Acyclicity: a valid tree never reaches N links
                prop_assert!(tree.link_count() < tree.node_count());

                // Subtree complementarity on fully-connected trees
                if is_single_tree(&tree) {
                    for link in tree.links() {
                        let (a, b) = link.endpoints();
                        let sum = link.dest_toward(a).unwrap_or(0)
                            + link.dest_toward(b).unwrap_or(0);
                        prop_assert_eq!(sum, tree.destination_count());
                    }
                }
            } else {
                // Invalid trees pin the sentinel, never a stale cost
                prop_assert_eq!(tree.cost(), INVALID_COST);
            }
        }
    }

    #[test]
    fn prop_recalculation_is_idempotent(ops in proptest::collection::vec(op_strategy(), 1..30)) {
        let mut tree = Tree::new();
        let mut ids: Vec<NodeId> = Vec::new();
        for op in ops {
            apply(&mut tree, &mut ids, op);
        }

        let cost = tree.cost();
        let valid = tree.is_valid();

        let model = tree.cost_model();
        tree.set_cost_parameters(model.kappa, model.alpha);

        prop_assert_eq!(tree.is_valid(), valid);
        prop_assert_eq!(tree.cost(), cost);
    }

    #[test]
    fn prop_codec_round_trip_is_stable(
        nodes in 1usize..15,
        destination_bits in proptest::collection::vec(any::<bool>(), 1..15),
    ) {
        // Path graph: always one connected tree
        let mut tree = Tree::new();
        let mut previous: Option<NodeId> = None;
        for i in 0..nodes {
            let destination = destination_bits.get(i).copied().unwrap_or(false);
            let id = tree.add_node(i as f64 * 1.5, (i % 3) as f64, destination);
            if let Some(prev) = previous {
                tree.add_link(prev, id);
            }
            previous = Some(id);
        }

        let rendered = codec::render_tree(&tree).unwrap();
        let reparsed = codec::parse_tree(&rendered).unwrap();

        prop_assert_eq!(reparsed.node_count(), tree.node_count());
        prop_assert_eq!(reparsed.destination_count(), tree.destination_count());
        prop_assert_eq!(reparsed.link_count(), tree.link_count());

        // Serializing the reparsed tree reproduces the text exactly
        let rerendered = codec::render_tree(&reparsed).unwrap();
        prop_assert_eq!(rendered, rerendered);
    }
}
