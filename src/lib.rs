//! # Shared Multicast Tree Engine
//!
//! This library implements the cost-evaluation and structural-validity
//! engine behind a shared multicast tree (SMT) editor.
//!
//! ## Core Pipeline
//!
//! 1. **Mutation**: nodes and undirected links are edited through [`Tree`]
//! 2. **Derivation**: the distinct link set is rebuilt from neighbor lists
//! 3. **Validation**: structural legality (acyclic, destinations connected)
//! 4. **Evaluation**: power levels, rooted subtree sizes, total cost
//!
//! Every mutation runs the full pipeline synchronously on the caller's
//! thread; when the configuration is invalid the cost is the `-1` sentinel.
//!
//! ## Usage Example
//!
//! ```
//! use smtree::Tree;
//!
//! let mut tree = Tree::new();
//! let center = tree.add_node(0.0, 0.0, true);
//! let leaf = tree.add_node(3.0, 4.0, true);
//! tree.add_link(center, leaf);
//! assert!(tree.is_valid());
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod codec; // Plain-text tree format
pub mod tree; // Tree store, validator, cost evaluator

pub use tree::{IdAllocator, Link, LinkKey, Node, NodeId, Summary, SummaryField, Tree};

use thiserror::Error;

/// Sentinel total cost stored while the tree is structurally invalid.
pub const INVALID_COST: f64 = -1.0;

/// The `kappa * distance^alpha` power-attenuation law.
///
/// Both coefficients are tree-wide state: changing them recomputes cost
/// over the existing tree, there is no per-edge versioning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    /// Multiplicative coefficient of the power law
    pub kappa: f64,

    /// Distance exponent of the power law
    pub alpha: f64,
}

impl CostModel {
    /// Create a cost model from its two coefficients
    pub fn new(kappa: f64, alpha: f64) -> Self {
        Self { kappa, alpha }
    }

    /// Power cost of a transmission spanning `distance`
    #[inline]
    pub fn power_cost(&self, distance: f64) -> f64 {
        self.kappa * distance.powf(self.alpha)
    }
}

impl Default for CostModel {
    /// Free-space attenuation: `kappa = 1`, `alpha = 2`
    fn default() -> Self {
        Self {
            kappa: 1.0,
            alpha: 2.0,
        }
    }
}

/// Errors raised when constructing a tree from parsed layout data
#[derive(Error, Debug)]
pub enum SmtError {
    /// Coordinate list and neighbor list count disagree
    #[error("layout mismatch: {nodes} coordinates but {lists} neighbor lists")]
    LayoutMismatch {
        /// Number of coordinates supplied
        nodes: usize,
        /// Number of neighbor lists supplied
        lists: usize,
    },

    /// More destinations declared than nodes supplied
    #[error("{destinations} destinations declared for {nodes} nodes")]
    TooManyDestinations {
        /// Declared destination count
        destinations: usize,
        /// Number of nodes supplied
        nodes: usize,
    },

    /// A neighbor list refers to a node index outside the layout
    #[error("neighbor index {index} out of range for {nodes} nodes")]
    NeighborOutOfRange {
        /// The offending neighbor index
        index: usize,
        /// Number of nodes supplied
        nodes: usize,
    },
}
