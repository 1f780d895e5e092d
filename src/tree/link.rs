//! Undirected links and their canonical keys
//!
//! A link is derived state: it exists exactly as long as both endpoints'
//! neighbor lists agree, and is rebuilt from them on every mutation. The
//! evaluation pass caches one destination-subtree size per traversal
//! direction on each link.

use std::fmt;

use super::NodeId;

/// Order-insensitive identity of a link: `(a, b)` equals `(b, a)`.
///
/// The constructor canonicalizes the pair, so the key is usable directly
/// as a hash-map key without a custom `Hash` implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkKey(NodeId, NodeId);

impl LinkKey {
    /// Build the canonical key for an unordered id pair
    pub fn new(id1: NodeId, id2: NodeId) -> Self {
        if id1 <= id2 {
            Self(id1, id2)
        } else {
            Self(id2, id1)
        }
    }

    /// The two endpoint ids, lower id first
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.0, self.1)
    }

    /// True if `id` is one of the two endpoints
    pub fn touches(&self, id: NodeId) -> bool {
        self.0 == id || self.1 == id
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <--> {}", self.0, self.1)
    }
}

/// One undirected edge of the tree
#[derive(Debug, Clone)]
pub struct Link {
    key: LinkKey,

    // Destinations on each endpoint's side when the tree is cut at this
    // link; the two always sum to the total destination count.
    toward_lo: usize,
    toward_hi: usize,
}

impl Link {
    /// Create a link with zeroed subtree sizes
    pub(crate) fn new(key: LinkKey) -> Self {
        Self {
            key,
            toward_lo: 0,
            toward_hi: 0,
        }
    }

    /// Canonical key of this link
    pub fn key(&self) -> LinkKey {
        self.key
    }

    /// The two endpoint ids, lower id first
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        self.key.endpoints()
    }

    /// Destinations in the component containing `id` when the tree is
    /// cut at this link. `None` if `id` is not an endpoint.
    pub fn dest_toward(&self, id: NodeId) -> Option<usize> {
        let (lo, hi) = self.key.endpoints();
        if id == lo {
            Some(self.toward_lo)
        } else if id == hi {
            Some(self.toward_hi)
        } else {
            None
        }
    }

    /// Store the subtree size for the side containing `id`; the opposite
    /// side is not touched. Ignored for ids that are not endpoints.
    pub(crate) fn set_dest_toward(&mut self, id: NodeId, size: usize) {
        let (lo, hi) = self.key.endpoints();
        if id == lo {
            self.toward_lo = size;
        } else if id == hi {
            self.toward_hi = size;
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Link: {}]", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_order_insensitive() {
        assert_eq!(LinkKey::new(4, 1), LinkKey::new(1, 4));
        assert_eq!(LinkKey::new(4, 1).endpoints(), (1, 4));
    }

    #[test]
    fn test_dest_toward_tracks_endpoints() {
        let mut link = Link::new(LinkKey::new(7, 2));
        link.set_dest_toward(7, 3);
        link.set_dest_toward(2, 1);

        assert_eq!(link.dest_toward(7), Some(3));
        assert_eq!(link.dest_toward(2), Some(1));
        assert_eq!(link.dest_toward(9), None);
    }
}
