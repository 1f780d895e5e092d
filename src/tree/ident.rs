//! Node identifier allocation
//!
//! Ids keep the model and any external presentation objects in sync, so
//! they must never be reissued while a tree is alive. The allocator is
//! owned by the tree store and reset only from [`Tree::clear`].
//!
//! [`Tree::clear`]: super::Tree::clear

use super::NodeId;

/// Monotonic issuer of unique node identifiers
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    next: NodeId,
}

impl IdAllocator {
    /// Create an allocator starting at id 0
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Issue the next id, advancing the counter
    pub fn issue(&mut self) -> NodeId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Peek at the upcoming id without advancing
    pub fn peek(&self) -> NodeId {
        self.next
    }

    /// Restart from 0. Only meaningful when the tree is cleared with it;
    /// calling it on a live tree would make future ids collide.
    pub fn reset(&mut self) {
        self.next = 0;
    }
}
