//! FIFO of (node, id) pairs for breadth-first enumeration.

use std::collections::VecDeque;

use crate::domain::arena::NodeId;
use crate::domain::error::{DomainError, DomainResult};

#[derive(Debug, Default)]
pub struct WorkQueue {
    items: VecDeque<(NodeId, usize)>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Growth failure leaves the queue unchanged.
    pub fn enqueue(&mut self, node: NodeId, id: usize) -> DomainResult<()> {
        self.items
            .try_reserve(1)
            .map_err(|_| DomainError::Allocation { what: "work queue" })?;
        self.items.push_back((node, id));
        Ok(())
    }

    /// Front pair, or `None` once the queue is drained.
    pub fn dequeue(&mut self) -> Option<(NodeId, usize)> {
        self.items.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
