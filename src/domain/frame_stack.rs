//! Growable LIFO stacks used for iterative descent and the edit history.
//!
//! Capacity is tracked explicitly: it starts at 16 and doubles whenever a
//! push finds the stack full. If the initial reservation fails the stack
//! starts at capacity zero and the first push grows it to one. A failed
//! growth leaves the stack exactly as it was.

use tracing::trace;

use crate::domain::arena::{Answer, NodeId};
use crate::domain::error::{DomainError, DomainResult};

pub const INITIAL_CAPACITY: usize = 16;

/// One step of a descent: the node reached and the answer that led there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub node: NodeId,
    /// `None` for the frame holding the root
    pub answer: Option<Answer>,
}

#[derive(Debug)]
pub struct Stack<T> {
    items: Vec<T>,
    capacity: usize,
    what: &'static str,
}

impl<T> Stack<T> {
    pub fn new(what: &'static str) -> Self {
        let mut items = Vec::new();
        let capacity = match items.try_reserve_exact(INITIAL_CAPACITY) {
            Ok(()) => INITIAL_CAPACITY,
            Err(_) => 0,
        };
        Self {
            items,
            capacity,
            what,
        }
    }

    pub fn push(&mut self, item: T) -> DomainResult<()> {
        self.reserve_one()?;
        self.items.push(item);
        Ok(())
    }

    /// Make sure the next push cannot fail.
    pub fn reserve_one(&mut self) -> DomainResult<()> {
        if self.items.len() < self.capacity {
            return Ok(());
        }
        let new_capacity = if self.capacity == 0 {
            1
        } else {
            self.capacity * 2
        };
        self.items
            .try_reserve_exact(new_capacity - self.items.len())
            .map_err(|_| DomainError::Allocation { what: self.what })?;
        trace!("{}: grew {} -> {}", self.what, self.capacity, new_capacity);
        self.capacity = new_capacity;
        Ok(())
    }

    /// Callers are expected to check `is_empty` first; an empty stack yields `None`.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every item, keeping the capacity for reuse.
    pub fn drain(&mut self) -> std::vec::Drain<'_, T> {
        self.items.drain(..)
    }
}

/// Stack driving the descent from the root to a leaf.
pub type FrameStack = Stack<Frame>;

impl FrameStack {
    pub fn frames() -> Self {
        Stack::new("frame stack")
    }

    pub fn push_frame(&mut self, node: NodeId, answer: Option<Answer>) -> DomainResult<()> {
        self.push(Frame { node, answer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::arena::KnowledgeTree;

    #[test]
    fn given_new_stack_then_capacity_sixteen_and_empty() {
        let stack = FrameStack::frames();
        assert!(stack.is_empty());
        assert_eq!(stack.capacity(), INITIAL_CAPACITY);
    }

    #[test]
    fn given_full_stack_when_pushing_then_capacity_doubles() {
        let mut stack: Stack<u32> = Stack::new("test");
        for i in 0..17 {
            stack.push(i).unwrap();
        }
        assert_eq!(stack.len(), 17);
        assert_eq!(stack.capacity(), 32);
    }

    #[test]
    fn given_zero_capacity_when_pushing_then_grows_to_one() {
        let mut stack: Stack<u32> = Stack {
            items: Vec::new(),
            capacity: 0,
            what: "test",
        };
        stack.push(7).unwrap();
        assert_eq!(stack.capacity(), 1);
        stack.push(8).unwrap();
        assert_eq!(stack.capacity(), 2);
    }

    #[test]
    fn given_frames_when_popping_then_lifo_order() {
        let tree = KnowledgeTree::seeded().unwrap();
        let root = tree.root().unwrap();
        let yes = tree.get_node(root).unwrap().yes.unwrap();
        let mut stack = FrameStack::frames();
        stack.push_frame(root, None).unwrap();
        stack.push_frame(yes, Some(Answer::Yes)).unwrap();

        assert_eq!(
            stack.pop(),
            Some(Frame {
                node: yes,
                answer: Some(Answer::Yes)
            })
        );
        assert_eq!(stack.pop().map(|f| f.node), Some(root));
        assert!(stack.is_empty());
        assert_eq!(stack.pop(), None);
    }
}
