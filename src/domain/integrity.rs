//! Structural validation and breadth-first measurements of the knowledge tree.

use tracing::{debug, instrument, warn};

use crate::domain::arena::KnowledgeTree;
use crate::domain::error::DomainResult;
use crate::domain::work_queue::WorkQueue;

/// Where a breadth-first walk found the tree malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Breadth-first position of the offending node
    pub position: usize,
    pub text: String,
    pub reason: &'static str,
}

/// Verify that every question has both children and every leaf has none.
///
/// An empty tree is valid. Stops at the first violation.
#[instrument(level = "debug", skip(tree))]
pub fn find_violation(tree: &KnowledgeTree) -> DomainResult<Option<Violation>> {
    let Some(root) = tree.root() else {
        return Ok(None);
    };
    let mut queue = WorkQueue::new();
    queue.enqueue(root, 0)?;
    let mut next_id = 1;

    while let Some((id, position)) = queue.dequeue() {
        // a tree never yields more positions than the arena holds nodes
        if position >= tree.allocated() {
            return Ok(Some(Violation {
                position,
                text: String::new(),
                reason: "node reachable from more than one edge",
            }));
        }
        let Some(node) = tree.get_node(id) else {
            return Ok(Some(Violation {
                position,
                text: String::new(),
                reason: "dangling child reference",
            }));
        };
        if node.is_question() {
            let (Some(yes), Some(no)) = (node.yes, node.no) else {
                return Ok(Some(Violation {
                    position,
                    text: node.text.clone(),
                    reason: "question is missing a child",
                }));
            };
            queue.enqueue(yes, next_id)?;
            queue.enqueue(no, next_id + 1)?;
            next_id += 2;
        } else if node.yes.is_some() || node.no.is_some() {
            return Ok(Some(Violation {
                position,
                text: node.text.clone(),
                reason: "leaf has a child",
            }));
        }
    }
    Ok(None)
}

/// `false` for a malformed tree, and when the walk itself cannot complete.
pub fn check_integrity(tree: &KnowledgeTree) -> bool {
    match find_violation(tree) {
        Ok(None) => true,
        Ok(Some(v)) => {
            debug!("integrity: node {} {:?}: {}", v.position, v.text, v.reason);
            false
        }
        Err(e) => {
            warn!("integrity: check aborted: {}", e);
            false
        }
    }
}

/// Size and shape of the reachable tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub nodes: usize,
    pub questions: usize,
    pub leaves: usize,
    /// Levels from root to deepest node; 0 for an empty tree
    pub depth: usize,
}

pub fn stats(tree: &KnowledgeTree) -> DomainResult<TreeStats> {
    let mut stats = TreeStats::default();
    let Some(root) = tree.root() else {
        return Ok(stats);
    };
    let mut queue = WorkQueue::new();
    queue.enqueue(root, 1)?;

    while let Some((id, level)) = queue.dequeue() {
        let Some(node) = tree.get_node(id) else {
            continue;
        };
        stats.nodes += 1;
        stats.depth = stats.depth.max(level);
        if node.is_question() {
            stats.questions += 1;
        } else {
            stats.leaves += 1;
        }
        for child in [node.yes, node.no].into_iter().flatten() {
            queue.enqueue(child, level + 1)?;
        }
    }
    Ok(stats)
}
