//! Distinguishing questions between two animals.
//!
//! Breadth-first search records, for every node, its parent and the answer
//! leading to it; both animals are then traced back to the root and the
//! paths compared to find their lowest common ancestor.

use std::collections::HashMap;

use crate::domain::arena::{Answer, KnowledgeTree, NodeId};
use crate::domain::error::DomainResult;
use crate::domain::work_queue::WorkQueue;

/// One question on a path together with the answer that was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub question: String,
    pub answer: Answer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distinction {
    /// Questions answered the same way for both animals, root first
    pub shared: Vec<Step>,
    /// From the common ancestor down to the first animal
    pub first: Vec<Step>,
    /// From the common ancestor down to the second animal
    pub second: Vec<Step>,
}

/// Compare two animals by name (case-insensitive).
///
/// `None` when either animal is not a leaf of the tree.
pub fn distinguish(
    tree: &KnowledgeTree,
    first: &str,
    second: &str,
) -> DomainResult<Option<Distinction>> {
    let Some(root) = tree.root() else {
        return Ok(None);
    };
    let mut parents: HashMap<NodeId, (NodeId, Answer)> = HashMap::new();
    let mut found_first = None;
    let mut found_second = None;

    let mut queue = WorkQueue::new();
    queue.enqueue(root, 0)?;
    while let Some((id, _)) = queue.dequeue() {
        let Some(node) = tree.get_node(id) else {
            continue;
        };
        if !node.is_question() {
            if found_first.is_none() && node.text.eq_ignore_ascii_case(first) {
                found_first = Some(id);
            }
            if found_second.is_none() && node.text.eq_ignore_ascii_case(second) {
                found_second = Some(id);
            }
            if found_first.is_some() && found_second.is_some() {
                break;
            }
        }
        for answer in [Answer::Yes, Answer::No] {
            if let Some(child) = node.child(answer) {
                parents.insert(child, (id, answer));
                queue.enqueue(child, 0)?;
            }
        }
    }

    let (Some(found_first), Some(found_second)) = (found_first, found_second) else {
        return Ok(None);
    };
    let first_path = path_from_root(tree, &parents, found_first);
    let second_path = path_from_root(tree, &parents, found_second);

    let common = first_path
        .iter()
        .zip(&second_path)
        .take_while(|(a, b)| a == b)
        .count();

    Ok(Some(Distinction {
        shared: first_path[..common].to_vec(),
        first: first_path[common..].to_vec(),
        second: second_path[common..].to_vec(),
    }))
}

fn path_from_root(
    tree: &KnowledgeTree,
    parents: &HashMap<NodeId, (NodeId, Answer)>,
    leaf: NodeId,
) -> Vec<Step> {
    let mut steps = Vec::new();
    let mut current = leaf;
    while let Some(&(parent, answer)) = parents.get(&current) {
        if let Some(node) = tree.get_node(parent) {
            steps.push(Step {
                question: node.text.clone(),
                answer,
            });
        }
        current = parent;
    }
    steps.reverse();
    steps
}
