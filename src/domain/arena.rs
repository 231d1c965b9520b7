use generational_arena::{Arena, Index};
use std::fmt;
use tracing::{debug, instrument, warn};

use crate::domain::error::{DomainError, DomainResult};

/// Stable handle of a node in the knowledge tree arena.
pub type NodeId = Index;

/// Reply to a yes/no question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    pub fn is_yes(self) -> bool {
        self == Answer::Yes
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Yes => write!(f, "yes"),
            Answer::No => write!(f, "no"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Internal node holding a yes/no question
    Question,
    /// Terminal node holding an animal name
    Leaf,
}

/// Tree node in the arena-based knowledge tree.
///
/// Children are plain optional handles so that a malformed tree (for example
/// one restored from a damaged file) stays representable and can be reported
/// by the integrity checker instead of being rejected at construction time.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub kind: NodeKind,
    /// Question text or animal name, never empty
    pub text: String,
    pub yes: Option<NodeId>,
    pub no: Option<NodeId>,
}

impl TreeNode {
    pub fn is_question(&self) -> bool {
        self.kind == NodeKind::Question
    }

    pub fn child(&self, answer: Answer) -> Option<NodeId> {
        match answer {
            Answer::Yes => self.yes,
            Answer::No => self.no,
        }
    }

    fn child_mut(&mut self, answer: Answer) -> &mut Option<NodeId> {
        match answer {
            Answer::Yes => &mut self.yes,
            Answer::No => &mut self.no,
        }
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Arena-based binary decision tree.
///
/// Every node lives in one generational arena; edges are arena indices.
/// Nodes detached by an undo stay allocated until the edit that owns them
/// is discarded, so the arena may hold more nodes than are reachable from
/// the root.
#[derive(Debug)]
pub struct KnowledgeTree {
    arena: Arena<TreeNode>,
    root: Option<NodeId>,
}

impl Default for KnowledgeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Tree every fresh knowledge base starts from.
    pub fn seeded() -> DomainResult<Self> {
        let mut tree = Self::new();
        let question = tree.create_question("Does it meow?")?;
        let cat = tree.create_leaf("cat")?;
        let dog = tree.create_leaf("dog")?;
        tree.set_child(question, Answer::Yes, Some(cat))?;
        tree.set_child(question, Answer::No, Some(dog))?;
        tree.set_root(Some(question));
        Ok(tree)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn create_question(&mut self, text: &str) -> DomainResult<NodeId> {
        self.create_node(NodeKind::Question, text)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn create_leaf(&mut self, text: &str) -> DomainResult<NodeId> {
        self.create_node(NodeKind::Leaf, text)
    }

    /// Insert a detached node whose text is already owned.
    pub(crate) fn insert_node(&mut self, kind: NodeKind, text: String) -> NodeId {
        self.arena.insert(TreeNode {
            kind,
            text,
            yes: None,
            no: None,
        })
    }

    fn create_node(&mut self, kind: NodeKind, text: &str) -> DomainResult<NodeId> {
        let text = copy_text(text)?;
        Ok(self.insert_node(kind, text))
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn get_node(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.get(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id)
    }

    /// Point the `answer` edge of `parent` at `child`.
    pub fn set_child(
        &mut self,
        parent: NodeId,
        answer: Answer,
        child: Option<NodeId>,
    ) -> DomainResult<()> {
        let node = self.arena.get_mut(parent).ok_or(DomainError::StaleNode)?;
        *node.child_mut(answer) = child;
        Ok(())
    }

    /// Rewrite one edge, either `parent`'s `answer` edge or the root when
    /// `parent` is `None`.
    pub fn relink(
        &mut self,
        parent: Option<NodeId>,
        answer: Option<Answer>,
        target: NodeId,
    ) -> DomainResult<()> {
        if !self.arena.contains(target) {
            return Err(DomainError::StaleNode);
        }
        match (parent, answer) {
            (Some(parent), Some(answer)) => self.set_child(parent, answer, Some(target)),
            (Some(_), None) => Err(DomainError::StaleNode),
            (None, _) => {
                self.root = Some(target);
                Ok(())
            }
        }
    }

    /// Frees `node` and everything below it.
    ///
    /// Rotates each yes subtree up into the no spine until the current node
    /// has no yes child, then frees it and continues down its no edge. Needs
    /// no auxiliary memory and no recursion, so loaded trees of any depth are
    /// safe. Absent and already freed nodes are a no-op.
    #[instrument(level = "trace", skip(self))]
    pub fn destroy_tree(&mut self, node: Option<NodeId>) {
        let mut current = node;
        let mut freed = 0usize;
        // a tree needs at most one rotation and one free per node
        let mut budget = 2 * self.arena.len();
        while let Some(id) = current {
            if budget == 0 {
                warn!("destroy_tree: not a tree below {:?}, stopping", node);
                break;
            }
            budget -= 1;
            let Some(n) = self.arena.get(id) else {
                break;
            };
            let (yes, no) = (n.yes, n.no);
            match yes.filter(|y| self.arena.contains(*y)) {
                Some(y) => {
                    // y takes id's place; id hangs under y's no edge
                    let y_no = self.arena.get(y).and_then(|n| n.no);
                    if let Some(n) = self.arena.get_mut(id) {
                        n.yes = y_no;
                    }
                    if let Some(n) = self.arena.get_mut(y) {
                        n.no = Some(id);
                    }
                    current = Some(y);
                }
                None => {
                    self.arena.remove(id);
                    freed += 1;
                    if self.root == Some(id) {
                        self.root = None;
                    }
                    current = no;
                }
            }
        }
        debug!("destroy_tree: freed {} nodes", freed);
    }

    /// Frees a single node without touching its children.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> Option<TreeNode> {
        let removed = self.arena.remove(id);
        if removed.is_some() {
            debug!("remove_node: reclaimed {:?}", id);
        }
        removed
    }

    /// Number of nodes reachable from `node`, counting `node` itself.
    ///
    /// Walks with an explicit stack, so depth is bounded only by the heap.
    /// Stops after `allocated()` visits, which only a cyclic graph can reach.
    pub fn count_nodes(&self, node: Option<NodeId>) -> usize {
        let mut pending: Vec<NodeId> = node.into_iter().collect();
        let mut count = 0;
        while let Some(id) = pending.pop() {
            let Some(n) = self.arena.get(id) else {
                continue;
            };
            count += 1;
            if count >= self.arena.len() {
                break;
            }
            pending.extend(n.yes);
            pending.extend(n.no);
        }
        count
    }

    /// Number of nodes reachable from the root.
    pub fn len(&self) -> usize {
        self.count_nodes(self.root)
    }

    /// Number of nodes held by the arena, including detached ones.
    pub fn allocated(&self) -> usize {
        self.arena.len()
    }
}

/// Copy node text into an owned string, reporting allocation failure.
pub(crate) fn copy_text(text: &str) -> DomainResult<String> {
    if text.trim().is_empty() {
        return Err(DomainError::EmptyText);
    }
    let mut owned = String::new();
    owned
        .try_reserve_exact(text.len())
        .map_err(|_| DomainError::Allocation { what: "node text" })?;
    owned.push_str(text);
    Ok(owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn given_seeded_tree_when_counting_then_three_nodes() {
        let tree = KnowledgeTree::seeded().unwrap();
        assert_eq!(tree.len(), 3);
        let root = tree.get_node(tree.root().unwrap()).unwrap();
        assert!(root.is_question());
        assert_eq!(root.text, "Does it meow?");
        assert_eq!(tree.get_node(root.yes.unwrap()).unwrap().text, "cat");
        assert_eq!(tree.get_node(root.no.unwrap()).unwrap().text, "dog");
    }

    #[test]
    fn given_absent_node_when_counting_then_zero() {
        let tree = KnowledgeTree::new();
        assert_eq!(tree.count_nodes(None), 0);
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn given_empty_text_when_creating_then_rejected() {
        let mut tree = KnowledgeTree::new();
        assert_eq!(tree.create_leaf("   "), Err(DomainError::EmptyText));
        assert_eq!(tree.allocated(), 0);
    }

    #[test]
    fn given_tree_when_destroyed_then_all_nodes_freed_once() {
        let mut tree = KnowledgeTree::seeded().unwrap();
        let root = tree.root();
        tree.destroy_tree(root);
        assert_eq!(tree.allocated(), 0);
        assert!(tree.is_empty());
        // second destroy of the same handle is a no-op
        tree.destroy_tree(root);
        assert_eq!(tree.count_nodes(root), 0);
    }

    #[test]
    fn given_subtree_when_destroyed_then_parent_survives() {
        let mut tree = KnowledgeTree::seeded().unwrap();
        let root = tree.root().unwrap();
        let yes = tree.get_node(root).unwrap().yes;
        tree.destroy_tree(yes);
        assert_eq!(tree.allocated(), 2);
        assert!(tree.contains(root));
    }

    fn chain(tree: &mut KnowledgeTree, depth: usize, spine: Answer) -> NodeId {
        let mut tail = tree.create_leaf("end").unwrap();
        for _ in 0..depth {
            let side = tree.create_leaf("side").unwrap();
            let q = tree.create_question("next?").unwrap();
            let (yes, no) = match spine {
                Answer::Yes => (tail, side),
                Answer::No => (side, tail),
            };
            tree.set_child(q, Answer::Yes, Some(yes)).unwrap();
            tree.set_child(q, Answer::No, Some(no)).unwrap();
            tail = q;
        }
        tail
    }

    #[rstest]
    #[case::yes_spine(Answer::Yes)]
    #[case::no_spine(Answer::No)]
    fn given_deep_chain_when_counting_and_destroying_then_no_recursion(#[case] spine: Answer) {
        let mut tree = KnowledgeTree::new();
        let root = chain(&mut tree, 50_000, spine);
        tree.set_root(Some(root));

        assert_eq!(tree.len(), 100_001);
        tree.destroy_tree(Some(root));
        assert_eq!(tree.allocated(), 0);
        assert!(tree.is_empty());
    }

    #[test]
    fn given_root_relink_when_no_parent_then_root_replaced() {
        let mut tree = KnowledgeTree::seeded().unwrap();
        let leaf = tree.create_leaf("fish").unwrap();
        tree.relink(None, None, leaf).unwrap();
        assert_eq!(tree.root(), Some(leaf));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.allocated(), 4);
    }
}
