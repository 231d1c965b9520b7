//! Reversible tree splits: the learning mutation and its undo/redo history.
//!
//! After a split, `previous_leaf` is owned by `new_question`; the edit only
//! remembers handles. Undo points the captured edge back at `previous_leaf`
//! and leaves `new_question`/`new_leaf` allocated but detached, so the edit
//! on the redo stack is their only holder until a redo reattaches them or a
//! fresh split discards the redo stack and frees them.

use tracing::{debug, instrument, warn};

use crate::domain::arena::{copy_text, Answer, KnowledgeTree, NodeId, NodeKind};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::frame_stack::Stack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// A leaf replaced by a question owning that leaf and a new leaf
    Split,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    pub kind: EditKind,
    /// `None` when the split replaced the root
    pub parent: Option<NodeId>,
    /// Which edge of `parent` was rewritten
    pub edge: Option<Answer>,
    pub previous_leaf: NodeId,
    pub new_question: NodeId,
    pub new_leaf: NodeId,
}

/// What the player taught the tree after a wrong guess.
#[derive(Debug, Clone, Copy)]
pub struct Lesson<'a> {
    pub animal: &'a str,
    pub question: &'a str,
    /// The new animal's answer to `question`
    pub answer: Answer,
}

pub type EditStack = Stack<Edit>;

#[derive(Debug)]
pub struct EditLog {
    undo: EditStack,
    redo: EditStack,
}

impl Default for EditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EditLog {
    pub fn new() -> Self {
        Self {
            undo: Stack::new("undo stack"),
            redo: Stack::new("redo stack"),
        }
    }

    /// Replace `leaf` (reached through `parent`'s `edge`, or the root) with a
    /// question separating it from a new animal.
    ///
    /// All fallible work happens before the tree is touched, so on error the
    /// tree and both stacks are unchanged.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn split(
        &mut self,
        tree: &mut KnowledgeTree,
        parent: Option<NodeId>,
        edge: Option<Answer>,
        leaf: NodeId,
        lesson: Lesson<'_>,
    ) -> DomainResult<Edit> {
        let current = match parent {
            Some(p) => {
                let answer = edge.ok_or(DomainError::StaleNode)?;
                tree.get_node(p)
                    .ok_or(DomainError::StaleNode)?
                    .child(answer)
            }
            None => tree.root(),
        };
        if current != Some(leaf) {
            return Err(DomainError::StaleNode);
        }

        self.undo.reserve_one()?;
        let animal = copy_text(lesson.animal)?;
        let question = copy_text(lesson.question)?;

        let new_question = tree.insert_node(NodeKind::Question, question);
        let new_leaf = tree.insert_node(NodeKind::Leaf, animal);
        let (yes, no) = match lesson.answer {
            Answer::Yes => (new_leaf, leaf),
            Answer::No => (leaf, new_leaf),
        };
        tree.set_child(new_question, Answer::Yes, Some(yes))?;
        tree.set_child(new_question, Answer::No, Some(no))?;
        tree.relink(parent, edge, new_question)?;

        let edit = Edit {
            kind: EditKind::Split,
            parent,
            edge,
            previous_leaf: leaf,
            new_question,
            new_leaf,
        };
        self.undo.push(edit)?;
        self.clear_redo(tree);
        debug!("split: {:?}", edit);
        Ok(edit)
    }

    /// Revert the most recent split. `false` when there is nothing to undo.
    #[instrument(level = "debug", skip_all)]
    pub fn undo(&mut self, tree: &mut KnowledgeTree) -> bool {
        Self::transfer(&mut self.undo, &mut self.redo, tree, |e| e.previous_leaf)
    }

    /// Reapply the most recently undone split. `false` when there is nothing to redo.
    #[instrument(level = "debug", skip_all)]
    pub fn redo(&mut self, tree: &mut KnowledgeTree) -> bool {
        Self::transfer(&mut self.redo, &mut self.undo, tree, |e| e.new_question)
    }

    fn transfer(
        from: &mut EditStack,
        to: &mut EditStack,
        tree: &mut KnowledgeTree,
        target: impl Fn(&Edit) -> NodeId,
    ) -> bool {
        if from.is_empty() {
            return false;
        }
        if let Err(e) = to.reserve_one() {
            warn!("edit log: {}", e);
            return false;
        }
        let Some(edit) = from.pop() else {
            return false;
        };
        if let Err(e) = tree.relink(edit.parent, edit.edge, target(&edit)) {
            warn!("edit log: cannot relink {:?}: {}", edit, e);
            // reserved above, cannot fail
            let _ = from.push(edit);
            return false;
        }
        debug!("relinked edge to {:?}", target(&edit));
        let _ = to.push(edit);
        true
    }

    /// Discard every redoable edit and free the nodes only they still hold.
    fn clear_redo(&mut self, tree: &mut KnowledgeTree) {
        for edit in self.redo.drain() {
            tree.remove_node(edit.new_question);
            tree.remove_node(edit.new_leaf);
        }
    }

    /// Forget the whole history without touching any tree.
    pub fn reset(&mut self) {
        self.undo.drain();
        self.redo.drain();
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson<'a>(animal: &'a str, question: &'a str, answer: Answer) -> Lesson<'a> {
        Lesson {
            animal,
            question,
            answer,
        }
    }

    fn seeded() -> (KnowledgeTree, NodeId, NodeId) {
        let tree = KnowledgeTree::seeded().unwrap();
        let root = tree.root().unwrap();
        let cat = tree.get_node(root).unwrap().yes.unwrap();
        (tree, root, cat)
    }

    #[test]
    fn given_leaf_under_parent_when_split_then_edge_points_to_new_question() {
        let (mut tree, root, cat) = seeded();
        let mut log = EditLog::new();

        let edit = log
            .split(
                &mut tree,
                Some(root),
                Some(Answer::Yes),
                cat,
                lesson("lion", "Is it wild?", Answer::Yes),
            )
            .unwrap();

        let q = tree.get_node(edit.new_question).unwrap();
        assert_eq!(tree.get_node(root).unwrap().yes, Some(edit.new_question));
        assert_eq!(q.yes, Some(edit.new_leaf));
        assert_eq!(q.no, Some(cat));
        assert_eq!(tree.len(), 5);
        assert_eq!(log.undo_len(), 1);
    }

    #[test]
    fn given_root_leaf_when_split_then_root_replaced() {
        let mut tree = KnowledgeTree::new();
        let fish = tree.create_leaf("fish").unwrap();
        tree.set_root(Some(fish));
        let mut log = EditLog::new();

        let edit = log
            .split(&mut tree, None, None, fish, lesson("whale", "Is it a mammal?", Answer::Yes))
            .unwrap();
        assert_eq!(tree.root(), Some(edit.new_question));

        assert!(log.undo(&mut tree));
        assert_eq!(tree.root(), Some(fish));
        assert!(log.redo(&mut tree));
        assert_eq!(tree.root(), Some(edit.new_question));
    }

    #[test]
    fn given_wrong_parent_edge_when_split_then_tree_untouched() {
        let (mut tree, root, cat) = seeded();
        let mut log = EditLog::new();
        let before = tree.allocated();

        let err = log
            .split(
                &mut tree,
                Some(root),
                Some(Answer::No),
                cat,
                lesson("lion", "Is it wild?", Answer::Yes),
            )
            .unwrap_err();
        assert_eq!(err, DomainError::StaleNode);
        assert_eq!(tree.allocated(), before);
        assert_eq!(log.undo_len(), 0);
    }

    #[test]
    fn given_empty_question_when_split_then_nothing_allocated() {
        let (mut tree, root, cat) = seeded();
        let mut log = EditLog::new();

        let err = log
            .split(&mut tree, Some(root), Some(Answer::Yes), cat, lesson("lion", " ", Answer::Yes))
            .unwrap_err();
        assert_eq!(err, DomainError::EmptyText);
        assert_eq!(tree.allocated(), 3);
    }

    #[test]
    fn given_undone_split_when_new_split_then_redo_cleared_and_nodes_freed() {
        let (mut tree, root, cat) = seeded();
        let mut log = EditLog::new();
        let first = log
            .split(
                &mut tree,
                Some(root),
                Some(Answer::Yes),
                cat,
                lesson("lion", "Is it wild?", Answer::Yes),
            )
            .unwrap();
        assert!(log.undo(&mut tree));
        assert_eq!(tree.allocated(), 5);

        log.split(
            &mut tree,
            Some(root),
            Some(Answer::Yes),
            cat,
            lesson("tiger", "Does it have stripes?", Answer::Yes),
        )
        .unwrap();

        assert_eq!(log.redo_len(), 0);
        assert!(!log.redo(&mut tree));
        assert!(!tree.contains(first.new_question));
        assert!(!tree.contains(first.new_leaf));
        assert!(tree.contains(cat));
        assert_eq!(tree.allocated(), 5);
    }

    #[test]
    fn given_empty_log_when_undo_or_redo_then_false() {
        let (mut tree, _, _) = seeded();
        let mut log = EditLog::new();
        assert!(!log.undo(&mut tree));
        assert!(!log.redo(&mut tree));
    }
}
