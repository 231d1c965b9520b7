//! Knowledge base: the tree, its edit history and question index in one context
//!
//! Drives a guessing round step by step so the caller can block on user
//! input between steps, applies the learning split after a wrong guess, and
//! persists the live tree.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::codec;
use crate::application::error_ext::IoResultExt;
use crate::application::{ApplicationError, ApplicationResult, IoAction};
use crate::domain::integrity::{self, TreeStats};
use crate::domain::path::{self, Distinction};
use crate::domain::{
    canonicalize, Answer, AnimalId, DomainError, DomainResult, Edit, EditLog, Frame, FrameStack,
    KnowledgeTree, Lesson, NodeId, QuestionIndex,
};
use crate::infrastructure::traits::FileSystem;

/// What the caller should ask the player next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// A yes/no question from an internal node
    AskQuestion(String),
    /// A guess: "is it <animal>?"
    AskIsAnimal(String),
    Done(Outcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The guess was right
    Guessed,
    /// The guess was wrong; `submit_wrong_guess` may teach the tree
    Stumped,
    /// Nothing left to ask (empty tree or a question without that child)
    Exhausted,
}

/// State of one round between two answers.
#[derive(Debug)]
struct Traversal {
    stack: FrameStack,
    /// Frame whose prompt is awaiting an answer
    current: Option<Frame>,
    parent: Option<NodeId>,
    parent_answer: Option<Answer>,
    /// Leaf the player rejected
    stumped_on: Option<NodeId>,
}

impl Traversal {
    fn new() -> Self {
        Self {
            stack: FrameStack::frames(),
            current: None,
            parent: None,
            parent_answer: None,
            stumped_on: None,
        }
    }

    /// Pop exactly one frame and turn it into the next prompt.
    fn advance(&mut self, tree: &KnowledgeTree) -> Prompt {
        let Some(frame) = self.stack.pop() else {
            self.current = None;
            return Prompt::Done(Outcome::Exhausted);
        };
        let Some(node) = tree.get_node(frame.node) else {
            self.current = None;
            return Prompt::Done(Outcome::Exhausted);
        };
        self.current = Some(frame);
        if node.is_question() {
            Prompt::AskQuestion(node.text.clone())
        } else {
            Prompt::AskIsAnimal(node.text.clone())
        }
    }
}

pub struct KnowledgeBase {
    tree: KnowledgeTree,
    edits: EditLog,
    index: QuestionIndex,
    traversal: Option<Traversal>,
    fs: Arc<dyn FileSystem>,
}

impl KnowledgeBase {
    /// Knowledge base starting from the seed tree.
    pub fn new(fs: Arc<dyn FileSystem>, index_buckets: usize) -> DomainResult<Self> {
        Self::with_tree(KnowledgeTree::seeded()?, fs, index_buckets)
    }

    pub fn with_tree(
        tree: KnowledgeTree,
        fs: Arc<dyn FileSystem>,
        index_buckets: usize,
    ) -> DomainResult<Self> {
        Ok(Self {
            tree,
            edits: EditLog::new(),
            index: QuestionIndex::new(index_buckets)?,
            traversal: None,
            fs,
        })
    }

    pub fn tree(&self) -> &KnowledgeTree {
        &self.tree
    }

    pub fn index(&self) -> &QuestionIndex {
        &self.index
    }

    pub fn edits(&self) -> &EditLog {
        &self.edits
    }

    /// Start a round at the root, abandoning any round in progress.
    #[instrument(level = "debug", skip(self))]
    pub fn begin_traversal(&mut self) -> DomainResult<Prompt> {
        self.traversal = None;
        let Some(root) = self.tree.root() else {
            return Ok(Prompt::Done(Outcome::Exhausted));
        };
        let mut traversal = Traversal::new();
        traversal.stack.push_frame(root, None)?;
        let prompt = traversal.advance(&self.tree);
        if !matches!(prompt, Prompt::Done(_)) {
            self.traversal = Some(traversal);
        }
        Ok(prompt)
    }

    /// Answer the pending prompt and get the next one.
    #[instrument(level = "debug", skip(self))]
    pub fn step_traversal(&mut self, answer: Answer) -> DomainResult<Prompt> {
        let traversal = self.traversal.as_mut().ok_or(DomainError::NoTraversal)?;
        let frame = traversal.current.ok_or(DomainError::NoTraversal)?;
        let node = self
            .tree
            .get_node(frame.node)
            .ok_or(DomainError::StaleNode)?;

        if node.is_question() {
            traversal.parent = Some(frame.node);
            traversal.parent_answer = Some(answer);
            if let Some(child) = node.child(answer) {
                traversal.stack.push_frame(child, Some(answer))?;
            }
            let prompt = traversal.advance(&self.tree);
            if prompt == Prompt::Done(Outcome::Exhausted) {
                debug!("step: {:?} has no {} child", node.text, answer);
                self.traversal = None;
            }
            return Ok(prompt);
        }

        traversal.current = None;
        if answer.is_yes() {
            self.traversal = None;
            Ok(Prompt::Done(Outcome::Guessed))
        } else {
            traversal.stumped_on = Some(frame.node);
            Ok(Prompt::Done(Outcome::Stumped))
        }
    }

    /// Teach the tree after a wrong guess: the rejected leaf is split into
    /// `question`, with `animal` on the side given by `answer`.
    #[instrument(level = "debug", skip(self))]
    pub fn submit_wrong_guess(
        &mut self,
        animal: &str,
        question: &str,
        answer: Answer,
    ) -> ApplicationResult<Edit> {
        let traversal = self.traversal.as_ref().ok_or(DomainError::NoTraversal)?;
        let leaf = traversal.stumped_on.ok_or(DomainError::NotStumped)?;
        let (parent, edge) = (traversal.parent, traversal.parent_answer);

        let edit = self.edits.split(
            &mut self.tree,
            parent,
            edge,
            leaf,
            Lesson {
                animal,
                question,
                answer,
            },
        )?;
        self.traversal = None;

        let key = canonicalize(question);
        let id = self.tree.len() as AnimalId;
        if key.is_empty() {
            debug!("index: {:?} has no indexable characters", question);
        } else if let Err(e) = self.index.put(&key, id) {
            warn!("index: cannot record {:?}: {}", key, e);
        }
        info!("learned {:?} via {:?}", animal, question);
        Ok(edit)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn undo(&mut self) -> bool {
        self.traversal = None;
        self.edits.undo(&mut self.tree)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn redo(&mut self) -> bool {
        self.traversal = None;
        self.edits.redo(&mut self.tree)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn save(&self, path: &Path) -> ApplicationResult<()> {
        if self.tree.is_empty() {
            return Err(ApplicationError::NothingToSave);
        }
        let bytes = codec::encode(&self.tree)?;
        self.fs
            .ensure_parent(path)
            .with_path_context(IoAction::Write, path)?;
        self.fs
            .write(path, &bytes)
            .with_path_context(IoAction::Write, path)?;
        info!("saved {} nodes to {}", self.tree.len(), path.display());
        Ok(())
    }

    /// Replace the live tree with the one stored at `path`.
    ///
    /// On any failure the live tree, history and index are untouched. On
    /// success the edit history is cleared since it refers to the old tree.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&mut self, path: &Path) -> ApplicationResult<usize> {
        let bytes = self
            .fs
            .read(path)
            .with_path_context(IoAction::Read, path)?;
        let loaded = codec::decode(&bytes)?;

        let mut previous = std::mem::replace(&mut self.tree, loaded);
        let old_root = previous.root();
        previous.destroy_tree(old_root);
        self.edits.reset();
        self.traversal = None;

        // a freshly decoded arena holds exactly the tree's nodes
        let count = self.tree.allocated();
        info!("loaded {} nodes from {}", count, path.display());
        Ok(count)
    }

    pub fn check_integrity(&self) -> bool {
        integrity::check_integrity(&self.tree)
    }

    pub fn stats(&self) -> DomainResult<TreeStats> {
        integrity::stats(&self.tree)
    }

    pub fn distinguish(&self, first: &str, second: &str) -> DomainResult<Option<Distinction>> {
        path::distinguish(&self.tree, first, second)
    }

    /// Identifiers recorded for a question, looked up by its canonical form.
    pub fn animals_for_question(&self, question: &str) -> Option<&[AnimalId]> {
        self.index.get_ids(&canonicalize(question))
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.fs.exists(path)
    }

    pub fn in_traversal(&self) -> bool {
        self.traversal.is_some()
    }
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("nodes", &self.tree.len())
            .field("undo", &self.edits.undo_len())
            .field("redo", &self.edits.redo_len())
            .field("index_keys", &self.index.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::traits::RealFileSystem;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::new(Arc::new(RealFileSystem), 16).unwrap()
    }

    #[test]
    fn given_seed_when_answering_yes_then_guesses_cat() {
        let mut kb = kb();
        assert_eq!(
            kb.begin_traversal().unwrap(),
            Prompt::AskQuestion("Does it meow?".into())
        );
        assert_eq!(
            kb.step_traversal(Answer::Yes).unwrap(),
            Prompt::AskIsAnimal("cat".into())
        );
        assert_eq!(
            kb.step_traversal(Answer::Yes).unwrap(),
            Prompt::Done(Outcome::Guessed)
        );
        assert!(!kb.in_traversal());
    }

    #[test]
    fn given_no_round_when_stepping_then_error() {
        let mut kb = kb();
        assert_eq!(
            kb.step_traversal(Answer::Yes).unwrap_err(),
            DomainError::NoTraversal
        );
    }

    #[test]
    fn given_round_not_stumped_when_submitting_then_error() {
        let mut kb = kb();
        kb.begin_traversal().unwrap();
        let err = kb
            .submit_wrong_guess("lion", "Is it wild?", Answer::Yes)
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::NotStumped)
        ));
    }

    #[test]
    fn given_wrong_guess_when_taught_then_index_records_node_count() {
        let mut kb = kb();
        kb.begin_traversal().unwrap();
        kb.step_traversal(Answer::No).unwrap();
        assert_eq!(
            kb.step_traversal(Answer::No).unwrap(),
            Prompt::Done(Outcome::Stumped)
        );
        kb.submit_wrong_guess("wolf", "Does it howl?", Answer::Yes)
            .unwrap();

        assert_eq!(kb.tree().len(), 5);
        assert_eq!(kb.animals_for_question("does it HOWL"), Some(&[5][..]));
        assert!(kb.index().contains("does_it_howl", 5));
    }

    #[test]
    fn given_empty_tree_when_beginning_then_exhausted() {
        let mut kb = KnowledgeBase::with_tree(KnowledgeTree::new(), Arc::new(RealFileSystem), 4).unwrap();
        assert_eq!(
            kb.begin_traversal().unwrap(),
            Prompt::Done(Outcome::Exhausted)
        );
    }
}
