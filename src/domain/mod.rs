//! Domain layer: the knowledge tree and its supporting structures
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod edit_log;
pub mod error;
pub mod frame_stack;
pub mod index;
pub mod integrity;
pub mod path;
pub mod work_queue;

pub use arena::{Answer, KnowledgeTree, NodeId, NodeKind, TreeNode};
pub use edit_log::{Edit, EditKind, EditLog, Lesson};
pub use error::{DomainError, DomainResult};
pub use frame_stack::{Frame, FrameStack};
pub use index::{canonicalize, djb2, AnimalId, QuestionIndex};
pub use integrity::{check_integrity, TreeStats};
pub use path::Distinction;
pub use work_queue::WorkQueue;
