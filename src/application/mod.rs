//! Application layer: the knowledge base context and persistence
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod codec;
pub mod error;
pub mod error_ext;
pub mod knowledge_base;
pub mod render;

pub use codec::CodecError;
pub use error::{ApplicationError, ApplicationResult, IoAction};
pub use error_ext::IoResultExt;
pub use knowledge_base::{KnowledgeBase, Outcome, Prompt};
