//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the knowledge tree's rules.
/// These are independent of persistence and terminal concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("text must not be empty")]
    EmptyText,

    #[error("allocation failed: {what}")]
    Allocation { what: &'static str },

    #[error("node is no longer part of the tree")]
    StaleNode,

    #[error("no traversal in progress")]
    NoTraversal,

    #[error("traversal has not ended on a wrong guess")]
    NotStumped,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
