//! Infrastructure layer: I/O implementations and service wiring
//!
//! This layer implements I/O boundary traits and wires up the knowledge base.

pub mod di;
pub mod error;
pub mod traits;

pub use error::InfraError;
