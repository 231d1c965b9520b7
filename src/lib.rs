//! twentyq: a twenty-questions knowledge base
//!
//! A binary decision tree of yes/no questions whose leaves are animals. A
//! wrong guess teaches the tree a new question; every such split can be
//! undone and redone, and the tree persists in a compact binary file.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
