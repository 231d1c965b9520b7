//! Service container for dependency injection
//!
//! Wires the knowledge base to its settings and filesystem.

use std::sync::Arc;

use crate::application::KnowledgeBase;
use crate::config::Settings;
use crate::domain::DomainResult;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);

        Self { settings, fs }
    }

    /// Fresh knowledge base holding the seed tree.
    pub fn knowledge_base(&self) -> DomainResult<KnowledgeBase> {
        KnowledgeBase::new(Arc::clone(&self.fs), self.settings.index_buckets)
    }
}
