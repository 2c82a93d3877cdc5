//! The process-wide holder of the current index snapshot.
//!
//! Readers load the snapshot pointer without locking. Writers publish a whole
//! new snapshot; nothing inside a published snapshot is ever mutated.

use crate::model::IndexSnapshot;
use arc_swap::ArcSwap;
use prompthub_api::{PromptDocument, PromptSummary};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("prompt {name} not found")]
    NotFound { name: String },
    #[error("prompt {name} has no version {version}")]
    VersionNotFound { name: String, version: String },
}

pub struct IndexStore {
    current: ArcSwap<IndexSnapshot>,
    /// Serializes installs and holds the last assigned generation.
    generation: Mutex<u64>,
}

impl Default for IndexStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexStore {
    /// A store serving the empty snapshot.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(IndexSnapshot::empty()),
            generation: Mutex::new(0),
        }
    }

    /// The most recently installed snapshot. Wait-free.
    pub fn current(&self) -> Arc<IndexSnapshot> {
        self.current.load_full()
    }

    /// Replace the current snapshot. Concurrent installs serialize; the last one wins.
    pub fn install(&self, snapshot: IndexSnapshot) -> Arc<IndexSnapshot> {
        let mut generation = self
            .generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *generation += 1;
        let snapshot = Arc::new(snapshot.with_generation(*generation));
        self.current.store(Arc::clone(&snapshot));
        snapshot
    }

    /// Resolve against the snapshot current at call time.
    pub fn lookup(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<Arc<PromptDocument>, LookupError> {
        let snapshot = self.current.load();
        snapshot
            .resolve(name, version)
            .cloned()
            .ok_or_else(|| match version {
                Some(version) if snapshot.latest_version(name).is_some() => {
                    LookupError::VersionNotFound {
                        name: name.to_string(),
                        version: version.to_string(),
                    }
                }
                _ => LookupError::NotFound {
                    name: name.to_string(),
                },
            })
    }

    pub fn list(&self, tag: Option<&str>) -> Vec<PromptSummary> {
        self.current.load().summaries(tag)
    }
}
