use super::version::Version;
use chrono::{DateTime, Utc};
use prompthub_api::{PromptDocument, PromptSummary};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Immutable view of every prompt from one successful build.
///
/// Readers hold an `Arc<IndexSnapshot>` for the duration of a request; a newer
/// install never changes what an existing holder sees.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    by_name_version: HashMap<String, BTreeMap<Version, Arc<PromptDocument>>>,
    latest_by_name: HashMap<String, Version>,
    document_count: usize,
    generation: u64,
    built_at: Option<DateTime<Utc>>,
}

impl IndexSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        by_name_version: HashMap<String, BTreeMap<Version, Arc<PromptDocument>>>,
        latest_by_name: HashMap<String, Version>,
    ) -> Self {
        let document_count = by_name_version.values().map(BTreeMap::len).sum();
        Self {
            by_name_version,
            latest_by_name,
            document_count,
            generation: 0,
            built_at: Some(Utc::now()),
        }
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Exact `(name, version)` lookup.
    pub fn get(&self, name: &str, version: &str) -> Option<&Arc<PromptDocument>> {
        let version = Version::parse(version).ok()?;
        self.by_name_version.get(name)?.get(&version)
    }

    pub fn latest(&self, name: &str) -> Option<&Arc<PromptDocument>> {
        let version = self.latest_by_name.get(name)?;
        self.by_name_version.get(name)?.get(version)
    }

    pub fn latest_version(&self, name: &str) -> Option<&Version> {
        self.latest_by_name.get(name)
    }

    /// Exact lookup when `version` is given, latest otherwise.
    pub fn resolve(&self, name: &str, version: Option<&str>) -> Option<&Arc<PromptDocument>> {
        match version {
            Some(version) => self.get(name, version),
            None => self.latest(name),
        }
    }

    /// Versions of `name`, oldest first.
    pub fn versions(&self, name: &str) -> Vec<&Version> {
        self.by_name_version
            .get(name)
            .map(|versions| versions.keys().collect())
            .unwrap_or_default()
    }

    /// One summary per prompt family, sorted by name.
    ///
    /// With `tag`, only families whose latest version carries the tag are kept.
    pub fn summaries(&self, tag: Option<&str>) -> Vec<PromptSummary> {
        let mut names: Vec<&String> = self.latest_by_name.keys().collect();
        names.sort();
        names
            .into_iter()
            .filter_map(|name| self.latest(name))
            .filter(|doc| tag.is_none_or(|t| doc.has_tag(t)))
            .map(|doc| PromptSummary::from(doc.as_ref()))
            .collect()
    }

    /// Number of `(name, version)` entries.
    pub fn len(&self) -> usize {
        self.document_count
    }

    pub fn is_empty(&self) -> bool {
        self.document_count == 0
    }

    pub fn family_count(&self) -> usize {
        self.by_name_version.len()
    }

    /// Install counter assigned by the store; 0 for the initial empty snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.built_at
    }
}
