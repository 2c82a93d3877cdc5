use crate::error::{HubError, Result};
use crate::model::{IndexSnapshot, Version};
use prompthub_api::PromptDocument;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub struct IndexBuilder;

impl IndexBuilder {
    /// Assemble validated documents into a snapshot.
    ///
    /// Fails only when the input breaks an invariant the validator guarantees
    /// (an unparsable version or a repeated `(name, version)`). An empty input
    /// yields an empty snapshot.
    pub fn build(documents: Vec<PromptDocument>) -> Result<IndexSnapshot> {
        let mut by_name_version: HashMap<String, BTreeMap<Version, Arc<PromptDocument>>> =
            HashMap::new();

        for doc in documents {
            let version = Version::parse(&doc.version).map_err(|e| {
                HubError::Internal(format!(
                    "unvalidated version {:?} for {}: {}",
                    doc.version, doc.name, e
                ))
            })?;
            let versions = by_name_version.entry(doc.name.clone()).or_default();
            if let Some(previous) = versions.insert(version, Arc::new(doc)) {
                return Err(HubError::Internal(format!(
                    "duplicate {}@{} reached the index builder",
                    previous.name, previous.version
                )));
            }
        }

        let latest_by_name = by_name_version
            .iter()
            .filter_map(|(name, versions)| {
                versions
                    .keys()
                    .next_back()
                    .map(|latest| (name.clone(), latest.clone()))
            })
            .collect();

        Ok(IndexSnapshot::from_parts(by_name_version, latest_by_name))
    }
}
