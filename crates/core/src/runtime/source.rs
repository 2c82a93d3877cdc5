//! Where the prompt definitions come from.
//!
//! The index only ever reads a local directory. A remote repository is handled
//! by a [`RemoteSync`] collaborator that updates a local checkout before each
//! refresh; the credential is handed to it untouched.

use crate::config::{Credential, Settings};
use crate::error::{HubError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[async_trait]
pub trait SourceProvider: Send + Sync {
    fn describe(&self) -> String;

    /// Make the definitions available locally and return their root directory.
    async fn prepare(&self) -> Result<PathBuf>;

    /// Local directory worth watching for changes, if any.
    fn watch_root(&self) -> Option<PathBuf> {
        None
    }
}

/// Serve a directory as-is.
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl SourceProvider for LocalSource {
    fn describe(&self) -> String {
        format!("local directory {}", self.root.display())
    }

    async fn prepare(&self) -> Result<PathBuf> {
        Ok(self.root.clone())
    }

    fn watch_root(&self) -> Option<PathBuf> {
        Some(self.root.clone())
    }
}

/// Brings a local checkout up to date with a remote repository.
#[async_trait]
pub trait RemoteSync: Send + Sync {
    async fn sync(&self, checkout: &Path, credential: &Credential) -> Result<()>;
}

/// A local checkout refreshed through [`RemoteSync`] before every scan.
pub struct SyncedSource {
    checkout: PathBuf,
    credential: Credential,
    remote: Arc<dyn RemoteSync>,
}

impl SyncedSource {
    pub fn new(checkout: impl Into<PathBuf>, credential: Credential, remote: Arc<dyn RemoteSync>) -> Self {
        Self {
            checkout: checkout.into(),
            credential,
            remote,
        }
    }
}

#[async_trait]
impl SourceProvider for SyncedSource {
    fn describe(&self) -> String {
        format!("synced checkout {}", self.checkout.display())
    }

    async fn prepare(&self) -> Result<PathBuf> {
        self.remote
            .sync(&self.checkout, &self.credential)
            .await
            .map_err(|e| HubError::source_unavailable(&self.checkout, format!("sync failed: {e}")))?;
        Ok(self.checkout.clone())
    }
}

/// Pick the source for `settings`.
///
/// Without a credential, or without a sync collaborator, only the local
/// directory is served.
pub fn source_from_settings(
    settings: &Settings,
    remote: Option<Arc<dyn RemoteSync>>,
) -> Arc<dyn SourceProvider> {
    match remote {
        Some(remote) if !settings.local_only() => Arc::new(SyncedSource::new(
            settings.prompts_path.clone(),
            settings.github_token.clone(),
            remote,
        )),
        Some(_) => {
            tracing::info!("No credential configured, remote sync disabled");
            Arc::new(LocalSource::new(settings.prompts_path.clone()))
        }
        None => Arc::new(LocalSource::new(settings.prompts_path.clone())),
    }
}
