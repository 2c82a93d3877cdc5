//! Prompt index runtime with snapshot swapping.

use crate::config::Settings;
use crate::error::Result;
use crate::indexing::{DocumentFormat, DocumentLoader, format::default_formats};
use crate::model::IndexSnapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub mod refresh;
pub mod source;
pub mod store;
mod watch;

pub use refresh::{
    DEFAULT_REFRESH_TIMEOUT, RefreshCoordinator, RefreshPhase, RefreshReport, RefreshStatus,
};
pub use source::{LocalSource, RemoteSync, SourceProvider, SyncedSource, source_from_settings};
pub use store::{IndexStore, LookupError};

/// PromptHub engine
///
/// Owns the index store and its single writer:
/// - Readers get the current snapshot (Arc clone, no locking)
/// - The refresh coordinator builds new snapshots and atomically swaps them in
/// - Background refresh tasks stop when the engine is dropped
pub struct HubEngine {
    store: Arc<IndexStore>,
    coordinator: Arc<RefreshCoordinator>,
    refresh_interval: Option<Duration>,
    watch: bool,
    cancel_token: CancellationToken,
}

pub struct HubEngineBuilder {
    source: Arc<dyn SourceProvider>,
    formats: Vec<Arc<dyn DocumentFormat>>,
    refresh_timeout: Duration,
    refresh_interval: Option<Duration>,
    watch: bool,
}

impl HubEngineBuilder {
    pub fn new(source: Arc<dyn SourceProvider>) -> Self {
        Self {
            source,
            formats: default_formats(),
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            refresh_interval: None,
            watch: false,
        }
    }

    /// Builder preconfigured from service settings.
    pub fn from_settings(settings: &Settings, source: Arc<dyn SourceProvider>) -> Self {
        Self::new(source)
            .with_refresh_timeout(settings.refresh_timeout())
            .with_refresh_interval(settings.refresh_interval())
            .with_watch(settings.watch)
    }

    /// Register an extra definition format, tried after the built-in ones.
    pub fn with_format(mut self, format: Arc<dyn DocumentFormat>) -> Self {
        self.formats.push(format);
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Option<Duration>) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    pub fn build(self) -> HubEngine {
        let store = Arc::new(IndexStore::new());
        let coordinator = Arc::new(RefreshCoordinator::new(
            Arc::clone(&store),
            self.source,
            DocumentLoader::new(self.formats),
            self.refresh_timeout,
        ));
        HubEngine {
            store,
            coordinator,
            refresh_interval: self.refresh_interval,
            watch: self.watch,
            cancel_token: CancellationToken::new(),
        }
    }
}

impl Drop for HubEngine {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

impl HubEngine {
    pub fn builder(source: Arc<dyn SourceProvider>) -> HubEngineBuilder {
        HubEngineBuilder::new(source)
    }

    /// Build the first index. An error here means there is nothing to serve.
    pub async fn init(&self) -> Result<RefreshReport> {
        tracing::info!("Loading prompts from {}", self.coordinator.source().describe());
        self.coordinator.refresh_now().await
    }

    /// Start the configured background refresh triggers.
    pub fn start_background(&self) -> Result<()> {
        if let Some(interval) = self.refresh_interval {
            tracing::info!("Refreshing prompt index every {:?}", interval);
            watch::spawn_periodic_refresh(
                Arc::clone(&self.coordinator),
                interval,
                self.cancel_token.clone(),
            );
        }
        if self.watch {
            match self.coordinator.source().watch_root() {
                Some(root) => watch::spawn_watch_refresh(
                    Arc::clone(&self.coordinator),
                    root,
                    self.cancel_token.clone(),
                )?,
                None => tracing::warn!("Watch mode requested but the prompt source has no local root"),
            }
        }
        Ok(())
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// The snapshot currently serving reads (cheap Arc clone).
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.store.current()
    }

    /// Stop background refresh tasks.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HubError;
    use crate::indexing::format::BoxError;
    use crate::indexing::{RawDefinition, YamlFormat};
    use std::path::Path;
    use tempfile::tempdir;
    use tokio::task::JoinSet;

    /// Claims `.slow` files and parses them slower than any test timeout.
    struct SlowFormat;

    impl DocumentFormat for SlowFormat {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn supports_path(&self, path: &Path) -> bool {
            path.extension().is_some_and(|ext| ext == "slow")
        }

        fn parse(&self, source: &str) -> std::result::Result<RawDefinition, BoxError> {
            std::thread::sleep(Duration::from_millis(300));
            YamlFormat.parse(source)
        }
    }

    #[tokio::test]
    async fn readers_see_whole_snapshots_during_refresh() {
        let dir = tempdir().unwrap();
        let write = |rel: &str, version: &str| {
            std::fs::write(
                dir.path().join(rel),
                format!("name: greet\nversion: '{version}'\ntext: v{version}"),
            )
            .unwrap();
        };
        write("greet-1.yaml", "1.0");

        let engine = Arc::new(HubEngine::builder(Arc::new(LocalSource::new(dir.path()))).build());
        engine.init().await.unwrap();

        let mut readers = JoinSet::new();
        for _ in 0..8 {
            let engine = Arc::clone(&engine);
            readers.spawn(async move {
                let mut last_generation = 0;
                for _ in 0..200 {
                    let snapshot = engine.snapshot();
                    assert!(snapshot.generation() >= last_generation);
                    last_generation = snapshot.generation();
                    match snapshot.len() {
                        1 => assert_eq!(snapshot.latest_version("greet").unwrap().as_str(), "1.0"),
                        2 => assert_eq!(snapshot.latest_version("greet").unwrap().as_str(), "2.0"),
                        n => panic!("unexpected document count {n}"),
                    }
                    tokio::task::yield_now().await;
                }
            });
        }

        write("greet-2.yaml", "2.0");
        engine.coordinator().refresh_now().await.unwrap();

        while let Some(result) = readers.join_next().await {
            result.unwrap();
        }
        assert_eq!(engine.snapshot().len(), 2);
        assert_eq!(engine.snapshot().generation(), 2);
    }

    #[tokio::test]
    async fn timeout_while_parsing_installs_nothing() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("greet.yaml"), "name: greet\nversion: '1'\ntext: Hi").unwrap();
        std::fs::write(dir.path().join("late.slow"), "name: late\nversion: '1'\ntext: Hi").unwrap();

        let engine = HubEngine::builder(Arc::new(LocalSource::new(dir.path())))
            .with_format(Arc::new(SlowFormat))
            .with_refresh_timeout(Duration::from_millis(50))
            .build();

        let err = engine.init().await.unwrap_err();
        assert!(matches!(err, HubError::RefreshTimeout(_)));
        assert_eq!(engine.coordinator().phase(), RefreshPhase::Idle);

        // Let the abandoned parse finish; it must not touch the phase or the store.
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(engine.coordinator().phase(), RefreshPhase::Idle);
        assert_eq!(engine.snapshot().generation(), 0);
        assert!(engine.coordinator().status().last_error.is_some());
    }

    #[tokio::test]
    async fn init_fails_on_missing_source() {
        let dir = tempdir().unwrap();
        let engine =
            HubEngine::builder(Arc::new(LocalSource::new(dir.path().join("absent")))).build();
        assert!(engine.init().await.is_err());
        assert!(engine.snapshot().is_empty());
    }

    #[tokio::test]
    async fn periodic_refresh_picks_up_new_files() {
        let dir = tempdir().unwrap();
        let engine = HubEngine::builder(Arc::new(LocalSource::new(dir.path())))
            .with_refresh_interval(Some(Duration::from_millis(50)))
            .build();
        engine.init().await.unwrap();
        engine.start_background().unwrap();

        std::fs::write(
            dir.path().join("greet.yaml"),
            "name: greet\nversion: '1.0'\ntext: Hi",
        )
        .unwrap();

        let mut found = false;
        for _ in 0..100 {
            if engine.store().lookup("greet", None).is_ok() {
                found = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        engine.shutdown();
        assert!(found, "periodic refresh should install the new prompt");
    }
}
