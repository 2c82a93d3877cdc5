use super::refresh::RefreshCoordinator;
use crate::error::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use prompthub_api::RefreshOutcome;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const DEBOUNCE_INTERVAL: Duration = Duration::from_millis(500);

struct FsWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl FsWatcher {
    fn new(root: &Path) -> notify::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    async fn next_event_async(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Some(Ok(event)) => return Some(event),
                Some(Err(err)) => tracing::warn!("Watch error: {}", err),
                None => return None,
            }
        }
    }
}

fn log_trigger(reason: &str, outcome: RefreshOutcome) {
    match outcome {
        RefreshOutcome::Accepted => tracing::info!("{}: refreshing prompt index", reason),
        RefreshOutcome::AlreadyInProgress => {
            tracing::debug!("{}: refresh already in progress", reason)
        }
    }
}

/// Trigger a refresh every `interval` until `cancel_token` is cancelled.
pub fn spawn_periodic_refresh(
    coordinator: Arc<RefreshCoordinator>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    let coordinator = Arc::downgrade(&coordinator);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; startup already refreshed.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(coordinator) = coordinator.upgrade() else { break };
                    log_trigger("Scheduled refresh", coordinator.trigger());
                }
            }
        }
        tracing::debug!("Periodic refresh task ended");
    });
}

/// Watch `root` and trigger a debounced refresh on relevant changes.
/// The watcher task exits when `cancel_token` is cancelled.
pub fn spawn_watch_refresh(
    coordinator: Arc<RefreshCoordinator>,
    root: PathBuf,
    cancel_token: CancellationToken,
) -> Result<()> {
    let root = std::fs::canonicalize(&root).unwrap_or(root);
    let mut watcher = FsWatcher::new(&root)?;
    let loader = coordinator.loader().clone();
    let coordinator = Arc::downgrade(&coordinator);

    tokio::spawn(async move {
        tracing::info!("Started watching {}", root.display());
        let mut dirty = false;

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    break;
                }
                event = watcher.next_event_async() => {
                    match event {
                        Some(e) => dirty |= e.paths.iter().any(|p| loader.claims(&root, p)),
                        None => break,
                    }
                }
                _ = tokio::time::sleep(DEBOUNCE_INTERVAL), if dirty => {
                    dirty = false;
                    let Some(coordinator) = coordinator.upgrade() else { break };
                    log_trigger("Detected changes in prompt files", coordinator.trigger());
                }
            }
        }
        tracing::info!("File watcher task ended for {}", root.display());
    });

    Ok(())
}
