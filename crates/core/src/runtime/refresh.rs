//! Refresh coordination: scan, validate, build, install.
//!
//! At most one attempt runs at a time. A request that arrives while an attempt
//! is running is answered with `AlreadyInProgress` and folded into a single
//! follow-up attempt, so changes made during a scan are not lost.

use super::source::SourceProvider;
use super::store::IndexStore;
use crate::error::{HubError, Result};
use crate::indexing::{DocumentLoader, IndexBuilder, LoadError, ValidationError, Validator};
use chrono::{DateTime, Utc};
use prompthub_api::{Diagnostic, RefreshOutcome};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::OwnedMutexGuard;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPhase {
    #[default]
    Idle,
    Scanning,
    Validating,
    Building,
    Installing,
    /// The attempt failed; the coordinator moves back to `Idle` once the
    /// failure is recorded in `last_error`.
    Failed,
}

/// What one successful attempt found and installed.
#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    pub document_count: usize,
    pub generation: u64,
    pub load_errors: Vec<LoadError>,
    pub validation_errors: Vec<ValidationError>,
    pub elapsed: Duration,
}

impl RefreshReport {
    pub fn rejected(&self) -> usize {
        self.load_errors.len() + self.validation_errors.len()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let loads = self.load_errors.iter().map(|e| Diagnostic {
            path: e.path.display().to_string(),
            message: e.reason.clone(),
        });
        let validations = self.validation_errors.iter().map(|e| Diagnostic {
            path: e.path.display().to_string(),
            message: e.kind.to_string(),
        });
        loads.chain(validations).collect()
    }
}

#[derive(Debug, Default)]
struct RefreshState {
    phase: RefreshPhase,
    last_success: Option<DateTime<Utc>>,
    last_error: Option<String>,
    last_report: Option<RefreshReport>,
}

/// Point-in-time copy of the coordinator's bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct RefreshStatus {
    pub phase: RefreshPhase,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_report: Option<RefreshReport>,
}

pub struct RefreshCoordinator {
    store: Arc<IndexStore>,
    source: Arc<dyn SourceProvider>,
    loader: DocumentLoader,
    validator: Validator,
    timeout: Duration,
    /// Held for the whole of an attempt.
    gate: Arc<tokio::sync::Mutex<()>>,
    rerun: AtomicBool,
    state: Arc<Mutex<RefreshState>>,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<IndexStore>,
        source: Arc<dyn SourceProvider>,
        loader: DocumentLoader,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            source,
            loader,
            validator: Validator,
            timeout,
            gate: Arc::new(tokio::sync::Mutex::new(())),
            rerun: AtomicBool::new(false),
            state: Arc::new(Mutex::new(RefreshState::default())),
        }
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    pub fn source(&self) -> &Arc<dyn SourceProvider> {
        &self.source
    }

    pub fn loader(&self) -> &DocumentLoader {
        &self.loader
    }

    pub fn phase(&self) -> RefreshPhase {
        lock(&self.state).phase
    }

    pub fn is_running(&self) -> bool {
        self.gate.try_lock().is_err()
    }

    pub fn status(&self) -> RefreshStatus {
        let state = lock(&self.state);
        RefreshStatus {
            phase: state.phase,
            last_success: state.last_success,
            last_error: state.last_error.clone(),
            last_report: state.last_report.clone(),
        }
    }

    /// Run one attempt now, waiting for any attempt already in flight.
    ///
    /// Used at startup, where the caller treats an error as fatal.
    pub async fn refresh_now(self: &Arc<Self>) -> Result<RefreshReport> {
        let guard = Arc::clone(&self.gate).lock_owned().await;
        // Requests queued so far are served by this attempt.
        self.rerun.store(false, Ordering::Release);
        let result = self.run_attempt().await;
        self.release(guard);
        result
    }

    /// Start an attempt in the background unless one is already running.
    ///
    /// A request that finds an attempt running is remembered; the holder of the
    /// gate runs one more attempt for all such requests before it lets go.
    pub fn trigger(self: &Arc<Self>) -> RefreshOutcome {
        self.rerun.store(true, Ordering::Release);
        if self.spawn_pending() {
            RefreshOutcome::Accepted
        } else {
            tracing::debug!("Refresh already in progress, coalescing request");
            RefreshOutcome::AlreadyInProgress
        }
    }

    /// Take the gate and drain pending requests in a background task.
    /// Returns false when another attempt holds the gate.
    fn spawn_pending(self: &Arc<Self>) -> bool {
        let Ok(guard) = Arc::clone(&self.gate).try_lock_owned() else {
            return false;
        };

        let this = Arc::clone(self);
        tokio::spawn(async move {
            while this.rerun.swap(false, Ordering::AcqRel) {
                if let Err(err) = this.run_attempt().await {
                    tracing::error!("Prompt index refresh failed, keeping previous index: {}", err);
                }
            }
            this.release(guard);
        });
        true
    }

    /// Unlock the gate, then pick up any request that arrived after the last check.
    fn release(self: &Arc<Self>, guard: OwnedMutexGuard<()>) {
        drop(guard);
        if self.rerun.load(Ordering::Acquire) && self.spawn_pending() {
            tracing::debug!("Running coalesced refresh");
        }
    }

    async fn run_attempt(&self) -> Result<RefreshReport> {
        let started = Instant::now();
        let cancel = CancellationToken::new();
        {
            let mut state = lock(&self.state);
            state.phase = RefreshPhase::Scanning;
        }

        let result = match tokio::time::timeout(self.timeout, self.pipeline(cancel.clone(), started)).await
        {
            Ok(result) => result,
            Err(_) => {
                cancel.cancel();
                Err(HubError::RefreshTimeout(self.timeout))
            }
        };

        let mut state = lock(&self.state);
        match &result {
            Ok(report) => {
                state.phase = RefreshPhase::Idle;
                state.last_success = Some(Utc::now());
                state.last_error = None;
                state.last_report = Some(report.clone());
            }
            Err(err) => {
                state.phase = RefreshPhase::Failed;
                state.last_error = Some(err.to_string());
            }
        }
        drop(state);

        if result.is_err() {
            tracing::debug!("Refresh attempt failed after {:?}", started.elapsed());
            lock(&self.state).phase = RefreshPhase::Idle;
        }
        result
    }

    async fn pipeline(&self, cancel: CancellationToken, started: Instant) -> Result<RefreshReport> {
        let root = self.source.prepare().await?;
        tracing::debug!("Scanning prompts from {}", self.source.describe());

        let loader = self.loader.clone();
        let validator = self.validator;
        let state = Arc::clone(&self.state);
        let token = cancel.clone();

        let (snapshot, load_errors, validation_errors) = tokio::task::spawn_blocking(move || -> Result<_> {
            let outcome = loader.scan(&root)?.with_cancellation(token.clone()).into_outcome();
            if token.is_cancelled() {
                return Err(HubError::Internal("scan cancelled".to_string()));
            }

            set_phase(&state, &token, RefreshPhase::Validating);
            let (documents, validation_errors) = validator.validate_all(outcome.documents);

            set_phase(&state, &token, RefreshPhase::Building);
            let snapshot = IndexBuilder::build(documents)?;
            Ok((snapshot, outcome.errors, validation_errors))
        })
        .await
        .map_err(|e| HubError::Internal(e.to_string()))??;

        set_phase(&self.state, &cancel, RefreshPhase::Installing);
        let installed = self.store.install(snapshot);

        let report = RefreshReport {
            document_count: installed.len(),
            generation: installed.generation(),
            load_errors,
            validation_errors,
            elapsed: started.elapsed(),
        };

        for diagnostic in report.diagnostics() {
            tracing::warn!("Rejected {}: {}", diagnostic.path, diagnostic.message);
        }
        tracing::info!(
            "Prompt index refreshed: {} documents in {} families, {} rejected, {:?}",
            report.document_count,
            installed.family_count(),
            report.rejected(),
            report.elapsed
        );
        Ok(report)
    }
}

fn lock(state: &Mutex<RefreshState>) -> MutexGuard<'_, RefreshState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Phase updates from an abandoned attempt are dropped.
///
/// The token is checked under the state lock, so an update cannot land after
/// the timeout path has recorded the failure.
fn set_phase(state: &Mutex<RefreshState>, cancel: &CancellationToken, phase: RefreshPhase) {
    let mut state = lock(state);
    if !cancel.is_cancelled() {
        state.phase = phase;
    }
}
