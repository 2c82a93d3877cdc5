use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of asking for a background refresh.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefreshOutcome {
    Accepted,
    AlreadyInProgress,
}

/// One rejected file or document from the last refresh attempt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthStatus {
    pub document_count: usize,
    /// Install counter of the snapshot currently serving traffic; 0 before the first install.
    pub generation: u64,
    pub last_successful_refresh: Option<DateTime<Utc>>,
    pub last_refresh_error: Option<String>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}
