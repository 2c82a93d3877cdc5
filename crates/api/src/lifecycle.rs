use crate::ApiResult;
use crate::models::{HealthStatus, RefreshOutcome};
use async_trait::async_trait;

#[async_trait]
pub trait HubLifecycle: Send + Sync {
    /// Ask for the index to be rebuilt from its source in the background.
    async fn trigger_refresh(&self) -> ApiResult<RefreshOutcome>;

    /// Index size, refresh bookkeeping and the diagnostics of the last attempt.
    async fn health_status(&self) -> ApiResult<HealthStatus>;
}
