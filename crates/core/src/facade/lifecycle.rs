use super::HubHandle;
use async_trait::async_trait;
use prompthub_api::{ApiResult, HealthStatus, HubLifecycle, RefreshOutcome};

#[async_trait]
impl HubLifecycle for HubHandle {
    async fn trigger_refresh(&self) -> ApiResult<RefreshOutcome> {
        Ok(self.engine.coordinator().trigger())
    }

    async fn health_status(&self) -> ApiResult<HealthStatus> {
        let snapshot = self.engine.snapshot();
        let status = self.engine.coordinator().status();
        Ok(HealthStatus {
            document_count: snapshot.len(),
            generation: snapshot.generation(),
            last_successful_refresh: status.last_success,
            last_refresh_error: status.last_error,
            diagnostics: status
                .last_report
                .map(|report| report.diagnostics())
                .unwrap_or_default(),
        })
    }
}
