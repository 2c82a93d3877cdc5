use super::HubHandle;
use async_trait::async_trait;
use prompthub_api::{ApiError, ApiResult, PromptDocument, PromptService, PromptSummary};

#[async_trait]
impl PromptService for HubHandle {
    async fn get_prompt(&self, name: &str, version: Option<&str>) -> ApiResult<PromptDocument> {
        self.engine
            .store()
            .lookup(name, version)
            .map(|doc| doc.as_ref().clone())
            .map_err(|e| ApiError::NotFound(e.to_string()))
    }

    async fn list_prompts(&self, tag: Option<&str>) -> ApiResult<Vec<PromptSummary>> {
        Ok(self.engine.store().list(tag))
    }
}
