use crate::ApiResult;
use crate::models::{PromptDocument, PromptSummary};
use async_trait::async_trait;

#[async_trait]
pub trait PromptService: Send + Sync {
    /// Resolve a prompt by name. Without a version the latest one is returned.
    async fn get_prompt(&self, name: &str, version: Option<&str>) -> ApiResult<PromptDocument>;

    /// List every prompt family once, with its latest version.
    /// `tag` restricts the listing to families whose latest version carries it.
    async fn list_prompts(&self, tag: Option<&str>) -> ApiResult<Vec<PromptSummary>>;
}
