pub mod error;
pub mod lifecycle;
pub mod models;
pub mod prompt;

// Re-export commonly used types
pub use error::{ApiError, ApiResult};
pub use lifecycle::HubLifecycle;
pub use models::*;
pub use prompt::PromptService;

/// Composite trait representing the full PromptHub API.
/// Transports depend on this single trait instead of the individual ones.
pub trait PromptHub: PromptService + HubLifecycle {}

impl<T: PromptService + HubLifecycle> PromptHub for T {}
