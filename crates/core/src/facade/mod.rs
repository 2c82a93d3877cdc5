use std::sync::Arc;

use crate::model::IndexSnapshot;
use crate::runtime::HubEngine;

mod lifecycle;
mod prompt;

/// Engine handle - the `PromptHub` API implementation handed to transports
#[derive(Clone)]
pub struct HubHandle {
    pub(crate) engine: Arc<HubEngine>,
}

impl HubHandle {
    pub fn new(engine: Arc<HubEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<HubEngine> {
        &self.engine
    }

    /// Snapshot currently serving reads
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.engine.snapshot()
    }
}
