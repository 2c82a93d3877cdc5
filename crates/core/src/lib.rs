pub mod config;
pub mod error;
pub mod logging;

pub mod facade;
pub mod indexing;
pub mod model;
pub mod runtime;

pub use error::{HubError, Result};
pub use facade::HubHandle;
pub use runtime::{HubEngine, HubEngineBuilder};
