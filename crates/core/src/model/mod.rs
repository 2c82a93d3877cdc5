pub mod snapshot;
pub mod version;

pub use snapshot::IndexSnapshot;
pub use version::{Version, VersionError};
