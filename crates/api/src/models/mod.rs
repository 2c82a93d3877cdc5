pub mod prompt;
pub mod status;

pub use prompt::*;
pub use status::*;
