//! Index build pipeline: scan, validate, build.

pub mod build;
pub mod format;
pub mod scanner;
pub mod validate;

pub use build::IndexBuilder;
pub use format::{DocumentFormat, JsonFormat, RawDefinition, YamlFormat};
pub use scanner::{DocumentLoader, DocumentScan, LoadError, LoadOutcome, RawDocument};
pub use validate::{ValidationError, ValidationErrorKind, Validator};

use std::path::{Component, Path};

/// True when no component of `path` below `root` starts with a dot.
pub fn is_visible_below(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    !relative.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}
