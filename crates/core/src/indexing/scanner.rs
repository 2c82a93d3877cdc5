use super::format::{DocumentFormat, RawDefinition, default_formats, format_for_path};
use super::is_visible_below;

use crate::error::{HubError, Result};
use ignore::WalkBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One definition file, read and parsed but not yet validated.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub path: PathBuf,
    pub format: &'static str,
    pub content: String,
    pub definition: RawDefinition,
}

/// A file that could not be read or parsed. Collected, never fatal to a scan.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {reason}", .path.display())]
pub struct LoadError {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub documents: Vec<RawDocument>,
    pub errors: Vec<LoadError>,
}

#[derive(Clone)]
pub struct DocumentLoader {
    formats: Arc<Vec<Arc<dyn DocumentFormat>>>,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new(default_formats())
    }
}

impl DocumentLoader {
    pub fn new(formats: Vec<Arc<dyn DocumentFormat>>) -> Self {
        Self {
            formats: Arc::new(formats),
        }
    }

    /// Start a scan of `root`.
    ///
    /// Candidate paths are discovered and sorted up front; files are read and
    /// parsed only as the returned iterator advances. Calling `scan` again
    /// starts over from scratch.
    pub fn scan(&self, root: &Path) -> Result<DocumentScan> {
        check_root(root)?;

        let mut candidates = Vec::new();
        let mut walk_errors = VecDeque::new();

        for entry in WalkBuilder::new(root).require_git(false).build() {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if !entry.file_type().is_some_and(|t| t.is_file()) || !is_visible_below(root, path) {
                        continue;
                    }
                    if let Some(format) = format_for_path(&self.formats, path) {
                        candidates.push((path.to_path_buf(), Arc::clone(format)));
                    }
                }
                Err(err) => walk_errors.push_back(LoadError {
                    path: root.to_path_buf(),
                    reason: err.to_string(),
                }),
            }
        }

        candidates.sort_by(|a, b| a.0.cmp(&b.0));
        tracing::debug!(
            "Found {} candidate definition files under {}",
            candidates.len(),
            root.display()
        );

        Ok(DocumentScan {
            walk_errors,
            candidates: candidates.into_iter(),
            cancel: None,
        })
    }

    /// Whether a change to `path` can affect a scan of `root`.
    pub fn claims(&self, root: &Path, path: &Path) -> bool {
        is_visible_below(root, path) && format_for_path(&self.formats, path).is_some()
    }

    /// Run a full scan, collecting documents and per-file errors together.
    pub fn load(&self, root: &Path) -> Result<LoadOutcome> {
        Ok(self.scan(root)?.into_outcome())
    }
}

fn check_root(root: &Path) -> Result<()> {
    let metadata = fs::metadata(root).map_err(|e| HubError::source_unavailable(root, e))?;
    if !metadata.is_dir() {
        return Err(HubError::source_unavailable(root, "not a directory"));
    }
    fs::read_dir(root).map_err(|e| HubError::source_unavailable(root, e))?;
    Ok(())
}

/// Lazy, path-sorted sequence of parsed definition files.
pub struct DocumentScan {
    walk_errors: VecDeque<LoadError>,
    candidates: std::vec::IntoIter<(PathBuf, Arc<dyn DocumentFormat>)>,
    cancel: Option<CancellationToken>,
}

impl DocumentScan {
    /// Stop yielding as soon as `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Number of files not yet read.
    pub fn remaining(&self) -> usize {
        self.candidates.len()
    }

    pub fn into_outcome(self) -> LoadOutcome {
        let mut outcome = LoadOutcome::default();
        for item in self {
            match item {
                Ok(doc) => outcome.documents.push(doc),
                Err(err) => outcome.errors.push(err),
            }
        }
        outcome
    }
}

impl Iterator for DocumentScan {
    type Item = std::result::Result<RawDocument, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            return None;
        }
        if let Some(err) = self.walk_errors.pop_front() {
            return Some(Err(err));
        }
        let (path, format) = self.candidates.next()?;
        Some(read_document(path, format.as_ref()))
    }
}

fn read_document(
    path: PathBuf,
    format: &dyn DocumentFormat,
) -> std::result::Result<RawDocument, LoadError> {
    let fail = |path: &Path, reason: String| LoadError {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = fs::read(&path).map_err(|e| fail(&path, format!("cannot read file: {e}")))?;
    let content =
        String::from_utf8(bytes).map_err(|_| fail(&path, "file is not valid UTF-8".to_string()))?;
    let definition = format
        .parse(&content)
        .map_err(|e| fail(&path, format!("invalid {}: {e}", format.name())))?;

    Ok(RawDocument {
        path,
        format: format.name(),
        content,
        definition,
    })
}
