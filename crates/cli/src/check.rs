use prompthub_core::indexing::{DocumentLoader, IndexBuilder, Validator};
use std::path::Path;

pub struct CheckReport {
    pub documents: usize,
    pub diagnostics: Vec<String>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// One load + validate + build pass, printing diagnostics to stdout.
pub fn run(root: &Path) -> anyhow::Result<CheckReport> {
    let report = collect(root)?;
    for line in &report.diagnostics {
        println!("{line}");
    }
    println!(
        "{} prompts indexed, {} problems",
        report.documents,
        report.diagnostics.len()
    );
    Ok(report)
}

fn collect(root: &Path) -> anyhow::Result<CheckReport> {
    let outcome = DocumentLoader::default().load(root)?;
    let mut diagnostics: Vec<String> = outcome.errors.iter().map(ToString::to_string).collect();

    let (documents, rejected) = Validator.validate_all(outcome.documents);
    diagnostics.extend(rejected.iter().map(ToString::to_string));

    let snapshot = IndexBuilder::build(documents)?;
    Ok(CheckReport {
        documents: snapshot.len(),
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn clean_directory_has_no_diagnostics() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("greet.yaml"),
            "name: greet\nversion: '1'\ntext: Hello\n",
        )
        .unwrap();

        let report = collect(dir.path()).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.documents, 1);
    }

    #[test]
    fn bad_files_are_reported() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("broken.yaml"), "name: [unclosed").unwrap();
        std::fs::write(dir.path().join("noversion.yaml"), "name: x\ntext: hi\n").unwrap();

        let report = collect(dir.path()).unwrap();
        assert_eq!(report.documents, 0);
        assert_eq!(report.diagnostics.len(), 2);
        assert!(report.diagnostics.iter().any(|d| d.contains("broken.yaml")));
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(collect(&dir.path().join("absent")).is_err());
    }
}
