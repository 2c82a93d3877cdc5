use super::format::{RawParameter, Scalar};
use super::scanner::RawDocument;
use crate::model::version::{Version, VersionError};
use once_cell::sync::Lazy;
use prompthub_api::{Parameter, PromptDocument};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("valid name pattern"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationErrorKind {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid name {name:?}: must start with a letter or digit and contain only letters, digits, '.', '_' or '-'")]
    InvalidName { name: String },
    #[error("invalid version {version:?}: {reason}")]
    InvalidVersion {
        version: String,
        reason: VersionError,
    },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("duplicate version {version} of {name}, already defined in {}", .first.display())]
    DuplicateVersion {
        name: String,
        version: String,
        first: PathBuf,
    },
}

/// A rejected document, attributed to the file it came from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {kind}", .path.display())]
pub struct ValidationError {
    pub path: PathBuf,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    /// The document field the error is about.
    pub fn field(&self) -> &'static str {
        match &self.kind {
            ValidationErrorKind::MissingField(field) => field,
            ValidationErrorKind::InvalidName { .. } => "name",
            ValidationErrorKind::InvalidVersion { .. }
            | ValidationErrorKind::DuplicateVersion { .. } => "version",
            ValidationErrorKind::InvalidParameter(_) => "parameters",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    /// Check one document in isolation. Uniqueness is checked by [`Validator::validate_all`].
    pub fn validate(&self, raw: RawDocument) -> Result<PromptDocument, ValidationError> {
        let path = raw.path;
        let def = raw.definition;
        let reject = |kind| ValidationError {
            path: path.clone(),
            kind,
        };

        let name = def
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| reject(ValidationErrorKind::MissingField("name")))?;
        if !NAME_PATTERN.is_match(&name) {
            return Err(reject(ValidationErrorKind::InvalidName { name }));
        }

        let version_text = match def.version {
            None => return Err(reject(ValidationErrorKind::MissingField("version"))),
            Some(Scalar::Float(f)) => {
                return Err(reject(ValidationErrorKind::InvalidVersion {
                    version: f.to_string(),
                    reason: VersionError::UnquotedDecimal,
                }));
            }
            Some(v) => v.into_text(),
        };
        let version = Version::parse(&version_text).map_err(|reason| {
            reject(ValidationErrorKind::InvalidVersion {
                version: version_text.clone(),
                reason,
            })
        })?;

        let body = def
            .body
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| reject(ValidationErrorKind::MissingField("body")))?;

        let parameters = convert_parameters(def.parameters)
            .map_err(|msg| reject(ValidationErrorKind::InvalidParameter(msg)))?;

        let mut tags: Vec<String> = def
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        tags.sort();
        tags.dedup();

        Ok(PromptDocument {
            name,
            version: version.as_str().to_string(),
            body,
            description: def.description.filter(|d| !d.trim().is_empty()),
            tags,
            parameters,
            authors: def.meta.authors,
            source_path: path.clone(),
        })
    }

    /// Validate one scan's documents.
    ///
    /// Documents are processed in path order so that, when two files define the
    /// same `(name, version)`, the one whose path sorts first is kept and the
    /// other is rejected with `DuplicateVersion`.
    pub fn validate_all<I>(&self, raws: I) -> (Vec<PromptDocument>, Vec<ValidationError>)
    where
        I: IntoIterator<Item = RawDocument>,
    {
        let mut raws: Vec<RawDocument> = raws.into_iter().collect();
        raws.sort_by(|a, b| a.path.cmp(&b.path));

        let mut accepted = Vec::with_capacity(raws.len());
        let mut errors = Vec::new();
        let mut seen: HashMap<(String, String), PathBuf> = HashMap::new();

        for raw in raws {
            let doc = match self.validate(raw) {
                Ok(doc) => doc,
                Err(err) => {
                    errors.push(err);
                    continue;
                }
            };

            let key = (doc.name.clone(), doc.version.clone());
            if let Some(first) = seen.get(&key) {
                errors.push(ValidationError {
                    path: doc.source_path,
                    kind: ValidationErrorKind::DuplicateVersion {
                        name: key.0,
                        version: key.1,
                        first: first.clone(),
                    },
                });
                continue;
            }
            seen.insert(key, doc.source_path.clone());
            accepted.push(doc);
        }

        (accepted, errors)
    }
}

fn convert_parameters(raw: Vec<RawParameter>) -> Result<Vec<Parameter>, String> {
    let mut names = HashSet::new();
    let mut parameters = Vec::with_capacity(raw.len());

    for (idx, param) in raw.into_iter().enumerate() {
        let parameter = match param {
            RawParameter::Name(name) => Parameter {
                name: name.trim().to_string(),
                default: None,
                required: true,
            },
            RawParameter::Full {
                name,
                default,
                required,
            } => {
                let default = default.map(|d| d.into_text());
                Parameter {
                    name: name.unwrap_or_default().trim().to_string(),
                    required: required.unwrap_or(default.is_none()),
                    default,
                }
            }
        };

        if parameter.name.is_empty() {
            return Err(format!("parameter #{} has no name", idx + 1));
        }
        if !names.insert(parameter.name.clone()) {
            return Err(format!("parameter {:?} is declared twice", parameter.name));
        }
        parameters.push(parameter);
    }

    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::format::{DocumentFormat, YamlFormat};

    fn raw(path: &str, yaml: &str) -> RawDocument {
        RawDocument {
            path: PathBuf::from(path),
            format: "yaml",
            content: yaml.to_string(),
            definition: YamlFormat.parse(yaml).unwrap(),
        }
    }

    fn kind(path: &str, yaml: &str) -> ValidationErrorKind {
        Validator.validate(raw(path, yaml)).unwrap_err().kind
    }

    #[test]
    fn valid_document_is_normalized() {
        let doc = Validator
            .validate(raw(
                "p/greet.yaml",
                "name: ' greet '\nversion: v1.0\ntext: Hi {{name}}\ntags: [b, a, b, '']\n\
                 parameters:\n  - name\n  - name: tone\n    default: friendly\n",
            ))
            .unwrap();
        assert_eq!(doc.name, "greet");
        assert_eq!(doc.version, "v1.0");
        assert_eq!(doc.tags, vec!["a", "b"]);
        assert!(doc.parameters[0].required);
        assert!(!doc.parameters[1].required);
        assert_eq!(doc.parameters[1].default.as_deref(), Some("friendly"));
        assert_eq!(doc.source_path, PathBuf::from("p/greet.yaml"));
    }

    #[test]
    fn missing_fields() {
        assert_eq!(
            kind("a.yaml", "version: '1'\ntext: x"),
            ValidationErrorKind::MissingField("name")
        );
        assert_eq!(
            kind("a.yaml", "name: a\ntext: x"),
            ValidationErrorKind::MissingField("version")
        );
        assert_eq!(
            kind("a.yaml", "name: a\nversion: '1'\ntext: '   '"),
            ValidationErrorKind::MissingField("body")
        );
    }

    #[test]
    fn name_with_path_separator_is_rejected() {
        let err = Validator
            .validate(raw("a.yaml", "name: a/b\nversion: '1'\ntext: x"))
            .unwrap_err();
        assert_eq!(err.field(), "name");
        assert!(matches!(err.kind, ValidationErrorKind::InvalidName { .. }));
    }

    #[test]
    fn unparsable_version_is_rejected() {
        match kind("a.yaml", "name: a\nversion: '1..2'\ntext: x") {
            ValidationErrorKind::InvalidVersion { version, reason } => {
                assert_eq!(version, "1..2");
                assert_eq!(reason, VersionError::EmptyComponent);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unquoted_decimal_versions_stay_distinct() {
        let (docs, errors) = Validator.validate_all(vec![
            raw("p/a.yaml", "name: p\nversion: 1.9\ntext: nine\n"),
            raw("p/b.yaml", "name: p\nversion: 1.10\ntext: ten\n"),
            raw("q/c.yaml", "name: q\nversion: 1.1\ntext: one\n"),
            raw("q/d.yaml", "name: q\nversion: 1.10\ntext: ten\n"),
        ]);
        assert!(errors.is_empty(), "{errors:?}");
        let versions: Vec<&str> = docs.iter().map(|d| d.version.as_str()).collect();
        assert_eq!(versions, vec!["1.9", "1.10", "1.1", "1.10"]);
    }

    #[test]
    fn unrecoverable_float_version_is_rejected() {
        match kind("a.yaml", "{name: a, version: 1.10, text: x}") {
            ValidationErrorKind::InvalidVersion { reason, .. } => {
                assert_eq!(reason, VersionError::UnquotedDecimal);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn duplicate_parameter_is_rejected() {
        assert!(matches!(
            kind(
                "a.yaml",
                "name: a\nversion: '1'\ntext: x\nparameters: [p, {name: p}]"
            ),
            ValidationErrorKind::InvalidParameter(_)
        ));
        assert!(matches!(
            kind("a.yaml", "name: a\nversion: '1'\ntext: x\nparameters: [{}]"),
            ValidationErrorKind::InvalidParameter(_)
        ));
    }

    #[test]
    fn duplicate_keeps_first_path_regardless_of_input_order() {
        let body = "name: greet\nversion: '1.0'\ntext: ";
        let (docs, errors) = Validator.validate_all(vec![
            raw("z/greet.yaml", &format!("{body}second")),
            raw("a/greet.yaml", &format!("{body}first")),
        ]);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].body, "first");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, PathBuf::from("z/greet.yaml"));
        assert!(matches!(
            &errors[0].kind,
            ValidationErrorKind::DuplicateVersion { first, .. } if first == &PathBuf::from("a/greet.yaml")
        ));
    }

    #[test]
    fn invalid_documents_do_not_block_others() {
        let (docs, errors) = Validator.validate_all(vec![
            raw("a.yaml", "name: a\nversion: '1'\ntext: ok"),
            raw("b.yaml", "name: b\ntext: no version"),
        ]);
        assert_eq!(docs.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field(), "version");
    }
}
