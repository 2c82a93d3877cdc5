//! Definition file formats. Each format knows which paths it claims and how to
//! turn file text into a [`RawDefinition`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Top-level `version:` key with a plain numeric value.
static YAML_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^version[ \t]*:[ \t]*([0-9][0-9.]*)[ \t]*(?:#.*)?\r?$")
        .expect("valid yaml version pattern")
});

static JSON_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""version"\s*:\s*(-?[0-9][0-9.eE+-]*)"#).expect("valid json version pattern")
});

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A scalar that may be written unquoted (`version: 2`) but is kept as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    pub fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Integer(i) => i.to_string(),
            // `1.0` would otherwise print as `1`
            Scalar::Float(f) if f.fract() == 0.0 && f.is_finite() => format!("{f:.1}"),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawParameter {
    Name(String),
    Full {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        default: Option<Scalar>,
        #[serde(default)]
        required: Option<bool>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawMeta {
    #[serde(default)]
    pub authors: Vec<String>,
}

/// Untyped contents of one definition file. Nothing here is validated yet.
///
/// An unquoted decimal version is read as a float by both YAML and JSON, which
/// drops trailing zeros (`1.10` becomes `1.1`). The formats below put the
/// literal token back; a float that is still left is rejected by the validator.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<Scalar>,
    #[serde(default, alias = "text")]
    pub body: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<RawParameter>,
    #[serde(default)]
    pub meta: RawMeta,
}

impl RawDefinition {
    fn restore_version_literal(&mut self, pattern: &Regex, source: &str) {
        let Some(Scalar::Float(value)) = &self.version else {
            return;
        };
        let value = *value;
        let literal = pattern
            .captures_iter(source)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .find(|token| token.parse::<f64>().is_ok_and(|f| f == value));
        if let Some(token) = literal {
            self.version = Some(Scalar::Text(token.to_string()));
        }
    }
}

pub trait DocumentFormat: Send + Sync {
    fn name(&self) -> &'static str;

    fn supports_path(&self, path: &Path) -> bool;

    fn parse(&self, source: &str) -> Result<RawDefinition, BoxError>;
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|x| ext.eq_ignore_ascii_case(x)))
}

pub struct YamlFormat;

impl DocumentFormat for YamlFormat {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn supports_path(&self, path: &Path) -> bool {
        has_extension(path, &["yaml", "yml"])
    }

    fn parse(&self, source: &str) -> Result<RawDefinition, BoxError> {
        let mut def: RawDefinition = serde_yaml::from_str(source)?;
        def.restore_version_literal(&YAML_VERSION, source);
        Ok(def)
    }
}

pub struct JsonFormat;

impl DocumentFormat for JsonFormat {
    fn name(&self) -> &'static str {
        "json"
    }

    fn supports_path(&self, path: &Path) -> bool {
        has_extension(path, &["json"])
    }

    fn parse(&self, source: &str) -> Result<RawDefinition, BoxError> {
        let mut def: RawDefinition = serde_json::from_str(source)?;
        def.restore_version_literal(&JSON_VERSION, source);
        Ok(def)
    }
}

pub fn default_formats() -> Vec<Arc<dyn DocumentFormat>> {
    vec![Arc::new(YamlFormat), Arc::new(JsonFormat)]
}

/// First registered format claiming `path`.
pub fn format_for_path<'a>(
    formats: &'a [Arc<dyn DocumentFormat>],
    path: &Path,
) -> Option<&'a Arc<dyn DocumentFormat>> {
    formats.iter().find(|f| f.supports_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_by_extension() {
        let formats = default_formats();
        let name = |p: &str| format_for_path(&formats, Path::new(p)).map(|f| f.name());
        assert_eq!(name("a/greet.yaml"), Some("yaml"));
        assert_eq!(name("a/greet.YML"), Some("yaml"));
        assert_eq!(name("a/greet.json"), Some("json"));
        assert_eq!(name("a/README.md"), None);
        assert_eq!(name("a/yaml"), None);
    }

    #[test]
    fn yaml_accepts_text_alias_and_unquoted_version() {
        let raw = YamlFormat
            .parse(
                "name: greet\nversion: 1.0\ntext: Hi {{name}}\ntags: [a]\n\
                 parameters:\n  - name\n  - name: tone\n    default: friendly\n\
                 meta:\n  authors: [alice]\n",
            )
            .unwrap();
        assert_eq!(raw.name.as_deref(), Some("greet"));
        assert_eq!(raw.version.map(Scalar::into_text).as_deref(), Some("1.0"));
        assert_eq!(raw.body.as_deref(), Some("Hi {{name}}"));
        assert_eq!(raw.parameters.len(), 2);
        assert_eq!(raw.parameters[0], RawParameter::Name("name".to_string()));
        assert_eq!(raw.meta.authors, vec!["alice"]);
    }

    #[test]
    fn json_definition_parses() {
        let raw = JsonFormat
            .parse(r#"{"name": "sum", "version": 3, "body": "Summarize"}"#)
            .unwrap();
        assert_eq!(raw.version.map(Scalar::into_text).as_deref(), Some("3"));
        assert!(raw.tags.is_empty());
    }

    #[test]
    fn unquoted_decimal_versions_keep_trailing_zeros() {
        let version = |src: &str| YamlFormat.parse(src).unwrap().version;
        assert_eq!(
            version("name: p\nversion: 1.10\ntext: ten\n"),
            Some(Scalar::Text("1.10".to_string()))
        );
        assert_eq!(
            version("name: p\nversion: 2.50 # bumped\ntext: x\n"),
            Some(Scalar::Text("2.50".to_string()))
        );
        assert_eq!(
            version("name: p\nversion: 1.9\ntext: nine\n"),
            Some(Scalar::Text("1.9".to_string()))
        );

        let json = JsonFormat
            .parse(r#"{"name": "p", "version": 1.20, "body": "x"}"#)
            .unwrap();
        assert_eq!(json.version, Some(Scalar::Text("1.20".to_string())));
    }

    #[test]
    fn float_in_flow_mapping_stays_a_float() {
        let raw = YamlFormat.parse("{name: p, version: 1.10, text: x}").unwrap();
        assert_eq!(raw.version, Some(Scalar::Float(1.1)));
    }

    #[test]
    fn malformed_text_is_an_error() {
        assert!(YamlFormat.parse("name: [unterminated").is_err());
        assert!(JsonFormat.parse("{").is_err());
        // A top-level list is not a definition.
        assert!(YamlFormat.parse("- a\n- b\n").is_err());
    }
}
