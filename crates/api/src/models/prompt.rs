use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A named template parameter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// One versioned prompt template.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PromptDocument {
    pub name: String,
    pub version: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Sorted and deduplicated.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub authors: Vec<String>,
    /// Originating file. Kept for diagnostics, never sent to API callers.
    #[serde(skip)]
    pub source_path: PathBuf,
}

impl PromptDocument {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.binary_search_by(|t| t.as_str().cmp(tag)).is_ok()
    }
}

/// Listing entry: one per prompt family.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PromptSummary {
    pub name: String,
    pub latest_version: String,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&PromptDocument> for PromptSummary {
    fn from(doc: &PromptDocument) -> Self {
        Self {
            name: doc.name.clone(),
            latest_version: doc.version.clone(),
            tags: doc.tags.clone(),
            description: doc.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PromptDocument {
        PromptDocument {
            name: "greet".to_string(),
            version: "1.0".to_string(),
            body: "Hi {{name}}".to_string(),
            description: None,
            tags: vec!["chat".to_string(), "greeting".to_string()],
            parameters: vec![Parameter {
                name: "name".to_string(),
                default: None,
                required: true,
            }],
            authors: vec![],
            source_path: PathBuf::from("/srv/prompts/greet.yaml"),
        }
    }

    #[test]
    fn source_path_is_not_serialized() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("source_path").is_none());
        assert_eq!(json["body"], "Hi {{name}}");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn has_tag_uses_sorted_tags() {
        let doc = sample();
        assert!(doc.has_tag("greeting"));
        assert!(doc.has_tag("chat"));
        assert!(!doc.has_tag("code"));
    }
}
