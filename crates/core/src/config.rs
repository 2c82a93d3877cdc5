//! Service settings, layered as defaults, then a YAML file, then the environment.

use crate::error::{HubError, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "prompthub.yaml";
pub const ENV_PREFIX: &str = "PROMPTHUB_";

/// Access token for the remote prompt source.
///
/// Passed through to the source provider untouched; never printed.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Credential(<empty>)")
        } else {
            f.write_str("Credential(<redacted>)")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub port: u16,
    pub prompts_path: PathBuf,
    pub allowed_origins: Vec<String>,
    pub github_token: Credential,
    /// Seconds between background refreshes; 0 disables the timer.
    pub refresh_interval_secs: u64,
    pub refresh_timeout_secs: u64,
    /// Refresh when files under `prompts_path` change.
    pub watch: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 80,
            prompts_path: PathBuf::from("./prompts"),
            allowed_origins: vec!["https://prompthub.deepset.ai".to_string()],
            github_token: Credential::default(),
            refresh_interval_secs: 0,
            refresh_timeout_secs: 30,
            watch: false,
        }
    }
}

impl Settings {
    /// Resolve settings for the process.
    ///
    /// An explicit `config_path` must exist. Without one, `./prompthub.yaml` is
    /// read when present and defaults are used otherwise.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut settings = match config_path {
            Some(path) => {
                let settings = Self::from_file(path)?;
                tracing::debug!("Config file found at {}", path.display());
                settings
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    tracing::debug!("Config file found at {}", default_path.display());
                    Self::from_file(default_path)?
                } else {
                    tracing::info!("Configuration file not found, running with default parameters");
                    Self::default()
                }
            }
        };

        settings.apply_env(|key| std::env::var(key).ok())?;

        if settings.github_token.is_empty() {
            tracing::warn!("github_token is not set, serving the local prompt directory only");
        }
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| HubError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Override fields from environment variables.
    ///
    /// `PROMPTHUB_<KEY>` takes precedence over the bare `<KEY>`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(&format!("{ENV_PREFIX}{key}")).or_else(|| lookup(key));

        if let Some(v) = get("PORT") {
            self.port = parse_env("PORT", &v)?;
        }
        if let Some(v) = get("PROMPTS_PATH") {
            self.prompts_path = PathBuf::from(v);
        }
        if let Some(v) = get("ALLOWED_ORIGINS") {
            self.allowed_origins = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = get("GITHUB_TOKEN") {
            self.github_token = Credential::new(v);
        }
        if let Some(v) = get("REFRESH_INTERVAL_SECS") {
            self.refresh_interval_secs = parse_env("REFRESH_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = get("REFRESH_TIMEOUT_SECS") {
            self.refresh_timeout_secs = parse_env("REFRESH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("WATCH") {
            self.watch = parse_bool("WATCH", &v)?;
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs.max(1))
    }

    /// No credential means the remote source is never contacted.
    pub fn local_only(&self) -> bool {
        self.github_token.is_empty()
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| HubError::Config(format!("invalid value for {key}: {e}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(HubError::Config(format!(
            "invalid value for {key}: expected a boolean, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_service_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.port, 80);
        assert_eq!(settings.prompts_path, PathBuf::from("./prompts"));
        assert_eq!(settings.allowed_origins, vec!["https://prompthub.deepset.ai"]);
        assert!(settings.local_only());
        assert_eq!(settings.refresh_interval(), None);
    }

    #[test]
    fn yaml_overrides_only_given_fields() {
        let settings = Settings::from_yaml("port: 8080\nprompts_path: /srv/prompts\n").unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.prompts_path, PathBuf::from("/srv/prompts"));
        assert_eq!(settings.refresh_timeout_secs, 30);
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(Settings::from_yaml("  \n").unwrap(), Settings::default());
    }

    #[test]
    fn env_overrides_file_and_prefix_wins() {
        let mut settings = Settings::from_yaml("port: 8080").unwrap();
        settings
            .apply_env(env(&[
                ("PORT", "9000"),
                ("PROMPTHUB_PORT", "9100"),
                ("ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
                ("GITHUB_TOKEN", "ghp_secret"),
                ("WATCH", "yes"),
            ]))
            .unwrap();
        assert_eq!(settings.port, 9100);
        assert_eq!(
            settings.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!settings.local_only());
        assert!(settings.watch);
    }

    #[test]
    fn invalid_env_value_is_config_error() {
        let mut settings = Settings::default();
        let err = settings.apply_env(env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, HubError::Config(_)));
    }

    #[test]
    fn credential_debug_is_redacted() {
        let token = Credential::new("ghp_secret");
        assert_eq!(format!("{token:?}"), "Credential(<redacted>)");
        assert_eq!(format!("{:?}", Credential::default()), "Credential(<empty>)");
        assert_eq!(token.expose(), "ghp_secret");
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/prompthub.yaml"))).unwrap_err();
        assert!(matches!(err, HubError::Config(_)));
    }
}
