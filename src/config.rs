//! Persistent settings: Jira credentials plus default hierarchy options.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::models::HierarchyConfig;
use crate::tracker::{JiraClient, TrackerError, DEFAULT_TIMEOUT};

const APP_NAME: &str = "gherkin-jira";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub jira: JiraSettings,
    /// Defaults for preview and create; CLI flags override individual fields.
    #[serde(default)]
    pub hierarchy: HierarchyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JiraSettings {
    pub url: String,
    pub username: String,
    pub api_token: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for JiraSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            api_token: String::new(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl JiraSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn is_complete(&self) -> bool {
        !self.url.trim().is_empty()
            && !self.username.trim().is_empty()
            && !self.api_token.trim().is_empty()
    }

    pub fn client(&self) -> Result<JiraClient, TrackerError> {
        JiraClient::new(&self.url, &self.username, &self.api_token, self.timeout())
    }
}

impl AppConfig {
    /// Load configuration from the user's config directory, then apply
    /// environment overrides. Falls back to defaults if the file is missing or
    /// fails to parse.
    pub fn load() -> Self {
        let mut config = match get_config_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.apply_env();
        config
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;

        let config = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Override settings from `JIRA_URL`, `JIRA_USERNAME`, `JIRA_API_TOKEN`,
    /// `JIRA_PROJECT` and `JIRA_TIMEOUT_SECS`.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("JIRA_URL") {
            self.jira.url = url;
        }
        if let Some(username) = var("JIRA_USERNAME") {
            self.jira.username = username;
        }
        if let Some(token) = var("JIRA_API_TOKEN") {
            self.jira.api_token = token;
        }
        if let Some(project) = var("JIRA_PROJECT") {
            self.hierarchy.project_key = project;
        }
        if let Some(secs) = var("JIRA_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.jira.timeout_secs = secs;
        }
    }

    /// Save the current configuration to the user's config directory.
    pub fn save(&self) -> Result<PathBuf> {
        let path = get_config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Shape;

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = AppConfig::default();
        config.jira.url = "https://acme.atlassian.net".into();
        config.hierarchy = HierarchyConfig::new("PROJ").with_shape(Shape::Flat);
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.jira.url, "https://acme.atlassian.net");
        assert_eq!(loaded.hierarchy, config.hierarchy);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AppConfig::load_from(&dir.path().join(CONFIG_FILE)).unwrap();

        assert_eq!(loaded.jira.timeout_secs, 30);
        assert!(loaded.hierarchy.project_key.is_empty());
    }

    #[test]
    fn test_partial_file_and_level_alias() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"{"hierarchy": {"project_key": "PROJ", "shape": "level2", "fields": {"story_content": "customfield_10577"}}}"#,
        )
        .unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.hierarchy.shape, Shape::Flat);
        assert_eq!(loaded.hierarchy.fields.story_content, "customfield_10577");
        assert_eq!(loaded.hierarchy.fields.feature_content, "description");
        assert_eq!(loaded.hierarchy.relates_link_type.as_deref(), Some("Relates"));
    }

    #[test]
    fn test_overrides() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            "JIRA_PROJECT" => Some("OPS".to_string()),
            "JIRA_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        });

        assert_eq!(config.hierarchy.project_key, "OPS");
        assert_eq!(config.jira.timeout(), Duration::from_secs(5));
        assert!(!config.jira.is_complete());
    }
}
