// src/config.rs
//! Process-wide sync configuration.
//!
//! Loaded once at startup and shared read-only (`Arc<SyncConfig>`). Sources:
//! 1) `$JOB_SYNC_CONFIG_PATH`
//! 2) `config/job_sync.toml`
//! 3) built-in [`SyncConfig::default_seed`]
//!
//! Env overrides are applied on top: `SCRAPER_API_KEY`, `JOB_SYNC_STORE_PATH`,
//! `JOB_SYNC_INTERVAL_SECS`.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_CONFIG_PATH: &str = "JOB_SYNC_CONFIG_PATH";
pub const ENV_API_KEY: &str = "SCRAPER_API_KEY";
pub const ENV_STORE_PATH: &str = "JOB_SYNC_STORE_PATH";
pub const ENV_INTERVAL_SECS: &str = "JOB_SYNC_INTERVAL_SECS";

pub const DEFAULT_CONFIG_PATH: &str = "config/job_sync.toml";
pub const DEFAULT_ENDPOINT_TEMPLATE: &str =
    "https://boards-api.greenhouse.io/v1/boards/{company}/jobs?content=true";
pub const DEFAULT_SOURCE_ID: &str = "scrape_sources/greenhouse";
pub const DEV_API_KEY: &str = "my-development-secret-key-123";

fn default_endpoint_template() -> String {
    DEFAULT_ENDPOINT_TEMPLATE.to_string()
}
fn default_request_timeout_secs() -> u64 {
    20
}
fn default_collection() -> String {
    "jobs".to_string()
}
fn default_store_path() -> PathBuf {
    PathBuf::from("state/jobs.json")
}

/// What happens to `createdAt` when a posting is seen again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreatedAtPolicy {
    /// Keep the value stored on first insert.
    #[default]
    Preserve,
    /// Stamp the current sync time on every write.
    Overwrite,
}

/// One upstream job board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Board slug, substituted for `{company}` in the endpoint template.
    pub slug: String,
    /// Per-source endpoint template; falls back to the global one.
    #[serde(default)]
    pub endpoint_template: Option<String>,
    /// Display name; defaults to the capitalized slug.
    #[serde(default)]
    pub company: Option<String>,
    /// Prefix of `externalId`; defaults to `gh-<slug>`.
    #[serde(default)]
    pub key_prefix: Option<String>,
    /// Provenance id written into `sourceMeta.sourceId`.
    #[serde(default)]
    pub source_id: Option<String>,
}

impl SourceConfig {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            endpoint_template: None,
            company: None,
            key_prefix: None,
            source_id: None,
        }
    }

    pub fn with_endpoint_template(mut self, template: impl Into<String>) -> Self {
        self.endpoint_template = Some(template.into());
        self
    }

    pub fn company_name(&self) -> String {
        match &self.company {
            Some(c) => c.clone(),
            None => capitalize(&self.slug),
        }
    }

    pub fn key_prefix(&self) -> String {
        match &self.key_prefix {
            Some(p) => p.clone(),
            None => format!("gh-{}", self.slug),
        }
    }

    pub fn source_id(&self) -> &str {
        self.source_id.as_deref().unwrap_or(DEFAULT_SOURCE_ID)
    }

    /// Resolve the fetch URL, preferring the per-source template.
    pub fn endpoint_url(&self, default_template: &str) -> String {
        self.endpoint_template
            .as_deref()
            .unwrap_or(default_template)
            .replace("{company}", &self.slug)
    }
}

/// First letter upper-case, the rest lower-case ("figma" -> "Figma").
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub sources: Vec<SourceConfig>,
    pub keywords: Vec<String>,
    /// Display-label overrides for matched keywords (e.g. `ai = "AI"`).
    #[serde(default)]
    pub tag_labels: BTreeMap<String, String>,
    #[serde(default = "default_endpoint_template")]
    pub endpoint_template: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default)]
    pub created_at: CreatedAtPolicy,
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// 0 disables the periodic scheduler.
    #[serde(default)]
    pub sync_interval_secs: u64,
    /// Trigger credential. Only ever read from the environment.
    #[serde(skip)]
    pub api_key: String,
}

impl SyncConfig {
    /// Built-in seed: four Greenhouse boards and the tech keyword vocabulary.
    pub fn default_seed() -> Self {
        let sources = ["figma", "discord", "dropbox", "duolingo"]
            .into_iter()
            .map(SourceConfig::new)
            .collect();
        let keywords = [
            "software",
            "developer",
            "engineer",
            "data",
            "analytics",
            "analyst",
            "machine learning",
            "python",
            "full stack",
            "frontend",
            "backend",
            "cloud",
            "devops",
            "security",
            "it",
            "artificial intelligence",
            "ai",
            "react",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        let tag_labels = [("ai", "AI"), ("it", "IT")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            sources,
            keywords,
            tag_labels,
            endpoint_template: default_endpoint_template(),
            request_timeout_secs: default_request_timeout_secs(),
            collection: default_collection(),
            created_at: CreatedAtPolicy::default(),
            store_path: default_store_path(),
            sync_interval_secs: 0,
            api_key: DEV_API_KEY.to_string(),
        }
    }

    /// Parse and validate a TOML document. No env overrides are applied.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let mut cfg: SyncConfig = toml::from_str(s)?;
        cfg.keywords = clean_keywords(cfg.keywords);
        cfg.tag_labels = cfg
            .tag_labels
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .collect();
        cfg.api_key = DEV_API_KEY.to_string();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolve the config file (env path, default path, seed) and apply env overrides.
    pub fn load_default() -> Result<Self, ConfigError> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(ConfigError::Invalid(format!(
                    "{ENV_CONFIG_PATH} points to non-existent path {}",
                    pb.display()
                )));
            }
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                tracing::info!(target: "config", "no config file found, using built-in seed");
                Self::default_seed()
            }
        };
        cfg.apply_env();
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        match std::env::var(ENV_API_KEY) {
            Ok(k) if !k.trim().is_empty() => self.api_key = k.trim().to_string(),
            _ => tracing::warn!(
                target: "config",
                "{ENV_API_KEY} not set, falling back to the development key"
            ),
        }
        if let Ok(p) = std::env::var(ENV_STORE_PATH) {
            if !p.trim().is_empty() {
                self.store_path = PathBuf::from(p.trim());
            }
        }
        if let Some(secs) = std::env::var(ENV_INTERVAL_SECS)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.sync_interval_secs = secs;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keywords.is_empty() {
            return Err(ConfigError::Invalid("keyword vocabulary is empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be > 0".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(ConfigError::Invalid("collection name is empty".into()));
        }

        let mut slugs = HashSet::new();
        let mut prefixes = HashSet::new();
        for s in &self.sources {
            if s.slug.trim().is_empty() {
                return Err(ConfigError::Invalid("source with empty slug".into()));
            }
            if !slugs.insert(s.slug.to_lowercase()) {
                return Err(ConfigError::Invalid(format!("duplicate source `{}`", s.slug)));
            }
            if !prefixes.insert(s.key_prefix()) {
                return Err(ConfigError::Invalid(format!(
                    "key prefix `{}` is used by more than one source",
                    s.key_prefix()
                )));
            }
            let template = s
                .endpoint_template
                .as_deref()
                .unwrap_or(&self.endpoint_template);
            if !template.contains("{company}") {
                return Err(ConfigError::Invalid(format!(
                    "endpoint template for `{}` lacks a {{company}} placeholder",
                    s.slug
                )));
            }
        }
        Ok(())
    }
}

/// Lower-case, trim, drop empties and duplicates; keep first-seen order.
fn clean_keywords(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty() && seen.insert(k.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_valid() {
        let cfg = SyncConfig::default_seed();
        cfg.validate().unwrap();
        assert_eq!(cfg.sources.len(), 4);
        assert_eq!(cfg.keywords.len(), 18);
        assert_eq!(cfg.collection, "jobs");
    }

    #[test]
    fn source_defaults_derive_from_slug() {
        let s = SourceConfig::new("duolingo");
        assert_eq!(s.company_name(), "Duolingo");
        assert_eq!(s.key_prefix(), "gh-duolingo");
        assert_eq!(s.source_id(), DEFAULT_SOURCE_ID);
        assert_eq!(
            s.endpoint_url(DEFAULT_ENDPOINT_TEMPLATE),
            "https://boards-api.greenhouse.io/v1/boards/duolingo/jobs?content=true"
        );
    }

    #[test]
    fn capitalize_lowers_the_tail() {
        assert_eq!(capitalize("dropBOX"), "Dropbox");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn keywords_are_trimmed_lowered_and_deduped() {
        let out = clean_keywords(vec![" Python ".into(), "".into(), "python".into(), "AI".into()]);
        assert_eq!(out, vec!["python".to_string(), "ai".to_string()]);
    }

    #[test]
    fn shared_prefix_is_rejected() {
        let toml = r#"
keywords = ["engineer"]

[[sources]]
slug = "figma"
key_prefix = "gh"

[[sources]]
slug = "discord"
key_prefix = "gh"
"#;
        let err = SyncConfig::from_toml_str(toml).unwrap_err();
        assert!(err.to_string().contains("key prefix"), "{err}");
    }
}
