// src/config/mod.rs
//! Pipeline configuration loaded from TOML.
//!
//! Lookup order:
//! 1) `$SENTIMENT_CONFIG_PATH` (must exist when set)
//! 2) `config/sentiment.toml`
//! 3) built-in defaults

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/sentiment.toml";
pub const ENV_CONFIG_PATH: &str = "SENTIMENT_CONFIG_PATH";

pub const DEFAULT_BASE_URL: &str = "https://api.nb.no/dhlab";
pub const DEFAULT_LEXICON_URL_TEMPLATE: &str =
    "https://raw.githubusercontent.com/ltgoslo/norsentlex/master/Fullform/Fullform_{polarity}_lexicon.txt";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_connect_timeout_secs() -> u64 {
    4
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "collocation-sentiment/0.1".to_string()
}
fn default_sample_size() -> u64 {
    200_000
}
fn default_window() -> usize {
    10
}
fn default_url_template() -> String {
    DEFAULT_LEXICON_URL_TEMPLATE.to_string()
}
fn default_cache_capacity() -> usize {
    32
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub lexicon: LexiconConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Remote text statistics API.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Upper bound on keyword occurrences the service samples per document.
    #[serde(default = "default_sample_size")]
    pub sample_size: u64,
    #[serde(default)]
    pub frequency_cutoff: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            sample_size: default_sample_size(),
            frequency_cutoff: 0,
        }
    }
}

impl ServiceConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Token window around each keyword occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window")]
    pub before: usize,
    #[serde(default = "default_window")]
    pub after: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            before: default_window(),
            after: default_window(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LexiconConfig {
    /// Local override for the positive list; falls back to the URL when absent.
    #[serde(default)]
    pub positive_path: Option<PathBuf>,
    #[serde(default)]
    pub negative_path: Option<PathBuf>,
    /// `{polarity}` is replaced by `Positive` or `Negative`.
    #[serde(default = "default_url_template")]
    pub url_template: String,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            positive_path: None,
            negative_path: None,
            url_template: default_url_template(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

impl PipelineConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing pipeline config {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: PipelineConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Env var first, then the default path, then built-in defaults.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
            return Err(anyhow!(
                "{ENV_CONFIG_PATH} points to non-existent path {}",
                pb.display()
            ));
        }
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Self::load_from_file(&default_path);
        }
        tracing::info!(
            path = DEFAULT_CONFIG_PATH,
            "no pipeline config file, using built-in defaults"
        );
        Ok(Self::default())
    }

    fn validate(&self) -> Result<()> {
        if self.service.base_url.trim().is_empty() {
            return Err(anyhow!("service.base_url must not be empty"));
        }
        if !self.lexicon.url_template.contains("{polarity}") {
            return Err(anyhow!("lexicon.url_template must contain {{polarity}}"));
        }
        if self.cache.capacity == 0 {
            return Err(anyhow!("cache.capacity must be at least 1"));
        }
        Ok(())
    }
}
