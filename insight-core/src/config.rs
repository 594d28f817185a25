//! Application configuration.
//!
//! Every field has a compiled default matching the crawler's historical
//! behaviour, so a missing config file is never an error. Resolution order:
//! 1. `$DANMAKU_INSIGHT_CONFIG` (the file must exist)
//! 2. `danmaku-insight.toml` in the working directory, if present
//! 3. Compiled defaults

use crate::error::{ConfigError, CoreError};
use crate::types::DEFAULT_TOP_N;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFIG_ENV_VAR: &str = "DANMAKU_INSIGHT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "danmaku-insight.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub keywords: Vec<String>,
    pub max_videos_per_keyword: usize,
    pub top_n: usize,
    pub crawl: CrawlSettings,
    pub cache: CacheSettings,
    pub filter: FilterConfig,
    pub report: ReportSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            keywords: vec![
                "大语言模型".to_string(),
                "大模型".to_string(),
                "LLM".to_string(),
            ],
            max_videos_per_keyword: 300,
            top_n: DEFAULT_TOP_N,
            crawl: CrawlSettings::default(),
            cache: CacheSettings::default(),
            filter: FilterConfig::default(),
            report: ReportSettings::default(),
        }
    }
}

/// Request pacing and HTTP client settings. Delays are in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    pub page_size: u32,
    pub search_delay_min_ms: u64,
    pub search_delay_max_ms: u64,
    pub block_retry_delay_ms: u64,
    pub video_delay_ms: u64,
    pub warmup_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            page_size: 20,
            search_delay_min_ms: 1500,
            search_delay_max_ms: 3000,
            block_retry_delay_ms: 5000,
            video_delay_ms: 500,
            warmup_delay_ms: 1000,
            request_timeout_secs: 15,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Prompt on stdin whenever a non-empty cache exists.
    Ask,
    /// Reuse a non-empty cache without asking.
    Always,
    /// Always crawl afresh.
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub path: PathBuf,
    pub policy: CachePolicy,
    pub persist_partial_on_interrupt: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("danmaku_cache.txt"),
            policy: CachePolicy::Ask,
            persist_partial_on_interrupt: false,
        }
    }
}

/// Noise rule table. Patterns are regular expressions matched against the
/// trimmed text, case-insensitively and anchored at the start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub anchored_patterns: Vec<String>,
    pub blocked_phrases: Vec<String>,
    pub domain_keywords: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            anchored_patterns: vec![
                r"^6+$".to_string(),
                r"^[\d\s]+$".to_string(),
                r"^[a-zA-Z\s]+$".to_string(),
                r"^[^\x{4e00}-\x{9fa5}]+$".to_string(),
                r"^\s*$".to_string(),
            ],
            blocked_phrases: ["点赞", "三连", "关注", "投币"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            domain_keywords: [
                "大语言模型",
                "大模型",
                "LLM",
                "GPT",
                "ChatGPT",
                "语言模型",
                "AI模型",
                "人工智能模型",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Output locations for the report sinks. `None` disables a sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub console_summary: bool,
    pub stats_path: Option<PathBuf>,
    pub narrative_path: Option<PathBuf>,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            console_summary: true,
            stats_path: Some(PathBuf::from("danmaku_statistics.json")),
            narrative_path: Some(PathBuf::from("analysis_conclusion.txt")),
        }
    }
}

impl AppConfig {
    /// Resolve the configuration from the environment and working directory.
    pub fn load() -> Result<Self, CoreError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            return Self::from_file(&path);
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(local);
        }

        debug!("No configuration file found, using defaults");
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            std::io::ErrorKind::PermissionDenied => ConfigError::PermissionDenied {
                path: path.display().to_string(),
            },
            _ => ConfigError::ValidationFailed {
                reason: format!("cannot read {}: {}", path.display(), e),
            },
        })?;
        let config = Self::from_toml_str(&raw)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::ValidationFailed {
                reason: "at least one search keyword is required".to_string(),
            });
        }
        if self.top_n == 0 {
            return Err(ConfigError::InvalidValue {
                field: "top_n".to_string(),
                value: "0".to_string(),
            });
        }
        if self.crawl.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "crawl.page_size".to_string(),
                value: "0".to_string(),
            });
        }
        if self.crawl.search_delay_min_ms > self.crawl.search_delay_max_ms {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "crawl.search_delay_min_ms ({}) exceeds crawl.search_delay_max_ms ({})",
                    self.crawl.search_delay_min_ms, self.crawl.search_delay_max_ms
                ),
            });
        }
        Ok(())
    }
}
