use std::path::PathBuf;
use std::time::Duration;

use scout_core::{pass_limit, BatchPolicy, DEFAULT_BATCH_SIZE, QUERIES_PER_PASS, QUERIES_PER_WORKER};
use serde::{Deserialize, Serialize};

/// Settings of the whole pipeline. Every field has a default, so a config
/// file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub queries: Vec<String>,
    pub region_suffix: Option<String>,
    pub max_results_per_query: usize,
    pub queries_per_worker: usize,
    /// Also sizes the blocking pool used for page parsing.
    pub worker_count: usize,
    pub queries_per_pass: usize,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub run_interval_secs: u64,
    pub continuous: bool,
    pub wrap_around: bool,
    pub batch_size: usize,
    pub batch_policy: BatchPolicy,
    pub queue_capacity: usize,
    pub database_path: PathBuf,
    pub cursor_path: PathBuf,
    pub dead_letter_path: Option<PathBuf>,
    pub search: SearchConfig,
    pub fetch: FetchConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queries: Vec::new(),
            region_suffix: None,
            max_results_per_query: 10,
            queries_per_worker: QUERIES_PER_WORKER,
            worker_count: 5,
            queries_per_pass: QUERIES_PER_PASS,
            max_attempts: 3,
            retry_delay_ms: 0,
            run_interval_secs: 60,
            continuous: true,
            wrap_around: false,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_policy: BatchPolicy::FirstLabel,
            queue_capacity: 10_000,
            database_path: PathBuf::from("scout.db"),
            cursor_path: PathBuf::from(".scout_cursor.ron"),
            dead_letter_path: None,
            search: SearchConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn discovery_settings(&self) -> DiscoverySettings {
        DiscoverySettings {
            max_results_per_query: self.max_results_per_query,
            pass_limit: pass_limit(
                self.queries_per_worker,
                self.worker_count,
                self.queries_per_pass,
            ),
            max_attempts: self.max_attempts.max(1),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            wrap_around: self.wrap_around,
        }
    }

    pub fn batch_settings(&self) -> BatchSettings {
        BatchSettings {
            batch_size: self.batch_size.max(1),
            policy: self.batch_policy,
        }
    }

    pub fn run_interval(&self) -> Duration {
        Duration::from_secs(self.run_interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverySettings {
    pub max_results_per_query: usize,
    pub pass_limit: usize,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub wrap_around: bool,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        PipelineConfig::default().discovery_settings()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    pub batch_size: usize,
    pub policy: BatchPolicy,
}

impl Default for BatchSettings {
    fn default() -> Self {
        PipelineConfig::default().batch_settings()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub page_size: usize,
    pub page_delay_ms: u64,
    pub request_timeout_secs: u64,
    /// Only links whose host contains this text are kept.
    pub host_filter: String,
    pub client_id_env: String,
    pub client_secret_env: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://openapi.naver.com/v1/search/blog".to_string(),
            page_size: 10,
            page_delay_ms: 1_000,
            request_timeout_secs: 10,
            host_filter: "blog.naver".to_string(),
            client_id_env: "NAVER_CLIENT_ID".to_string(),
            client_secret_env: "NAVER_CLIENT_SECRET".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Upper bound for one extraction, content frame included.
    pub content_wait_secs: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 20,
            content_wait_secs: 20,
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) scout/0.1".to_string(),
        }
    }
}

impl FetchConfig {
    pub fn fetch_settings(&self) -> crate::FetchSettings {
        crate::FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_bytes,
            allowed_content_types: self.allowed_content_types.clone(),
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn content_wait(&self) -> Duration {
        Duration::from_secs(self.content_wait_secs)
    }
}
