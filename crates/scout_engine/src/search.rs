use std::collections::HashSet;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use scout_core::{host_contains, normalize_url_for_dedupe};
use serde::Deserialize;

use crate::fetch::map_reqwest_error;
use crate::{FetchError, FetchFailure, SearchConfig, SearchError};

/// Paged search returning candidate post URLs for a Query, in ranking order
/// and without duplicates.
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, SearchError>;
}

#[derive(Debug, Clone)]
pub struct SearchCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl SearchCredentials {
    /// Read credentials from the environment variables named in `config`.
    pub fn from_env(config: &SearchConfig) -> Result<Self, SearchError> {
        let read = |name: &str| {
            std::env::var(name).map_err(|_| {
                SearchError::Unavailable(format!("environment variable {name} is not set"))
            })
        };
        Ok(Self {
            client_id: read(&config.client_id_env)?,
            client_secret: read(&config.client_secret_env)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
}

/// Client for the blog search open API.
pub struct NaverBlogSearch {
    client: reqwest::Client,
    config: SearchConfig,
    credentials: SearchCredentials,
}

impl NaverBlogSearch {
    pub fn new(config: SearchConfig, credentials: SearchCredentials) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|err| FetchError::new(FetchFailure::Network, err.to_string()))?;
        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    fn page_url(&self, query: &str, start: usize) -> Result<url::Url, SearchError> {
        let start = start.to_string();
        let display = self.config.page_size.to_string();
        url::Url::parse_with_params(
            &self.config.endpoint,
            &[
                ("query", query),
                ("start", start.as_str()),
                ("display", display.as_str()),
                ("sort", "sim"),
            ],
        )
        .map_err(|err| FetchError::new(FetchFailure::InvalidUrl, err.to_string()).into())
    }

    async fn fetch_page(&self, query: &str, start: usize) -> Result<Vec<String>, SearchError> {
        let url = self.page_url(query, start)?;
        let response = self
            .client
            .get(url)
            .header("X-Naver-Client-Id", self.credentials.client_id.as_str())
            .header("X-Naver-Client-Secret", self.credentials.client_secret.as_str())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FetchFailure::HttpStatus(status.as_u16()),
                status.to_string(),
            )
            .into());
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let page: SearchPage =
            serde_json::from_slice(&body).map_err(|err| SearchError::Decode(err.to_string()))?;
        Ok(page.items.into_iter().map(|item| item.link).collect())
    }
}

#[async_trait::async_trait]
impl SearchProvider for NaverBlogSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, SearchError> {
        let page_size = self.config.page_size.max(1);
        let mut urls = Vec::new();
        let mut seen = HashSet::new();
        let mut start = 1;

        while urls.len() < max_results && start <= max_results {
            if start > 1 && self.config.page_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.page_delay_ms)).await;
            }
            let links = self.fetch_page(query, start).await?;
            let exhausted = links.len() < page_size;
            for link in links {
                if !host_contains(&link, &self.config.host_filter) {
                    continue;
                }
                if seen.insert(normalize_url_for_dedupe(&link)) {
                    urls.push(link);
                }
                if urls.len() >= max_results {
                    break;
                }
            }
            engine_debug!("search '{}' start={} -> {} urls so far", query, start, urls.len());
            if exhausted {
                break;
            }
            start += page_size;
        }

        engine_info!("search '{}' found {} urls", query, urls.len());
        Ok(urls)
    }
}
