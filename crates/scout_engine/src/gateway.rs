use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use scout_core::ExtractedPost;
use tokio::sync::Semaphore;

use crate::decode::decode_html;
use crate::extract::{content_frame_url, PostExtractor};
use crate::fetch::{FetchSettings, HttpFetcher};
use crate::{ExtractError, FetchError};

/// Fetch-and-extract step for a single post URL.
///
/// One instance owns one underlying fetch resource; callers must not run
/// extractions against it concurrently.
#[async_trait::async_trait]
pub trait ExtractorGateway: Send + Sync {
    async fn extract(&self, url: &str) -> Result<ExtractedPost, ExtractError>;

    /// Discard and recreate the fetch resource. Called by the retry loop
    /// between attempts, never from inside `extract`.
    async fn reset_resource(&self);
}

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub fetch: FetchSettings,
    /// Upper bound for one extraction, content frame included.
    pub content_wait: Duration,
    /// Size of the blocking pool used for HTML parsing.
    pub parse_workers: usize,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        let fetch = crate::FetchConfig::default();
        Self {
            fetch: fetch.fetch_settings(),
            content_wait: fetch.content_wait(),
            parse_workers: 5,
        }
    }
}

/// Gateway for blog posts: HTTP fetch, charset decoding, content-frame
/// resolution, then field extraction on the blocking pool.
pub struct BlogPageGateway {
    fetcher: HttpFetcher,
    extractor: Arc<dyn PostExtractor>,
    parse_permits: Arc<Semaphore>,
    content_wait: Duration,
    resets: AtomicU64,
}

impl BlogPageGateway {
    pub fn new(
        settings: GatewaySettings,
        extractor: Arc<dyn PostExtractor>,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            fetcher: HttpFetcher::new(settings.fetch)?,
            extractor,
            parse_permits: Arc::new(Semaphore::new(settings.parse_workers.max(1))),
            content_wait: settings.content_wait,
            resets: AtomicU64::new(0),
        })
    }

    /// How many times the fetch resource has been rebuilt.
    pub fn reset_count(&self) -> u64 {
        self.resets.load(Ordering::Relaxed)
    }

    async fn load_post_html(&self, url: &str) -> Result<String, ExtractError> {
        let page = self.fetcher.fetch(url).await?;
        let outer = decode_html(&page.bytes, page.content_type.as_deref());
        let Some(frame_url) = content_frame_url(&outer.html, &page.final_url) else {
            return Ok(outer.html);
        };

        engine_debug!("following content frame {} for {}", frame_url, url);
        let frame = self.fetcher.fetch(&frame_url).await?;
        let decoded = decode_html(&frame.bytes, frame.content_type.as_deref());
        if decoded.lossy {
            engine_debug!("lossy {} decode for {}", decoded.encoding_label, frame_url);
        }
        Ok(decoded.html)
    }

    async fn parse(&self, html: String, url: &str) -> Result<ExtractedPost, ExtractError> {
        let permit = self
            .parse_permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|err| ExtractError::transient(format!("parse pool closed: {err}")))?;
        let extractor = self.extractor.clone();
        let url = url.to_string();
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            extractor.extract(&html, &url)
        })
        .await
        .map_err(|err| ExtractError::transient(format!("parse task failed: {err}")))?
    }
}

#[async_trait::async_trait]
impl ExtractorGateway for BlogPageGateway {
    async fn extract(&self, url: &str) -> Result<ExtractedPost, ExtractError> {
        let work = async {
            let html = self.load_post_html(url).await?;
            self.parse(html, url).await
        };
        match tokio::time::timeout(self.content_wait, work).await {
            Ok(result) => result,
            Err(_) => Err(ExtractError::transient(format!(
                "content did not arrive within {:?}",
                self.content_wait
            ))),
        }
    }

    async fn reset_resource(&self) {
        match self.fetcher.reset() {
            Ok(()) => {
                self.resets.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => engine_warn!("failed to rebuild http client: {}", err),
        }
    }
}
