//! Bounded retry around the extractor gateway.

use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use scout_core::ExtractedPost;
use tokio_util::sync::CancellationToken;

use crate::{ExtractError, ExtractorGateway};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    Extracted { post: ExtractedPost, attempts: u32 },
    /// Gave up on the URL; no record is produced.
    Dropped { attempts: u32, last_error: ExtractError },
    /// Cancellation was observed between attempts.
    Cancelled { attempts: u32 },
}

/// Extract `url`, trying at most `max_attempts` times.
///
/// Transient failures reset the gateway resource before the next attempt.
/// Permanent failures and the legacy `"error"` title end the loop at once.
/// Cancellation is only checked between attempts; an attempt in flight always
/// runs to completion.
pub async fn extract_with_retry(
    gateway: &dyn ExtractorGateway,
    url: &str,
    max_attempts: u32,
    delay: Duration,
    cancel: &CancellationToken,
) -> RetryOutcome {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        if cancel.is_cancelled() {
            return RetryOutcome::Cancelled { attempts: attempt };
        }
        attempt += 1;

        let result = gateway.extract(url).await.and_then(|post| {
            if post.is_failure_sentinel() {
                Err(ExtractError::permanent("page rendered the failure title"))
            } else {
                Ok(post)
            }
        });

        match result {
            Ok(post) => {
                return RetryOutcome::Extracted {
                    post,
                    attempts: attempt,
                }
            }
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                engine_debug!(
                    "{}: attempt {}/{} failed: {}, resetting resource",
                    url,
                    attempt,
                    max_attempts,
                    err
                );
                gateway.reset_resource().await;
                if !delay.is_zero() {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            return RetryOutcome::Cancelled { attempts: attempt };
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
            Err(err) => {
                engine_warn!("{}: dropped after {} attempt(s): {}", url, attempt, err);
                return RetryOutcome::Dropped {
                    attempts: attempt,
                    last_error: err,
                };
            }
        }
    }
}
