use crate::fetch::transport::{HttpRequest, HttpTransport};
use crate::fetch::{random_duration, timed_out, FetchConfig, FetchResult};
use crate::identity::IdentityManager;
use crate::FetchError;
use rand::Rng;
use std::time::Instant;

/// Content types that can yield document text
const DOCUMENT_CONTENT_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// Returns true if a declared content type is an HTML document
pub fn is_document_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    DOCUMENT_CONTENT_TYPES.contains(&essence.as_str())
}

/// Fetches a page over plain HTTP with per-failure retry policies
///
/// Each attempt carries a freshly generated identity.
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | 2xx, HTML content type | Success |
/// | 2xx, other content type | Fail immediately |
/// | HTTP 429 | Wait `rate_limit_backoff`, retry |
/// | HTTP 403 | Retry at once |
/// | Timeout / connection failure | Wait `transient_backoff`, retry |
/// | Any other status | Fail immediately |
///
/// No wait is taken after the last attempt.
///
/// # Returns
///
/// The outcome and the number of attempts made, which never exceeds
/// `config.retry_attempts`.
pub async fn plain_fetch<R: Rng + ?Sized>(
    url: &str,
    config: &FetchConfig,
    transport: &dyn HttpTransport,
    identities: &IdentityManager,
    rng: &mut R,
) -> (Result<FetchResult, FetchError>, u32) {
    let budget = config.retry_attempts.max(1);
    let started = Instant::now();
    let mut last_error = None;

    for attempt in 1..=budget {
        let is_last = attempt == budget;
        let identity = identities.identity_for(url, config.stealth, rng);
        let request = HttpRequest {
            url: url.to_string(),
            headers: identity.headers,
            timeout: config.timeout,
        };

        let sent = tokio::time::timeout(config.timeout, transport.send(&request)).await;

        let response = match sent {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let error = e.into_fetch_error(url);
                tracing::warn!("Attempt {}/{} for {}: {}", attempt, budget, url, error);
                if !is_last {
                    tokio::time::sleep(random_duration(rng, config.retry.transient_backoff)).await;
                }
                last_error = Some(error);
                continue;
            }
            Err(_) => {
                let error = timed_out(url, config.timeout);
                tracing::warn!("Attempt {}/{} for {}: {}", attempt, budget, url, error);
                if !is_last {
                    tokio::time::sleep(random_duration(rng, config.retry.transient_backoff)).await;
                }
                last_error = Some(error);
                continue;
            }
        };

        match response.status {
            200..=299 => {
                let content_type = response.content_type().unwrap_or_default().to_string();
                if !is_document_content_type(&content_type) {
                    tracing::info!("Skipping non-HTML content at {}: {:?}", url, content_type);
                    return (
                        Err(FetchError::ContentTypeRejected {
                            url: url.to_string(),
                            content_type,
                        }),
                        attempt,
                    );
                }

                return (
                    Ok(FetchResult {
                        url: url.to_string(),
                        final_url: response.final_url,
                        status_code: response.status,
                        raw_markup: response.body,
                        rendered: false,
                        duration: started.elapsed(),
                        title: None,
                        headers: response.headers,
                    }),
                    attempt,
                );
            }
            429 => {
                tracing::warn!("Rate limited on attempt {}/{} for {}", attempt, budget, url);
                if !is_last {
                    tokio::time::sleep(random_duration(rng, config.retry.rate_limit_backoff)).await;
                }
            }
            403 => {
                tracing::warn!("403 Forbidden on attempt {}/{} for {}", attempt, budget, url);
            }
            status => {
                tracing::warn!("HTTP {} for {}, not retrying", status, url);
                return (
                    Err(FetchError::Http {
                        status,
                        url: url.to_string(),
                    }),
                    attempt,
                );
            }
        }

        last_error = Some(FetchError::Http {
            status: response.status,
            url: url.to_string(),
        });
    }

    let error = last_error.unwrap_or_else(|| FetchError::AllStrategiesExhausted {
        url: url.to_string(),
        attempts: budget,
    });
    (Err(error), budget)
}
