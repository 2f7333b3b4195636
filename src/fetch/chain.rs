use crate::crawler::ScrapeContext;
use crate::fetch::plain::plain_fetch;
use crate::fetch::rendered::rendered_fetch;
use crate::fetch::{FetchConfig, FetchResult, FetchedPage};
use crate::FetchError;

/// Rendered results with less sanitized text than this also try plain HTTP
pub const MIN_RENDERED_TEXT_LENGTH: usize = 100;

/// Fetches one URL through the strategy chain
///
/// # Strategy Order
///
/// 1. If `config.render_capable` and the context has a rendering engine,
///    attempt a rendered fetch once
/// 2. If that produced nothing, or fewer than 100 characters of sanitized
///    text, run the plain HTTP fetch with its retry budget
/// 3. If both produced content, keep the one with more sanitized text;
///    a tie keeps the rendered result
///
/// Strategy failures are logged and absorbed here.
///
/// # Errors
///
/// Returns [`FetchError::AllStrategiesExhausted`] when no strategy produced
/// a result; `attempts` counts every strategy attempt made.
pub async fn fetch_page(
    url: &str,
    config: &FetchConfig,
    ctx: &mut ScrapeContext,
) -> Result<FetchedPage, FetchError> {
    let mut attempts = 0u32;
    let mut rendered = None;

    if config.render_capable {
        let session = ctx.render_session(url, config.stealth).await;
        if let Some(session) = session {
            attempts += 1;
            let outcome = rendered_fetch(url, config, session).await;
            match outcome {
                Ok(result) => rendered = Some(sanitized(ctx, result)),
                Err(e) => tracing::warn!("Rendered fetch failed for {}: {}", url, e),
            }
        } else {
            tracing::debug!("No rendering engine available for {}", url);
        }
    }

    let needs_plain = rendered
        .as_ref()
        .map_or(true, |page: &FetchedPage| page.text_length() < MIN_RENDERED_TEXT_LENGTH);

    let mut plain = None;
    if needs_plain {
        if rendered.is_some() {
            tracing::info!("Rendered text for {} is thin, trying plain HTTP", url);
        }

        match ctx.transport(config) {
            Ok(transport) => {
                let (outcome, made) = plain_fetch(
                    url,
                    config,
                    transport.as_ref(),
                    &ctx.identities,
                    &mut ctx.rng,
                )
                .await;
                attempts += made;

                match outcome {
                    Ok(result) => plain = Some(sanitized(ctx, result)),
                    Err(e) => tracing::warn!("Plain fetch failed for {}: {}", url, e),
                }
            }
            Err(e) => tracing::warn!("No HTTP transport for {}: {}", url, e),
        }
    }

    match (rendered, plain) {
        (Some(rendered), Some(plain)) => Ok(choose_longer(rendered, plain)),
        (Some(page), None) | (None, Some(page)) => Ok(page),
        (None, None) => Err(FetchError::AllStrategiesExhausted {
            url: url.to_string(),
            attempts,
        }),
    }
}

/// Keeps the page with more sanitized text; ties keep `earlier`
pub fn choose_longer(earlier: FetchedPage, later: FetchedPage) -> FetchedPage {
    if later.text_length() > earlier.text_length() {
        later
    } else {
        earlier
    }
}

fn sanitized(ctx: &ScrapeContext, result: FetchResult) -> FetchedPage {
    let text = ctx.sanitizer.sanitize(&result.raw_markup);
    FetchedPage { result, text }
}
