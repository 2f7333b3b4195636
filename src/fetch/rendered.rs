use crate::fetch::render::{RenderSession, BLOCKED_RESOURCES, SCROLL_SCRIPT};
use crate::fetch::{FetchConfig, FetchResult};
use crate::FetchError;
use std::time::{Duration, Instant};

/// Pause after scrolling so late requests can land
pub const SCROLL_SETTLE: Duration = Duration::from_millis(1000);

/// Upper bound for the scroll script
const SCROLL_LIMIT: Duration = Duration::from_secs(10);

/// Upper bound for reading content, title and URL back
const READ_LIMIT: Duration = Duration::from_secs(10);

/// Fetches a page through the rendering engine
///
/// # Flow
///
/// 1. Block images, stylesheets, fonts and media
/// 2. Navigate, bounded by `config.timeout`
/// 3. Wait for the content-ready signal, up to `config.render_wait`
/// 4. Scroll to the bottom and let lazy content settle
/// 5. Read the final markup, title and URL
///
/// Every failure, including a timeout at any step, comes back as a
/// `FetchError`; nothing here panics or hangs.
pub async fn rendered_fetch(
    url: &str,
    config: &FetchConfig,
    session: &mut dyn RenderSession,
) -> Result<FetchResult, FetchError> {
    let started = Instant::now();
    let limit = overall_limit(config);

    match tokio::time::timeout(limit, drive(url, config, session)).await {
        Ok(Ok((raw_markup, title, final_url))) => Ok(FetchResult {
            url: url.to_string(),
            final_url,
            status_code: 200,
            raw_markup,
            rendered: true,
            duration: started.elapsed(),
            title,
            headers: Vec::new(),
        }),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(FetchError::RenderEngine(format!(
            "rendering {} exceeded {:?}",
            url, limit
        ))),
    }
}

async fn drive(
    url: &str,
    config: &FetchConfig,
    session: &mut dyn RenderSession,
) -> Result<(String, Option<String>, String), FetchError> {
    session.block_resource_types(BLOCKED_RESOURCES).await?;

    tokio::time::timeout(config.timeout, session.navigate(url))
        .await
        .map_err(|_| step_timed_out("navigation", url, config.timeout))??;

    session.wait_ready(config.render_wait).await?;

    match tokio::time::timeout(SCROLL_LIMIT, session.evaluate(SCROLL_SCRIPT)).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => tracing::debug!("Scroll script failed on {}: {}", url, e),
        Err(_) => tracing::debug!("Scroll script timed out on {}", url),
    }
    tokio::time::sleep(SCROLL_SETTLE).await;

    let read = async {
        let content = session.content().await?;
        let title = session.title().await?;
        let final_url = session.url().await?;
        Ok::<_, FetchError>((content, title, final_url))
    };

    tokio::time::timeout(READ_LIMIT, read)
        .await
        .map_err(|_| step_timed_out("reading content", url, READ_LIMIT))?
}

fn step_timed_out(step: &str, url: &str, limit: Duration) -> FetchError {
    FetchError::RenderEngine(format!("{} of {} exceeded {:?}", step, url, limit))
}

/// Total time a single rendered fetch may take
fn overall_limit(config: &FetchConfig) -> Duration {
    config.timeout + config.render_wait + SCROLL_LIMIT + SCROLL_SETTLE + READ_LIMIT
}
