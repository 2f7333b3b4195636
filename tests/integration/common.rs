//! Shared fixtures for integration tests
//!
//! Fake capability implementations record what they were asked to do so
//! tests can assert on attempt counts, waits and session lifetimes.

use async_trait::async_trait;
use pagesift::extract::{PatternTables, Sanitizer};
use pagesift::fetch::{
    FetchConfig, HttpRequest, HttpResponse, HttpTransport, RenderLauncher, RenderSession,
    ResourceKind, TransportError,
};
use pagesift::{FetchError, Identity, IdentityManager, ScrapeContext};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Fetch settings with no pacing and a short timeout
pub fn fast_fetch_config() -> FetchConfig {
    FetchConfig {
        timeout: Duration::from_secs(5),
        delay_range: (0.0, 0.0),
        render_wait: Duration::from_millis(100),
        ..FetchConfig::default()
    }
}

/// A context with the built-in tables and a fixed seed
pub fn seeded_context() -> ScrapeContext {
    ScrapeContext::new(
        IdentityManager::default(),
        Sanitizer::new(PatternTables::default()).expect("default tables compile"),
    )
    .with_seed(42)
}

/// An HTML page whose article holds `paragraphs` and whose nav holds `links`
pub fn article_page(title: &str, paragraphs: &[&str], links: &[&str]) -> String {
    let nav: String = links
        .iter()
        .map(|href| format!("<a href=\"{}\">{}</a>", href, href))
        .collect();
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<p>{}</p>", p))
        .collect();

    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><title>{}</title></head>\
         <body><nav>{}</nav><article>{}</article><footer>Copyright</footer></body></html>",
        title, nav, body
    )
}

/// A paragraph long enough to count as main content on its own
pub fn long_paragraph(topic: &str) -> String {
    format!(
        "This paragraph about {} is long enough to be recognized as the main \
         content of the page, well past every length threshold the sanitizer uses \
         when it decides which element holds the article text.",
        topic
    )
}

pub fn html_response(url: &str, status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: vec![(
            "content-type".to_string(),
            "text/html; charset=utf-8".to_string(),
        )],
        body: body.to_string(),
        final_url: url.to_string(),
    }
}

/// One scripted transport reply
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(HttpResponse),
    Fail(TransportError),
    /// Never answers; the caller's timeout must fire
    Hang,
}

/// Transport that plays back scripted replies and records send times
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    sent: Mutex<Vec<(Instant, HttpRequest)>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().iter().map(|(_, r)| r.clone()).collect()
    }

    /// Time between consecutive sends
    pub fn gaps(&self) -> Vec<Duration> {
        let sent = self.sent.lock().unwrap();
        sent.windows(2).map(|w| w[1].0 - w[0].0).collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((Instant::now(), request.clone()));
        let reply = self.replies.lock().unwrap().pop_front();

        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(error)) => Err(error),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(TransportError::Connection("no scripted reply left".to_string())),
        }
    }
}

/// Observations shared between a fake launcher and its sessions
#[derive(Debug, Default)]
pub struct RenderLog {
    pub launches: AtomicUsize,
    pub navigations: AtomicUsize,
    pub closed: AtomicBool,
    pub blocked: Mutex<Vec<ResourceKind>>,
    pub last_identity: Mutex<Option<Identity>>,
}

/// Launcher whose sessions serve fixed markup
#[derive(Debug)]
pub struct FakeLauncher {
    markup: String,
    title: Option<String>,
    fail_launch: bool,
    pub log: Arc<RenderLog>,
}

impl FakeLauncher {
    pub fn serving(markup: &str, title: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            markup: markup.to_string(),
            title: title.map(str::to_string),
            fail_launch: false,
            log: Arc::new(RenderLog::default()),
        })
    }

    pub fn broken() -> Arc<Self> {
        Arc::new(Self {
            markup: String::new(),
            title: None,
            fail_launch: true,
            log: Arc::new(RenderLog::default()),
        })
    }
}

#[async_trait]
impl RenderLauncher for FakeLauncher {
    async fn launch(&self, identity: &Identity) -> Result<Box<dyn RenderSession>, FetchError> {
        self.log.launches.fetch_add(1, Ordering::SeqCst);
        *self.log.last_identity.lock().unwrap() = Some(identity.clone());

        if self.fail_launch {
            return Err(FetchError::RenderEngine("no browser available".to_string()));
        }

        Ok(Box::new(FakeSession {
            markup: self.markup.clone(),
            title: self.title.clone(),
            url: String::new(),
            log: Arc::clone(&self.log),
        }))
    }
}

struct FakeSession {
    markup: String,
    title: Option<String>,
    url: String,
    log: Arc<RenderLog>,
}

#[async_trait]
impl RenderSession for FakeSession {
    async fn block_resource_types(&mut self, kinds: &[ResourceKind]) -> Result<(), FetchError> {
        *self.log.blocked.lock().unwrap() = kinds.to_vec();
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<(), FetchError> {
        self.log.navigations.fetch_add(1, Ordering::SeqCst);
        self.url = url.to_string();
        Ok(())
    }

    async fn wait_ready(&mut self, _max_wait: Duration) -> Result<(), FetchError> {
        Ok(())
    }

    async fn evaluate(&mut self, _script: &str) -> Result<serde_json::Value, FetchError> {
        Ok(serde_json::Value::Null)
    }

    async fn content(&mut self) -> Result<String, FetchError> {
        Ok(self.markup.clone())
    }

    async fn title(&mut self) -> Result<Option<String>, FetchError> {
        Ok(self.title.clone())
    }

    async fn url(&mut self) -> Result<String, FetchError> {
        Ok(self.url.clone())
    }

    async fn close(&mut self) -> Result<(), FetchError> {
        self.log.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
