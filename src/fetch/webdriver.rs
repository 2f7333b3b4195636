//! WebDriver rendering engine
//!
//! Drives a headless Chrome through a WebDriver endpoint (chromedriver or a
//! Selenium grid) with `fantoccini`. The session is launched with the
//! identity's user agent and language and automation markers turned off.
//! Sub-resources are refused through the DevTools `Network.setBlockedURLs`
//! command, sent over chromedriver's `goog/cdp/execute` extension.

use crate::fetch::render::{blocked_url_patterns, RenderLauncher, RenderSession, ResourceKind};
use crate::identity::Identity;
use crate::FetchError;
use async_trait::async_trait;
use fantoccini::wd::WebDriverCompatibleCommand;
use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Map, Value};
use std::time::{Duration, Instant};
use url::Url;

/// Interval between `document.readyState` polls
const READY_POLL: Duration = Duration::from_millis(250);

/// Launches WebDriver sessions against one endpoint
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    endpoint: String,
}

impl WebDriverLauncher {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Chrome capabilities for a headless session presenting `identity`
fn capabilities(identity: &Identity) -> Map<String, Value> {
    let mut args = vec![
        "--headless=new".to_string(),
        "--disable-gpu".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-blink-features=AutomationControlled".to_string(),
        "--window-size=1920,1080".to_string(),
        format!("--user-agent={}", identity.user_agent),
    ];
    if let Some(language) = identity.header("Accept-Language") {
        if let Some(primary) = language.split(',').next() {
            args.push(format!("--lang={}", primary.trim()));
        }
    }

    let mut caps = Map::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": args,
            "excludeSwitches": ["enable-automation"]
        }),
    );
    caps
}

/// A DevTools protocol command sent through chromedriver
#[derive(Debug, Clone, PartialEq)]
struct CdpCommand {
    method: &'static str,
    params: Value,
}

impl CdpCommand {
    fn new(method: &'static str, params: Value) -> Self {
        Self { method, params }
    }
}

impl WebDriverCompatibleCommand for CdpCommand {
    fn endpoint(&self, base_url: &Url, session_id: Option<&str>) -> Result<Url, url::ParseError> {
        let session_id = session_id.unwrap_or_default();
        base_url.join(&format!("session/{}/goog/cdp/execute", session_id))
    }

    fn method_and_body(&self, _request_url: &Url) -> (http::Method, Option<String>) {
        let body = json!({ "cmd": self.method, "params": self.params });
        (http::Method::POST, Some(body.to_string()))
    }
}

#[async_trait]
impl RenderLauncher for WebDriverLauncher {
    async fn launch(&self, identity: &Identity) -> Result<Box<dyn RenderSession>, FetchError> {
        tracing::debug!("Connecting to WebDriver at {}", self.endpoint);

        let client = ClientBuilder::native()
            .capabilities(capabilities(identity))
            .connect(&self.endpoint)
            .await
            .map_err(|e| {
                FetchError::RenderEngine(format!(
                    "could not start session at {}: {}",
                    self.endpoint, e
                ))
            })?;

        Ok(Box::new(WebDriverSession {
            client: Some(client),
            blocked: Vec::new(),
        }))
    }
}

/// One WebDriver browser window
#[derive(Debug)]
pub struct WebDriverSession {
    client: Option<Client>,
    blocked: Vec<ResourceKind>,
}

impl WebDriverSession {
    fn client(&self) -> Result<&Client, FetchError> {
        self.client
            .as_ref()
            .ok_or_else(|| FetchError::RenderEngine("session already closed".to_string()))
    }

    /// Resource kinds requested to be blocked
    pub fn blocked(&self) -> &[ResourceKind] {
        &self.blocked
    }
}

fn engine_error(action: &str, e: fantoccini::error::CmdError) -> FetchError {
    FetchError::RenderEngine(format!("{} failed: {}", action, e))
}

#[async_trait]
impl RenderSession for WebDriverSession {
    async fn block_resource_types(&mut self, kinds: &[ResourceKind]) -> Result<(), FetchError> {
        let patterns = blocked_url_patterns(kinds);
        let client = self.client()?;

        client
            .issue_cmd(CdpCommand::new("Network.enable", json!({})))
            .await
            .map_err(|e| engine_error("enabling network events", e))?;
        client
            .issue_cmd(CdpCommand::new(
                "Network.setBlockedURLs",
                json!({ "urls": patterns }),
            ))
            .await
            .map_err(|e| engine_error("blocking resources", e))?;

        self.blocked = kinds.to_vec();
        tracing::trace!("Blocking resource kinds: {:?}", self.blocked);
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<(), FetchError> {
        self.client()?
            .goto(url)
            .await
            .map_err(|e| engine_error("navigation", e))
    }

    async fn wait_ready(&mut self, max_wait: Duration) -> Result<(), FetchError> {
        let client = self.client()?;
        let started = Instant::now();

        while started.elapsed() < max_wait {
            let state = client
                .execute("return document.readyState;", Vec::new())
                .await
                .map_err(|e| engine_error("readiness check", e))?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            tokio::time::sleep(READY_POLL).await;
        }

        tracing::debug!("Document not ready after {:?}, continuing", max_wait);
        Ok(())
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value, FetchError> {
        self.client()?
            .execute(script, Vec::new())
            .await
            .map_err(|e| engine_error("script", e))
    }

    async fn content(&mut self) -> Result<String, FetchError> {
        self.client()?
            .source()
            .await
            .map_err(|e| engine_error("reading source", e))
    }

    async fn title(&mut self) -> Result<Option<String>, FetchError> {
        let title = self
            .client()?
            .title()
            .await
            .map_err(|e| engine_error("reading title", e))?;
        let title = title.trim();
        Ok((!title.is_empty()).then(|| title.to_string()))
    }

    async fn url(&mut self) -> Result<String, FetchError> {
        self.client()?
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(|e| engine_error("reading url", e))
    }

    async fn close(&mut self) -> Result<(), FetchError> {
        match self.client.take() {
            Some(client) => client.close().await.map_err(|e| engine_error("close", e)),
            None => Ok(()),
        }
    }
}
