//! Per-invocation scrape context
//!
//! Owns everything one fetch or crawl shares between its steps:
//! - The HTTP transport, created on first need
//! - The rendering session, launched on first need
//! - Identity selection and the random source behind it
//! - The compiled sanitizer
//!
//! Nothing here is global; independent invocations each build their own.

use crate::config::Config;
use crate::extract::Sanitizer;
use crate::fetch::{
    FetchConfig, HttpTransport, HttpTransportFactory, RenderLauncher, RenderSession,
    ReqwestTransportFactory,
};
use crate::identity::IdentityManager;
use crate::{ConfigError, FetchError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// Resources scoped to one fetch or crawl invocation
pub struct ScrapeContext {
    pub(crate) identities: IdentityManager,
    pub(crate) sanitizer: Sanitizer,
    pub(crate) rng: StdRng,
    transport_factory: Arc<dyn HttpTransportFactory>,
    transport: Option<Arc<dyn HttpTransport>>,
    render_launcher: Option<Arc<dyn RenderLauncher>>,
    render_session: Option<Box<dyn RenderSession>>,
    render_failed: bool,
    shut_down: bool,
}

impl ScrapeContext {
    /// Creates a context using the default `reqwest` transport and no renderer
    pub fn new(identities: IdentityManager, sanitizer: Sanitizer) -> Self {
        Self {
            identities,
            sanitizer,
            rng: StdRng::from_entropy(),
            transport_factory: Arc::new(ReqwestTransportFactory),
            transport: None,
            render_launcher: None,
            render_session: None,
            render_failed: false,
            shut_down: false,
        }
    }

    /// Creates a context from a loaded configuration
    ///
    /// With the `webdriver` feature enabled and rendering turned on, a
    /// WebDriver launcher pointed at `fetch.webdriver-url` is attached.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let sanitizer = Sanitizer::new(config.pattern_tables())?;
        let ctx = Self::new(config.identity_manager(), sanitizer);
        Ok(attach_renderer(ctx, config))
    }

    /// Replaces the factory used to create the HTTP transport
    pub fn with_transport_factory(mut self, factory: Arc<dyn HttpTransportFactory>) -> Self {
        self.transport_factory = factory;
        self
    }

    /// Supplies a ready transport, skipping lazy creation
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_render_launcher(mut self, launcher: Arc<dyn RenderLauncher>) -> Self {
        self.render_launcher = Some(launcher);
        self
    }

    /// Seeds identity selection, pacing and backoff
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    pub fn identities(&self) -> &IdentityManager {
        &self.identities
    }

    /// True once [`ScrapeContext::shutdown`] has run at least once
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// True while a rendering session is open
    pub fn has_live_session(&self) -> bool {
        self.render_session.is_some()
    }

    /// Returns the HTTP transport, creating it on first use
    pub(crate) fn transport(
        &mut self,
        config: &FetchConfig,
    ) -> Result<Arc<dyn HttpTransport>, FetchError> {
        if let Some(transport) = &self.transport {
            return Ok(Arc::clone(transport));
        }

        let transport = self.transport_factory.create(config)?;
        tracing::debug!("HTTP transport created");
        self.transport = Some(Arc::clone(&transport));
        Ok(transport)
    }

    /// Returns the rendering session, launching it on first use
    ///
    /// A failed launch is not retried for the rest of the invocation.
    pub(crate) async fn render_session(
        &mut self,
        url: &str,
        stealth: bool,
    ) -> Option<&mut dyn RenderSession> {
        if self.render_session.is_none() {
            if self.render_failed {
                return None;
            }
            let launcher = self.render_launcher.clone()?;

            let identity = self.identities.identity_for(url, stealth, &mut self.rng);
            match launcher.launch(&identity).await {
                Ok(session) => {
                    tracing::info!("Rendering session started");
                    self.render_session = Some(session);
                }
                Err(e) => {
                    tracing::warn!("Could not start rendering session: {}", e);
                    self.render_failed = true;
                    return None;
                }
            }
        }

        match self.render_session.as_mut() {
            Some(session) => Some(session.as_mut()),
            None => None,
        }
    }

    /// Releases the rendering session and HTTP transport
    ///
    /// Each live resource is released exactly once; calling this again only
    /// releases what was created since.
    pub async fn shutdown(&mut self) {
        self.shut_down = true;

        if let Some(mut session) = self.render_session.take() {
            match session.close().await {
                Ok(()) => tracing::debug!("Rendering session closed"),
                Err(e) => tracing::warn!("Failed to close rendering session: {}", e),
            }
        }

        if self.transport.take().is_some() {
            tracing::debug!("HTTP transport released");
        }
    }
}

#[cfg(feature = "webdriver")]
fn attach_renderer(ctx: ScrapeContext, config: &Config) -> ScrapeContext {
    if !config.fetch.render {
        return ctx;
    }
    ctx.with_render_launcher(Arc::new(crate::fetch::WebDriverLauncher::new(
        &config.fetch.webdriver_url,
    )))
}

#[cfg(not(feature = "webdriver"))]
fn attach_renderer(ctx: ScrapeContext, config: &Config) -> ScrapeContext {
    if config.fetch.render {
        tracing::warn!("Rendering requested but this build has no rendering engine; using plain HTTP");
    }
    ctx
}

impl Drop for ScrapeContext {
    fn drop(&mut self) {
        let Some(mut session) = self.render_session.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!("Context dropped without shutdown, closing rendering session");
                handle.spawn(async move {
                    if let Err(e) = session.close().await {
                        tracing::warn!("Failed to close rendering session: {}", e);
                    }
                });
            }
            Err(_) => {
                tracing::warn!("Context dropped outside a runtime; rendering session left open")
            }
        }
    }
}

impl std::fmt::Debug for ScrapeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrapeContext")
            .field("identities", &self.identities)
            .field("has_transport", &self.transport.is_some())
            .field("has_render_launcher", &self.render_launcher.is_some())
            .field("has_render_session", &self.render_session.is_some())
            .field("shut_down", &self.shut_down)
            .finish()
    }
}
