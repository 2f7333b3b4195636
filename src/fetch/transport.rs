//! HTTP capability
//!
//! The plain fetch strategy talks to the network only through
//! [`HttpTransport`]. [`ReqwestTransport`] is the default implementation:
//! - Cookie persistence for the lifetime of one invocation
//! - Redirects followed up to 10 hops
//! - gzip, brotli and deflate decoding
//! - Bodies read only for successful HTML responses, up to a size cap,
//!   and decoded with the detected character set

use crate::fetch::charset::decode_html;
use crate::fetch::{is_document_content_type, FetchConfig};
use crate::{FetchError, NetworkFailure};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, Response};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Maximum redirect hops followed by the default transport
pub const MAX_REDIRECTS: usize = 10;

/// One outgoing GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,

    /// Header name/value pairs in send order
    pub headers: Vec<(String, String)>,

    pub timeout: Duration,
}

/// A response as seen after redirects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,

    /// Header name/value pairs, names lowercased
    pub headers: Vec<(String, String)>,

    /// Decoded body; left empty unless the response is a 2xx HTML document
    pub body: String,

    /// URL of the last hop
    pub final_url: String,
}

impl HttpResponse {
    /// Looks up a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

/// Transport-level failures
///
/// Anything that is neither a timeout nor a connect failure (TLS, body
/// decoding, redirect loops) is reported as [`TransportError::Connection`].
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),
}

impl TransportError {
    pub fn kind(&self) -> NetworkFailure {
        match self {
            TransportError::Timeout(_) => NetworkFailure::Timeout,
            TransportError::Connection(_) => NetworkFailure::ConnectionError,
        }
    }

    /// Converts to a strategy failure for `url`
    pub fn into_fetch_error(self, url: &str) -> FetchError {
        let kind = self.kind();
        let message = match self {
            TransportError::Timeout(message) | TransportError::Connection(message) => message,
        };
        FetchError::Network {
            kind,
            url: url.to_string(),
            message,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TransportError::Timeout(error.to_string())
        } else {
            TransportError::Connection(error.to_string())
        }
    }
}

/// Sends HTTP requests on behalf of the plain fetch strategy
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Creates the transport for one invocation, on first need
pub trait HttpTransportFactory: Send + Sync {
    fn create(&self, config: &FetchConfig) -> Result<Arc<dyn HttpTransport>, FetchError>;
}

/// `reqwest`-backed transport with a per-invocation cookie jar
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    max_body_bytes: usize,
}

impl ReqwestTransport {
    /// Builds the underlying client
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies the request timeout and body size cap
    ///
    /// # Returns
    ///
    /// * `Ok(ReqwestTransport)` - Ready to send
    /// * `Err(reqwest::Error)` - The TLS backend could not be initialized
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(10)))
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

/// Reads at most `limit` bytes of a response body
async fn read_capped(mut response: Response, limit: usize) -> Result<Vec<u8>, TransportError> {
    let mut body = Vec::new();

    while let Some(chunk) = response.chunk().await? {
        let room = limit.saturating_sub(body.len());
        if chunk.len() > room {
            body.extend_from_slice(&chunk[..room]);
            tracing::debug!("Body of {} cut at {} bytes", response.url(), limit);
            break;
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.get(&request.url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let content_type = headers
            .iter()
            .find(|(name, _)| name == "content-type")
            .map(|(_, value)| value.clone());
        let wanted = (200..300).contains(&status)
            && content_type.as_deref().map_or(false, is_document_content_type);

        let body = if wanted {
            let bytes = read_capped(response, self.max_body_bytes).await?;
            decode_html(&bytes, content_type.as_deref())
        } else {
            tracing::debug!(
                "Not reading body of {} (status {}, content type {:?})",
                final_url,
                status,
                content_type
            );
            String::new()
        };

        Ok(HttpResponse {
            status,
            headers,
            body,
            final_url,
        })
    }
}

/// Factory for [`ReqwestTransport`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestTransportFactory;

impl HttpTransportFactory for ReqwestTransportFactory {
    fn create(&self, config: &FetchConfig) -> Result<Arc<dyn HttpTransport>, FetchError> {
        let transport = ReqwestTransport::new(config).map_err(|e| FetchError::Network {
            kind: NetworkFailure::ConnectionError,
            url: String::new(),
            message: format!("failed to build HTTP client: {}", e),
        })?;
        Ok(Arc::new(transport))
    }
}
