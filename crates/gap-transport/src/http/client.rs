//! REST client implementation of [`ApiTransport`].

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, ClientBuilder, Response};
use serde_json::Value;
use tokio_util::io::ReaderStream;
use tracing::{debug, trace};

use gap_core::{
    ApiTransport, MediaKind, Method, OutboundAction, OutboundError, OutboundResult,
    TransportError, TransportResult,
};

/// Default base URL of the Gap bot API.
pub const DEFAULT_API_URL: &str = "https://api.gap.im/";

/// Configuration for [`HttpApiClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL; the method name is appended to it.
    pub api_url: String,
    /// Bot token, sent in the `token` header.
    pub token: String,
    /// Request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl HttpClientConfig {
    /// Creates a config for the default API URL.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            timeout: None,
        }
    }

    /// Sets the base URL (builder pattern).
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Sets the request timeout (builder pattern).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Calls the Gap REST API over HTTP.
///
/// Requests are `POST {api_url}{method}` with a URL-encoded body and the
/// bot token in a `token` header. Uploads are multipart posts to `upload`
/// streaming the file from disk.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    api_url: String,
    token: String,
}

impl HttpApiClient {
    /// Creates a client from its configuration.
    pub fn new(config: HttpClientConfig) -> TransportResult<Self> {
        let mut builder = ClientBuilder::new();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::InvalidConfig(e.to_string()))?;

        let mut api_url = config.api_url;
        if !api_url.ends_with('/') {
            api_url.push('/');
        }

        Ok(Self {
            client,
            api_url,
            token: config.token,
        })
    }

    /// Returns the full URL of a method.
    pub fn url(&self, method: Method) -> String {
        format!("{}{}", self.api_url, method)
    }
}

#[async_trait]
impl ApiTransport for HttpApiClient {
    async fn call(&self, action: &OutboundAction) -> OutboundResult<()> {
        let url = self.url(action.method());
        trace!(url = %url, "POST");

        let resp = self
            .client
            .post(&url)
            .header("token", &self.token)
            .form(action.params())
            .send()
            .await
            .map_err(|e| OutboundError::request(None, e.to_string()))?;

        check_status(resp).await.map(|_| ())
    }

    async fn upload(&self, kind: MediaKind, path: &Path) -> OutboundResult<Value> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| OutboundError::Upload(format!("{}: {e}", path.display())))?;
        let len = file.metadata().await.ok().map(|m| m.len());
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(kind.as_str())
            .to_string();

        let body = Body::wrap_stream(ReaderStream::new(file));
        let part = match len {
            Some(len) => Part::stream_with_length(body, len),
            None => Part::stream(body),
        }
        .file_name(file_name);
        let form = Form::new().part(kind.as_str(), part);

        debug!(kind = %kind, size = ?len, "Uploading file");

        let resp = self
            .client
            .post(self.url(Method::Upload))
            .header("token", &self.token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| OutboundError::Upload(e.to_string()))?;

        let resp = check_status(resp)
            .await
            .map_err(|e| OutboundError::Upload(e.to_string()))?;

        resp.json::<Value>()
            .await
            .map_err(|e| OutboundError::Upload(format!("invalid upload response: {e}")))
    }
}

/// Turns a non-2xx response into an error carrying its body.
async fn check_status(resp: Response) -> OutboundResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    Err(OutboundError::from_status(status.as_u16(), body))
}
