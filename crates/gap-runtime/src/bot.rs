//! The bot lifecycle.
//!
//! [`GapBot`] ties together a [`GapConfig`], the handler registry, the REST
//! client and the webhook listener.
//!
//! ```rust,ignore
//! use gap_runtime::GapBot;
//!
//! let mut bot = GapBot::builder().token("TOKEN").port(3000).build()?;
//! let client = bot.client();
//! bot.on_join(move |update: Update| {
//!     let client = client.clone();
//!     async move {
//!         let chat = update.chat_id.unwrap_or_default();
//!         client.send_text(&chat, "Welcome!", &TextOptions::new()).await
//!     }
//! });
//! bot.run().await?;
//! ```
//!
//! Handlers must be registered before [`GapBot::start`]. The listener serves
//! a snapshot of the registry taken at start; later registrations only take
//! effect after a restart.

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use gap_core::{
    BoxedHandler, CoreResult, Dispatcher, EventSlot, GapClient, Handler, HandlerRegistry,
    Payment, Update,
};
use gap_transport::{HttpApiClient, HttpClientConfig, ListenerHandle, WebhookServer};
use tokio::signal;
use tracing::{debug, info, warn};

use crate::config::{ConfigLoader, GapConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging;

/// A Gap bot: handler registry, REST client and webhook listener.
pub struct GapBot {
    config: GapConfig,
    dispatcher: Dispatcher,
    client: GapClient,
    listener: Option<ListenerHandle>,
}

impl GapBot {
    /// Creates a bot with the given token and default settings.
    pub fn new(token: impl Into<String>) -> RuntimeResult<Self> {
        Self::from_config(&GapConfig::with_token(token))
    }

    /// Returns a builder.
    pub fn builder() -> GapBotBuilder {
        GapBotBuilder::new()
    }

    /// Creates a bot from a loaded configuration.
    ///
    /// Validates the configuration and initializes logging from it.
    pub fn from_config(config: &GapConfig) -> RuntimeResult<Self> {
        validate_config(config)?;
        logging::init_from_config(&config.logging);

        let mut http = HttpClientConfig::new(config.token.clone()).api_url(config.api_url.clone());
        if let Some(timeout) = config.timeout() {
            http = http.timeout(timeout);
        }
        let client = GapClient::from_transport(HttpApiClient::new(http)?);

        info!(
            api_url = %config.api_url,
            server = config.server.enabled,
            log_level = %config.logging.level,
            "Gap bot initialized"
        );

        Ok(Self {
            config: config.clone(),
            dispatcher: Dispatcher::new(),
            client,
            listener: None,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GapConfig {
        &self.config
    }

    /// Returns a handle to the outbound API.
    pub fn client(&self) -> GapClient {
        self.client.clone()
    }

    /// Returns the dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the handler registry.
    pub fn registry(&self) -> &HandlerRegistry {
        self.dispatcher.registry()
    }

    /// Returns the handler registry for registration.
    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        self.dispatcher.registry_mut()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Sets the `join` handler.
    pub fn on_join<H: Handler<Update>>(&mut self, handler: H) -> &mut Self {
        self.registry_mut().on_join(handler);
        self
    }

    /// Sets the `triggerButton` handler.
    pub fn on_trigger_button<H: Handler<Update>>(&mut self, handler: H) -> &mut Self {
        self.registry_mut().on_trigger_button(handler);
        self
    }

    /// Sets the `submitForm` handler.
    pub fn on_submit_form<H: Handler<Update>>(&mut self, handler: H) -> &mut Self {
        self.registry_mut().on_submit_form(handler);
        self
    }

    /// Sets the handler for decoded payment callbacks.
    pub fn on_paid<H: Handler<Payment>>(&mut self, handler: H) -> &mut Self {
        self.registry_mut().on_paid(handler);
        self
    }

    /// Sets the catch-all handler for text and unrecognised events.
    pub fn on_text<H: Handler<Update>>(&mut self, handler: H) -> &mut Self {
        self.registry_mut().set_main_text_handler(handler);
        self
    }

    /// Appends a text route compiled from `pattern`.
    pub fn on_text_matching<H: Handler<Update>>(
        &mut self,
        pattern: &str,
        handler: H,
    ) -> CoreResult<&mut Self> {
        self.registry_mut().try_add_text_route(pattern, handler)?;
        Ok(self)
    }

    /// Appends a text route.
    pub fn add_text_route<H: Handler<Update>>(
        &mut self,
        pattern: gap_core::regex::Regex,
        handler: H,
    ) -> &mut Self {
        self.registry_mut().add_text_route(pattern, handler);
        self
    }

    /// Sets the fallback for text no route matched.
    pub fn on_unhandled_text<H: Handler<Update>>(&mut self, handler: H) -> &mut Self {
        self.registry_mut().on_unhandled_text(handler);
        self
    }

    /// Restores a handler slot to its no-op default.
    pub fn reset(&mut self, slot: EventSlot) -> &mut Self {
        self.registry_mut().reset(slot);
        self
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Returns a webhook server over the current registry.
    ///
    /// Use its `router()` to mount the webhook in an existing axum app when
    /// the built-in listener is disabled.
    pub fn webhook(&self) -> WebhookServer {
        WebhookServer::new(self.dispatcher.clone())
    }

    /// Returns whether the listener is running.
    pub fn is_running(&self) -> bool {
        self.listener.is_some()
    }

    /// Returns the listener address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(ListenerHandle::local_addr)
    }

    /// Starts the webhook listener if the server is enabled.
    pub async fn start(&mut self) -> RuntimeResult<()> {
        if self.listener.is_some() {
            warn!("Gap bot is already running");
            return Ok(());
        }

        if !self.config.server.enabled {
            info!("Webhook server disabled, updates must be fed to the dispatcher");
            return Ok(());
        }

        let handle = self
            .webhook()
            .listen(&self.config.server.bind_addr())
            .await?;

        info!(
            addr = %handle.local_addr(),
            text_routes = self.registry().text_routes().len(),
            "Gap bot started"
        );
        self.listener = Some(handle);
        Ok(())
    }

    /// Stops the listener, waiting for in-flight requests.
    pub async fn stop(&mut self) {
        match self.listener.take() {
            Some(handle) => {
                handle.shutdown().await;
                info!("Gap bot stopped");
            }
            None => debug!("Gap bot is not running"),
        }
    }

    /// Starts the bot and runs until Ctrl+C or SIGTERM.
    pub async fn run(mut self) -> RuntimeResult<()> {
        self.start().await?;
        info!("Gap bot is now running. Press Ctrl+C to stop.");

        let result = wait_for_shutdown().await;
        self.stop().await;
        result
    }

    /// Starts the bot and runs until `shutdown` completes.
    pub async fn run_until<F>(mut self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        shutdown.await;
        self.stop().await;
        Ok(())
    }
}

impl std::fmt::Debug for GapBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GapBot")
            .field("api_url", &self.config.api_url)
            .field("server", &self.config.server)
            .field("registry", self.registry())
            .field("running", &self.is_running())
            .finish()
    }
}

async fn wait_for_shutdown() -> RuntimeResult<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}

// =============================================================================
// GapBotBuilder
// =============================================================================

/// Builder for [`GapBot`].
///
/// Explicit settings override anything loaded from files or the
/// environment. Sources are only consulted after [`GapBotBuilder::load_config`]
/// or [`GapBotBuilder::config_file`].
#[derive(Default)]
pub struct GapBotBuilder {
    loader: Option<ConfigLoader>,
    token: Option<String>,
    api_url: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    http_server: Option<bool>,
    timeout: Option<Duration>,
    unhandled_text: Option<BoxedHandler<Update>>,
}

impl GapBotBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from `gap.toml` and `GAP_*` variables.
    pub fn load_config(mut self) -> Self {
        self.loader = Some(ConfigLoader::new().with_current_dir());
        self
    }

    /// Loads configuration from a specific file plus `GAP_*` variables.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        let loader = self
            .loader
            .take()
            .unwrap_or_else(|| ConfigLoader::new().with_current_dir());
        self.loader = Some(loader.file(path.into()));
        self
    }

    /// Sets the bot token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the REST base URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Sets the listener host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the listener port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Enables or disables the built-in webhook listener.
    pub fn http_server(mut self, enabled: bool) -> Self {
        self.http_server = Some(enabled);
        self
    }

    /// Sets the outbound request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the fallback for text no route matched.
    pub fn unhandled_text<H: Handler<Update>>(mut self, handler: H) -> Self {
        self.unhandled_text = Some(gap_core::into_handler(handler));
        self
    }

    /// Resolves the configuration without building a bot.
    pub fn resolve_config(&mut self) -> RuntimeResult<GapConfig> {
        let mut config = match self.loader.take() {
            Some(loader) => loader.load()?,
            None => GapConfig::default(),
        };

        if let Some(token) = self.token.take() {
            config.token = token;
        }
        if let Some(url) = self.api_url.take() {
            config.api_url = url;
        }
        if let Some(host) = self.host.take() {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(enabled) = self.http_server {
            config.server.enabled = enabled;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        }

        Ok(config)
    }

    /// Builds the bot.
    pub fn build(mut self) -> RuntimeResult<GapBot> {
        let config = self.resolve_config()?;
        let mut bot = GapBot::from_config(&config)?;

        if let Some(handler) = self.unhandled_text {
            bot.on_unhandled_text(move |update: Update| handler.call(update));
        }

        Ok(bot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use gap_core::{Outcome, RouteMatch};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn counter() -> (Arc<AtomicUsize>, impl Fn(Update) -> std::future::Ready<()> + Clone) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let handler = move |_: Update| {
            c.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        };
        (count, handler)
    }

    async fn post(addr: SocketAddr, body: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "POST /webhook HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[test]
    fn test_empty_token_is_rejected() {
        let err = GapBot::new("").unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }

    #[test]
    fn test_builder_overrides() {
        let mut builder = GapBot::builder()
            .token("t")
            .port(8443)
            .http_server(false)
            .timeout(Duration::from_secs(5));
        let config = builder.resolve_config().unwrap();

        assert_eq!(config.token, "t");
        assert_eq!(config.server.port, 8443);
        assert!(!config.server.enabled);
        assert_eq!(config.timeout_ms, Some(5000));
        assert_eq!(config.api_url, "https://api.gap.im/");
    }

    #[test]
    fn test_oversized_timeout_saturates() {
        let mut builder = GapBot::builder().token("t").timeout(Duration::MAX);
        let config = builder.resolve_config().unwrap();
        assert_eq!(config.timeout_ms, Some(u64::MAX));
    }

    #[tokio::test]
    async fn test_builder_installs_unhandled_text() {
        let (count, handler) = counter();
        let mut bot = GapBot::builder()
            .token("t")
            .http_server(false)
            .unhandled_text(handler)
            .build()
            .unwrap();
        bot.on_text_matching("^/start", |_: Update| async {}).unwrap();

        let outcome = bot
            .dispatcher()
            .dispatch(Update::new("text").with_data("hello"))
            .unwrap()
            .run()
            .await;

        assert_eq!(
            outcome,
            Outcome::Main {
                kind: gap_core::EventKind::Text,
                route: RouteMatch::Unhandled
            }
        );
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_server_does_not_bind() {
        let mut bot = GapBot::builder()
            .token("t")
            .http_server(false)
            .build()
            .unwrap();

        bot.start().await.unwrap();
        assert!(!bot.is_running());
        assert_eq!(bot.local_addr(), None);
    }

    #[tokio::test]
    async fn test_started_bot_serves_webhook() {
        let (count, handler) = counter();
        let mut bot = GapBot::builder()
            .token("t")
            .host("127.0.0.1")
            .port(0)
            .build()
            .unwrap();
        bot.on_join(handler);

        bot.start().await.unwrap();
        let addr = bot.local_addr().unwrap();

        let response = post(addr, r#"{"type":"join","chat_id":42}"#).await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");

        let response = post(addr, "not json").await;
        assert!(response.starts_with("HTTP/1.1 400"), "{response}");

        for _ in 0..50 {
            if count.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);

        bot.stop().await;
        assert!(!bot.is_running());
    }
}
