//! # Gap Transport
//!
//! Network implementations for the Gap bot SDK.
//!
//! `gap-core` builds outbound actions and dispatches inbound updates but
//! performs no I/O. This crate supplies both ends of the wire behind
//! feature flags.
//!
//! ## Features
//!
//! - `http-client` (default): REST client implementing [`gap_core::ApiTransport`]
//! - `http-server` (default): webhook server feeding a [`gap_core::Dispatcher`]
//! - `full`: everything
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  Application        │  (handlers, GapClient calls)
//! ├─────────────────────┤
//! │  gap-core           │  (dispatcher, action builders)
//! ├─────────────────────┤
//! │  gap-transport      │  <- This crate
//! ├─────────────────────┤
//! │  Network (HTTP)     │
//! └─────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gap_core::{Dispatcher, GapClient, TextOptions, Update};
//! use gap_transport::{HttpApiClient, HttpClientConfig, WebhookServer};
//!
//! let client = GapClient::from_transport(HttpApiClient::new(HttpClientConfig::new(token))?);
//!
//! let mut dispatcher = Dispatcher::new();
//! let replies = client.clone();
//! dispatcher.registry_mut().on_join(move |update: Update| {
//!     let client = replies.clone();
//!     async move {
//!         let chat = update.chat_id.unwrap_or_default();
//!         client.send_text(&chat, "welcome", &TextOptions::new()).await
//!     }
//! });
//!
//! let handle = WebhookServer::new(dispatcher).listen("0.0.0.0:8080").await?;
//! ```

#[cfg(any(feature = "http-client", feature = "http-server"))]
pub mod http;

#[cfg(feature = "http-client")]
pub use http::{DEFAULT_API_URL, HttpApiClient, HttpClientConfig};

#[cfg(feature = "http-server")]
pub use http::{ListenerHandle, WebhookServer};
