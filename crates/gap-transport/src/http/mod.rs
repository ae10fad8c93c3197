//! HTTP transport.
//!
//! This module provides the REST client and the webhook server.

#[cfg(feature = "http-client")]
mod client;
#[cfg(feature = "http-client")]
pub use client::{DEFAULT_API_URL, HttpApiClient, HttpClientConfig};

#[cfg(feature = "http-server")]
mod server;
#[cfg(feature = "http-server")]
pub use server::{ListenerHandle, WebhookServer};
