//! # Gap
//!
//! An SDK for building bots on the Gap messenger.
//!
//! ## Overview
//!
//! The platform delivers every event to one webhook URL; the bot answers by
//! calling a REST API. This crate bundles both directions:
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌──────────────────────────────┐
//! │   Webhook   │────▶│ Dispatcher │────▶│ join / triggerButton / form  │
//! │  (axum)     │     │            │────▶│ paid (decoded payment)       │
//! └─────────────┘     └────────────┘────▶│ main handler + text routes   │
//!                                        └──────────────┬───────────────┘
//!                                                       │ GapClient
//!                                                       ▼
//!                                               REST API (reqwest)
//! ```
//!
//! - **Runtime**: [`GapBot`](runtime::GapBot) owns config, registry, client and listener
//! - **Core**: event model, registry, dispatcher and outbound action builders
//! - **Transport**: the axum webhook server and reqwest API client
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gap::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut bot = GapBot::builder().token("TOKEN").build()?;
//!     let client = bot.client();
//!
//!     bot.on_text_matching("^/echo (.+)", move |update: Update| {
//!         let client = client.clone();
//!         async move {
//!             let chat = update.chat_id.clone().unwrap_or_default();
//!             let text = update.text().unwrap_or_default().to_string();
//!             client.send_text(&chat, &text, &TextOptions::new()).await
//!         }
//!     })?;
//!
//!     bot.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: `gap.toml` configuration files (default)
//! - `yaml-config`: `gap.yaml` configuration files
//! - `json-log`: JSON log output

pub use gap_core as core;
pub use gap_runtime as runtime;
pub use gap_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use gap::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use gap_runtime::{GapBot, GapBotBuilder, GapConfig, RuntimeError, RuntimeResult};

    // Inbound events and routing
    pub use gap_core::{
        Dispatcher, Event, EventKind, EventSlot, Handler, HandlerRegistry, Outcome, Payment,
        RouteMatch, Update,
    };

    // Outbound API
    pub use gap_core::{
        Button, FieldType, Form, FormField, GapClient, InlineButton, InlineKeyboard, MediaKind,
        MediaSource, OutboundError, OutboundResult, ReplyKeyboard, TextOptions,
    };

    pub use gap_core::regex::Regex;
}
