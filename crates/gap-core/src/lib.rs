//! # Gap Core
//!
//! The core of the Gap bot SDK: inbound event dispatch and outbound request
//! building. This crate performs no network I/O of its own; the HTTP server
//! and client live in `gap-transport`.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! - **Event Model**: Raw webhook records and their classification ([`Update`], [`Event`])
//! - **Errors**: Dispatch, registration and outbound error taxonomy
//!
//! ### Framework Layer
//!
//! - **Handlers**: Async closures as handlers ([`Handler`])
//! - **Registry**: One handler per event kind plus ordered text routes ([`HandlerRegistry`])
//! - **Dispatcher**: Kind-based routing with first-match text routes ([`Dispatcher`])
//!
//! ### Integration Layer
//!
//! - **Actions**: Method-tagged parameter sets ([`OutboundAction`])
//! - **Keyboards**: Reply/inline keyboards and forms
//! - **Transport**: The outbound network seam ([`ApiTransport`])
//! - **Client**: Application-facing outbound API ([`GapClient`])
//!
//! ## Event Flow
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌──────────────────────┐
//! │   Webhook   │────▶│ Dispatcher │────▶│ join / button / form │
//! │   (POST)    │     │            │────▶│ paid (decoded)       │
//! └─────────────┘     └────────────┘────▶│ main + text route    │
//!                                        └──────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use gap_core::{Dispatcher, Update};
//! use regex::Regex;
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher
//!     .registry_mut()
//!     .on_join(|update: Update| async move {
//!         println!("joined: {:?}", update.chat_id);
//!     })
//!     .add_text_route(Regex::new("^/help")?, |update: Update| async move {
//!         println!("help requested in {:?}", update.chat_id);
//!     });
//!
//! let update = Update::new("text").with_data("/help");
//! dispatcher.dispatch(update)?.run().await;
//! ```

// Architectural layers
pub mod foundation;
pub mod framework;
pub mod integration;

// Re-export foundation types
pub use foundation::{
    CoreError, CoreResult, DispatchError, DispatchResult, Event, EventKind, OutboundError,
    OutboundResult, Payment, TransportError, TransportResult, Update,
};

// Re-export framework types
pub use framework::{
    BoxFuture, BoxedHandler, Dispatch, Dispatcher, EventSlot, Handler, HandlerOutput,
    HandlerRegistry, Outcome, RouteMatch, TextRoute, into_handler, noop,
};

// Re-export integration types
pub use integration::{
    ApiTransport, BoxedTransport, Button, FieldType, Form, FormField, GapClient, InlineButton,
    InlineKeyboard, MediaKind, MediaSource, MessageType, Method, OutboundAction, ReplyKeyboard,
    TextOptions,
};

// Re-export regex for text route patterns
pub use regex;

/// Prelude for common imports.
pub mod prelude {
    pub use super::foundation::*;
    pub use super::framework::{Dispatcher, EventSlot, Handler, HandlerRegistry, Outcome};
    pub use super::integration::*;
    pub use regex::Regex;
}
