//! Integration layer - Outbound interfaces.
//!
//! This module contains everything on the outbound path:
//! - Action builders producing method-tagged parameter sets
//! - Keyboard and form types serialized into those parameters
//! - The transport seam performing the network call
//! - The application-facing client

pub mod action;
pub mod client;
pub mod keyboard;
pub mod transport;

pub use action::{MediaKind, MediaSource, MessageType, Method, OutboundAction, TextOptions};
pub use client::GapClient;
pub use keyboard::{
    Button, FieldType, Form, FormField, InlineButton, InlineKeyboard, ReplyKeyboard,
};
pub use transport::{ApiTransport, BoxedTransport};
