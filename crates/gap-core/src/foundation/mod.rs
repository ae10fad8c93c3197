//! Foundation layer - Inbound data model and error types.
//!
//! This module contains the fundamental building blocks of the SDK:
//! - Update and event types for inbound webhook payloads
//! - Error taxonomy for dispatch, registration and outbound calls

pub mod error;
pub mod event;

pub use error::{
    CoreError, CoreResult, DispatchError, DispatchResult, OutboundError, OutboundResult,
    TransportError, TransportResult,
};
pub use event::{Event, EventKind, Payment, Update};
