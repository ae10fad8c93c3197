//! Framework layer - Handler registration and event routing.
//!
//! This module contains the inbound processing pipeline:
//! - Handler trait with a blanket implementation for async closures
//! - Handler registry with single-handler slots and ordered text routes
//! - Central dispatcher routing classified events to the registry

pub mod dispatcher;
pub mod handler;
pub mod registry;

pub use dispatcher::{Dispatch, Dispatcher, Outcome, RouteMatch};
pub use handler::{BoxFuture, BoxedHandler, Handler, HandlerOutput, into_handler, noop};
pub use registry::{EventSlot, HandlerRegistry, TextRoute};
