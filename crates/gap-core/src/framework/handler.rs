//! Handler system for the Gap SDK.
//!
//! Handlers are plain async closures. Anything implementing
//! `Fn(T) -> impl Future` is a [`Handler<T>`] through a blanket
//! implementation, similar to Axum's handler system:
//!
//! ```rust,ignore
//! registry.on_join(|update: Update| async move {
//!     info!(chat_id = ?update.chat_id, "New user joined");
//! });
//!
//! registry.on_paid(|payment: Payment| async move {
//!     client.pay_verify(&chat_id, payment.ref_id.as_deref().unwrap_or_default()).await
//! });
//! ```
//!
//! A handler may return `()` or `Result<(), E>`; errors are logged and never
//! reach the dispatcher.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use tracing::warn;

/// An owned, boxed future.
pub type BoxFuture<'a, T> = futures::future::BoxFuture<'a, T>;

// ============================================================================
// HandlerOutput - Handle handler return values
// ============================================================================

/// A trait for values a handler may return.
pub trait HandlerOutput: Send {
    /// Consumes the return value once the handler has finished.
    fn finish(self);
}

impl HandlerOutput for () {
    fn finish(self) {}
}

impl<E: Display + Send> HandlerOutput for Result<(), E> {
    fn finish(self) {
        if let Err(e) = self {
            warn!(error = %e, "Handler returned an error");
        }
    }
}

// ============================================================================
// Handler
// ============================================================================

/// An event handler receiving values of type `T`.
///
/// Calling a handler is synchronous: it returns the future that performs
/// the work, which the dispatcher hands back to its caller.
pub trait Handler<T>: Send + Sync + 'static {
    /// Invokes the handler.
    fn call(&self, input: T) -> BoxFuture<'static, ()>;
}

impl<F, Fut, T> Handler<T> for F
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: HandlerOutput,
{
    fn call(&self, input: T) -> BoxFuture<'static, ()> {
        let fut = self(input);
        Box::pin(async move { fut.await.finish() })
    }
}

/// A type-erased, shareable handler.
pub type BoxedHandler<T> = Arc<dyn Handler<T>>;

/// Boxes a handler.
pub fn into_handler<T, H>(handler: H) -> BoxedHandler<T>
where
    H: Handler<T>,
{
    Arc::new(handler)
}

/// Returns a handler that does nothing.
pub fn noop<T: Send + 'static>() -> BoxedHandler<T> {
    into_handler(|_: T| async {})
}
