//! Event dispatcher for the Gap SDK.
//!
//! The [`Dispatcher`] owns a [`HandlerRegistry`] and routes each inbound
//! [`Update`] to it:
//!
//! 1. `join`, `triggerButton` and `submitForm` go to their single handler
//! 2. `paycallback` data is decoded as a [`Payment`] and handed to the paid
//!    handler; a malformed payload fails the dispatch
//! 3. Everything else goes to the main handler, then, for non-empty `text`
//!    events, to the first matching text route or the unhandled-text handler
//!
//! Handlers are invoked synchronously; the futures they return are collected
//! in a [`Dispatch`] so the caller decides whether to await or detach them.
//!
//! ```rust,ignore
//! let mut dispatcher = Dispatcher::new();
//! dispatcher
//!     .registry_mut()
//!     .add_text_route(Regex::new("^/start")?, start_handler);
//!
//! let outcome = dispatcher.dispatch(update)?.run().await;
//! ```

use futures::future::join_all;
use tracing::{Instrument, Level, debug, span, trace};

use crate::foundation::error::DispatchResult;
use crate::foundation::event::{Event, EventKind, Payment, Update};
use crate::framework::handler::BoxFuture;
use crate::framework::registry::HandlerRegistry;

/// Result of text-route resolution for a non-structural event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMatch {
    /// The route at this priority index matched.
    Matched(usize),
    /// No route matched; the unhandled-text handler ran.
    Unhandled,
    /// Resolution did not run (no routes, not a text event, or empty text).
    Skipped,
}

/// Which branch of the dispatcher handled an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The join handler ran.
    Join,
    /// The trigger-button handler ran.
    TriggerButton,
    /// The submit-form handler ran.
    SubmitForm,
    /// The paid handler ran with a decoded payment.
    Paid,
    /// The main handler ran, followed by text-route resolution.
    Main {
        /// Kind of the dispatched event (`Text` or `Unknown`).
        kind: EventKind,
        /// Text-route resolution result.
        route: RouteMatch,
    },
}

/// The handler work produced by a single dispatch.
#[must_use = "handler futures do nothing unless run or spawned"]
pub struct Dispatch {
    outcome: Outcome,
    tasks: Vec<BoxFuture<'static, ()>>,
}

impl Dispatch {
    /// Returns which branch handled the event.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Returns the number of handlers invoked.
    pub fn handler_count(&self) -> usize {
        self.tasks.len()
    }

    /// Awaits every handler future in invocation order.
    pub async fn run(self) -> Outcome {
        join_all(self.tasks).await;
        self.outcome
    }

    /// Detaches the handler futures onto the current tokio runtime.
    ///
    /// Must be called from within a runtime.
    pub fn spawn(self) -> Outcome {
        if !self.tasks.is_empty() {
            tokio::spawn(async move {
                join_all(self.tasks).await;
            });
        }
        self.outcome
    }
}

impl std::fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatch")
            .field("outcome", &self.outcome)
            .field("handler_count", &self.tasks.len())
            .finish()
    }
}

/// The central event dispatcher.
///
/// # Thread Safety
///
/// `Dispatcher` is `Send + Sync`; share it behind an `Arc` once
/// registration is complete.
#[derive(Default, Clone, Debug)]
pub struct Dispatcher {
    registry: HandlerRegistry,
}

impl Dispatcher {
    /// Creates a dispatcher with an empty registry.
    pub fn new() -> Self {
        Self {
            registry: HandlerRegistry::new(),
        }
    }

    /// Creates a dispatcher around an existing registry.
    pub fn with_registry(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Returns the registry.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Returns the registry for registration.
    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    /// Classifies and dispatches a raw update.
    pub fn dispatch(&self, update: Update) -> DispatchResult<Dispatch> {
        self.dispatch_event(Event::classify(update))
    }

    /// Dispatches an already classified event.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MalformedPayment`](crate::DispatchError::MalformedPayment)
    /// when a `paycallback` payload is not a JSON object. No handler runs in
    /// that case.
    pub fn dispatch_event(&self, event: Event) -> DispatchResult<Dispatch> {
        let kind = event.kind();
        let span = span!(Level::DEBUG, "dispatch", event_kind = %kind);
        let _enter = span.enter();

        let registry = &self.registry;
        let mut tasks = Vec::with_capacity(2);

        let outcome = match event {
            Event::Join(update) => {
                tasks.push(registry.join().call(update));
                Outcome::Join
            }
            Event::TriggerButton(update) => {
                tasks.push(registry.trigger_button().call(update));
                Outcome::TriggerButton
            }
            Event::SubmitForm(update) => {
                tasks.push(registry.submit_form().call(update));
                Outcome::SubmitForm
            }
            Event::PayCallback(update) => {
                let mut payment = Payment::parse(update.data.as_deref().unwrap_or_default())?;
                payment.chat_id = update.chat_id;
                debug!(
                    ref_id = ?payment.ref_id,
                    chat_id = ?payment.chat_id,
                    "Decoded payment callback"
                );
                tasks.push(registry.paid().call(payment));
                Outcome::Paid
            }
            Event::Text(update) | Event::Unknown(update) => {
                tasks.push(registry.main_text().call(update.clone()));
                let route = self.resolve_text(update, &mut tasks);
                Outcome::Main { kind, route }
            }
        };

        debug!(?outcome, handlers = tasks.len(), "Event dispatched");

        let tasks = tasks
            .into_iter()
            .map(|task| -> BoxFuture<'static, ()> { Box::pin(task.instrument(span.clone())) })
            .collect();

        Ok(Dispatch { outcome, tasks })
    }

    /// Runs text-route resolution: first match wins, otherwise the
    /// unhandled-text handler.
    fn resolve_text(&self, update: Update, tasks: &mut Vec<BoxFuture<'static, ()>>) -> RouteMatch {
        let routes = self.registry.text_routes();
        if routes.is_empty() || update.event_kind() != EventKind::Text {
            return RouteMatch::Skipped;
        }

        let Some(text) = update.text() else {
            trace!("Empty text, skipping route resolution");
            return RouteMatch::Skipped;
        };

        match self.registry.first_match(text) {
            Some((index, route)) => {
                debug!(route = index, pattern = %route.pattern(), "Text route matched");
                tasks.push(route.handler().call(update));
                RouteMatch::Matched(index)
            }
            None => {
                debug!("No text route matched");
                tasks.push(self.registry.unhandled_text().call(update));
                RouteMatch::Unhandled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::error::DispatchError;
    use regex::Regex;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(
        counter: &Arc<AtomicUsize>,
        amount: usize,
    ) -> impl Fn(Update) -> BoxFuture<'static, ()> + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move |_| {
            let c = Arc::clone(&counter);
            Box::pin(async move {
                c.fetch_add(amount, Ordering::SeqCst);
            })
        }
    }

    #[tokio::test]
    async fn test_structural_kinds_route_to_their_slot() {
        let counter = Arc::new(AtomicUsize::new(0));
        let main = Arc::new(AtomicUsize::new(0));

        let mut dispatcher = Dispatcher::new();
        dispatcher
            .registry_mut()
            .on_join(counting(&counter, 1))
            .on_trigger_button(counting(&counter, 10))
            .on_submit_form(counting(&counter, 100))
            .set_main_text_handler(counting(&main, 1));

        let join = dispatcher.dispatch(Update::new("join")).unwrap().run().await;
        let button = dispatcher
            .dispatch(Update::new("triggerButton"))
            .unwrap()
            .run()
            .await;
        let form = dispatcher.dispatch(Update::new("submitForm")).unwrap().run().await;

        assert_eq!(join, Outcome::Join);
        assert_eq!(button, Outcome::TriggerButton);
        assert_eq!(form, Outcome::SubmitForm);
        assert_eq!(counter.load(Ordering::SeqCst), 111);
        assert_eq!(main.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_main_handler_runs_once_for_other_kinds() {
        let main = Arc::new(AtomicUsize::new(0));

        let mut dispatcher = Dispatcher::new();
        dispatcher
            .registry_mut()
            .set_main_text_handler(counting(&main, 1))
            .add_text_route(Regex::new(".*").unwrap(), |_: Update| async {});

        for kind in ["text", "image", "contact", ""] {
            dispatcher
                .dispatch(Update::new(kind).with_data("x"))
                .unwrap()
                .run()
                .await;
        }

        assert_eq!(main.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_first_matching_route_wins() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let mut dispatcher = Dispatcher::new();
        dispatcher
            .registry_mut()
            .add_text_route(Regex::new("hello").unwrap(), counting(&first, 1))
            .add_text_route(Regex::new("hello world").unwrap(), counting(&second, 1));

        let outcome = dispatcher
            .dispatch(Update::new("text").with_data("hello world"))
            .unwrap()
            .run()
            .await;

        assert_eq!(
            outcome,
            Outcome::Main {
                kind: EventKind::Text,
                route: RouteMatch::Matched(0)
            }
        );
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_text_skips_routes_and_fallback() {
        let main = Arc::new(AtomicUsize::new(0));
        let routed = Arc::new(AtomicUsize::new(0));
        let unhandled = Arc::new(AtomicUsize::new(0));

        let mut dispatcher = Dispatcher::new();
        dispatcher
            .registry_mut()
            .set_main_text_handler(counting(&main, 1))
            .add_text_route(Regex::new("").unwrap(), counting(&routed, 1))
            .on_unhandled_text(counting(&unhandled, 1));

        let empty = dispatcher.dispatch(Update::new("text").with_data("")).unwrap();
        assert_eq!(empty.handler_count(), 1);
        empty.run().await;
        dispatcher.dispatch(Update::new("text")).unwrap().run().await;

        assert_eq!(main.load(Ordering::SeqCst), 2);
        assert_eq!(routed.load(Ordering::SeqCst), 0);
        assert_eq!(unhandled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unmatched_text_hits_fallback_once() {
        let unhandled = Arc::new(AtomicUsize::new(0));

        let mut dispatcher = Dispatcher::new();
        dispatcher
            .registry_mut()
            .add_text_route(Regex::new("^/start$").unwrap(), |_: Update| async {})
            .on_unhandled_text(counting(&unhandled, 1));

        let outcome = dispatcher
            .dispatch(Update::new("text").with_data("what?"))
            .unwrap()
            .run()
            .await;

        assert_eq!(
            outcome,
            Outcome::Main {
                kind: EventKind::Text,
                route: RouteMatch::Unhandled
            }
        );
        assert_eq!(unhandled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_text_kind_skips_routes() {
        let unhandled = Arc::new(AtomicUsize::new(0));

        let mut dispatcher = Dispatcher::new();
        dispatcher
            .registry_mut()
            .add_text_route(Regex::new(".*").unwrap(), |_: Update| async {})
            .on_unhandled_text(counting(&unhandled, 1));

        let outcome = dispatcher
            .dispatch(Update::new("image").with_data("{}"))
            .unwrap()
            .run()
            .await;

        assert_eq!(
            outcome,
            Outcome::Main {
                kind: EventKind::Unknown,
                route: RouteMatch::Skipped
            }
        );
        assert_eq!(unhandled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_routes_means_no_fallback() {
        let unhandled = Arc::new(AtomicUsize::new(0));

        let mut dispatcher = Dispatcher::new();
        dispatcher
            .registry_mut()
            .on_unhandled_text(counting(&unhandled, 1));

        dispatcher
            .dispatch(Update::new("text").with_data("hi"))
            .unwrap()
            .run()
            .await;

        assert_eq!(unhandled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_paycallback_passes_decoded_payment() {
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let seen_clone = Arc::clone(&seen);

        let mut dispatcher = Dispatcher::new();
        dispatcher.registry_mut().on_paid(move |payment: Payment| {
            let seen = Arc::clone(&seen_clone);
            async move {
                *seen.lock() = Some((payment.ref_id, payment.chat_id));
            }
        });

        let outcome = dispatcher
            .dispatch(
                Update::new("paycallback")
                    .with_chat_id("c9")
                    .with_data(r#"{"ref_id":"abc"}"#),
            )
            .unwrap()
            .run()
            .await;

        assert_eq!(outcome, Outcome::Paid);
        assert_eq!(
            seen.lock().clone(),
            Some((Some("abc".to_string()), Some("c9".to_string())))
        );
    }

    #[tokio::test]
    async fn test_malformed_paycallback_fails_without_invoking_handler() {
        let paid = Arc::new(AtomicUsize::new(0));
        let paid_clone = Arc::clone(&paid);

        let mut dispatcher = Dispatcher::new();
        dispatcher.registry_mut().on_paid(move |_: Payment| {
            let c = Arc::clone(&paid_clone);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        let err = dispatcher
            .dispatch(Update::new("paycallback").with_data("{not json"))
            .unwrap_err();

        assert!(matches!(err, DispatchError::MalformedPayment { .. }));
        assert_eq!(paid.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reregistering_replaces_handler() {
        let joins = Arc::new(AtomicUsize::new(0));

        let mut dispatcher = Dispatcher::new();
        dispatcher
            .registry_mut()
            .on_join(counting(&joins, 1))
            .on_join(counting(&joins, 10));

        dispatcher.dispatch(Update::new("join")).unwrap().run().await;
        assert_eq!(joins.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_reset_restores_noop() {
        let joins = Arc::new(AtomicUsize::new(0));

        let mut dispatcher = Dispatcher::new();
        dispatcher
            .registry_mut()
            .on_join(counting(&joins, 1))
            .reset(crate::framework::registry::EventSlot::Join);

        dispatcher.dispatch(Update::new("join")).unwrap().run().await;
        assert_eq!(joins.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_spawned_handlers_complete() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let tx = Arc::new(parking_lot::Mutex::new(Some(tx)));

        let mut dispatcher = Dispatcher::new();
        dispatcher.registry_mut().on_join(move |update: Update| {
            let tx = tx.lock().take();
            async move {
                if let Some(tx) = tx {
                    let _ = tx.send(update.chat_id);
                }
            }
        });

        let outcome = dispatcher
            .dispatch(Update::new("join").with_chat_id("c1"))
            .unwrap()
            .spawn();

        assert_eq!(outcome, Outcome::Join);
        assert_eq!(rx.await.unwrap().as_deref(), Some("c1"));
    }
}
