//! Handler registry.
//!
//! The registry holds exactly one handler per structural event kind plus an
//! ordered list of [`TextRoute`]s. Every slot always has a handler bound;
//! slots that were never registered (or were [`reset`](HandlerRegistry::reset))
//! resolve to a no-op.
//!
//! Registration requires `&mut` access. Once the registry is handed to a
//! running webhook server it sits behind an `Arc` and can no longer change,
//! so registering while events are being dispatched is not supported.

use regex::Regex;
use tracing::debug;

use crate::foundation::error::{CoreError, CoreResult};
use crate::foundation::event::{Payment, Update};
use crate::framework::handler::{BoxedHandler, Handler, into_handler, noop};

/// A single-handler slot of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSlot {
    /// `join` events.
    Join,
    /// `triggerButton` events.
    TriggerButton,
    /// `submitForm` events.
    SubmitForm,
    /// Decoded `paycallback` payloads.
    Paid,
    /// The catch-all handler for every non-structural event.
    MainText,
    /// Text events no route matched.
    UnhandledText,
}

/// A `(pattern, handler)` pair used to route free text.
#[derive(Clone)]
pub struct TextRoute {
    pattern: Regex,
    handler: BoxedHandler<Update>,
}

impl TextRoute {
    /// Returns the route's pattern.
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Returns the route's handler.
    pub fn handler(&self) -> &BoxedHandler<Update> {
        &self.handler
    }

    /// Checks whether `text` matches this route.
    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

impl std::fmt::Debug for TextRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRoute")
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// Handler storage for one bot instance.
#[derive(Clone)]
pub struct HandlerRegistry {
    join: BoxedHandler<Update>,
    trigger_button: BoxedHandler<Update>,
    submit_form: BoxedHandler<Update>,
    paid: BoxedHandler<Payment>,
    main_text: BoxedHandler<Update>,
    unhandled_text: BoxedHandler<Update>,
    text_routes: Vec<TextRoute>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerRegistry {
    /// Creates a registry with every slot bound to a no-op.
    pub fn new() -> Self {
        Self {
            join: noop(),
            trigger_button: noop(),
            submit_form: noop(),
            paid: noop(),
            main_text: noop(),
            unhandled_text: noop(),
            text_routes: Vec::new(),
        }
    }

    /// Replaces the `join` handler.
    pub fn on_join<H: Handler<Update>>(&mut self, handler: H) -> &mut Self {
        self.join = into_handler(handler);
        self
    }

    /// Replaces the `triggerButton` handler.
    pub fn on_trigger_button<H: Handler<Update>>(&mut self, handler: H) -> &mut Self {
        self.trigger_button = into_handler(handler);
        self
    }

    /// Replaces the `submitForm` handler.
    pub fn on_submit_form<H: Handler<Update>>(&mut self, handler: H) -> &mut Self {
        self.submit_form = into_handler(handler);
        self
    }

    /// Replaces the payment handler, invoked with the decoded `paycallback` data.
    pub fn on_paid<H: Handler<Payment>>(&mut self, handler: H) -> &mut Self {
        self.paid = into_handler(handler);
        self
    }

    /// Replaces the catch-all handler.
    ///
    /// It runs for every event that is not `join`, `triggerButton`,
    /// `submitForm` or `paycallback`, whether or not a text route matches.
    pub fn set_main_text_handler<H: Handler<Update>>(&mut self, handler: H) -> &mut Self {
        self.main_text = into_handler(handler);
        self
    }

    /// Replaces the handler for text no route matched.
    pub fn on_unhandled_text<H: Handler<Update>>(&mut self, handler: H) -> &mut Self {
        self.unhandled_text = into_handler(handler);
        self
    }

    /// Appends a text route.
    ///
    /// Routes are tried in registration order and the first match wins.
    /// Duplicate patterns are kept; the earlier one always takes priority.
    pub fn add_text_route<H: Handler<Update>>(&mut self, pattern: Regex, handler: H) -> &mut Self {
        debug!(pattern = %pattern, priority = self.text_routes.len(), "Adding text route");
        self.text_routes.push(TextRoute {
            pattern,
            handler: into_handler(handler),
        });
        self
    }

    /// Compiles `pattern` and appends it as a text route.
    pub fn try_add_text_route<H: Handler<Update>>(
        &mut self,
        pattern: &str,
        handler: H,
    ) -> CoreResult<&mut Self> {
        let regex = Regex::new(pattern).map_err(|e| CoreError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(self.add_text_route(regex, handler))
    }

    /// Restores a single slot to the no-op handler.
    pub fn reset(&mut self, slot: EventSlot) -> &mut Self {
        match slot {
            EventSlot::Join => self.join = noop(),
            EventSlot::TriggerButton => self.trigger_button = noop(),
            EventSlot::SubmitForm => self.submit_form = noop(),
            EventSlot::Paid => self.paid = noop(),
            EventSlot::MainText => self.main_text = noop(),
            EventSlot::UnhandledText => self.unhandled_text = noop(),
        }
        self
    }

    /// Returns the `join` handler.
    pub fn join(&self) -> &BoxedHandler<Update> {
        &self.join
    }

    /// Returns the `triggerButton` handler.
    pub fn trigger_button(&self) -> &BoxedHandler<Update> {
        &self.trigger_button
    }

    /// Returns the `submitForm` handler.
    pub fn submit_form(&self) -> &BoxedHandler<Update> {
        &self.submit_form
    }

    /// Returns the catch-all handler.
    pub fn main_text(&self) -> &BoxedHandler<Update> {
        &self.main_text
    }

    /// Returns the unhandled-text handler.
    pub fn unhandled_text(&self) -> &BoxedHandler<Update> {
        &self.unhandled_text
    }

    /// Returns the payment handler.
    pub fn paid(&self) -> &BoxedHandler<Payment> {
        &self.paid
    }

    /// Returns the registered text routes in priority order.
    pub fn text_routes(&self) -> &[TextRoute] {
        &self.text_routes
    }

    /// Returns the first route matching `text`, with its priority index.
    pub fn first_match(&self, text: &str) -> Option<(usize, &TextRoute)> {
        self.text_routes
            .iter()
            .enumerate()
            .find(|(_, route)| route.matches(text))
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("text_routes", &self.text_routes)
            .finish_non_exhaustive()
    }
}
