//! Inbound event model.
//!
//! Every webhook request carries a single [`Update`]: a flat record with a
//! `type` discriminant, an optional `data` payload and whatever other fields
//! the platform attached. [`Event`] classifies an update into the closed set
//! of kinds the dispatcher understands:
//!
//! ```text
//! Update { type, chat_id, data, from, ..extra }
//! └── Event
//!     ├── Join            ("join")
//!     ├── TriggerButton   ("triggerButton")
//!     ├── SubmitForm      ("submitForm")
//!     ├── PayCallback     ("paycallback", data = JSON object)
//!     ├── Text            ("text")
//!     └── Unknown         (anything else)
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::foundation::error::{DispatchError, DispatchResult};

// ============================================================================
// Update
// ============================================================================

/// A raw inbound webhook record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// Event discriminant (`join`, `text`, `paycallback`, ...).
    #[serde(rename = "type")]
    pub kind: String,

    /// Chat the event originates from.
    #[serde(
        default,
        deserialize_with = "loose_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub chat_id: Option<String>,

    /// Kind-specific payload. Free text for `text`, JSON for `paycallback`.
    #[serde(
        default,
        deserialize_with = "loose_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<String>,

    /// Sender information, as sent by the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Value>,

    /// Every other field of the request body.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Update {
    /// Creates an update of the given kind with no payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Sets the chat id (builder pattern).
    pub fn with_chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }

    /// Sets the data payload (builder pattern).
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Decodes an update from a JSON request body.
    pub fn from_json(body: &[u8]) -> DispatchResult<Self> {
        serde_json::from_slice(body).map_err(|e| DispatchError::malformed_update(e.to_string()))
    }

    /// Decodes an update from a URL-encoded request body.
    pub fn from_form(body: &[u8]) -> DispatchResult<Self> {
        serde_urlencoded::from_bytes(body)
            .map_err(|e| DispatchError::malformed_update(e.to_string()))
    }

    /// Returns the data payload if it is present and non-empty.
    pub fn text(&self) -> Option<&str> {
        self.data.as_deref().filter(|t| !t.is_empty())
    }

    /// Returns an extra field by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Returns the classified discriminant of this update.
    pub fn event_kind(&self) -> EventKind {
        let Ok(kind) = self.kind.parse::<EventKind>();
        kind
    }
}

/// Accepts a string, number or boolean; objects and arrays are kept as JSON text.
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

// ============================================================================
// Event Kind
// ============================================================================

/// The discriminant of an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A user joined the bot.
    Join,
    /// An inline button was pressed.
    TriggerButton,
    /// A form was submitted.
    SubmitForm,
    /// A payment completed.
    PayCallback,
    /// A free-text message.
    Text,
    /// Anything else (images, contacts, locations, ...).
    Unknown,
}

impl EventKind {
    /// Returns the wire name of this kind.
    ///
    /// [`EventKind::Unknown`] has no wire name of its own.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::TriggerButton => "triggerButton",
            Self::SubmitForm => "submitForm",
            Self::PayCallback => "paycallback",
            Self::Text => "text",
            Self::Unknown => "unknown",
        }
    }
}

impl FromStr for EventKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "join" => Self::Join,
            "triggerButton" => Self::TriggerButton,
            "submitForm" => Self::SubmitForm,
            "paycallback" => Self::PayCallback,
            "text" => Self::Text,
            _ => Self::Unknown,
        })
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Event
// ============================================================================

/// A classified inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// `join`
    Join(Update),
    /// `triggerButton`
    TriggerButton(Update),
    /// `submitForm`
    SubmitForm(Update),
    /// `paycallback`
    PayCallback(Update),
    /// `text`
    Text(Update),
    /// Any other discriminant, kept verbatim in the update.
    Unknown(Update),
}

impl Event {
    /// Classifies an update by its `type` field.
    pub fn classify(update: Update) -> Self {
        match update.event_kind() {
            EventKind::Join => Self::Join(update),
            EventKind::TriggerButton => Self::TriggerButton(update),
            EventKind::SubmitForm => Self::SubmitForm(update),
            EventKind::PayCallback => Self::PayCallback(update),
            EventKind::Text => Self::Text(update),
            EventKind::Unknown => Self::Unknown(update),
        }
    }

    /// Returns the kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Join(_) => EventKind::Join,
            Self::TriggerButton(_) => EventKind::TriggerButton,
            Self::SubmitForm(_) => EventKind::SubmitForm,
            Self::PayCallback(_) => EventKind::PayCallback,
            Self::Text(_) => EventKind::Text,
            Self::Unknown(_) => EventKind::Unknown,
        }
    }

    /// Returns the underlying update.
    pub fn update(&self) -> &Update {
        match self {
            Self::Join(u)
            | Self::TriggerButton(u)
            | Self::SubmitForm(u)
            | Self::PayCallback(u)
            | Self::Text(u)
            | Self::Unknown(u) => u,
        }
    }

    /// Consumes the event, returning the underlying update.
    pub fn into_update(self) -> Update {
        match self {
            Self::Join(u)
            | Self::TriggerButton(u)
            | Self::SubmitForm(u)
            | Self::PayCallback(u)
            | Self::Text(u)
            | Self::Unknown(u) => u,
        }
    }
}

impl From<Update> for Event {
    fn from(update: Update) -> Self {
        Self::classify(update)
    }
}

// ============================================================================
// Payment
// ============================================================================

/// The decoded payload of a `paycallback` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment reference, used with `payVerify`.
    #[serde(
        default,
        deserialize_with = "loose_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub ref_id: Option<String>,

    /// Chat the callback arrived in, taken from the update envelope.
    #[serde(skip)]
    pub chat_id: Option<String>,

    /// Remaining payment fields (amount, status, ...).
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Payment {
    /// Parses the `data` field of a payment callback.
    ///
    /// The payload must be a JSON object; anything else is rejected rather
    /// than partially decoded.
    pub fn parse(data: &str) -> DispatchResult<Self> {
        let value: Value =
            serde_json::from_str(data).map_err(|e| DispatchError::MalformedPayment {
                reason: e.to_string(),
            })?;

        if !value.is_object() {
            return Err(DispatchError::MalformedPayment {
                reason: format!("expected a JSON object, got {value}"),
            });
        }

        serde_json::from_value(value).map_err(|e| DispatchError::MalformedPayment {
            reason: e.to_string(),
        })
    }
}
