//! Reply keyboards, inline keyboards and forms.
//!
//! All three travel as JSON-encoded strings inside the URL-encoded request
//! body, so each type exposes `to_param` producing that string.
//!
//! ```text
//! reply_keyboard  = {"keyboard":[[{"yes":"Yes"},{"no":"No"}]],"once":true,"selective":false}
//! inline_keyboard = [[{"text":"Open","cb_data":"open"}]]
//! form            = [{"name":"email","type":"text","label":"Email"}]
//! ```

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::foundation::error::{OutboundError, OutboundResult};

// ============================================================================
// Reply Keyboard
// ============================================================================

/// A reply-keyboard button, encoded on the wire as `{value: label}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// The text sent back when the button is pressed.
    pub value: String,
    /// The text shown on the button.
    pub label: String,
}

impl Button {
    /// Creates a button.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Creates a button whose label equals its value.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(text.clone(), text)
    }

    /// Creates a button that asks for the user's contact.
    pub fn request_contact(label: impl Into<String>) -> Self {
        Self::new("$contact", label)
    }

    /// Creates a button that asks for the user's location.
    pub fn request_location(label: impl Into<String>) -> Self {
        Self::new("$location", label)
    }

    fn from_value(value: &Value) -> OutboundResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            OutboundError::InvalidKeyboard(format!("button must be an object, got {value}"))
        })?;

        match object.iter().next() {
            Some((key, Value::String(label))) if object.len() == 1 => {
                Ok(Self::new(key.clone(), label.clone()))
            }
            _ => Err(OutboundError::InvalidKeyboard(format!(
                "button must be a single {{value: label}} pair, got {value}"
            ))),
        }
    }
}

impl Serialize for Button {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.value, &self.label)?;
        map.end()
    }
}

/// A reply keyboard: rows of buttons replacing the user's keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyKeyboard {
    /// Button rows, top to bottom.
    pub keyboard: Vec<Vec<Button>>,
    /// Hide the keyboard after one use.
    pub once: bool,
    /// Show the keyboard only to mentioned users.
    pub selective: bool,
}

impl ReplyKeyboard {
    /// Creates a keyboard with `once = true` and `selective = false`.
    pub fn new(rows: Vec<Vec<Button>>) -> Self {
        Self {
            keyboard: rows,
            once: true,
            selective: false,
        }
    }

    /// Sets the `once` flag (builder pattern).
    pub fn once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    /// Sets the `selective` flag (builder pattern).
    pub fn selective(mut self, selective: bool) -> Self {
        self.selective = selective;
        self
    }

    /// Builds a keyboard from an untyped value such as `[[{"OK":"OK"}]]`.
    ///
    /// # Errors
    ///
    /// Returns [`OutboundError::InvalidKeyboard`] unless `value` is an array
    /// of rows, each row an array of `{value: label}` objects.
    pub fn from_value(value: &Value) -> OutboundResult<Self> {
        let rows = value.as_array().ok_or_else(|| {
            OutboundError::InvalidKeyboard("keyboard must be an array of rows".to_string())
        })?;

        let keyboard = rows
            .iter()
            .map(|row| {
                row.as_array()
                    .ok_or_else(|| {
                        OutboundError::InvalidKeyboard(format!("row must be an array, got {row}"))
                    })?
                    .iter()
                    .map(Button::from_value)
                    .collect::<OutboundResult<Vec<_>>>()
            })
            .collect::<OutboundResult<Vec<_>>>()?;

        Ok(Self::new(keyboard))
    }

    /// Encodes the keyboard as a request parameter.
    pub fn to_param(&self) -> OutboundResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Inline Keyboard
// ============================================================================

/// A button attached below a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    /// Button caption.
    pub text: String,
    /// Callback data delivered with the `triggerButton` event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cb_data: Option<String>,
    /// URL opened when the button is pressed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineButton {
    /// Creates a callback button.
    pub fn callback(text: impl Into<String>, cb_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cb_data: Some(cb_data.into()),
            url: None,
        }
    }

    /// Creates a link button.
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cb_data: None,
            url: Some(url.into()),
        }
    }
}

/// Rows of inline buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InlineKeyboard(pub Vec<Vec<InlineButton>>);

impl InlineKeyboard {
    /// Creates an inline keyboard from rows.
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self(rows)
    }

    /// Appends a row (builder pattern).
    pub fn row(mut self, row: Vec<InlineButton>) -> Self {
        self.0.push(row);
        self
    }

    /// Encodes the keyboard as a request parameter.
    pub fn to_param(&self) -> OutboundResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Form
// ============================================================================

/// Input type of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single-line text.
    Text,
    /// Multi-line text.
    Textarea,
    /// One of several options.
    Radio,
    /// Drop-down list.
    Select,
    /// Boolean toggle.
    Checkbox,
    /// The submit button.
    Submit,
}

/// A single form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    /// Key under which the value is submitted.
    pub name: String,
    /// Input type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Caption shown to the user.
    pub label: String,
    /// Choices for `radio` and `select` fields.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Button>,
}

impl FormField {
    /// Creates a field without options.
    pub fn new(name: impl Into<String>, field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type,
            label: label.into(),
            options: Vec::new(),
        }
    }

    /// Adds an option (builder pattern).
    pub fn option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.push(Button::new(value, label));
        self
    }
}

/// A form sent along with a text message; answers arrive as `submitForm` events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Form(pub Vec<FormField>);

impl Form {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field (builder pattern).
    pub fn field(mut self, field: FormField) -> Self {
        self.0.push(field);
        self
    }

    /// Encodes the form as a request parameter.
    pub fn to_param(&self) -> OutboundResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_keyboard_defaults() {
        let keyboard = ReplyKeyboard::new(vec![vec![Button::text("OK")]]);
        assert_eq!(
            keyboard.to_param().unwrap(),
            r#"{"keyboard":[[{"OK":"OK"}]],"once":true,"selective":false}"#
        );
    }

    #[test]
    fn test_reply_keyboard_flags_override() {
        let keyboard = ReplyKeyboard::new(vec![]).once(false).selective(true);
        assert!(!keyboard.once);
        assert!(keyboard.selective);
    }

    #[test]
    fn test_from_value_accepts_rows() {
        let keyboard = ReplyKeyboard::from_value(&json!([
            [{"yes": "Yes"}, {"no": "No"}],
            [{"$contact": "Share"}]
        ]))
        .unwrap();

        assert_eq!(keyboard.keyboard.len(), 2);
        assert_eq!(keyboard.keyboard[0][1], Button::new("no", "No"));
        assert_eq!(keyboard.keyboard[1][0], Button::request_contact("Share"));
    }

    #[test]
    fn test_from_value_rejects_non_rows() {
        for value in [
            json!({"OK": "OK"}),
            json!("OK"),
            json!([{"OK": "OK"}]),
            json!([["OK"]]),
            json!([[{"a": "A", "b": "B"}]]),
        ] {
            assert!(matches!(
                ReplyKeyboard::from_value(&value),
                Err(OutboundError::InvalidKeyboard(_))
            ));
        }
    }

    #[test]
    fn test_inline_keyboard_param() {
        let keyboard = InlineKeyboard::default()
            .row(vec![InlineButton::callback("Buy", "buy")])
            .row(vec![InlineButton::link("Site", "https://gap.im")]);

        assert_eq!(
            keyboard.to_param().unwrap(),
            r#"[[{"text":"Buy","cb_data":"buy"}],[{"text":"Site","url":"https://gap.im"}]]"#
        );
    }

    #[test]
    fn test_form_param() {
        let form = Form::new()
            .field(FormField::new("size", FieldType::Radio, "Size").option("s", "Small"))
            .field(FormField::new("send", FieldType::Submit, "Send"));

        assert_eq!(
            form.to_param().unwrap(),
            r#"[{"name":"size","type":"radio","label":"Size","options":[{"s":"Small"}]},{"name":"send","type":"submit","label":"Send"}]"#
        );
    }
}
