//! Outbound action builders.
//!
//! Every outbound call is an [`OutboundAction`]: the API [`Method`] plus an
//! ordered list of string parameters that becomes the URL-encoded request
//! body. Message sends additionally carry a `type` parameter.
//!
//! | Builder | Method | `type` |
//! |---------|--------|--------|
//! | [`send_text`] | `sendMessage` | `text` |
//! | [`send_media`] | `sendMessage` | `image` / `video` / `file` / `audio` |
//! | [`edit_text`] | `editMessage` | - |
//! | [`delete_message`] | `deleteMessage` | - |
//! | [`answer_callback`] | `answerCallback` | - |
//! | [`pay_verify`] | `payVerify` | - |

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::foundation::error::{OutboundError, OutboundResult};
use crate::integration::keyboard::{Form, InlineKeyboard, ReplyKeyboard};

// ============================================================================
// Method and message types
// ============================================================================

/// Remote API method, appended to the base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `sendMessage`
    SendMessage,
    /// `editMessage`
    EditMessage,
    /// `deleteMessage`
    DeleteMessage,
    /// `answerCallback`
    AnswerCallback,
    /// `payVerify`
    PayVerify,
    /// `upload`
    Upload,
}

impl Method {
    /// Returns the wire name of this method.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SendMessage => "sendMessage",
            Self::EditMessage => "editMessage",
            Self::DeleteMessage => "deleteMessage",
            Self::AnswerCallback => "answerCallback",
            Self::PayVerify => "payVerify",
            Self::Upload => "upload",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of media that go through the upload step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// `image`
    Image,
    /// `video`
    Video,
    /// `file`
    File,
    /// `audio`
    Audio,
}

impl MediaKind {
    /// Returns the wire name, used both as message `type` and upload field name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::File => "file",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `type` tag of a `sendMessage` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Plain text.
    Text,
    /// Uploaded media.
    Media(MediaKind),
}

impl MessageType {
    /// Returns the wire name of this message type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Media(kind) => kind.as_str(),
        }
    }
}

impl From<MediaKind> for MessageType {
    fn from(kind: MediaKind) -> Self {
        Self::Media(kind)
    }
}

// ============================================================================
// OutboundAction
// ============================================================================

/// A single outbound API call, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundAction {
    method: Method,
    params: Vec<(String, String)>,
}

impl OutboundAction {
    /// Creates an action with no parameters.
    pub fn new(method: Method) -> Self {
        Self {
            method,
            params: Vec::new(),
        }
    }

    /// Appends a parameter (builder pattern).
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Appends a parameter when `value` is present (builder pattern).
    pub fn param_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Tags the action with a message type (builder pattern).
    pub fn message_type(self, message_type: MessageType) -> Self {
        self.param("type", message_type.as_str())
    }

    /// Returns the API method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Returns the parameters in insertion order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Returns the first value of a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

// ============================================================================
// Media sources
// ============================================================================

/// Where the content of a media message comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSource {
    /// A local file, uploaded before sending.
    Path(PathBuf),
    /// The result of an earlier upload, sent as is.
    Uploaded(Value),
}

impl From<PathBuf> for MediaSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for MediaSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for MediaSource {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<String> for MediaSource {
    fn from(path: String) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<Value> for MediaSource {
    fn from(value: Value) -> Self {
        Self::Uploaded(value)
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Optional attachments of a text message.
#[derive(Debug, Clone, Default)]
pub struct TextOptions {
    /// Reply keyboard replacing the user's keyboard.
    pub reply_keyboard: Option<ReplyKeyboard>,
    /// Inline buttons below the message.
    pub inline_keyboard: Option<InlineKeyboard>,
    /// Form attached to the message.
    pub form: Option<Form>,
}

impl TextOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reply keyboard (builder pattern).
    pub fn reply_keyboard(mut self, keyboard: ReplyKeyboard) -> Self {
        self.reply_keyboard = Some(keyboard);
        self
    }

    /// Sets the inline keyboard (builder pattern).
    pub fn inline_keyboard(mut self, keyboard: InlineKeyboard) -> Self {
        self.inline_keyboard = Some(keyboard);
        self
    }

    /// Sets the form (builder pattern).
    pub fn form(mut self, form: Form) -> Self {
        self.form = Some(form);
        self
    }
}

/// Builds a text message.
pub fn send_text(
    chat_id: &str,
    text: &str,
    options: &TextOptions,
) -> OutboundResult<OutboundAction> {
    let reply = options
        .reply_keyboard
        .as_ref()
        .map(ReplyKeyboard::to_param)
        .transpose()?;
    let inline = options
        .inline_keyboard
        .as_ref()
        .map(InlineKeyboard::to_param)
        .transpose()?;
    let form = options.form.as_ref().map(Form::to_param).transpose()?;

    Ok(OutboundAction::new(Method::SendMessage)
        .param("chat_id", chat_id)
        .param("data", text)
        .param_opt("reply_keyboard", reply)
        .param_opt("inline_keyboard", inline)
        .param_opt("form", form)
        .message_type(MessageType::Text))
}

/// Merges an upload result with the caller's description.
///
/// # Errors
///
/// Returns [`OutboundError::Upload`] if the upload result is not a JSON object.
pub fn media_payload(upload: Value, desc: &str) -> OutboundResult<Value> {
    match upload {
        Value::Object(mut object) => {
            object.insert("desc".to_string(), Value::from(desc));
            Ok(Value::Object(object))
        }
        other => Err(OutboundError::Upload(format!(
            "upload response is not an object: {other}"
        ))),
    }
}

/// Builds a media message from an uploaded payload.
pub fn send_media(
    kind: MediaKind,
    chat_id: &str,
    payload: &Value,
    reply_keyboard: Option<&ReplyKeyboard>,
) -> OutboundResult<OutboundAction> {
    let reply = reply_keyboard.map(ReplyKeyboard::to_param).transpose()?;

    Ok(OutboundAction::new(Method::SendMessage)
        .param("chat_id", chat_id)
        .param("data", serde_json::to_string(payload)?)
        .param_opt("reply_keyboard", reply)
        .message_type(kind.into()))
}

/// Builds an edit of a previously sent text message.
pub fn edit_text(
    chat_id: &str,
    message_id: &str,
    data: Option<&str>,
    inline_keyboard: Option<&InlineKeyboard>,
) -> OutboundResult<OutboundAction> {
    let inline = inline_keyboard.map(InlineKeyboard::to_param).transpose()?;

    Ok(OutboundAction::new(Method::EditMessage)
        .param("chat_id", chat_id)
        .param("message_id", message_id)
        .param_opt("data", data.filter(|d| !d.is_empty()))
        .param_opt("inline_keyboard", inline))
}

/// Builds a message deletion.
pub fn delete_message(chat_id: &str, message_id: &str) -> OutboundAction {
    OutboundAction::new(Method::DeleteMessage)
        .param("chat_id", chat_id)
        .param("message_id", message_id)
}

/// Builds the answer to a `triggerButton` callback.
pub fn answer_callback(
    chat_id: &str,
    callback_id: &str,
    text: &str,
    show_alert: bool,
) -> OutboundAction {
    OutboundAction::new(Method::AnswerCallback)
        .param("chat_id", chat_id)
        .param("callback_id", callback_id)
        .param("text", text)
        .param("show_alert", show_alert.to_string())
}

/// Builds a payment verification request.
pub fn pay_verify(chat_id: &str, ref_id: &str) -> OutboundAction {
    OutboundAction::new(Method::PayVerify)
        .param("chat_id", chat_id)
        .param("ref_id", ref_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::keyboard::{Button, InlineButton};
    use serde_json::json;

    #[test]
    fn test_send_text_with_reply_keyboard() {
        let keyboard = ReplyKeyboard::from_value(&json!([[{"OK": "OK"}]])).unwrap();
        let options = TextOptions::new().reply_keyboard(keyboard);
        let action = send_text("chat", "hi", &options).unwrap();

        assert_eq!(action.method(), Method::SendMessage);
        assert_eq!(action.get("chat_id"), Some("chat"));
        assert_eq!(action.get("data"), Some("hi"));
        assert_eq!(action.get("type"), Some("text"));

        let reply: Value = serde_json::from_str(action.get("reply_keyboard").unwrap()).unwrap();
        assert_eq!(reply["once"], json!(true));
        assert_eq!(reply["selective"], json!(false));
        assert_eq!(reply["keyboard"], json!([[{"OK": "OK"}]]));
    }

    #[test]
    fn test_send_text_plain_has_no_attachments() {
        let action = send_text("chat", "hi", &TextOptions::default()).unwrap();
        let keys: Vec<_> = action.params().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["chat_id", "data", "type"]);
    }

    #[test]
    fn test_send_text_with_inline_keyboard_and_form() {
        let options = TextOptions::new()
            .inline_keyboard(InlineKeyboard::new(vec![vec![InlineButton::callback(
                "A", "a",
            )]]))
            .form(Form::new());
        let action = send_text("chat", "pick", &options).unwrap();

        assert_eq!(
            action.get("inline_keyboard"),
            Some(r#"[[{"text":"A","cb_data":"a"}]]"#)
        );
        assert_eq!(action.get("form"), Some("[]"));
    }

    #[test]
    fn test_media_payload_merges_desc() {
        let payload = media_payload(json!({"SID": "x1", "type": "image"}), "a cat").unwrap();
        assert_eq!(payload, json!({"SID": "x1", "type": "image", "desc": "a cat"}));
    }

    #[test]
    fn test_media_payload_rejects_non_object() {
        assert!(matches!(
            media_payload(json!("oops"), ""),
            Err(OutboundError::Upload(_))
        ));
    }

    #[test]
    fn test_send_media_tags_kind() {
        let keyboard = ReplyKeyboard::new(vec![vec![Button::text("Next")]]);
        let payload = json!({"SID": "v"});
        let action = send_media(MediaKind::Video, "chat", &payload, Some(&keyboard)).unwrap();

        assert_eq!(action.get("type"), Some("video"));
        assert_eq!(action.get("data"), Some(r#"{"SID":"v"}"#));
        assert!(action.get("reply_keyboard").is_some());
    }

    #[test]
    fn test_edit_text_omits_empty_fields() {
        let action = edit_text("chat", "m1", None, None).unwrap();
        assert_eq!(action.method(), Method::EditMessage);
        assert_eq!(action.get("message_id"), Some("m1"));
        assert_eq!(action.get("data"), None);
        assert_eq!(action.get("type"), None);
    }

    #[test]
    fn test_untyped_actions() {
        let answer = answer_callback("chat", "cb1", "Done", true);
        assert_eq!(answer.method(), Method::AnswerCallback);
        assert_eq!(answer.get("show_alert"), Some("true"));

        let verify = pay_verify("chat", "ref");
        assert_eq!(verify.method().as_str(), "payVerify");
        assert_eq!(verify.get("ref_id"), Some("ref"));

        let delete = delete_message("chat", "m1");
        assert_eq!(delete.method().as_str(), "deleteMessage");
        assert_eq!(delete.get("type"), None);
    }
}
