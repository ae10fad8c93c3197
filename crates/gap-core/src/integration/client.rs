//! Outbound client.
//!
//! [`GapClient`] is the application-facing side of the outbound path: it
//! validates arguments, builds the [`OutboundAction`] and hands it to the
//! configured [`ApiTransport`].
//!
//! ```rust,ignore
//! let client = bot.client();
//!
//! client.send_text(&chat_id, "Hello!", &TextOptions::default()).await?;
//! client.send_image(&chat_id, "cat.jpg", "a cat", None).await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{Instrument, Level, debug, span, warn};

use crate::foundation::error::{OutboundError, OutboundResult};
use crate::integration::action::{self, MediaKind, MediaSource, OutboundAction, TextOptions};
use crate::integration::keyboard::{InlineKeyboard, ReplyKeyboard};
use crate::integration::transport::{ApiTransport, BoxedTransport};

/// Sends messages and other actions to the Gap API.
///
/// Cloning is cheap; clones share the transport.
#[derive(Clone)]
pub struct GapClient {
    transport: BoxedTransport,
}

impl GapClient {
    /// Creates a client over a transport.
    pub fn new(transport: BoxedTransport) -> Self {
        Self { transport }
    }

    /// Creates a client from a concrete transport.
    pub fn from_transport<T: ApiTransport + 'static>(transport: T) -> Self {
        Self::new(Arc::new(transport))
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &BoxedTransport {
        &self.transport
    }

    /// Sends a built action.
    pub async fn execute(&self, action: &OutboundAction) -> OutboundResult<()> {
        let span = span!(Level::DEBUG, "api_call", method = %action.method());
        async {
            debug!(params = action.params().len(), "Calling API");
            let result = self.transport.call(action).await;
            if let Err(e) = &result {
                warn!(error = %e, "API call failed");
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Sends a text message.
    pub async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        options: &TextOptions,
    ) -> OutboundResult<()> {
        let action = action::send_text(chat_id, text, options)?;
        self.execute(&action).await
    }

    /// Sends an image.
    pub async fn send_image(
        &self,
        chat_id: &str,
        image: impl Into<MediaSource>,
        desc: &str,
        reply_keyboard: Option<&ReplyKeyboard>,
    ) -> OutboundResult<()> {
        self.send_media(MediaKind::Image, chat_id, image.into(), desc, reply_keyboard)
            .await
    }

    /// Sends a video.
    pub async fn send_video(
        &self,
        chat_id: &str,
        video: impl Into<MediaSource>,
        desc: &str,
        reply_keyboard: Option<&ReplyKeyboard>,
    ) -> OutboundResult<()> {
        self.send_media(MediaKind::Video, chat_id, video.into(), desc, reply_keyboard)
            .await
    }

    /// Sends a file.
    pub async fn send_file(
        &self,
        chat_id: &str,
        file: impl Into<MediaSource>,
        desc: &str,
        reply_keyboard: Option<&ReplyKeyboard>,
    ) -> OutboundResult<()> {
        self.send_media(MediaKind::File, chat_id, file.into(), desc, reply_keyboard)
            .await
    }

    /// Sends an audio clip.
    pub async fn send_audio(
        &self,
        chat_id: &str,
        audio: impl Into<MediaSource>,
        desc: &str,
        reply_keyboard: Option<&ReplyKeyboard>,
    ) -> OutboundResult<()> {
        self.send_media(MediaKind::Audio, chat_id, audio.into(), desc, reply_keyboard)
            .await
    }

    /// Sends a media message of any kind.
    ///
    /// A [`MediaSource::Path`] is checked for existence before anything is
    /// sent, then uploaded and merged with `desc`. A
    /// [`MediaSource::Uploaded`] value is sent as is.
    ///
    /// # Errors
    ///
    /// - [`OutboundError::InvalidPath`] if the path does not exist
    /// - [`OutboundError::Upload`] if the upload step fails
    /// - any error of the final send
    pub async fn send_media(
        &self,
        kind: MediaKind,
        chat_id: &str,
        source: MediaSource,
        desc: &str,
        reply_keyboard: Option<&ReplyKeyboard>,
    ) -> OutboundResult<()> {
        let payload = match source {
            MediaSource::Path(path) => {
                check_path(kind, &path)?;
                let uploaded = self.upload(kind, &path).await?;
                action::media_payload(uploaded, desc)?
            }
            MediaSource::Uploaded(value) => value,
        };

        let action = action::send_media(kind, chat_id, &payload, reply_keyboard)?;
        self.execute(&action).await
    }

    /// Uploads a local file without sending it.
    ///
    /// The returned value can be passed back as [`MediaSource::Uploaded`].
    pub async fn upload(&self, kind: MediaKind, path: &Path) -> OutboundResult<Value> {
        check_path(kind, path)?;
        debug!(kind = %kind, path = %path.display(), "Uploading media");

        self.transport.upload(kind, path).await.map_err(|e| {
            warn!(kind = %kind, error = %e, "Upload failed");
            match e {
                OutboundError::Upload(_) => e,
                other => OutboundError::Upload(other.to_string()),
            }
        })
    }

    /// Edits a text message's content and/or inline keyboard.
    pub async fn edit_text(
        &self,
        chat_id: &str,
        message_id: &str,
        data: Option<&str>,
        inline_keyboard: Option<&InlineKeyboard>,
    ) -> OutboundResult<()> {
        let action = action::edit_text(chat_id, message_id, data, inline_keyboard)?;
        self.execute(&action).await
    }

    /// Deletes a message.
    pub async fn delete_message(&self, chat_id: &str, message_id: &str) -> OutboundResult<()> {
        self.execute(&action::delete_message(chat_id, message_id)).await
    }

    /// Answers a `triggerButton` callback.
    pub async fn answer_callback(
        &self,
        chat_id: &str,
        callback_id: &str,
        text: &str,
        show_alert: bool,
    ) -> OutboundResult<()> {
        self.execute(&action::answer_callback(chat_id, callback_id, text, show_alert))
            .await
    }

    /// Verifies a payment by its reference id.
    pub async fn pay_verify(&self, chat_id: &str, ref_id: &str) -> OutboundResult<()> {
        self.execute(&action::pay_verify(chat_id, ref_id)).await
    }
}

impl std::fmt::Debug for GapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GapClient").finish_non_exhaustive()
    }
}

fn check_path(kind: MediaKind, path: &Path) -> OutboundResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(OutboundError::InvalidPath {
            kind: kind.as_str(),
            path: path.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::action::Method;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::io::Write;

    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<OutboundAction>>,
        uploads: Mutex<Vec<MediaKind>>,
        fail_upload: bool,
    }

    #[async_trait]
    impl ApiTransport for RecordingTransport {
        async fn call(&self, action: &OutboundAction) -> OutboundResult<()> {
            self.calls.lock().push(action.clone());
            Ok(())
        }

        async fn upload(&self, kind: MediaKind, _path: &Path) -> OutboundResult<Value> {
            self.uploads.lock().push(kind);
            if self.fail_upload {
                return Err(OutboundError::request(Some(500), "disk full"));
            }
            Ok(json!({"SID": "file-1", "type": kind.as_str()}))
        }
    }

    fn client() -> (GapClient, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        (GapClient::new(transport.clone()), transport)
    }

    #[tokio::test]
    async fn test_missing_path_fails_before_network() {
        let (client, transport) = client();

        let err = client
            .send_image("chat", "/nonexistent/path.png", "", None)
            .await
            .unwrap_err();

        assert!(matches!(err, OutboundError::InvalidPath { kind: "image", .. }));
        assert!(transport.uploads.lock().is_empty());
        assert!(transport.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_path_is_uploaded_then_sent() {
        let (client, transport) = client();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not really a video").unwrap();

        client
            .send_video("chat", file.path(), "clip", None)
            .await
            .unwrap();

        assert_eq!(*transport.uploads.lock(), [MediaKind::Video]);
        let calls = transport.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method(), Method::SendMessage);
        assert_eq!(calls[0].get("type"), Some("video"));

        let data: Value = serde_json::from_str(calls[0].get("data").unwrap()).unwrap();
        assert_eq!(data, json!({"SID": "file-1", "type": "video", "desc": "clip"}));
    }

    #[tokio::test]
    async fn test_uploaded_source_skips_upload() {
        let (client, transport) = client();

        client
            .send_audio("chat", json!({"SID": "a1"}), "", None)
            .await
            .unwrap();

        assert!(transport.uploads.lock().is_empty());
        assert_eq!(transport.calls.lock()[0].get("data"), Some(r#"{"SID":"a1"}"#));
    }

    #[tokio::test]
    async fn test_upload_failure_is_wrapped() {
        let transport = Arc::new(RecordingTransport {
            fail_upload: true,
            ..Default::default()
        });
        let client = GapClient::new(transport.clone());
        let file = tempfile::NamedTempFile::new().unwrap();

        let err = client
            .send_file("chat", file.path(), "", None)
            .await
            .unwrap_err();

        assert!(matches!(err, OutboundError::Upload(_)));
        assert!(transport.calls.lock().is_empty());

        // A failed upload does not poison later sends.
        client
            .send_text("chat", "still here", &TextOptions::default())
            .await
            .unwrap();
        assert_eq!(transport.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_untyped_methods() {
        let (client, transport) = client();

        client.edit_text("chat", "m1", Some("new"), None).await.unwrap();
        client.delete_message("chat", "m1").await.unwrap();
        client.answer_callback("chat", "cb", "ok", false).await.unwrap();
        client.pay_verify("chat", "ref").await.unwrap();

        let methods: Vec<_> = transport.calls.lock().iter().map(|a| a.method()).collect();
        assert_eq!(
            methods,
            [
                Method::EditMessage,
                Method::DeleteMessage,
                Method::AnswerCallback,
                Method::PayVerify
            ]
        );
    }
}
