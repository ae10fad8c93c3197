//! Webhook server.
//!
//! Gap delivers every event as an HTTP request to a single webhook URL.
//! The server accepts requests on any path and method, decodes the body
//! into an [`Update`] and hands it to the [`Dispatcher`]. Handlers run on
//! spawned tasks so the platform gets its acknowledgement immediately.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
};
use gap_core::{DispatchResult, Dispatcher, TransportError, TransportResult, Update};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Serves a [`Dispatcher`] over HTTP.
#[derive(Debug, Clone)]
pub struct WebhookServer {
    dispatcher: Arc<Dispatcher>,
}

impl WebhookServer {
    /// Creates a server around a fully registered dispatcher.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self::from_shared(Arc::new(dispatcher))
    }

    /// Creates a server around a shared dispatcher.
    pub fn from_shared(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Returns the dispatcher.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Builds the axum router. Every path and method reaches the webhook.
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(webhook)
            .with_state(self.dispatcher.clone())
    }

    /// Binds `addr` and serves the webhook until the handle is stopped.
    pub async fn listen(&self, addr: &str) -> TransportResult<ListenerHandle> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| TransportError::Bind {
                addr: addr.to_string(),
                reason: e.to_string(),
            })?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, "Webhook server listening");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let router = self.router();

        let task = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;

            match result {
                Ok(()) => info!(addr = %local_addr, "Webhook server stopped"),
                Err(e) => error!(error = %e, "Webhook server error"),
            }
        });

        Ok(ListenerHandle {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }
}

/// Handle to a running webhook listener.
///
/// Dropping this handle stops the listener.
#[derive(Debug)]
pub struct ListenerHandle {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    /// Returns the bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signals the listener to stop without waiting for it.
    pub fn stop(mut self) {
        self.signal();
    }

    /// Stops the listener and waits for in-flight requests to finish.
    pub async fn shutdown(mut self) {
        self.signal();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    fn signal(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.signal();
    }
}

async fn webhook(
    State(dispatcher): State<Arc<Dispatcher>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    trace!(len = body.len(), "Received webhook request");

    let result = decode(&headers, &body).and_then(|update| dispatcher.dispatch(update));
    match result {
        Ok(dispatch) => {
            let outcome = dispatch.spawn();
            debug!(outcome = ?outcome, "Webhook dispatched");
            StatusCode::OK
        }
        Err(e) => {
            warn!(error = %e, "Rejected webhook request");
            StatusCode::BAD_REQUEST
        }
    }
}

/// Decodes a request body according to its content type.
///
/// Without a recognized content type the body is tried as JSON first and
/// then as a URL-encoded form.
fn decode(headers: &HeaderMap, body: &[u8]) -> DispatchResult<Update> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/x-www-form-urlencoded") {
        Update::from_form(body)
    } else if content_type.starts_with("application/json") {
        Update::from_json(body)
    } else {
        Update::from_json(body).or_else(|_| Update::from_form(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use gap_core::Payment;
    use std::time::Duration;
    use tower::ServiceExt;

    fn request(content_type: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/any/path");
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_json_update_reaches_handler() {
        let (tx, rx) = oneshot::channel();
        let tx = parking_lot::Mutex::new(Some(tx));

        let mut dispatcher = Dispatcher::new();
        dispatcher.registry_mut().on_join(move |update: Update| {
            let tx = tx.lock().take();
            async move {
                if let Some(tx) = tx {
                    let _ = tx.send(update.chat_id);
                }
            }
        });

        let router = WebhookServer::new(dispatcher).router();
        let resp = router
            .oneshot(request(
                Some("application/json"),
                r#"{"type":"join","chat_id":"c1"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let chat_id = tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(chat_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_form_update_reaches_paid_handler() {
        let (tx, rx) = oneshot::channel();
        let tx = parking_lot::Mutex::new(Some(tx));

        let mut dispatcher = Dispatcher::new();
        dispatcher.registry_mut().on_paid(move |payment: Payment| {
            let tx = tx.lock().take();
            async move {
                if let Some(tx) = tx {
                    let _ = tx.send((payment.ref_id, payment.chat_id));
                }
            }
        });

        let router = WebhookServer::new(dispatcher).router();
        let resp = router
            .oneshot(request(
                Some("application/x-www-form-urlencoded"),
                "type=paycallback&chat_id=c1&data=%7B%22ref_id%22%3A%22r9%22%7D",
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let (ref_id, chat_id) = tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ref_id.as_deref(), Some("r9"));
        assert_eq!(chat_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_failing_handler_still_acknowledged() {
        let (tx, rx) = oneshot::channel();
        let tx = parking_lot::Mutex::new(Some(tx));

        let mut dispatcher = Dispatcher::new();
        dispatcher.registry_mut().on_join(move |_: Update| {
            let tx = tx.lock().take();
            async move {
                if let Some(tx) = tx {
                    let _ = tx.send(());
                }
                Err::<(), _>("boom")
            }
        });

        let router = WebhookServer::new(dispatcher).router();
        let resp = router
            .oneshot(request(Some("application/json"), r#"{"type":"join"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_unlabelled_body_falls_back_to_form() {
        let headers = HeaderMap::new();
        let update = decode(&headers, b"type=text&data=hello").unwrap();
        assert_eq!(update.kind, "text");
        assert_eq!(update.text(), Some("hello"));
    }

    #[tokio::test]
    async fn test_unknown_kind_is_acknowledged() {
        let router = WebhookServer::new(Dispatcher::new()).router();
        let resp = router
            .oneshot(request(None, r#"{"type":"somethingNew"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let router = WebhookServer::new(Dispatcher::new()).router();
        let resp = router
            .oneshot(request(Some("application/json"), "{not json"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_payment_is_rejected() {
        let router = WebhookServer::new(Dispatcher::new()).router();
        let resp = router
            .oneshot(request(
                Some("application/json"),
                r#"{"type":"paycallback","data":"[1,2]"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_listen_binds_ephemeral_port() {
        let server = WebhookServer::new(Dispatcher::new());
        let handle = server.listen("127.0.0.1:0").await.unwrap();
        assert_ne!(handle.local_addr().port(), 0);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_listen_reports_bind_failure() {
        let server = WebhookServer::new(Dispatcher::new());
        let err = server.listen("not-an-address").await.unwrap_err();
        assert!(matches!(err, TransportError::Bind { .. }));
    }
}
