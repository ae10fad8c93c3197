//! The outbound transport seam.
//!
//! [`ApiTransport`] is the only point where the SDK touches the network for
//! outbound calls. `gap-transport` provides the HTTP implementation; tests
//! and alternative clients can provide their own.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::foundation::error::OutboundResult;
use crate::integration::action::{MediaKind, OutboundAction};

/// Performs outbound API calls.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Sends an action to the remote API.
    ///
    /// Succeeds on any 2xx response. Nothing is retried.
    async fn call(&self, action: &OutboundAction) -> OutboundResult<()>;

    /// Uploads a local file, returning the platform's description of it.
    ///
    /// The file is sent under a form field named after `kind`.
    async fn upload(&self, kind: MediaKind, path: &Path) -> OutboundResult<Value>;
}

/// A shareable transport.
pub type BoxedTransport = Arc<dyn ApiTransport>;
