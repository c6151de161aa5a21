//! Redirect side-channel
//!
//! The evaluator never navigates itself. On a denial with a redirect target
//! it hands a [`RedirectRequest`] to the host's [`Navigator`].
//!
//! - `ChannelNavigator`: forwards requests over an mpsc channel
//! - `NoopNavigator`: drops them, for hosts that only read the verdict
//! - Closures implement `Navigator` directly

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// A request to navigate elsewhere after a denial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRequest {
    /// Navigation commands (path segments, or a single path)
    pub commands: Vec<String>,

    /// Path of the route that was denied
    pub denied_path: String,
}

impl RedirectRequest {
    /// Create a redirect request
    pub fn new(commands: Vec<String>, denied_path: impl Into<String>) -> Self {
        Self {
            commands,
            denied_path: denied_path.into(),
        }
    }
}

/// The host's navigation-trigger primitive
///
/// Redirects are fire-and-forget; implementations must not block.
pub trait Navigator: Send + Sync {
    /// Trigger navigation for a redirect request
    fn navigate(&self, request: &RedirectRequest);
}

impl<F> Navigator for F
where
    F: Fn(&RedirectRequest) + Send + Sync,
{
    fn navigate(&self, request: &RedirectRequest) {
        (self)(request)
    }
}

/// Navigator that ignores every request
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, request: &RedirectRequest) {
        tracing::trace!("Dropping redirect to {:?}", request.commands);
    }
}

/// Navigator that forwards requests to the host over a channel
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<RedirectRequest>,
}

impl ChannelNavigator {
    /// Create a navigator and the receiver the host reads redirects from
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RedirectRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, request: &RedirectRequest) {
        if self.tx.send(request.clone()).is_err() {
            tracing::warn!(
                "Redirect receiver closed, dropping redirect to {:?}",
                request.commands
            );
        }
    }
}
