//! User-facing notices.
//!
//! The synchronization stores never surface errors to callers directly:
//! every public operation resolves, and failures (plus successes worth
//! announcing) arrive on this side channel for the frontend to render as
//! dismissible toasts.

use tokio::sync::mpsc;
use tracing::debug;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A user-visible, dismissible message.
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Sending half handed to the stores.
#[derive(Clone)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<Notice>>,
}

impl Notifier {
    /// Create a notifier and the stream the frontend consumes.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A notifier that drops every notice. For headless callers (the CLI
    /// prints API results directly) and tests that don't assert on notices.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { tx: None }
    }

    /// Announce a successful operation.
    pub fn success(&self, message: impl Into<String>) {
        self.send(NoticeLevel::Success, message.into());
    }

    /// Surface a failure. The store leaves its state unchanged or at a safe
    /// default; the user retries by repeating the action.
    pub fn error(&self, message: impl Into<String>) {
        self.send(NoticeLevel::Error, message.into());
    }

    fn send(&self, level: NoticeLevel, message: String) {
        let Some(tx) = &self.tx else { return };
        if tx.send(Notice { level, message }).is_err() {
            debug!("notice receiver dropped, discarding notice");
        }
    }
}
