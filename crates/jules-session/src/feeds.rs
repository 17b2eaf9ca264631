//! Message and diagnostic log feeds written by the controller and poller.

use std::sync::Arc;

use jules_core::{ChatMessage, FeedView, LogEntry, MsgStore};

/// The two observable sequences a controller produces.
///
/// Writers hold a `Feeds`; presentation layers get read-only [`FeedView`]s.
#[derive(Clone, Default)]
pub struct Feeds {
    messages: Arc<MsgStore<ChatMessage>>,
    logs: Arc<MsgStore<LogEntry>>,
}

impl Feeds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the chat messages.
    #[must_use]
    pub fn messages(&self) -> FeedView<ChatMessage> {
        FeedView::new(Arc::clone(&self.messages))
    }

    /// Read-only view of the diagnostic log.
    #[must_use]
    pub fn logs(&self) -> FeedView<LogEntry> {
        FeedView::new(Arc::clone(&self.logs))
    }

    pub fn push_message(&self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn log_info(&self, text: impl Into<String>) {
        let entry = LogEntry::info(text);
        tracing::info!("{}", entry.text);
        self.logs.push(entry);
    }

    pub fn log_warn(&self, text: impl Into<String>) {
        let entry = LogEntry::warn(text);
        tracing::warn!("{}", entry.text);
        self.logs.push(entry);
    }

    /// Report a failure: one error message and one log entry.
    pub fn report_error(&self, text: impl Into<String>) {
        let text = text.into();
        tracing::error!("{text}");
        self.messages.push(ChatMessage::error(text.clone()));
        self.logs.push(LogEntry::error(text));
    }
}

#[cfg(test)]
mod tests {
    use jules_core::{LogLevel, Role};

    use super::*;

    #[test]
    fn report_error_writes_both_feeds_once() {
        let feeds = Feeds::new();
        feeds.report_error("Error sending message: boom");

        let messages = feeds.messages().history();
        let logs = feeds.logs().history();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::Error);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].level, LogLevel::Error);
        assert_eq!(logs[0].text, "Error sending message: boom");
    }

    #[test]
    fn info_logs_do_not_touch_messages() {
        let feeds = Feeds::new();
        feeds.log_info("Loaded 2 sources");
        assert!(feeds.messages().is_empty());
        assert_eq!(feeds.logs().len(), 1);
    }
}
