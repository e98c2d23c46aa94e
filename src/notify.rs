//! Outbound notification capability.
//!
//! Alert delivery is a capability passed into whatever needs it, never a
//! process-wide singleton. The chat-bot collaborator supplies its own
//! `Notifier`; the crate ships a tracing-backed sink and a collecting sink
//! for tests.

use crate::core::flags::Flag;
use std::sync::Mutex;

/// A shared sink for outbound notifications.
pub trait Notifier: Send + Sync {
    /// Deliver one notification, fire and forget.
    fn notify(&self, text: &str);
}

/// Notifier that writes to the structured log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, text: &str) {
        tracing::info!(target: "pulse_sentinel::notify", "{text}");
    }
}

/// Notifier that collects messages in memory, for tests.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    messages: Mutex<Vec<String>>,
}

impl CollectingNotifier {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered so far.
    pub fn sent(&self) -> Vec<String> {
        self.messages.lock().expect("notifier lock poisoned").clone()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, text: &str) {
        self.messages
            .lock()
            .expect("notifier lock poisoned")
            .push(text.to_string());
    }
}

/// Send one notification per active flag. Quiet when nothing fired.
pub fn alert_flags(notifier: &dyn Notifier, flags: &[Flag]) {
    for flag in flags {
        notifier.notify(&format!("[{}] {}: {}", flag.severity, flag.key, flag.message));
    }
}
