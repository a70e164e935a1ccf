//! Command timing and tracing spans.

use std::time::Instant;

/// Drop guard observing `warden_command_duration_seconds` for one command.
pub struct CommandTimer {
    name: String,
    started: Instant,
}

impl CommandTimer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        crate::metrics::record_command(&self.name, self.started.elapsed().as_secs_f64());
    }
}

/// Span constructors shared by the poller and the dispatcher.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span covering one incoming update.
    pub fn update(update_id: i64, chat_id: Option<i64>) -> Span {
        if let Some(chat_id) = chat_id {
            info_span!("update", update_id, chat_id)
        } else {
            info_span!("update", update_id)
        }
    }

    /// Span for a command execution.
    pub fn command(name: &str, issuer: Option<i64>) -> Span {
        if let Some(issuer) = issuer {
            info_span!("command", name = %name, issuer)
        } else {
            info_span!("command", name = %name)
        }
    }
}
