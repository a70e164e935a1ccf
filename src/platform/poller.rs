//! Poller - long-polls `getUpdates` and spawns a task per update.

use super::TelegramApi;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use warden_proto::Update;

/// Pause after a failed poll before trying again.
const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Consumer of incoming updates.
#[async_trait]
pub trait UpdateHandler: Send + Sync + 'static {
    async fn handle_update(&self, update: Update);
}

/// Long-poll loop feeding an [`UpdateHandler`].
///
/// Updates are handled concurrently; the poller does not wait for one
/// handler to finish before dispatching the next.
pub struct Poller<H> {
    api: Arc<TelegramApi>,
    handler: Arc<H>,
    timeout: Duration,
    offset: i64,
}

impl<H: UpdateHandler> Poller<H> {
    pub fn new(api: Arc<TelegramApi>, handler: Arc<H>, timeout: Duration) -> Self {
        Self {
            api,
            handler,
            timeout,
            offset: 0,
        }
    }

    /// Run until the task is dropped.
    pub async fn run(mut self) {
        info!(timeout_secs = self.timeout.as_secs(), "Polling for updates");
        loop {
            self.poll_once().await;
        }
    }

    /// Fetch one batch and dispatch it. Returns the number of updates seen.
    async fn poll_once(&mut self) -> usize {
        match self.api.get_updates(self.offset, self.timeout).await {
            Ok(updates) => {
                let count = updates.len();
                for update in updates {
                    self.offset = self.offset.max(update.update_id + 1);
                    debug!(update_id = update.update_id, "Dispatching update");

                    let handler = Arc::clone(&self.handler);
                    tokio::spawn(async move {
                        handler.handle_update(update).await;
                    });
                }
                count
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch updates");
                tokio::time::sleep(RETRY_DELAY).await;
                0
            }
        }
    }
}
