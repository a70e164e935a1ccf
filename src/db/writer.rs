//! Single-writer store actor.
//!
//! The actor task owns the [`Document`]. Every read and mutation is a
//! message with a oneshot reply, so mutations from concurrent update tasks
//! are applied one at a time and each full-document rewrite sees every
//! earlier change.

use super::{Document, StoreError, WelcomeConfig, load, save};
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

/// Queue depth before senders wait on the writer.
const QUEUE_DEPTH: usize = 256;

enum StoreCommand {
    GetWelcome {
        chat_id: i64,
        reply_tx: oneshot::Sender<Option<WelcomeConfig>>,
    },
    SetWelcome {
        chat_id: i64,
        config: WelcomeConfig,
        reply_tx: oneshot::Sender<()>,
    },
    ClearWelcome {
        chat_id: i64,
        reply_tx: oneshot::Sender<bool>,
    },
    SetLastWelcome {
        chat_id: i64,
        message_id: i64,
        reply_tx: oneshot::Sender<bool>,
    },
    Warn {
        chat_id: i64,
        user_id: i64,
        reply_tx: oneshot::Sender<u32>,
    },
    #[cfg(test)]
    WarnCount {
        chat_id: i64,
        user_id: i64,
        reply_tx: oneshot::Sender<u32>,
    },
    #[cfg(test)]
    Snapshot {
        reply_tx: oneshot::Sender<Document>,
    },
}

struct StoreActor {
    path: PathBuf,
    doc: Document,
}

impl StoreActor {
    async fn run(mut self, mut rx: mpsc::Receiver<StoreCommand>) {
        while let Some(cmd) = rx.recv().await {
            self.handle(cmd).await;
        }
        debug!(path = %self.path.display(), "Store writer stopped");
    }

    async fn handle(&mut self, cmd: StoreCommand) {
        match cmd {
            StoreCommand::GetWelcome { chat_id, reply_tx } => {
                let _ = reply_tx.send(self.doc.welcomes.get(&chat_id).cloned());
            }
            StoreCommand::SetWelcome {
                chat_id,
                config,
                reply_tx,
            } => {
                self.doc.welcomes.insert(chat_id, config);
                self.persist().await;
                let _ = reply_tx.send(());
            }
            StoreCommand::ClearWelcome { chat_id, reply_tx } => {
                let removed = self.doc.welcomes.remove(&chat_id).is_some();
                if removed {
                    self.persist().await;
                }
                let _ = reply_tx.send(removed);
            }
            StoreCommand::SetLastWelcome {
                chat_id,
                message_id,
                reply_tx,
            } => {
                // A clear that landed after the send must not resurrect the record.
                let updated = match self.doc.welcomes.get_mut(&chat_id) {
                    Some(config) => {
                        config.last_welcome_message_id = Some(message_id);
                        true
                    }
                    None => false,
                };
                if updated {
                    self.persist().await;
                }
                let _ = reply_tx.send(updated);
            }
            StoreCommand::Warn {
                chat_id,
                user_id,
                reply_tx,
            } => {
                let count = self.doc.add_warn(chat_id, user_id);
                self.persist().await;
                let _ = reply_tx.send(count);
            }
            #[cfg(test)]
            StoreCommand::WarnCount {
                chat_id,
                user_id,
                reply_tx,
            } => {
                let _ = reply_tx.send(self.doc.warn_count(chat_id, user_id));
            }
            #[cfg(test)]
            StoreCommand::Snapshot { reply_tx } => {
                let _ = reply_tx.send(self.doc.clone());
            }
        }
    }

    /// Rewrite the file. Failure leaves the in-memory document authoritative
    /// until the next successful save.
    async fn persist(&self) {
        if let Err(e) = save(&self.path, &self.doc).await {
            error!(path = %self.path.display(), error = %e, "Failed to save store");
            crate::metrics::record_store_save_failure();
        }
    }
}

/// Cloneable handle to the store writer.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<StoreCommand>,
}

impl StoreHandle {
    /// Load the document at `path` and start the writer.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doc = load(&path).await;
        Self::spawn(path, doc)
    }

    /// Start the writer over an already-loaded document.
    pub fn spawn(path: PathBuf, doc: Document) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        info!(path = %path.display(), "Store writer started");
        tokio::spawn(StoreActor { path, doc }.run(rx));
        Self { tx }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> StoreCommand,
    ) -> Result<T, StoreError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| StoreError::Closed)?;
        reply_rx.await.map_err(|_| StoreError::Closed)
    }

    pub async fn welcome(&self, chat_id: i64) -> Result<Option<WelcomeConfig>, StoreError> {
        self.request(|reply_tx| StoreCommand::GetWelcome { chat_id, reply_tx })
            .await
    }

    /// Replace the chat's welcome configuration.
    pub async fn set_welcome(&self, chat_id: i64, config: WelcomeConfig) -> Result<(), StoreError> {
        self.request(|reply_tx| StoreCommand::SetWelcome {
            chat_id,
            config,
            reply_tx,
        })
        .await
    }

    /// Remove the chat's welcome configuration. Returns whether one existed.
    pub async fn clear_welcome(&self, chat_id: i64) -> Result<bool, StoreError> {
        self.request(|reply_tx| StoreCommand::ClearWelcome { chat_id, reply_tx })
            .await
    }

    /// Point the chat at its newest welcome message. Returns false, writing
    /// nothing, when the chat is no longer configured.
    pub async fn set_last_welcome(&self, chat_id: i64, message_id: i64) -> Result<bool, StoreError> {
        self.request(|reply_tx| StoreCommand::SetLastWelcome {
            chat_id,
            message_id,
            reply_tx,
        })
        .await
    }

    /// Increment and return the warn count for `(chat_id, user_id)`.
    pub async fn warn(&self, chat_id: i64, user_id: i64) -> Result<u32, StoreError> {
        self.request(|reply_tx| StoreCommand::Warn {
            chat_id,
            user_id,
            reply_tx,
        })
        .await
    }

    #[cfg(test)]
    pub async fn warn_count(&self, chat_id: i64, user_id: i64) -> Result<u32, StoreError> {
        self.request(|reply_tx| StoreCommand::WarnCount {
            chat_id,
            user_id,
            reply_tx,
        })
        .await
    }

    /// Copy of the whole in-memory document.
    #[cfg(test)]
    pub async fn snapshot(&self) -> Result<Document, StoreError> {
        self.request(|reply_tx| StoreCommand::Snapshot { reply_tx })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::try_load;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_mutations_are_persisted_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = StoreHandle::open(&path).await;

        store
            .set_welcome(-1, WelcomeConfig::new("hi {user_mention}", None))
            .await
            .unwrap();
        assert_eq!(store.warn(-1, 5).await.unwrap(), 1);

        let on_disk = try_load(&path).await.unwrap().unwrap();
        assert_eq!(on_disk, store.snapshot().await.unwrap());
        assert_eq!(on_disk.warn_count(-1, 5), 1);
    }

    #[tokio::test]
    async fn test_concurrent_warns_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = Arc::new(StoreHandle::open(&path).await);

        let mut tasks = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.warn(-1, 100 + (i % 2)).await.unwrap()
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(store.warn_count(-1, 100).await.unwrap(), 10);
        assert_eq!(store.warn_count(-1, 101).await.unwrap(), 10);
        let on_disk = try_load(&path).await.unwrap().unwrap();
        assert_eq!(on_disk.warn_count(-1, 100), 10);
        assert_eq!(on_disk.warn_count(-1, 101), 10);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreHandle::open(dir.path().join("store.json")).await;

        store.set_welcome(-1, WelcomeConfig::new("hi", None)).await.unwrap();
        assert!(store.clear_welcome(-1).await.unwrap());
        assert!(!store.clear_welcome(-1).await.unwrap());
        assert!(store.welcome(-1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_last_welcome_requires_configured_chat() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreHandle::open(dir.path().join("store.json")).await;

        assert!(!store.set_last_welcome(-1, 9).await.unwrap());
        assert!(store.welcome(-1).await.unwrap().is_none());

        store.set_welcome(-1, WelcomeConfig::new("hi", None)).await.unwrap();
        assert!(store.set_last_welcome(-1, 9).await.unwrap());
        assert!(store.set_last_welcome(-1, 10).await.unwrap());
        let config = store.welcome(-1).await.unwrap().unwrap();
        assert_eq!(config.last_welcome_message_id, Some(10));
    }

    #[tokio::test]
    async fn test_save_failure_does_not_fail_caller() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("store.json");
        let store = StoreHandle::spawn(path.clone(), Document::default());

        assert_eq!(store.warn(-1, 5).await.unwrap(), 1);
        assert_eq!(store.warn(-1, 5).await.unwrap(), 2);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_reload_reproduces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        {
            let store = StoreHandle::open(&path).await;
            for chat in [-1, -2, -3] {
                store
                    .set_welcome(chat, WelcomeConfig::new(format!("welcome to {chat}"), None))
                    .await
                    .unwrap();
                store.warn(chat, 7).await.unwrap();
            }
            store.set_last_welcome(-2, 55).await.unwrap();
        }
        let reopened = StoreHandle::open(&path).await;
        let doc = reopened.snapshot().await.unwrap();
        assert_eq!(doc.welcomes.len(), 3);
        assert_eq!(doc.welcomes[&-2].last_welcome_message_id, Some(55));
        assert_eq!(doc.warn_count(-3, 7), 1);
    }
}
