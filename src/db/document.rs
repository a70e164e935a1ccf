//! The persisted document and its file format.
//!
//! ```json
//! {
//!   "welcomes": {
//!     "-100123": { "message": "Hi {user_mention}", "channel_link": null, "last_welcome_message_id": 42 }
//!   },
//!   "warns": { "-100123": { "777": 2 } }
//! }
//! ```
//!
//! Keys are decimal ids. The file is pretty-printed UTF-8 and replaced
//! atomically through a sibling temp file.

use super::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Welcome configuration for one chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomeConfig {
    /// Template; `{user_mention}` is replaced per new member.
    #[serde(rename = "message", default)]
    pub message_template: String,
    #[serde(default)]
    pub channel_link: Option<String>,
    /// Most recently posted welcome in the chat.
    #[serde(default)]
    pub last_welcome_message_id: Option<i64>,
}

impl WelcomeConfig {
    pub fn new(message_template: impl Into<String>, channel_link: Option<String>) -> Self {
        Self {
            message_template: message_template.into(),
            channel_link,
            last_welcome_message_id: None,
        }
    }
}

/// Root of the persisted state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub welcomes: BTreeMap<i64, WelcomeConfig>,
    /// chat id -> target id -> warn count.
    #[serde(default)]
    pub warns: BTreeMap<i64, BTreeMap<i64, u32>>,
}

impl Document {
    /// Increment the warn counter for `(chat_id, user_id)`, returning the new count.
    pub fn add_warn(&mut self, chat_id: i64, user_id: i64) -> u32 {
        let count = self
            .warns
            .entry(chat_id)
            .or_default()
            .entry(user_id)
            .or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    #[cfg(test)]
    pub fn warn_count(&self, chat_id: i64, user_id: i64) -> u32 {
        self.warns
            .get(&chat_id)
            .and_then(|chat| chat.get(&user_id))
            .copied()
            .unwrap_or(0)
    }
}

/// Read the document. `Ok(None)` when the file does not exist.
pub async fn try_load(path: &Path) -> Result<Option<Document>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

/// Read the document, falling back to an empty one.
///
/// A missing file is normal on first start. An unreadable or corrupt file
/// is logged and counted; the bot starts with an empty document and the
/// next mutation overwrites the bad file.
pub async fn load(path: &Path) -> Document {
    match try_load(path).await {
        Ok(Some(doc)) => {
            info!(
                path = %path.display(),
                welcomes = doc.welcomes.len(),
                warned_chats = doc.warns.len(),
                "Store loaded"
            );
            doc
        }
        Ok(None) => {
            info!(path = %path.display(), "No store file, starting empty");
            Document::default()
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to load store, starting empty");
            crate::metrics::record_store_load_failure();
            Document::default()
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Rewrite the whole document: write a sibling temp file, then rename it
/// over the target.
pub async fn save(path: &Path, doc: &Document) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(doc)?;
    let tmp = temp_path(path);

    tokio::fs::write(&tmp, &bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
            warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temp store file");
        }
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::default();
        doc.welcomes.insert(
            -100123,
            WelcomeConfig {
                message_template: "Привет, {user_mention}!".into(),
                channel_link: Some("https://t.me/news".into()),
                last_welcome_message_id: Some(42),
            },
        );
        doc.welcomes.insert(-200, WelcomeConfig::new("hi", None));
        doc.add_warn(-100123, 777);
        doc.add_warn(-100123, 777);
        doc.add_warn(-100123, 778);
        doc
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let doc = sample();

        save(&path, &doc).await.unwrap();
        assert_eq!(load(&path).await, doc);
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_file_format_uses_string_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        save(&path, &sample()).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(raw["warns"]["-100123"]["777"], 2);
        assert_eq!(raw["welcomes"]["-200"]["channel_link"], serde_json::Value::Null);
        assert_eq!(raw["welcomes"]["-100123"]["message"], "Привет, {user_mention}!");
        // Non-ASCII is written as-is.
        assert!(text.contains("Привет"));
    }

    #[tokio::test]
    async fn test_reads_legacy_file_without_optional_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, r#"{"welcomes": {"5": {"message": "yo"}}}"#).unwrap();

        let doc = try_load(&path).await.unwrap().unwrap();
        assert_eq!(doc.welcomes[&5], WelcomeConfig::new("yo", None));
        assert!(doc.warns.is_empty());
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert!(try_load(&missing).await.unwrap().is_none());
        assert_eq!(load(&missing).await, Document::default());

        let corrupt = dir.path().join("corrupt.json");
        std::fs::write(&corrupt, "{not json").unwrap();
        assert!(matches!(try_load(&corrupt).await, Err(StoreError::Json(_))));
        assert_eq!(load(&corrupt).await, Document::default());
    }

    #[test]
    fn test_warn_counts_are_per_target() {
        let mut doc = Document::default();
        assert_eq!(doc.add_warn(1, 10), 1);
        assert_eq!(doc.add_warn(1, 10), 2);
        assert_eq!(doc.add_warn(1, 11), 1);
        assert_eq!(doc.add_warn(2, 10), 1);
        assert_eq!(doc.warn_count(1, 10), 2);
        assert_eq!(doc.warn_count(3, 10), 0);
    }
}
