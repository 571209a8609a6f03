//! Append-only conversation history.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{ChatError, Result};
use crate::types::{HistoryMessage, Message};

/// Where every message of a conversation is recorded, in order.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Stamp and persist one message.
    async fn append(&self, message: &Message) -> Result<HistoryMessage>;

    /// The full log, oldest first.
    async fn load(&self) -> Result<Vec<HistoryMessage>>;
}

/// One JSON object per line in a file.
#[derive(Debug)]
pub struct JsonlHistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryStore for JsonlHistoryStore {
    async fn append(&self, message: &Message) -> Result<HistoryMessage> {
        let entry = HistoryMessage::now(message.clone());
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(entry)
    }

    async fn load(&self) -> Result<Vec<HistoryMessage>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(number, line)| {
                serde_json::from_str(line).map_err(|err| {
                    ChatError::History(format!(
                        "{}:{}: {err}",
                        self.path.display(),
                        number + 1
                    ))
                })
            })
            .collect()
    }
}

/// In-memory history, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<Vec<HistoryMessage>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages without timestamps, oldest first.
    pub async fn messages(&self) -> Vec<Message> {
        self.entries
            .lock()
            .await
            .iter()
            .map(|entry| entry.message.clone())
            .collect()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, message: &Message) -> Result<HistoryMessage> {
        let entry = HistoryMessage::now(message.clone());
        self.entries.lock().await.push(entry.clone());
        Ok(entry)
    }

    async fn load(&self) -> Result<Vec<HistoryMessage>> {
        Ok(self.entries.lock().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_keeps_order() {
        let store = MemoryHistoryStore::new();
        store.append(&Message::user("a")).await.unwrap();
        store.append(&Message::assistant("b")).await.unwrap();
        assert_eq!(
            store.messages().await,
            vec![Message::user("a"), Message::assistant("b")]
        );
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlHistoryStore::new(dir.path().join("nope.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_line_reports_its_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        tokio::fs::write(&path, "\n{not json}\n").await.unwrap();

        let err = JsonlHistoryStore::new(&path).load().await.unwrap_err();

        assert!(matches!(err, ChatError::History(msg) if msg.contains("history.json:2:")));
    }
}
