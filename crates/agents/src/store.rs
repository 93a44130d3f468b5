//! Embedding store — persistent cache of corpus embeddings.
//!
//! Embedding a corpus is the slow part of startup; the store lets a
//! restart skip it when the corpus text has not changed. The cached
//! paragraphs are compared against the freshly loaded corpus and the
//! cache is used only on an exact match, so a stale cache can never
//! serve embeddings for text that is no longer in the corpus.
//!
//! Storage location (file backend): one JSON object per line, keyed by
//! agent name.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use deskhand_core::error::StoreError;

/// A cached corpus with its document embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCorpus {
    /// The owning agent's name.
    pub agent: String,

    /// The paragraphs exactly as embedded.
    pub paragraphs: Vec<String>,

    /// One document-mode vector per paragraph, same order.
    pub embeddings: Vec<Vec<f32>>,

    /// When the embeddings were computed.
    pub updated_at: DateTime<Utc>,
}

impl StoredCorpus {
    /// True when this cache entry covers exactly these paragraphs.
    pub fn matches(&self, paragraphs: &[String]) -> bool {
        self.paragraphs == paragraphs && self.embeddings.len() == paragraphs.len()
    }
}

/// Get/put interface over embedding cache backends.
#[async_trait]
pub trait VectorStore: Send + Sync {
    fn name(&self) -> &str;

    /// Look up the cached corpus for an agent.
    async fn get(&self, agent: &str) -> Result<Option<StoredCorpus>, StoreError>;

    /// Insert or replace the cached corpus for an agent.
    async fn put(&self, corpus: StoredCorpus) -> Result<(), StoreError>;
}

/// In-memory store, useful for tests and one-shot runs.
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, StoredCorpus>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, agent: &str) -> Result<Option<StoredCorpus>, StoreError> {
        Ok(self.entries.read().await.get(agent).cloned())
    }

    async fn put(&self, corpus: StoredCorpus) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(corpus.agent.clone(), corpus);
        Ok(())
    }
}

/// Store that caches nothing; every startup re-embeds.
pub struct NoopStore;

#[async_trait]
impl VectorStore for NoopStore {
    fn name(&self) -> &str {
        "none"
    }

    async fn get(&self, _agent: &str) -> Result<Option<StoredCorpus>, StoreError> {
        Ok(None)
    }

    async fn put(&self, _corpus: StoredCorpus) -> Result<(), StoreError> {
        Ok(())
    }
}

/// A file-backed store using JSONL (one JSON object per line).
///
/// Entries are loaded into memory on creation and flushed to disk on
/// every put. This gives fast reads with durable writes.
pub struct FileStore {
    path: PathBuf,
    entries: Arc<RwLock<HashMap<String, StoredCorpus>>>,
}

impl FileStore {
    /// Create a new file-backed store at the given path.
    ///
    /// If the file exists, entries are loaded from it. If not, starts
    /// empty (file created on first put).
    pub fn new(path: PathBuf) -> Self {
        let entries = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = entries.len(), "Embedding store loaded");
        Self {
            path,
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    fn load_from_disk(path: &PathBuf) -> HashMap<String, StoredCorpus> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return HashMap::new(), // File doesn't exist yet
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<StoredCorpus>(line) {
                Ok(entry) => Some((entry.agent.clone(), entry)),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted store entry");
                    None
                }
            })
            .collect()
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let entries = self.entries.read().await;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Storage(format!("Failed to create store directory: {e}"))
            })?;
        }

        let mut content = String::new();
        let mut names: Vec<&String> = entries.keys().collect();
        names.sort();
        for name in names {
            let line = serde_json::to_string(&entries[name]).map_err(|e| {
                StoreError::Storage(format!("Failed to serialize store entry: {e}"))
            })?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(&self.path, &content)
            .map_err(|e| StoreError::Storage(format!("Failed to write store file: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl VectorStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, agent: &str) -> Result<Option<StoredCorpus>, StoreError> {
        Ok(self.entries.read().await.get(agent).cloned())
    }

    async fn put(&self, corpus: StoredCorpus) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(corpus.agent.clone(), corpus);
        self.flush().await
    }
}
