//! The agent registry — loads every configured agent at startup.
//!
//! Loading an agent means reading its corpus, resolving document
//! embeddings (from the store when the text is unchanged, otherwise from
//! the embedder), and embedding its name as the routing descriptor. The
//! registry is immutable after load; routing iterates it in
//! configuration order, so ties between equally scored agents resolve
//! to the earlier entry.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use deskhand_core::error::CorpusError;
use deskhand_core::{Embedder, EmbeddingMode, Generator, Result, TokenCounter};

use crate::corpus::load_paragraphs;
use crate::store::{StoredCorpus, VectorStore};

/// Everything needed to construct one agent.
pub struct AgentSpec {
    /// Domain name, doubling as the routing descriptor text.
    pub name: String,

    /// Path to the corpus text file.
    pub corpus_path: PathBuf,

    /// Generation capability for this domain.
    pub generator: Arc<dyn Generator>,

    /// Token length function matching this agent's generator.
    pub counter: Arc<dyn TokenCounter>,
}

/// A loaded topic agent.
pub struct Agent {
    name: String,
    paragraphs: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    name_embedding: Vec<f32>,
    generator: Arc<dyn Generator>,
    counter: Arc<dyn TokenCounter>,
}

impl Agent {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The corpus paragraphs, in file order.
    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    /// Document embeddings, parallel to [`paragraphs`](Self::paragraphs).
    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    /// The routing descriptor vector for this agent's name.
    pub fn name_embedding(&self) -> &[f32] {
        &self.name_embedding
    }

    pub fn generator(&self) -> &Arc<dyn Generator> {
        &self.generator
    }

    pub fn counter(&self) -> &Arc<dyn TokenCounter> {
        &self.counter
    }
}

/// All loaded agents, in configuration order.
pub struct AgentRegistry {
    agents: Vec<Agent>,
}

impl AgentRegistry {
    /// Load every agent: corpus text, document embeddings (cache-aware),
    /// and the name descriptor embedding.
    pub async fn load(
        specs: Vec<AgentSpec>,
        embedder: &dyn Embedder,
        store: &dyn VectorStore,
        write_through: bool,
    ) -> Result<Self> {
        let mut agents = Vec::with_capacity(specs.len());

        for spec in specs {
            let paragraphs = load_paragraphs(&spec.name, &spec.corpus_path)?;

            let embeddings = match store.get(&spec.name).await? {
                Some(cached) if cached.matches(&paragraphs) => {
                    debug!(agent = %spec.name, count = paragraphs.len(), "Using cached embeddings");
                    cached.embeddings
                }
                cached => {
                    if cached.is_some() {
                        debug!(agent = %spec.name, "Corpus changed, re-embedding");
                    }
                    let embeddings = embedder
                        .embed_batch(&paragraphs, EmbeddingMode::Document)
                        .await?;
                    if write_through {
                        store
                            .put(StoredCorpus {
                                agent: spec.name.clone(),
                                paragraphs: paragraphs.clone(),
                                embeddings: embeddings.clone(),
                                updated_at: chrono::Utc::now(),
                            })
                            .await?;
                    }
                    embeddings
                }
            };

            if embeddings.len() != paragraphs.len() {
                return Err(CorpusError::EmbeddingMismatch {
                    agent: spec.name.clone(),
                    paragraphs: paragraphs.len(),
                    embeddings: embeddings.len(),
                }
                .into());
            }

            let name_embedding = embedder.embed(&spec.name, EmbeddingMode::Document).await?;

            info!(
                agent = %spec.name,
                paragraphs = paragraphs.len(),
                generator = spec.generator.name(),
                "Agent loaded"
            );

            agents.push(Agent {
                name: spec.name,
                paragraphs,
                embeddings,
                name_embedding,
                generator: spec.generator,
                counter: spec.counter,
            });
        }

        Ok(Self { agents })
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn get(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
