//! Shared scripted stand-ins for pipeline tests.

use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::NamedTempFile;

use deskhand_agents::{AgentRegistry, AgentSpec, NoopStore};
use deskhand_core::error::{EmbeddingError, GenerationError};
use deskhand_core::{Embedder, EmbeddingMode, GenerationRequest, Generator, HeuristicCounter};

/// Embedder that maps exact texts to fixed vectors, ignoring the mode.
/// Unknown texts embed to the zero vector, which scores 0.0 against
/// everything.
pub(crate) struct KeyedEmbedder {
    map: HashMap<String, Vec<f32>>,
}

pub(crate) fn keyed_embedder(entries: &[(&str, Vec<f32>)]) -> KeyedEmbedder {
    KeyedEmbedder {
        map: entries
            .iter()
            .map(|(text, vector)| (text.to_string(), vector.clone()))
            .collect(),
    }
}

#[async_trait]
impl Embedder for KeyedEmbedder {
    fn name(&self) -> &str {
        "keyed"
    }

    async fn embed(
        &self,
        text: &str,
        _mode: EmbeddingMode,
    ) -> std::result::Result<Vec<f32>, EmbeddingError> {
        Ok(self
            .map
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0; 6]))
    }
}

/// Embedder whose every call fails.
pub(crate) struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn name(&self) -> &str {
        "failing"
    }

    async fn embed(
        &self,
        _text: &str,
        _mode: EmbeddingMode,
    ) -> std::result::Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Backend("scripted failure".into()))
    }
}

/// Generator that replays a scripted sequence of results and counts its
/// calls. An exhausted script fails loudly.
pub(crate) struct ScriptedGenerator {
    script: Mutex<VecDeque<std::result::Result<String, GenerationError>>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub(crate) fn with_responses(
        responses: Vec<std::result::Result<String, GenerationError>>,
    ) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        _request: GenerationRequest,
    ) -> std::result::Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Backend("script exhausted".into())))
    }
}

/// Generator that never completes in real time; pairs with paused-clock
/// tests to exercise the timeout path.
pub(crate) struct SlowGenerator;

#[async_trait]
impl Generator for SlowGenerator {
    fn name(&self) -> &str {
        "slow"
    }

    async fn generate(
        &self,
        _request: GenerationRequest,
    ) -> std::result::Result<String, GenerationError> {
        tokio::time::sleep(std::time::Duration::from_secs(86_400)).await;
        Ok("too late".into())
    }
}

pub(crate) fn stub_generator() -> Arc<dyn Generator> {
    Arc::new(ScriptedGenerator::with_responses(vec![]))
}

/// Write a corpus file and keep it alive for the caller.
pub(crate) fn corpus_file(paragraphs: &[&str]) -> (NamedTempFile, PathBuf) {
    let mut tmp = NamedTempFile::new().unwrap();
    for paragraph in paragraphs {
        writeln!(tmp, "{paragraph}").unwrap();
    }
    let path = tmp.path().to_path_buf();
    (tmp, path)
}

/// Load a single-agent registry over an in-memory scripted stack.
pub(crate) async fn load_test_registry(
    name: &str,
    paragraphs: &[&str],
    embedder: &KeyedEmbedder,
    generator: Arc<dyn Generator>,
) -> AgentRegistry {
    let (_file, path) = corpus_file(paragraphs);
    AgentRegistry::load(
        vec![AgentSpec {
            name: name.into(),
            corpus_path: path,
            generator,
            counter: Arc::new(HeuristicCounter),
        }],
        embedder,
        &NoopStore,
        false,
    )
    .await
    .unwrap()
}
