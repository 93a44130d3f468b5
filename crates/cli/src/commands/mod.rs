//! CLI command implementations.

pub mod ask;
pub mod onboard;
pub mod serve;
pub mod status;

use std::sync::Arc;

use deskhand_agents::{AgentRegistry, AgentSpec, FileStore, InMemoryStore, NoopStore, VectorStore};
use deskhand_config::AppConfig;
use deskhand_core::{Embedder, Generator, HeuristicCounter, TokenCounter};
use deskhand_pipeline::Pipeline;
use deskhand_providers::OpenAiCompatBackend;

/// Build the full pipeline stack from configuration: backend, embedding
/// store, agent registry, gates.
pub(crate) async fn build_pipeline(
    config: &AppConfig,
) -> Result<Pipeline, Box<dyn std::error::Error>> {
    if config.agents.is_empty() {
        tracing::warn!("No agents configured; every routable query will ask for clarification");
    }

    let backend = OpenAiCompatBackend::new(
        config.provider.base_url.clone(),
        config.provider.api_key.clone(),
        config.provider.embedding_model.clone(),
        config.provider.generation_model.clone(),
    )?;

    let store: Box<dyn VectorStore> = match config.store.backend.as_str() {
        "file" => Box::new(FileStore::new(config.store_path())),
        "memory" => Box::new(InMemoryStore::new()),
        _ => Box::new(NoopStore),
    };

    let base_counter: Arc<dyn TokenCounter> = Arc::new(HeuristicCounter);

    let specs: Vec<AgentSpec> = config
        .agents
        .iter()
        .map(|agent| AgentSpec {
            name: agent.name.clone(),
            corpus_path: agent.corpus_path.clone(),
            generator: match &agent.model {
                Some(model) => {
                    Arc::new(backend.with_completion_model(model)) as Arc<dyn Generator>
                }
                None => Arc::new(backend.clone()),
            },
            counter: base_counter.clone(),
        })
        .collect();

    let registry = AgentRegistry::load(
        specs,
        &backend,
        store.as_ref(),
        config.store.write_through,
    )
    .await?;

    let embedder: Arc<dyn Embedder> = Arc::new(backend.clone());
    let base_generator: Arc<dyn Generator> = Arc::new(backend);

    let pipeline = Pipeline::initialize(
        config,
        embedder,
        Arc::new(registry),
        base_generator,
        base_counter,
    )
    .await?;

    Ok(pipeline)
}
