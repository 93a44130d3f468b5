//! The pipeline orchestrator.
//!
//! Sequences the stages into the `process_query` contract. Every
//! terminal state except a generation failure appends exactly one
//! user/assistant pair to the history it returns; a generation failure
//! returns the input history untouched so a caller retry starts from a
//! clean state.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use deskhand_agents::{Agent, AgentRegistry};
use deskhand_config::{AppConfig, GenerationConfig, MessagesConfig, ThresholdConfig};
use deskhand_core::error::GenerationError;
use deskhand_core::{
    ConversationHistory, Embedder, EmbeddingMode, GenerationRequest, Generator, Result,
    TokenCounter,
};

use crate::budget::BudgetManager;
use crate::renderer::PromptRenderer;
use crate::retriever::{retrieve, RetrievalResult};
use crate::sentence::first_sentence;
use crate::similarity::{classify, ReferencePhrase};
use crate::validator::{AnswerValidator, ValidationOutcome};

/// Where the pipeline stopped for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    /// Blank or whitespace-only input.
    EmptyQuery,
    /// Matched an escalation phrase.
    Escalation,
    /// Matched a profanity phrase.
    Profanity,
    /// Matched a greeting phrase; answered by the base model.
    Greeting,
    /// No agent scored above the routing gate.
    NoAgent,
    /// No paragraph scored above the retrieval gate.
    NoContext,
    /// Generated and validated successfully.
    Answered,
    /// Generated, but the validator downgraded the answer.
    Escalated,
    /// The generation call failed.
    Failed,
}

impl TerminalState {
    /// True when the request ends up with a human specialist.
    pub fn is_manager(&self) -> bool {
        matches!(self, Self::Escalation | Self::Escalated)
    }
}

/// The pipeline's answer to one request.
#[derive(Debug)]
pub struct PipelineResponse {
    pub answer: String,
    pub history: ConversationHistory,
    pub state: TerminalState,
}

impl PipelineResponse {
    pub fn is_manager(&self) -> bool {
        self.state.is_manager()
    }
}

/// Precomputed phrase vectors for the three special-case gates.
struct GateSet {
    escalation: Vec<ReferencePhrase>,
    profanity: Vec<ReferencePhrase>,
    greeting: Vec<ReferencePhrase>,
}

/// The assembled query-processing pipeline.
///
/// Immutable after [`initialize`](Self::initialize); safe to share
/// across concurrent requests.
pub struct Pipeline {
    embedder: Arc<dyn Embedder>,
    registry: Arc<AgentRegistry>,
    base_generator: Arc<dyn Generator>,
    base_counter: Arc<dyn TokenCounter>,
    renderer: PromptRenderer,
    budget: BudgetManager,
    validator: AnswerValidator,
    gates: GateSet,
    thresholds: ThresholdConfig,
    generation: GenerationConfig,
    messages: MessagesConfig,
    max_new_tokens: u32,
}

impl Pipeline {
    /// Build the pipeline, embedding all gate phrases up front.
    pub async fn initialize(
        config: &AppConfig,
        embedder: Arc<dyn Embedder>,
        registry: Arc<AgentRegistry>,
        base_generator: Arc<dyn Generator>,
        base_counter: Arc<dyn TokenCounter>,
    ) -> Result<Self> {
        let gates = GateSet {
            escalation: Self::embed_phrases(embedder.as_ref(), &config.phrases.escalation).await?,
            profanity: Self::embed_phrases(embedder.as_ref(), &config.phrases.profanity).await?,
            greeting: Self::embed_phrases(embedder.as_ref(), &config.phrases.greeting).await?,
        };

        info!(
            agents = registry.len(),
            escalation_phrases = gates.escalation.len(),
            profanity_phrases = gates.profanity.len(),
            greeting_phrases = gates.greeting.len(),
            "Pipeline initialized"
        );

        Ok(Self {
            embedder,
            registry,
            base_generator,
            base_counter,
            renderer: PromptRenderer::new(
                config.system_instruction.clone(),
                config.bot_username.clone(),
            ),
            budget: BudgetManager::new(
                config.budget.max_total_tokens,
                config.budget.total_reserved(),
            ),
            validator: AnswerValidator::new(
                config.thresholds.answer_validation,
                config.messages.escalation.clone(),
            ),
            gates,
            thresholds: config.thresholds.clone(),
            generation: config.generation.clone(),
            messages: config.messages.clone(),
            max_new_tokens: config.budget.reserved_output_tokens as u32,
        })
    }

    async fn embed_phrases(
        embedder: &dyn Embedder,
        phrases: &[String],
    ) -> Result<Vec<ReferencePhrase>> {
        let vectors = embedder
            .embed_batch(phrases, EmbeddingMode::Paraphrase)
            .await?;
        Ok(phrases
            .iter()
            .zip(vectors)
            .map(|(phrase, vector)| ReferencePhrase::new(phrase.clone(), vector))
            .collect())
    }

    /// Process one user query against its conversation history.
    pub async fn process_query(
        &self,
        question: &str,
        history: ConversationHistory,
        username: &str,
    ) -> PipelineResponse {
        let question = question.trim();

        if question.is_empty() {
            debug!("Empty query");
            return self.terminal(
                TerminalState::EmptyQuery,
                self.messages.invalid_input.clone(),
                history,
                username,
                question,
            );
        }

        // Special-case gates share one symmetric encoding of the query.
        // An embedding failure here skips the gates rather than failing
        // the request; routing gets its own chance below.
        match self
            .embedder
            .embed(question, EmbeddingMode::Paraphrase)
            .await
        {
            Ok(gate_vector) => {
                if let Some(m) =
                    classify(&gate_vector, &self.gates.escalation, self.thresholds.special_phrase)
                {
                    info!(score = m.score, "Escalation phrase matched");
                    return self.terminal(
                        TerminalState::Escalation,
                        self.messages.escalation.clone(),
                        history,
                        username,
                        question,
                    );
                }
                if let Some(m) =
                    classify(&gate_vector, &self.gates.profanity, self.thresholds.special_phrase)
                {
                    info!(score = m.score, "Profanity phrase matched");
                    return self.terminal(
                        TerminalState::Profanity,
                        self.messages.profanity.clone(),
                        history,
                        username,
                        question,
                    );
                }
                if let Some(m) =
                    classify(&gate_vector, &self.gates.greeting, self.thresholds.special_phrase)
                {
                    debug!(score = m.score, phrase = %m.phrase, "Greeting phrase matched");
                    return self.answer_greeting(history, username, question).await;
                }
            }
            Err(e) => {
                warn!(error = %e, "Gate embedding failed, skipping special-case checks");
            }
        }

        // Agent routing against the name descriptors.
        let query_vector = match self.embedder.embed(question, EmbeddingMode::Query).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Query embedding failed, treating as no route");
                return self.terminal(
                    TerminalState::NoAgent,
                    self.messages.clarify.clone(),
                    history,
                    username,
                    question,
                );
            }
        };

        let name_refs: Vec<ReferencePhrase> = self
            .registry
            .agents()
            .iter()
            .map(|a| ReferencePhrase::new(a.name(), a.name_embedding().to_vec()))
            .collect();

        let Some(selected) = classify(&query_vector, &name_refs, self.thresholds.agent_routing)
        else {
            debug!("No agent above routing gate");
            return self.terminal(
                TerminalState::NoAgent,
                self.messages.clarify.clone(),
                history,
                username,
                question,
            );
        };
        let agent = &self.registry.agents()[selected.index];
        debug!(agent = agent.name(), score = selected.score, "Agent selected");

        let RetrievalResult::Retrieved { paragraph, .. } =
            retrieve(&query_vector, agent, self.thresholds.retrieval)
        else {
            return self.terminal(
                TerminalState::NoContext,
                self.messages.clarify.clone(),
                history,
                username,
                question,
            );
        };

        self.answer_from_context(agent, history, username, question, paragraph)
            .await
    }

    /// Greeting path: base model, empty context, no validation.
    async fn answer_greeting(
        &self,
        history: ConversationHistory,
        username: &str,
        question: &str,
    ) -> PipelineResponse {
        let original = history.clone();
        let (fitted, _, _) = self.budget.fit(
            &self.renderer,
            self.base_counter.as_ref(),
            history,
            question,
            username,
            String::new(),
        );
        let prompt = self.renderer.render_full(&fitted, question, "", username);

        match self
            .generate_with_timeout(self.base_generator.as_ref(), prompt)
            .await
        {
            Ok(draft) => {
                let answer = first_sentence(&draft);
                self.terminal(TerminalState::Greeting, answer, fitted, username, question)
            }
            Err(e) => self.generation_failed(e, original),
        }
    }

    /// Full retrieval-augmented path: budget, render, generate,
    /// extract, validate.
    async fn answer_from_context(
        &self,
        agent: &Agent,
        history: ConversationHistory,
        username: &str,
        question: &str,
        context: String,
    ) -> PipelineResponse {
        let original = history.clone();
        let (fitted, context, state) = self.budget.fit(
            &self.renderer,
            agent.counter().as_ref(),
            history,
            question,
            username,
            context,
        );
        debug!(
            history_tokens = state.history_tokens,
            context_tokens = state.context_tokens,
            required = state.required(),
            available = state.available(),
            "Budget fitted"
        );

        let prompt = self
            .renderer
            .render_full(&fitted, question, &context, username);

        let draft = match self
            .generate_with_timeout(agent.generator().as_ref(), prompt)
            .await
        {
            Ok(draft) if !draft.trim().is_empty() => draft,
            Ok(_) => {
                return self.generation_failed(
                    GenerationError::MalformedOutput("empty completion".into()),
                    original,
                )
            }
            Err(e) => return self.generation_failed(e, original),
        };

        let answer = first_sentence(&draft);
        match self
            .validator
            .validate(self.embedder.as_ref(), answer, &context)
            .await
        {
            ValidationOutcome::Accepted(answer) => {
                self.terminal(TerminalState::Answered, answer, fitted, username, question)
            }
            ValidationOutcome::Escalated(answer) => {
                info!("Answer downgraded to escalation by validator");
                self.terminal(TerminalState::Escalated, answer, fitted, username, question)
            }
        }
    }

    async fn generate_with_timeout(
        &self,
        generator: &dyn Generator,
        prompt: String,
    ) -> std::result::Result<String, GenerationError> {
        let request = GenerationRequest {
            prompt,
            max_new_tokens: self.max_new_tokens,
            temperature: self.generation.temperature,
            top_p: self.generation.top_p,
            repetition_penalty: self.generation.repetition_penalty,
        };

        let timeout = Duration::from_secs(self.generation.timeout_secs);
        match tokio::time::timeout(timeout, generator.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(self.generation.timeout_secs)),
        }
    }

    fn generation_failed(
        &self,
        error: GenerationError,
        history: ConversationHistory,
    ) -> PipelineResponse {
        error!(error = %error, "Generation failed");
        PipelineResponse {
            answer: self.messages.generic_error.clone(),
            history,
            state: TerminalState::Failed,
        }
    }

    fn terminal(
        &self,
        state: TerminalState,
        answer: String,
        mut history: ConversationHistory,
        username: &str,
        question: &str,
    ) -> PipelineResponse {
        history.push_exchange(username, question, &answer);
        PipelineResponse {
            answer,
            history,
            state,
        }
    }
}
