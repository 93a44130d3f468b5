//! Configuration loading, validation, and management for Deskhand.
//!
//! Loads configuration from `~/.deskhand/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.deskhand/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Display name of the bot, also used as the assistant speaker label
    /// in rendered prompts.
    #[serde(default = "default_bot_username")]
    pub bot_username: String,

    /// The system instruction that heads every prompt.
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,

    /// Model backend endpoints and model names.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Similarity thresholds for the classifier cascade.
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Token budget settings.
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Generation sampling parameters.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Fixed user-facing response messages.
    #[serde(default)]
    pub messages: MessagesConfig,

    /// Reference phrase lists for the special-case gates.
    #[serde(default)]
    pub phrases: PhrasesConfig,

    /// Topic agents and their corpus files.
    #[serde(default)]
    pub agents: Vec<AgentConfig>,

    /// Vector store cache for corpus embeddings.
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_bot_username() -> String {
    "AI Assistant".into()
}

fn default_system_instruction() -> String {
    "You are an assistant that answers strictly from the provided context and \
     chat history, in a single sentence. Without context, respond to general \
     small talk as a friendly bot (greetings, farewells and so on)."
        .into()
}

fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bot_username", &self.bot_username)
            .field("provider", &self.provider)
            .field("thresholds", &self.thresholds)
            .field("budget", &self.budget)
            .field("generation", &self.generation)
            .field("agents", &self.agents)
            .field("store", &self.store)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of an OpenAI-compatible endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (env `DESKHAND_API_KEY` overrides).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Embedding model name.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Default generation model name; agents may override per-domain.
    #[serde(default = "default_generation_model")]
    pub generation_model: String,
}

fn default_base_url() -> String {
    "http://localhost:8000/v1".into()
}
fn default_embedding_model() -> String {
    "frida-embedding".into()
}
fn default_generation_model() -> String {
    "deskhand-chat".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            embedding_model: default_embedding_model(),
            generation_model: default_generation_model(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("embedding_model", &self.embedding_model)
            .field("generation_model", &self.generation_model)
            .finish()
    }
}

/// Similarity thresholds, all cosine scores in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Escalation / profanity / greeting phrase match.
    #[serde(default = "default_special_phrase")]
    pub special_phrase: f32,

    /// Agent selection against name descriptors.
    #[serde(default = "default_routing")]
    pub agent_routing: f32,

    /// Paragraph retrieval within the selected agent.
    #[serde(default = "default_routing")]
    pub retrieval: f32,

    /// Post-generation answer/context similarity.
    #[serde(default = "default_validation")]
    pub answer_validation: f32,
}

fn default_special_phrase() -> f32 {
    0.7
}
fn default_routing() -> f32 {
    0.25
}
fn default_validation() -> f32 {
    0.5
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            special_phrase: default_special_phrase(),
            agent_routing: default_routing(),
            retrieval: default_routing(),
            answer_validation: default_validation(),
        }
    }
}

/// Token budget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// The model context window.
    #[serde(default = "default_max_total_tokens")]
    pub max_total_tokens: usize,

    /// Tokens reserved for the generated answer (also the generation cap).
    #[serde(default = "default_reserved_output")]
    pub reserved_output_tokens: usize,

    /// Fixed safety margin reserved beyond the generation cap.
    #[serde(default = "default_safety_margin")]
    pub safety_margin_tokens: usize,
}

fn default_max_total_tokens() -> usize {
    8192
}
fn default_reserved_output() -> usize {
    150
}
fn default_safety_margin() -> usize {
    100
}

impl BudgetConfig {
    /// Everything held back from prompt assembly: generation cap + margin.
    pub fn total_reserved(&self) -> usize {
        self.reserved_output_tokens + self.safety_margin_tokens
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_total_tokens: default_max_total_tokens(),
            reserved_output_tokens: default_reserved_output(),
            safety_margin_tokens: default_safety_margin(),
        }
    }
}

/// Generation sampling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f32,

    /// Timeout around the generation call, in seconds.
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f32 {
    0.1
}
fn default_top_p() -> f32 {
    0.95
}
fn default_repetition_penalty() -> f32 {
    1.1
}
fn default_generation_timeout() -> u64 {
    60
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            repetition_penalty: default_repetition_penalty(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

/// Fixed user-facing responses for the terminal states.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesConfig {
    /// Blank or whitespace-only query.
    #[serde(default = "default_invalid_input")]
    pub invalid_input: String,

    /// Escalation phrase match or post-generation downgrade.
    #[serde(default = "default_escalation")]
    pub escalation: String,

    /// Profanity phrase match.
    #[serde(default = "default_profanity")]
    pub profanity: String,

    /// No agent or no context above threshold.
    #[serde(default = "default_clarify")]
    pub clarify: String,

    /// Generation failure.
    #[serde(default = "default_generic_error")]
    pub generic_error: String,
}

fn default_invalid_input() -> String {
    "Please enter a valid question.".into()
}
fn default_escalation() -> String {
    "Your request has been forwarded to a specialist. Please wait.".into()
}
fn default_profanity() -> String {
    "Please keep the conversation polite.".into()
}
fn default_clarify() -> String {
    "I didn't understand the question, could you rephrase it?".into()
}
fn default_generic_error() -> String {
    "Something went wrong while processing your request.".into()
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            invalid_input: default_invalid_input(),
            escalation: default_escalation(),
            profanity: default_profanity(),
            clarify: default_clarify(),
            generic_error: default_generic_error(),
        }
    }
}

/// Reference phrase lists for the special-case gates, checked in this
/// fixed priority order: escalation, profanity, greeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhrasesConfig {
    #[serde(default = "default_escalation_phrases")]
    pub escalation: Vec<String>,

    #[serde(default = "default_profanity_phrases")]
    pub profanity: Vec<String>,

    #[serde(default = "default_greeting_phrases")]
    pub greeting: Vec<String>,
}

fn default_escalation_phrases() -> Vec<String> {
    vec!["Hand this request over to a specialist.".into()]
}

fn default_profanity_phrases() -> Vec<String> {
    vec![
        "You are useless garbage.".into(),
        "This stupid bot is an idiot.".into(),
        "Damn you, shut up.".into(),
    ]
}

fn default_greeting_phrases() -> Vec<String> {
    vec![
        "Who are you?".into(),
        "Are you a bot?".into(),
        "Hi.".into(),
        "Hello.".into(),
        "How are you?".into(),
        "Thank you.".into(),
        "Bye.".into(),
        "Goodbye.".into(),
    ]
}

impl Default for PhrasesConfig {
    fn default() -> Self {
        Self {
            escalation: default_escalation_phrases(),
            profanity: default_profanity_phrases(),
            greeting: default_greeting_phrases(),
        }
    }
}

/// One topic agent: a named domain owning a corpus file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Domain name, embedded as the agent's routing descriptor.
    pub name: String,

    /// Path to the corpus text file (paragraphs separated by newlines).
    pub corpus_path: PathBuf,

    /// Per-domain generation model override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Vector store cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend: "file", "memory", or "none".
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Path for the file backend; defaults to
    /// `~/.deskhand/store/corpus_embeddings.jsonl`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Whether to write freshly computed embeddings back to the store.
    #[serde(default = "default_true")]
    pub write_through: bool,
}

fn default_store_backend() -> String {
    "file".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: None,
            write_through: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.deskhand/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `DESKHAND_API_KEY`
    /// - `DESKHAND_BASE_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(key) = std::env::var("DESKHAND_API_KEY") {
            config.provider.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("DESKHAND_BASE_URL") {
            config.provider.base_url = url;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".deskhand")
    }

    /// Effective file-store path, honoring the configured override.
    pub fn store_path(&self) -> PathBuf {
        self.store.path.clone().unwrap_or_else(|| {
            Self::config_dir()
                .join("store")
                .join("corpus_embeddings.jsonl")
        })
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("thresholds.special_phrase", self.thresholds.special_phrase),
            ("thresholds.agent_routing", self.thresholds.agent_routing),
            ("thresholds.retrieval", self.thresholds.retrieval),
            (
                "thresholds.answer_validation",
                self.thresholds.answer_validation,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 0.0 and 1.0"
                )));
            }
        }

        if self.budget.total_reserved() >= self.budget.max_total_tokens {
            return Err(ConfigError::ValidationError(
                "reserved_output_tokens + safety_margin_tokens must be smaller than max_total_tokens".into(),
            ));
        }

        if self.generation.temperature < 0.0 || self.generation.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !matches!(self.store.backend.as_str(), "file" | "memory" | "none") {
            return Err(ConfigError::ValidationError(format!(
                "unknown store backend '{}' (expected file, memory, or none)",
                self.store.backend
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for agent in &self.agents {
            if !seen.insert(agent.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate agent name '{}'",
                    agent.name
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string (for first-run onboarding).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bot_username: default_bot_username(),
            system_instruction: default_system_instruction(),
            provider: ProviderConfig::default(),
            thresholds: ThresholdConfig::default(),
            budget: BudgetConfig::default(),
            generation: GenerationConfig::default(),
            messages: MessagesConfig::default(),
            phrases: PhrasesConfig::default(),
            agents: vec![],
            store: StoreConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.budget.max_total_tokens, 8192);
        assert_eq!(config.budget.total_reserved(), 250);
        assert!((config.thresholds.special_phrase - 0.7).abs() < f32::EPSILON);
        assert!(!config.phrases.greeting.is_empty());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.bot_username, config.bot_username);
        assert_eq!(parsed.budget.max_total_tokens, config.budget.max_total_tokens);
        assert_eq!(parsed.messages.clarify, config.messages.clarify);
    }

    #[test]
    fn invalid_threshold_rejected() {
        let config = AppConfig {
            thresholds: ThresholdConfig {
                special_phrase: 1.5,
                ..ThresholdConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_reservation_rejected() {
        let config = AppConfig {
            budget: BudgetConfig {
                max_total_tokens: 200,
                reserved_output_tokens: 150,
                safety_margin_tokens: 100,
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn duplicate_agent_names_rejected() {
        let config = AppConfig {
            agents: vec![
                AgentConfig {
                    name: "Network".into(),
                    corpus_path: "network.txt".into(),
                    model: None,
                },
                AgentConfig {
                    name: "Network".into(),
                    corpus_path: "network2.txt".into(),
                    model: None,
                },
            ],
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().store.backend, "file");
    }

    #[test]
    fn load_from_reads_and_validates_file() {
        use std::io::Write;
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "bot_username = \"HelpBot\"").unwrap();
        writeln!(tmp, "[thresholds]").unwrap();
        writeln!(tmp, "retrieval = 0.3").unwrap();
        let config = AppConfig::load_from(tmp.path()).unwrap();
        assert_eq!(config.bot_username, "HelpBot");
        assert!((config.thresholds.retrieval - 0.3).abs() < f32::EPSILON);
        // Unspecified sections keep their defaults.
        assert_eq!(config.budget.max_total_tokens, 8192);
    }

    #[test]
    fn load_from_rejects_invalid_file() {
        use std::io::Write;
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "[thresholds]").unwrap();
        writeln!(tmp, "retrieval = 7.0").unwrap();
        let err = AppConfig::load_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn agents_parse_from_toml() {
        let toml_str = r#"
bot_username = "HelpBot"

[[agents]]
name = "Network"
corpus_path = "/var/lib/deskhand/network.txt"

[[agents]]
name = "Security"
corpus_path = "/var/lib/deskhand/security.txt"
model = "security-tuned"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.agents[0].name, "Network");
        assert_eq!(config.agents[1].model.as_deref(), Some("security-tuned"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_store_backend_rejected() {
        let config = AppConfig {
            store: StoreConfig {
                backend: "redis".into(),
                path: None,
                write_through: true,
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("max_total_tokens"));
        assert!(toml_str.contains("special_phrase"));
    }
}
