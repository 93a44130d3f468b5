//! OpenAI-compatible backend implementation.
//!
//! Works with: OpenAI, vLLM, Ollama, Text Embeddings Inference, and any
//! endpoint exposing `/v1/embeddings` and `/v1/completions`.
//!
//! The embedding modes are expressed as FRIDA-style instruction prefixes
//! (`search_document: `, `search_query: `, `paraphrase: `) prepended to the
//! input text, since the wire protocol has no task parameter.

use async_trait::async_trait;
use deskhand_core::error::{EmbeddingError, GenerationError};
use deskhand_core::{validate_vector, Embedder, EmbeddingMode, GenerationRequest, Generator};
use serde::Deserialize;
use tracing::{debug, warn};

/// An OpenAI-compatible model backend.
///
/// One instance serves both embeddings and completions; use
/// [`with_completion_model`](Self::with_completion_model) to derive a clone
/// pointed at a per-agent generation model.
#[derive(Clone)]
pub struct OpenAiCompatBackend {
    name: String,
    base_url: String,
    api_key: Option<String>,
    embedding_model: String,
    completion_model: String,
    client: reqwest::Client,
}

impl OpenAiCompatBackend {
    /// Create a new backend against a base URL like `http://host:8000/v1`.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        embedding_model: impl Into<String>,
        completion_model: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| GenerationError::Backend(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: "openai-compat".into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            embedding_model: embedding_model.into(),
            completion_model: completion_model.into(),
            client,
        })
    }

    /// Clone this backend with a different completion model.
    ///
    /// Agents with a per-domain model override share the HTTP client and
    /// endpoint but generate against their own model name.
    pub fn with_completion_model(&self, model: impl Into<String>) -> Self {
        Self {
            completion_model: model.into(),
            ..self.clone()
        }
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("Authorization", format!("Bearer {key}")),
            None => req,
        }
    }

    /// Prefix an input with the mode's task instruction.
    fn prefixed(text: &str, mode: EmbeddingMode) -> String {
        format!("{}: {}", mode.task_name(), text)
    }
}

#[async_trait]
impl Embedder for OpenAiCompatBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn embed(
        &self,
        text: &str,
        mode: EmbeddingMode,
    ) -> std::result::Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text.to_string()], mode).await?;
        vectors.pop().ok_or(EmbeddingError::Empty)
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        mode: EmbeddingMode,
    ) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/embeddings", self.base_url);
        let inputs: Vec<String> = texts.iter().map(|t| Self::prefixed(t, mode)).collect();

        let body = serde_json::json!({
            "model": self.embedding_model,
            "input": inputs,
            "encoding_format": "float",
        });

        debug!(
            model = %self.embedding_model,
            mode = mode.task_name(),
            count = texts.len(),
            "Sending embedding request"
        );

        let response = self
            .authorize(self.client.post(&url))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbeddingError::Backend(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return Err(EmbeddingError::Backend(
                "Invalid API key or insufficient permissions".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Embedding backend returned error");
            return Err(EmbeddingError::Backend(format!(
                "HTTP {status}: {error_body}"
            )));
        }

        let api_resp: EmbeddingApiResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Backend(format!("Failed to parse response: {e}")))?;

        if api_resp.data.len() != texts.len() {
            return Err(EmbeddingError::Malformed(format!(
                "expected {} vectors, got {}",
                texts.len(),
                api_resp.data.len()
            )));
        }

        // Responses are not guaranteed to arrive in input order.
        let mut data = api_resp.data;
        data.sort_by_key(|d| d.index);

        let vectors: Vec<Vec<f32>> = data.into_iter().map(|d| d.embedding).collect();
        for vector in &vectors {
            validate_vector(vector)?;
        }

        Ok(vectors)
    }
}

#[async_trait]
impl Generator for OpenAiCompatBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<String, GenerationError> {
        let url = format!("{}/completions", self.base_url);

        let body = serde_json::json!({
            "model": self.completion_model,
            "prompt": request.prompt,
            "max_tokens": request.max_new_tokens,
            "temperature": request.temperature,
            "top_p": request.top_p,
            "repetition_penalty": request.repetition_penalty,
            "stream": false,
        });

        debug!(
            model = %self.completion_model,
            max_tokens = request.max_new_tokens,
            "Sending completion request"
        );

        let response = self
            .authorize(self.client.post(&url))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Backend(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(GenerationError::Backend("Rate limited by backend".into()));
        }
        if status == 401 || status == 403 {
            return Err(GenerationError::Backend(
                "Invalid API key or insufficient permissions".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Completion backend returned error");
            return Err(GenerationError::Backend(format!(
                "HTTP {status}: {error_body}"
            )));
        }

        let api_resp: CompletionApiResponse = response.json().await.map_err(|e| {
            GenerationError::MalformedOutput(format!("Failed to parse response: {e}"))
        })?;

        let choice = api_resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::MalformedOutput("No choices in response".into()))?;

        Ok(choice.text)
    }
}

// --- API types (internal) ---

#[derive(Debug, Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct CompletionApiResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> OpenAiCompatBackend {
        OpenAiCompatBackend::new(
            "http://localhost:8000/v1/",
            Some("sk-test".into()),
            "frida-embedding",
            "deskhand-chat",
        )
        .unwrap()
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let b = backend();
        assert_eq!(b.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn mode_prefixes() {
        assert_eq!(
            OpenAiCompatBackend::prefixed("What is VLAN?", EmbeddingMode::Query),
            "search_query: What is VLAN?"
        );
        assert_eq!(
            OpenAiCompatBackend::prefixed("A VLAN is...", EmbeddingMode::Document),
            "search_document: A VLAN is..."
        );
        assert_eq!(
            OpenAiCompatBackend::prefixed("Hi.", EmbeddingMode::Paraphrase),
            "paraphrase: Hi."
        );
    }

    #[test]
    fn with_completion_model_keeps_endpoint() {
        let b = backend().with_completion_model("security-tuned");
        assert_eq!(b.completion_model, "security-tuned");
        assert_eq!(b.embedding_model, "frida-embedding");
        assert_eq!(b.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn parse_embedding_response_out_of_order() {
        let data = r#"{
            "data": [
                {"embedding": [0.4, 0.5], "index": 1},
                {"embedding": [0.1, 0.2], "index": 0}
            ],
            "model": "frida-embedding"
        }"#;
        let parsed: EmbeddingApiResponse = serde_json::from_str(data).unwrap();
        let mut rows = parsed.data;
        rows.sort_by_key(|d| d.index);
        assert_eq!(rows[0].embedding, vec![0.1, 0.2]);
        assert_eq!(rows[1].embedding, vec![0.4, 0.5]);
    }

    #[test]
    fn parse_completion_response() {
        let data = r#"{
            "choices": [{"text": " A VLAN is a virtual LAN.", "index": 0, "finish_reason": "stop"}],
            "model": "deskhand-chat"
        }"#;
        let parsed: CompletionApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.choices[0].text, " A VLAN is a virtual LAN.");
    }

    #[test]
    fn empty_choices_is_malformed() {
        let parsed: CompletionApiResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
