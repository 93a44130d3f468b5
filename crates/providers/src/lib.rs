//! Model backends for Deskhand.
//!
//! One HTTP implementation covers both capabilities: any OpenAI-compatible
//! endpoint (vLLM, Ollama, TEI, OpenAI itself) serves embeddings and
//! completions behind the `deskhand_core::Embedder` and
//! `deskhand_core::Generator` traits.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatBackend;
