//! # Deskhand Core
//!
//! Domain types, traits, and error definitions for the Deskhand
//! retrieval-augmented chat responder. This crate has **zero framework
//! dependencies** — it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! The model backends (embedding, generation, tokenization) are external
//! collaborators. Each is defined as a trait here; implementations live in
//! their respective crates. This enables:
//! - Swapping backends via configuration
//! - Easy testing with scripted mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod embedding;
pub mod error;
pub mod generation;
pub mod history;
pub mod token;
pub mod transport;

// Re-export key types at crate root for ergonomics
pub use embedding::{Embedder, EmbeddingMode, validate_vector};
pub use error::{Error, Result};
pub use generation::{GenerationRequest, Generator};
pub use history::{ConversationHistory, Turn};
pub use token::{HeuristicCounter, TokenCounter};
pub use transport::{InboundMessage, OutboundMessage};
