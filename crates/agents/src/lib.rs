//! Topic agents for Deskhand.
//!
//! An agent is a named knowledge domain: its corpus paragraphs, their
//! document embeddings, a routing descriptor embedding of its name, and
//! the generation capability used to answer within the domain. The
//! registry loads all agents at startup and is immutable afterwards.

pub mod corpus;
pub mod registry;
pub mod store;

pub use corpus::load_paragraphs;
pub use registry::{Agent, AgentRegistry, AgentSpec};
pub use store::{FileStore, InMemoryStore, NoopStore, StoredCorpus, VectorStore};
