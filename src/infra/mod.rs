//! Infrastructure boundary for the agent service.
//!
//! Everything here is an external collaborator specified only at the surface
//! the core touches: key-value store with expiry, publish/consume broker
//! with consumer groups, chat-completion provider, moderation classifiers,
//! vector similarity index, and a document store. The schemas are consumed,
//! not owned, by this crate.

pub mod broker;
pub mod classifier;
pub mod docs;
pub mod kv;
pub mod llm;
pub mod vector;

pub use broker::{Broker, MemoryBroker, Subscription};
pub use classifier::{ClassifierSuite, LlmClassifier};
pub use docs::{DocumentStore, MemoryDocs};
pub use kv::{KvStore, MemoryKv};
pub use llm::{ChatCompletion, HttpCompletion};
pub use vector::{MemoryIndex, VectorIndex, VectorMatch};
