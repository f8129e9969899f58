//! Agent communication protocol.
//!
//! This module defines the inter-agent wire shape and correlation:
//! - Message envelopes with correlation IDs
//! - Topic and response-key naming
//! - Request/response correlation through the shared key-value store

pub mod correlation;
pub mod message;

pub use correlation::CollaborationHub;
pub use message::{agent_topic, consumer_group, response_key, AgentMessage};
