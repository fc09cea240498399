//! Model access layer.
//!
//! Two seams live here:
//!
//! - [`ChatBackend`]: one transport able to run a completion against a named
//!   model. The real implementation is [`OpenAiCompatBackend`].
//! - [`LanguageModel`]: what the pipeline talks to: "send messages, get text".
//!   The real implementation is [`FailoverClient`], which rotates a pool of
//!   model names over a backend. Test double: [`mock::ScriptedModel`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{BackendError, ModelError};

pub mod failover;
pub mod mock;
pub mod openai;

pub use failover::{Backoff, FailoverClient, FailoverPolicy, PoolState};
pub use openai::OpenAiCompatBackend;

/// Role tag of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single role-tagged text block sent to a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Transport for a single completion against a named model.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run one completion. Any failure is reported, never retried here.
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<String, BackendError>;
}

/// Capability the pipeline depends on: given messages, return generated text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn answer(&self, messages: &[Message]) -> Result<String, ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::system("a").role, Role::System);
        assert_eq!(Message::user("b").role, Role::User);
        assert_eq!(Message::user("b").content, "b");
    }

    #[test]
    fn test_message_serializes_lowercase_role() {
        let json = serde_json::to_value(Message::system("hi")).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "hi");
    }
}
