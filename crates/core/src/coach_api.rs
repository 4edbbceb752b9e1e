use crate::error::Result;
use crate::phase::PhaseId;
use crate::transcript::{ChatTurn, Depth, Sentiment};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// The coach's answer to one chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub response_text: String,
    /// Set by the backend when the message may reflect distress or harm.
    pub alert: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub sentiment: Sentiment,
    pub depth: Depth,
}

/// The remote coaching backend. Conversation logic, sentiment analysis and
/// summarization all live behind this seam; the session controller only
/// depends on the trait so tests can swap in a mock.
///
/// Callers must not pass an empty message. Implementations do not retry.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait CoachApi: Send + Sync {
    async fn chat(&self, message: &str, phase: PhaseId) -> Result<ChatReply>;

    async fn analyze(&self, message: &str) -> Result<Analysis>;

    async fn summarize(&self, history: &[ChatTurn]) -> Result<String>;
}
