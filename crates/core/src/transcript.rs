use crate::phase::PhaseId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentiment label as reported by the backend's analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Other(String),
}

impl From<String> for Sentiment {
    fn from(value: String) -> Self {
        match value.trim().to_uppercase().as_str() {
            "POSITIVE" => Sentiment::Positive,
            "NEGATIVE" => Sentiment::Negative,
            "NEUTRAL" => Sentiment::Neutral,
            _ => Sentiment::Other(value),
        }
    }
}

impl From<Sentiment> for String {
    fn from(value: Sentiment) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => f.write_str("POSITIVE"),
            Sentiment::Negative => f.write_str("NEGATIVE"),
            Sentiment::Neutral => f.write_str("NEUTRAL"),
            Sentiment::Other(label) => f.write_str(label),
        }
    }
}

/// How deeply a message engages with the relationship, per the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Depth {
    Deep,
    Shallow,
    Other(String),
}

impl From<String> for Depth {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "deep" => Depth::Deep,
            "shallow" => Depth::Shallow,
            _ => Depth::Other(value),
        }
    }
}

impl From<Depth> for String {
    fn from(value: Depth) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Depth::Deep => f.write_str("deep"),
            Depth::Shallow => f.write_str("shallow"),
            Depth::Other(label) => f.write_str(label),
        }
    }
}

/// One user message, the coach's reply and what the analyzer made of it.
///
/// Serializes to the shape the backend's `/summarize` endpoint expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    #[serde(rename = "user")]
    user_text: String,
    #[serde(rename = "ai")]
    ai_text: String,
    phase: PhaseId,
    timestamp: DateTime<Utc>,
    sentiment: Option<Sentiment>,
    depth: Option<Depth>,
}

impl ChatTurn {
    pub fn new(
        user_text: impl Into<String>,
        ai_text: impl Into<String>,
        phase: PhaseId,
        sentiment: Option<Sentiment>,
        depth: Option<Depth>,
    ) -> Self {
        Self::with_timestamp(user_text, ai_text, phase, Utc::now(), sentiment, depth)
    }

    pub fn with_timestamp(
        user_text: impl Into<String>,
        ai_text: impl Into<String>,
        phase: PhaseId,
        timestamp: DateTime<Utc>,
        sentiment: Option<Sentiment>,
        depth: Option<Depth>,
    ) -> Self {
        Self {
            user_text: user_text.into(),
            ai_text: ai_text.into(),
            phase,
            timestamp,
            sentiment,
            depth,
        }
    }

    pub fn user_text(&self) -> &str {
        &self.user_text
    }

    pub fn ai_text(&self) -> &str {
        &self.ai_text
    }

    pub fn phase(&self) -> PhaseId {
        self.phase
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// `None` when the analyzer was unavailable for this turn.
    pub fn sentiment(&self) -> Option<&Sentiment> {
        self.sentiment.as_ref()
    }

    pub fn depth(&self) -> Option<&Depth> {
        self.depth.as_ref()
    }
}

/// Append-only record of the conversation, in the order it happened.
#[derive(Debug, Clone, Default)]
pub struct SessionTranscript {
    turns: Vec<ChatTurn>,
}

impl SessionTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn labels_parse_case_insensitively_and_keep_unknown_values() {
        assert_eq!(Sentiment::from("negative".to_string()), Sentiment::Negative);
        assert_eq!(
            Sentiment::from("MIXED".to_string()),
            Sentiment::Other("MIXED".to_string())
        );
        assert_eq!(Depth::from("Deep".to_string()), Depth::Deep);
        assert_eq!(Depth::Other("medium".into()).to_string(), "medium");
    }

    #[test]
    fn turn_serializes_in_summarize_history_shape() {
        let timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap();
        let turn = ChatTurn::with_timestamp(
            "We fought again",
            "Let's explore that.",
            PhaseId::Dynamics,
            timestamp,
            Some(Sentiment::Negative),
            None,
        );

        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "user": "We fought again",
                "ai": "Let's explore that.",
                "phase": "dynamics",
                "timestamp": "2024-05-01T18:30:00Z",
                "sentiment": "NEGATIVE",
                "depth": null,
            })
        );
    }
}
