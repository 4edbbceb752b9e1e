use crate::coach_api::{Analysis, ChatReply, CoachApi};
use crate::error::Result;
use crate::phase::PhaseId;
use crate::transcript::{ChatTurn, Depth, Sentiment};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

/// The hosted backend both front-ends talk to.
pub const DEFAULT_BACKEND_URL: &str = "https://relationship-ai-backend-1.onrender.com";

/// The hosted backend sleeps when idle and takes a while to wake up.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    phase: PhaseId,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
    // Older backend revisions leave this out.
    #[serde(default)]
    alert: bool,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    sentiment: Sentiment,
    depth: Depth,
}

#[derive(Debug, Serialize)]
struct SummarizeRequest<'a> {
    history: &'a [ChatTurn],
}

#[derive(Debug, Deserialize)]
struct SummarizeResponse {
    summary: String,
}

/// HTTP client for the coaching backend.
///
/// Stateless apart from the connection pool: every call is one POST with a
/// JSON body against `{base_url}/{operation}`.
#[derive(Debug, Clone)]
pub struct RemoteCoachClient {
    client: Client,
    base_url: String,
}

impl RemoteCoachClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    async fn post<B, R>(&self, operation: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/{operation}", self.base_url);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<R>().await?)
    }
}

#[async_trait]
impl CoachApi for RemoteCoachClient {
    async fn chat(&self, message: &str, phase: PhaseId) -> Result<ChatReply> {
        let reply: ChatResponse = self.post("chat", &ChatRequest { message, phase }).await?;
        tracing::debug!("Alert from backend: {}", reply.alert);
        Ok(ChatReply {
            response_text: reply.response,
            alert: reply.alert,
        })
    }

    async fn analyze(&self, message: &str) -> Result<Analysis> {
        let reply: AnalyzeResponse = self.post("analyze", &AnalyzeRequest { message }).await?;
        Ok(Analysis {
            sentiment: reply.sentiment,
            depth: reply.depth,
        })
    }

    async fn summarize(&self, history: &[ChatTurn]) -> Result<String> {
        let reply: SummarizeResponse = self
            .post("summarize", &SummarizeRequest { history })
            .await?;
        Ok(reply.summary)
    }
}
