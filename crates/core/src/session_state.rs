use crate::coach_api::{Analysis, CoachApi};
use crate::error::{CoachError, Result};
use crate::phase::{PhaseId, PhaseMode};
use crate::session_store::SessionStore;
use crate::speech::{SpeechInput, SpeechOutput, Utterance, VoiceCatalog, VoiceOption};
use crate::transcript::ChatTurn;
use tokio::sync::Mutex;

pub const CHAT_ERROR_TEXT: &str = "⚠️ Error talking to the AI.";
pub const ANALYSIS_ERROR_TEXT: &str = "⚠️ Analysis Failed";
pub const SUMMARY_ERROR_TEXT: &str = "⚠️ Summary Failed";
pub const SPEECH_UNSUPPORTED_TEXT: &str = "Voice recognition not supported.";
pub const RECOGNITION_ERROR_TEXT: &str = "Didn't catch that. Please try again.";

/// Lifecycle of the chat request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Sending,
    Settled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenState {
    Idle,
    Listening,
}

/// Configuration that distinguishes the guided multi-phase coach from the
/// single-form reflection coach.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub phase_mode: PhaseMode,
    pub auto_speak: bool,
    /// Run the analyzer on every chat message and keep its labels on the turn.
    pub analyze_turns: bool,
    pub locale: String,
}

impl SessionOptions {
    pub fn multi_phase() -> Self {
        Self {
            phase_mode: PhaseMode::MultiPhase,
            auto_speak: true,
            analyze_turns: true,
            locale: "en-US".to_string(),
        }
    }

    pub fn reflection() -> Self {
        Self {
            phase_mode: PhaseMode::Fixed(PhaseId::Reflection),
            auto_speak: true,
            analyze_turns: false,
            locale: "en-IN".to_string(),
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::multi_phase()
    }
}

/// Snapshot of everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub request: RequestState,
    pub loading: bool,
    pub listening: bool,
    pub phase: PhaseId,
    pub response: Option<String>,
    pub alert: bool,
    pub summary: Option<String>,
    pub notice: Option<String>,
    pub draft: String,
    pub turns: Vec<ChatTurn>,
    pub locale: String,
    pub auto_speak: bool,
    pub selected_voice: Option<VoiceOption>,
}

struct SessionInner {
    store: SessionStore,
    request: RequestState,
    listening: ListenState,
    voices: VoiceCatalog,
    locale: String,
    auto_speak: bool,
    draft: String,
    notice: Option<String>,
    /// Bumped by `reset`. Replies that come back under an older generation
    /// belong to the cleared conversation and are discarded.
    generation: u64,
}

impl SessionInner {
    fn utterance(&self, text: String) -> Utterance {
        Utterance::new(text, self.locale.clone(), self.voices.selected().cloned())
    }
}

/// Drives one coaching conversation: sends messages to the backend, keeps
/// the transcript, speaks replies and runs voice input.
///
/// All mutable state sits behind a single mutex that is never held while a
/// remote call or a recognition is pending, so a summary can be requested
/// while a chat message is still in flight. Only one chat request may be in
/// flight at a time.
pub struct CoachSession<A, O, I> {
    api: A,
    output: O,
    input: I,
    analyze_turns: bool,
    inner: Mutex<SessionInner>,
}

impl<A, O, I> CoachSession<A, O, I>
where
    A: CoachApi,
    O: SpeechOutput,
    I: SpeechInput,
{
    pub fn new(api: A, output: O, input: I, options: SessionOptions) -> Self {
        Self {
            api,
            output,
            input,
            analyze_turns: options.analyze_turns,
            inner: Mutex::new(SessionInner {
                store: SessionStore::new(options.phase_mode),
                request: RequestState::Idle,
                listening: ListenState::Idle,
                voices: VoiceCatalog::new(),
                locale: options.locale,
                auto_speak: options.auto_speak,
                draft: String::new(),
                notice: None,
                generation: 0,
            }),
        }
    }

    /// Sends `message` in the current phase and records the resulting turn.
    ///
    /// On a backend failure the response slot shows [`CHAT_ERROR_TEXT`], the
    /// transcript is untouched and the error is returned.
    pub async fn submit(&self, message: &str) -> Result<ChatTurn> {
        let message = message.trim();
        if message.is_empty() {
            return Err(CoachError::EmptyInput);
        }

        let phase = {
            let mut inner = self.inner.lock().await;
            if inner.request == RequestState::Sending {
                tracing::warn!("Rejecting message while another is in flight");
                return Err(CoachError::RequestInFlight);
            }
            inner.store.set_alert(false);
            inner.store.set_last_response(None);
            inner.notice = None;
            inner.request = RequestState::Sending;
            inner.store.current_phase()
        };

        tracing::info!("Sending message in phase '{}'", phase);
        let reply = match self.api.chat(message, phase).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Chat request failed: {}", e);
                let mut inner = self.inner.lock().await;
                inner
                    .store
                    .set_last_response(Some(CHAT_ERROR_TEXT.to_string()));
                inner.request = RequestState::Failed;
                return Err(e);
            }
        };

        {
            let mut inner = self.inner.lock().await;
            inner
                .store
                .set_last_response(Some(reply.response_text.clone()));
            inner.store.set_alert(reply.alert);
        }
        if reply.alert {
            tracing::warn!("Backend flagged the message as a possible safety concern");
        }

        let analysis = if self.analyze_turns {
            match self.api.analyze(message).await {
                Ok(analysis) => Some(analysis),
                Err(e) => {
                    tracing::warn!("Analysis failed, recording turn without labels: {}", e);
                    None
                }
            }
        } else {
            None
        };
        let (sentiment, depth) = match analysis {
            Some(Analysis { sentiment, depth }) => (Some(sentiment), Some(depth)),
            None => (None, None),
        };

        let turn = ChatTurn::new(message, reply.response_text.clone(), phase, sentiment, depth);
        let utterance = {
            let mut inner = self.inner.lock().await;
            inner.store.append_turn(turn.clone());
            inner.request = RequestState::Settled;
            inner
                .auto_speak
                .then(|| inner.utterance(reply.response_text))
        };
        if let Some(utterance) = utterance {
            self.output.speak(utterance);
        }

        Ok(turn)
    }

    /// Submits the draft message; the draft is cleared once the turn settles.
    pub async fn submit_draft(&self) -> Result<ChatTurn> {
        let draft = self.inner.lock().await.draft.clone();
        let turn = self.submit(&draft).await?;
        let mut inner = self.inner.lock().await;
        if inner.draft == draft {
            inner.draft.clear();
        }
        Ok(turn)
    }

    /// Marks a settled or failed request as seen, returning to `Idle`.
    pub async fn acknowledge(&self) -> RequestState {
        let mut inner = self.inner.lock().await;
        if matches!(inner.request, RequestState::Settled | RequestState::Failed) {
            inner.request = RequestState::Idle;
        }
        inner.request
    }

    /// Standalone analysis of a message. The result replaces the response
    /// slot; the transcript is not touched.
    pub async fn analyze(&self, message: &str) -> Result<Analysis> {
        let message = message.trim();
        if message.is_empty() {
            return Err(CoachError::EmptyInput);
        }

        let generation = self.inner.lock().await.generation;
        let result = self.api.analyze(message).await;

        let mut inner = self.inner.lock().await;
        let current = inner.generation == generation;
        if !current {
            tracing::debug!("Discarding analysis that finished after a reset");
        }
        match result {
            Ok(analysis) => {
                if current {
                    let text = format!(
                        "Sentiment: {}\nDepth: {}",
                        analysis.sentiment, analysis.depth
                    );
                    inner.store.set_last_response(Some(text));
                }
                Ok(analysis)
            }
            Err(e) => {
                tracing::error!("Analyze request failed: {}", e);
                if current {
                    inner
                        .store
                        .set_last_response(Some(ANALYSIS_ERROR_TEXT.to_string()));
                }
                Err(e)
            }
        }
    }

    /// Summarizes the transcript so far. An empty transcript is refused
    /// without contacting the backend.
    pub async fn summarize(&self) -> Result<String> {
        let (history, generation) = {
            let inner = self.inner.lock().await;
            if inner.store.transcript().is_empty() {
                return Err(CoachError::EmptyTranscript);
            }
            (inner.store.transcript().turns().to_vec(), inner.generation)
        };

        tracing::info!("Requesting summary of {} turns", history.len());
        let result = self.api.summarize(&history).await;

        let mut inner = self.inner.lock().await;
        let current = inner.generation == generation;
        if !current {
            tracing::debug!("Discarding summary that finished after a reset");
        }
        match result {
            Ok(summary) => {
                if current {
                    inner.store.set_summary(summary.clone());
                }
                Ok(summary)
            }
            Err(e) => {
                tracing::error!("Summarize request failed: {}", e);
                if current {
                    inner.notice = Some(SUMMARY_ERROR_TEXT.to_string());
                }
                Err(e)
            }
        }
    }

    /// Runs one voice-input session. A recognized transcript becomes the
    /// draft and is returned; a recognition failure leaves a notice and
    /// yields `None`.
    pub async fn listen(&self) -> Result<Option<String>> {
        if !self.input.is_supported() {
            self.inner.lock().await.notice = Some(SPEECH_UNSUPPORTED_TEXT.to_string());
            return Err(CoachError::SpeechUnsupported);
        }

        let (locale, generation) = {
            let mut inner = self.inner.lock().await;
            if inner.listening == ListenState::Listening {
                return Err(CoachError::AlreadyListening);
            }
            inner.listening = ListenState::Listening;
            (inner.locale.clone(), inner.generation)
        };

        tracing::debug!("Listening ({})", locale);
        let result = self.input.recognize(&locale).await;

        let mut inner = self.inner.lock().await;
        inner.listening = ListenState::Idle;
        let current = inner.generation == generation;
        match result {
            Ok(transcript) => {
                if current {
                    inner.draft = transcript.clone();
                }
                Ok(Some(transcript))
            }
            Err(e) => {
                tracing::warn!("Speech recognition failed: {}", e);
                if current {
                    inner.notice = Some(RECOGNITION_ERROR_TEXT.to_string());
                }
                Ok(None)
            }
        }
    }

    /// Speaks the current response again. Returns false if there is nothing
    /// to say.
    pub async fn speak_last_response(&self) -> bool {
        let utterance = {
            let inner = self.inner.lock().await;
            match inner.store.last_response() {
                Some(text) if !text.is_empty() => inner.utterance(text.to_string()),
                _ => return false,
            }
        };
        self.output.speak(utterance);
        true
    }

    /// Initial voice enumeration. The list may still be empty if the engine
    /// has not finished loading; call [`CoachSession::voices_changed`] when it
    /// signals that it has.
    pub async fn load_voices(&self) -> Vec<VoiceOption> {
        let voices = self.output.list_voices().await;
        self.apply_voices(voices).await
    }

    /// Re-queries the engine once after a voices-changed signal.
    pub async fn voices_changed(&self) -> Vec<VoiceOption> {
        let voices = self.output.refresh_voices().await;
        self.apply_voices(voices).await
    }

    async fn apply_voices(&self, voices: Vec<VoiceOption>) -> Vec<VoiceOption> {
        let mut inner = self.inner.lock().await;
        inner.voices.replace(voices);
        tracing::debug!(
            "{} voices available, selected {:?}",
            inner.voices.voices().len(),
            inner.voices.selected().map(|v| &v.name)
        );
        inner.voices.voices().to_vec()
    }

    pub async fn voices(&self) -> Vec<VoiceOption> {
        self.inner.lock().await.voices.voices().to_vec()
    }

    pub async fn select_voice(&self, name: &str) -> bool {
        self.inner.lock().await.voices.select(name)
    }

    pub async fn select_phase(&self, phase: PhaseId) -> bool {
        self.inner.lock().await.store.set_phase(phase)
    }

    pub async fn phase_choices(&self) -> Vec<PhaseId> {
        self.inner.lock().await.store.phase_mode().choices()
    }

    pub async fn set_locale(&self, locale: &str) -> bool {
        let locale = locale.trim();
        if locale.is_empty() {
            return false;
        }
        self.inner.lock().await.locale = locale.to_string();
        true
    }

    pub async fn set_auto_speak(&self, enabled: bool) {
        self.inner.lock().await.auto_speak = enabled;
    }

    pub async fn set_draft(&self, draft: &str) {
        self.inner.lock().await.draft = draft.to_string();
    }

    pub async fn draft(&self) -> String {
        self.inner.lock().await.draft.clone()
    }

    pub async fn transcript(&self) -> Vec<ChatTurn> {
        self.inner.lock().await.store.transcript().turns().to_vec()
    }

    /// Starts the session over. Refused while a chat request is in flight,
    /// since its reply would land in the fresh transcript. A summary,
    /// analysis or recognition still pending is allowed to finish, but its
    /// result no longer touches the session.
    pub async fn reset(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.request == RequestState::Sending {
            return Err(CoachError::RequestInFlight);
        }
        inner.store.reset();
        inner.generation += 1;
        inner.request = RequestState::Idle;
        inner.draft.clear();
        inner.notice = None;
        tracing::info!("Session reset");
        Ok(())
    }

    pub async fn view(&self) -> ViewState {
        let inner = self.inner.lock().await;
        ViewState {
            request: inner.request,
            loading: inner.request == RequestState::Sending,
            listening: inner.listening == ListenState::Listening,
            phase: inner.store.current_phase(),
            response: inner.store.last_response().map(str::to_string),
            alert: inner.store.alert(),
            summary: inner.store.summary().map(str::to_string),
            notice: inner.notice.clone(),
            draft: inner.draft.clone(),
            turns: inner.store.transcript().turns().to_vec(),
            locale: inner.locale.clone(),
            auto_speak: inner.auto_speak,
            selected_voice: inner.voices.selected().cloned(),
        }
    }
}
