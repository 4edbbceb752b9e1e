pub mod client;
pub mod coach_api;
pub mod error;
pub mod phase;
pub mod session_state;
pub mod session_store;
pub mod speech;
pub mod transcript;

pub use client::RemoteCoachClient;
pub use coach_api::{Analysis, ChatReply, CoachApi};
pub use error::{CoachError, Result};
pub use phase::{PhaseId, PhaseMode};
pub use session_state::{CoachSession, RequestState, SessionOptions, ViewState};
pub use speech::{SpeechInput, SpeechOutput, Utterance, VoiceOption};
pub use transcript::{ChatTurn, Depth, Sentiment};
