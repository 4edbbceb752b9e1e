use thiserror::Error;

/// Every way a coaching session operation can fail.
///
/// None of these are fatal: the session stays usable after any of them and
/// the controller has already folded the failure into its view state by the
/// time the error reaches the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoachError {
    /// The backend could not be reached, answered with a non-success status,
    /// or sent a body that did not decode.
    #[error("coach backend unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("message is empty")]
    EmptyInput,
    #[error("voice recognition not supported")]
    SpeechUnsupported,
    #[error("speech recognition failed: {0}")]
    RecognitionError(String),
    /// A chat request is still waiting on the backend.
    #[error("a message is already being sent")]
    RequestInFlight,
    #[error("already listening")]
    AlreadyListening,
    #[error("nothing to summarize yet")]
    EmptyTranscript,
}

impl From<reqwest::Error> for CoachError {
    fn from(err: reqwest::Error) -> Self {
        CoachError::RemoteUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CoachError>;
