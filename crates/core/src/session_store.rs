use crate::phase::{PhaseId, PhaseMode};
use crate::transcript::{ChatTurn, SessionTranscript};

/// In-memory state of one coaching session: the transcript, the phase
/// selection and the slots derived from the latest remote replies.
///
/// Every operation is total and free of I/O.
#[derive(Debug, Clone)]
pub struct SessionStore {
    transcript: SessionTranscript,
    phase_mode: PhaseMode,
    phase: PhaseId,
    alert: bool,
    summary: Option<String>,
    last_response: Option<String>,
}

impl SessionStore {
    pub fn new(phase_mode: PhaseMode) -> Self {
        Self {
            transcript: SessionTranscript::new(),
            phase_mode,
            phase: phase_mode.initial_phase(),
            alert: false,
            summary: None,
            last_response: None,
        }
    }

    pub fn append_turn(&mut self, turn: ChatTurn) {
        self.transcript.push(turn);
    }

    pub fn transcript(&self) -> &SessionTranscript {
        &self.transcript
    }

    pub fn phase_mode(&self) -> PhaseMode {
        self.phase_mode
    }

    pub fn current_phase(&self) -> PhaseId {
        self.phase
    }

    /// Returns false when the phase mode does not offer `phase`; the
    /// selection is left as it was in that case.
    pub fn set_phase(&mut self, phase: PhaseId) -> bool {
        if !self.phase_mode.allows(phase) {
            return false;
        }
        self.phase = phase;
        true
    }

    pub fn alert(&self) -> bool {
        self.alert
    }

    pub fn set_alert(&mut self, alert: bool) {
        self.alert = alert;
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn set_summary(&mut self, summary: String) {
        self.summary = Some(summary);
    }

    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    pub fn set_last_response(&mut self, response: Option<String>) {
        self.last_response = response;
    }

    /// Drops the transcript and every derived slot. The phase selection is
    /// kept.
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.alert = false;
        self.summary = None;
        self.last_response = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(text: &str) -> ChatTurn {
        ChatTurn::new(text, "ok", PhaseId::Onboarding, None, None)
    }

    #[test]
    fn append_keeps_conversation_order() {
        let mut store = SessionStore::new(PhaseMode::MultiPhase);
        store.append_turn(turn("first"));
        store.append_turn(turn("second"));
        store.append_turn(turn("third"));

        let texts: Vec<&str> = store
            .transcript()
            .turns()
            .iter()
            .map(|t| t.user_text())
            .collect();
        assert_eq!(texts, ["first", "second", "third"]);
    }

    #[test]
    fn phase_selection_is_independent_of_transcript() {
        let mut store = SessionStore::new(PhaseMode::MultiPhase);
        store.append_turn(turn("hello"));

        assert!(store.set_phase(PhaseId::Dynamics));
        assert_eq!(store.current_phase(), PhaseId::Dynamics);
        assert_eq!(store.transcript().len(), 1);

        assert!(!store.set_phase(PhaseId::Reflection));
        assert_eq!(store.current_phase(), PhaseId::Dynamics);
    }

    #[test]
    fn fixed_mode_pins_the_phase() {
        let mut store = SessionStore::new(PhaseMode::Fixed(PhaseId::Reflection));
        assert_eq!(store.current_phase(), PhaseId::Reflection);
        assert!(!store.set_phase(PhaseId::Onboarding));
        assert_eq!(store.current_phase(), PhaseId::Reflection);
    }

    #[test]
    fn reset_clears_transcript_and_derived_state_but_keeps_phase() {
        let mut store = SessionStore::new(PhaseMode::MultiPhase);
        store.set_phase(PhaseId::DualReflection);
        store.append_turn(turn("hello"));
        store.set_alert(true);
        store.set_summary("summary".to_string());
        store.set_last_response(Some("reply".to_string()));

        store.reset();

        assert!(store.transcript().is_empty());
        assert!(!store.alert());
        assert_eq!(store.summary(), None);
        assert_eq!(store.last_response(), None);
        assert_eq!(store.current_phase(), PhaseId::DualReflection);
    }
}
