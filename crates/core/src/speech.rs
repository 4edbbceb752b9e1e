use crate::error::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::fmt;

/// Locales offered for recognition and synthesis, with their display names.
pub const LOCALE_CHOICES: [(&str, &str); 5] = [
    ("en-IN", "English (India)"),
    ("en-US", "English (US)"),
    ("hi-IN", "Hindi"),
    ("ta-IN", "Tamil"),
    ("te-IN", "Telugu"),
];

/// A voice the synthesis engine can speak with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceOption {
    pub name: String,
    pub lang: String,
}

impl VoiceOption {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

impl fmt::Display for VoiceOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.lang)
    }
}

/// Text to be spoken along with how to speak it.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    /// `None` lets the engine pick its default voice for `lang`.
    pub voice: Option<VoiceOption>,
    pub rate: f32,
    pub pitch: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>, lang: impl Into<String>, voice: Option<VoiceOption>) -> Self {
        Self {
            text: text.into(),
            lang: lang.into(),
            voice,
            rate: 1.0,
            pitch: 1.0,
        }
    }
}

/// Speech-to-text. One call is one listening session that ends with a
/// single final transcript.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait SpeechInput: Send + Sync {
    /// Whether the platform has a recognizer at all. Callers check this
    /// before [`SpeechInput::recognize`] and report the capability as
    /// missing instead of invoking it.
    fn is_supported(&self) -> bool;

    async fn recognize(&self, lang: &str) -> Result<String>;
}

/// Text-to-speech.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait SpeechOutput: Send + Sync {
    /// Starts playback and returns immediately.
    fn speak(&self, utterance: Utterance);

    /// May be empty while the engine is still enumerating its voices.
    async fn list_voices(&self) -> Vec<VoiceOption>;

    /// Re-enumerates after the engine signalled that its voices changed.
    async fn refresh_voices(&self) -> Vec<VoiceOption> {
        self.list_voices().await
    }
}

const PREFERRED_VOICE_HINTS: [&str; 3] = ["female", "samantha", "zira"];

/// The known voices and which one is selected. The selection always points
/// into the current list.
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    voices: Vec<VoiceOption>,
    selected: Option<usize>,
}

impl VoiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the voice list. A previous selection survives if a voice
    /// with the same name is still present; otherwise a preferred voice or
    /// the first one is selected.
    pub fn replace(&mut self, voices: Vec<VoiceOption>) {
        let previous = self.selected().map(|v| v.name.clone());
        self.voices = voices;
        self.selected = previous
            .and_then(|name| self.position(&name))
            .or_else(|| self.preferred())
            .or(if self.voices.is_empty() { None } else { Some(0) });
    }

    pub fn voices(&self) -> &[VoiceOption] {
        &self.voices
    }

    pub fn selected(&self) -> Option<&VoiceOption> {
        self.selected.and_then(|idx| self.voices.get(idx))
    }

    pub fn select(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.selected = Some(idx);
                true
            }
            None => false,
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.voices.iter().position(|v| v.name == name)
    }

    fn preferred(&self) -> Option<usize> {
        self.voices.iter().position(|v| {
            let name = v.name.to_lowercase();
            PREFERRED_VOICE_HINTS.iter().any(|hint| name.contains(hint))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices(names: &[&str]) -> Vec<VoiceOption> {
        names.iter().map(|n| VoiceOption::new(*n, "en-US")).collect()
    }

    #[test]
    fn prefers_a_known_female_voice() {
        let mut catalog = VoiceCatalog::new();
        catalog.replace(voices(&["Alex", "Microsoft Zira Desktop", "Daniel"]));
        assert_eq!(catalog.selected().unwrap().name, "Microsoft Zira Desktop");
    }

    #[test]
    fn falls_back_to_first_voice_and_tolerates_empty_list() {
        let mut catalog = VoiceCatalog::new();
        catalog.replace(Vec::new());
        assert!(catalog.selected().is_none());

        catalog.replace(voices(&["Alex", "Daniel"]));
        assert_eq!(catalog.selected().unwrap().name, "Alex");
    }

    #[test]
    fn keeps_selection_across_reload_when_still_available() {
        let mut catalog = VoiceCatalog::new();
        catalog.replace(voices(&["Alex", "Samantha", "Daniel"]));
        assert!(catalog.select("Daniel"));

        catalog.replace(voices(&["Samantha", "Daniel", "Fred"]));
        assert_eq!(catalog.selected().unwrap().name, "Daniel");

        catalog.replace(voices(&["Fred", "Samantha"]));
        assert_eq!(catalog.selected().unwrap().name, "Samantha");
    }

    #[test]
    fn selecting_unknown_voice_is_refused() {
        let mut catalog = VoiceCatalog::new();
        catalog.replace(voices(&["Alex"]));
        assert!(!catalog.select("Nobody"));
        assert_eq!(catalog.selected().unwrap().name, "Alex");
    }
}
