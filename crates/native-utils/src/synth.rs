use async_trait::async_trait;
use coach_core::speech::{SpeechOutput, Utterance, VoiceOption};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Mutex;

/// espeak-ng's default speaking rate in words per minute.
const BASE_WORDS_PER_MINUTE: f32 = 175.0;
/// espeak-ng's default pitch on its 0-99 scale.
const BASE_PITCH: f32 = 50.0;

/// Text-to-speech through an `espeak-ng` compatible command.
///
/// The voice list is enumerated with `--voices` the first time it is asked
/// for and cached here for the life of the adapter. An empty enumeration is
/// not cached, so a later call tries again.
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
    voices: Mutex<Option<Vec<VoiceOption>>>,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            voices: Mutex::new(None),
        }
    }

    /// Builds a synthesizer from a command line such as `espeak-ng -a 150`.
    /// A blank line falls back to plain `espeak-ng`.
    pub fn from_command_line(line: &str) -> Self {
        match crate::split_command_line(line) {
            Some((program, args)) => Self::new(program, args),
            None => Self::new("espeak-ng", Vec::new()),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }

    async fn enumerate(&self) -> Vec<VoiceOption> {
        let output = match self.command().arg("--voices").output().await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Could not run '{}' to list voices: {}", self.program, e);
                return Vec::new();
            }
        };
        if !output.status.success() {
            tracing::warn!(
                "'{} --voices' exited with {}",
                self.program,
                output.status
            );
            return Vec::new();
        }
        parse_voice_list(&String::from_utf8_lossy(&output.stdout))
    }
}

#[async_trait]
impl SpeechOutput for CommandSynthesizer {
    fn speak(&self, utterance: Utterance) {
        let mut command = self.command();
        command
            .args(speak_args(&utterance))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!("Failed to start speech engine '{}': {}", self.program, e);
                return;
            }
        };
        tracing::debug!("Speaking {} characters", utterance.text.len());

        let stdin = child.stdin.take();
        let text = utterance.text;
        tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                if let Err(e) = stdin.write_all(text.as_bytes()).await {
                    tracing::warn!("Failed to hand text to speech engine: {}", e);
                }
            }
            match child.wait().await {
                Ok(status) if !status.success() => {
                    tracing::warn!("Speech engine exited with {}", status)
                }
                Err(e) => tracing::warn!("Speech engine did not finish: {}", e),
                Ok(_) => {}
            }
        });
    }

    async fn list_voices(&self) -> Vec<VoiceOption> {
        let mut cached = self.voices.lock().await;
        if let Some(voices) = cached.as_ref() {
            return voices.clone();
        }
        let voices = self.enumerate().await;
        if !voices.is_empty() {
            *cached = Some(voices.clone());
        }
        voices
    }

    async fn refresh_voices(&self) -> Vec<VoiceOption> {
        self.voices.lock().await.take();
        self.list_voices().await
    }
}

fn speak_args(utterance: &Utterance) -> Vec<String> {
    let voice = match &utterance.voice {
        Some(voice) => voice.name.clone(),
        None => utterance.lang.to_lowercase(),
    };
    let words_per_minute = (BASE_WORDS_PER_MINUTE * utterance.rate).round() as u32;
    let pitch = (BASE_PITCH * utterance.pitch).round().clamp(0.0, 99.0) as u32;
    vec![
        "-v".to_string(),
        voice,
        "-s".to_string(),
        words_per_minute.to_string(),
        "-p".to_string(),
        pitch.to_string(),
        "--stdin".to_string(),
    ]
}

/// Parses the table printed by `espeak-ng --voices`:
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  en-us           --/M      English_(America)  gmw/en-US            (en 10)
/// ```
pub fn parse_voice_list(output: &str) -> Vec<VoiceOption> {
    output
        .lines()
        .filter(|line| !line.trim_start().starts_with("Pty"))
        .filter_map(|line| {
            let columns: Vec<&str> = line.split_whitespace().collect();
            match columns.as_slice() {
                [_priority, lang, _age_gender, name, ..] => Some(VoiceOption::new(*name, *lang)),
                _ => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::tempdir;

    const VOICES_TABLE: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  en-gb           --/M      English_(Great_Britain) gmw/en            (en 2)
 5  en-us           --/M      English_(America)  gmw/en-US            (en 3)
 5  hi              --/M      Hindi              inc/hi
";

    /// A stand-in engine: a shell script that logs each invocation and
    /// answers `--voices` with a fixed table.
    fn fake_engine(dir: &Path) -> CommandSynthesizer {
        let script = format!(
            "printf '%s\\n' \"$*\" >> '{calls}'; \
             if [ \"$1\" = --voices ]; then printf '%s' '{table}'; else cat > '{spoken}'; fi",
            calls = dir.join("calls").display(),
            spoken = dir.join("spoken").display(),
            table = VOICES_TABLE,
        );
        CommandSynthesizer::new("sh", vec!["-c".to_string(), script, "sh".to_string()])
    }

    fn calls(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("calls"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_parse_voice_list_skips_header() {
        let voices = parse_voice_list(VOICES_TABLE);
        assert_eq!(
            voices,
            vec![
                VoiceOption::new("English_(Great_Britain)", "en-gb"),
                VoiceOption::new("English_(America)", "en-us"),
                VoiceOption::new("Hindi", "hi"),
            ]
        );
        assert!(parse_voice_list("").is_empty());
    }

    #[test]
    fn test_speak_args_prefer_selected_voice() {
        let with_voice = Utterance::new("hi", "en-US", Some(VoiceOption::new("Hindi", "hi")));
        assert_eq!(
            speak_args(&with_voice),
            ["-v", "Hindi", "-s", "175", "-p", "50", "--stdin"]
        );

        let mut by_locale = Utterance::new("hi", "en-IN", None);
        by_locale.rate = 1.2;
        assert_eq!(
            speak_args(&by_locale),
            ["-v", "en-in", "-s", "210", "-p", "50", "--stdin"]
        );
    }

    #[tokio::test]
    async fn test_voices_are_enumerated_once_until_refreshed() {
        let dir = tempdir().unwrap();
        let synth = fake_engine(dir.path());

        let first = synth.list_voices().await;
        let second = synth.list_voices().await;
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert_eq!(calls(dir.path()), ["--voices"]);

        synth.refresh_voices().await;
        assert_eq!(calls(dir.path()), ["--voices", "--voices"]);
    }

    #[tokio::test]
    async fn test_missing_engine_yields_no_voices() {
        let synth = CommandSynthesizer::new("definitely-not-a-speech-engine", Vec::new());
        assert!(synth.list_voices().await.is_empty());
        // Must not panic either.
        synth.speak(Utterance::new("hello", "en-US", None));
    }

    #[tokio::test]
    async fn test_speak_pipes_text_to_engine() {
        let dir = tempdir().unwrap();
        let synth = fake_engine(dir.path());

        synth.speak(Utterance::new("Let's explore that.", "en-US", None));

        let spoken = dir.path().join("spoken");
        let mut text = String::new();
        for _ in 0..100 {
            text = std::fs::read_to_string(&spoken).unwrap_or_default();
            if !text.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(text, "Let's explore that.");
        assert_eq!(calls(dir.path()), ["-v en-us -s 175 -p 50 --stdin"]);
    }
}
