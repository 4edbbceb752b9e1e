use async_trait::async_trait;
use coach_core::error::{CoachError, Result};
use coach_core::speech::SpeechInput;
use std::process::Stdio;
use tokio::process::Command;

/// Environment variable through which the recognizer learns the locale.
pub const LANG_ENV: &str = "COACH_STT_LANG";

/// Speech-to-text through an external command.
///
/// The command records one utterance, prints the final transcript on stdout
/// and exits. With no command configured the platform has no recognizer.
#[derive(Debug, Clone, Default)]
pub struct CommandRecognizer {
    command: Option<(String, Vec<String>)>,
}

impl CommandRecognizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: Some((program.into(), args)),
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn from_command_line(line: Option<&str>) -> Self {
        Self {
            command: line.and_then(crate::split_command_line),
        }
    }
}

#[async_trait]
impl SpeechInput for CommandRecognizer {
    fn is_supported(&self) -> bool {
        self.command.is_some()
    }

    async fn recognize(&self, lang: &str) -> Result<String> {
        let Some((program, args)) = &self.command else {
            return Err(CoachError::SpeechUnsupported);
        };

        let output = Command::new(program)
            .args(args)
            .env(LANG_ENV, lang)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| CoachError::RecognitionError(format!("failed to run {program}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoachError::RecognitionError(format!(
                "{program} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| CoachError::RecognitionError("no speech detected".to_string()))
    }
}
