//! Terminal presentation layer: turns typed lines into commands and session
//! state into text.

use chrono::Local;
use coach_core::error::CoachError;
use coach_core::phase::PhaseId;
use coach_core::session_state::ViewState;
use coach_core::speech::{LOCALE_CHOICES, VoiceOption};
use coach_core::transcript::ChatTurn;

pub const HELP: &str = "\
Type a message and press enter to talk to the coach.

  /phase [id]        list phases, or switch to one
  /voices            list speech voices
  /voice <name>      pick a voice
  /voices-changed    reload voices after installing new ones
  /locale [tag]      list locales, or switch recognition and speech locale
  /listen            speak instead of typing (kept as draft)
  /send              send the draft
  /analyze <text>    sentiment and depth of a message
  /summary           summarize the session so far
  /speak             read the last response aloud
  /autospeak on|off  speak every reply automatically
  /history           show the reflection journal
  /status            show session status
  /reset             start over
  /help              show this help
  /quit              exit";

pub const SAFETY_ALERT: &str = "\
🛑 Emotional Safety Alert: Your message may reflect distress or harm.
   Please consider talking to someone you trust or seeking professional help.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Say(String),
    Phase(Option<String>),
    Voices,
    Voice(String),
    VoicesChanged,
    Locale(Option<String>),
    Listen,
    Send,
    Analyze(String),
    Summary,
    Speak,
    AutoSpeak(bool),
    History,
    Status,
    Reset,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command /{0}. Type /help for a list.")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Option<Result<UserCommand, CommandError>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Some(Ok(UserCommand::Say(line.to_string())));
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    let argument = (!rest.is_empty()).then(|| rest.to_string());

    let parsed = match name.to_lowercase().as_str() {
        "phase" => Ok(UserCommand::Phase(argument)),
        "voices" => Ok(UserCommand::Voices),
        "voice" => argument
            .map(UserCommand::Voice)
            .ok_or(CommandError::Usage("/voice <name>")),
        "voices-changed" => Ok(UserCommand::VoicesChanged),
        "locale" => Ok(UserCommand::Locale(argument)),
        "listen" => Ok(UserCommand::Listen),
        "send" => Ok(UserCommand::Send),
        "analyze" => argument
            .map(UserCommand::Analyze)
            .ok_or(CommandError::Usage("/analyze <text>")),
        "summary" | "summarize" => Ok(UserCommand::Summary),
        "speak" => Ok(UserCommand::Speak),
        "autospeak" => argument
            .as_deref()
            .and_then(crate::config::parse_flag)
            .map(UserCommand::AutoSpeak)
            .ok_or(CommandError::Usage("/autospeak on|off")),
        "history" | "journal" => Ok(UserCommand::History),
        "status" => Ok(UserCommand::Status),
        "reset" => Ok(UserCommand::Reset),
        "help" | "?" => Ok(UserCommand::Help),
        "quit" | "exit" => Ok(UserCommand::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    };
    Some(parsed)
}

/// Whether a message (or the draft, when `message` is `None`) can be sent
/// right now. Same checks the session makes on submit.
pub fn check_send(view: &ViewState, message: Option<&str>) -> Result<(), CoachError> {
    if view.loading {
        return Err(CoachError::RequestInFlight);
    }
    let text = message.unwrap_or(&view.draft);
    if text.trim().is_empty() {
        return Err(CoachError::EmptyInput);
    }
    Ok(())
}

/// The coach's latest answer, followed by the safety notice when the backend
/// raised one.
pub fn render_response(view: &ViewState) -> String {
    let mut out = String::new();
    if let Some(response) = &view.response {
        out.push_str("🧠 AI Response:\n");
        out.push_str(response);
    }
    if view.alert {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(SAFETY_ALERT);
    }
    out
}

pub fn render_turn(turn: &ChatTurn) -> String {
    let timestamp = turn.timestamp().with_timezone(&Local);
    let sentiment = turn
        .sentiment()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let depth = turn
        .depth()
        .map(|d| d.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    format!(
        "{} ({})\nYou: {}\nAI: {}\nSentiment: {}\nDepth: {}",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        turn.phase(),
        turn.user_text(),
        turn.ai_text(),
        sentiment,
        depth
    )
}

pub fn render_journal(turns: &[ChatTurn]) -> String {
    if turns.is_empty() {
        return "The reflection journal is empty.".to_string();
    }
    let entries: Vec<String> = turns.iter().map(render_turn).collect();
    format!("🧠 Reflection Journal\n\n{}", entries.join("\n\n"))
}

pub fn render_phases(choices: &[PhaseId], current: PhaseId) -> String {
    choices
        .iter()
        .map(|phase| {
            let marker = if *phase == current { " [current]" } else { "" };
            format!(" * {} - {}{}", phase, phase.label(), marker)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_voices(voices: &[VoiceOption], selected: Option<&VoiceOption>) -> String {
    if voices.is_empty() {
        return "No voices available yet. Try /voices-changed once the speech engine is ready."
            .to_string();
    }
    voices
        .iter()
        .map(|voice| {
            let marker = if Some(voice) == selected { " [selected]" } else { "" };
            format!(" * {}{}", voice, marker)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_locales(current: &str) -> String {
    LOCALE_CHOICES
        .iter()
        .map(|(tag, name)| {
            let marker = if *tag == current { " [current]" } else { "" };
            format!(" * {} - {}{}", tag, name, marker)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_status(view: &ViewState) -> String {
    let voice = view
        .selected_voice
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "engine default".to_string());
    let mut lines = vec![
        format!("Phase: {} ({})", view.phase.label(), view.phase),
        format!("Turns: {}", view.turns.len()),
        format!("Request: {:?}", view.request),
        format!("Listening: {}", if view.listening { "yes" } else { "no" }),
        format!("Locale: {}", view.locale),
        format!("Voice: {}", voice),
        format!("Auto-speak: {}", if view.auto_speak { "on" } else { "off" }),
    ];
    if view.loading {
        lines.push("⏳ Thinking...".to_string());
    }
    if !view.draft.is_empty() {
        lines.push(format!("Draft: {}", view.draft));
    }
    if let Some(notice) = &view.notice {
        lines.push(format!("Notice: {}", notice));
    }
    lines.join("\n")
}
