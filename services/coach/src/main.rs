use anyhow::{Context, Result};
use clap::Parser;
use coach_core::client::RemoteCoachClient;
use coach_core::error::CoachError;
use coach_core::phase::PhaseId;
use coach_core::session_state::CoachSession;
use coach_native_utils::{CommandRecognizer, CommandSynthesizer};
use coach_service::config::{Config, Variant};
use coach_service::repl::{self, UserCommand};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::fmt::time::ChronoLocal;

type Session = CoachSession<RemoteCoachClient, CommandSynthesizer, CommandRecognizer>;

#[derive(Parser)]
#[command(version, about = "Talk to the relationship coach from your terminal")]
struct Cli {
    /// Base address of the coaching backend
    #[arg(long)]
    backend: Option<String>,
    /// Guided multi-phase coach or single reflection form
    #[arg(long, value_enum)]
    variant: Option<Variant>,
    /// Do not speak replies automatically
    #[arg(long)]
    mute: bool,
    /// Locale for voice input and output, e.g. en-IN
    #[arg(long)]
    locale: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Parse Command-Line Arguments ---
    let args = Cli::parse();

    // --- 2. Load Configuration ---
    let mut config = Config::from_env().context("Failed to load application configuration")?;
    if let Some(backend) = args.backend {
        config.backend_url = backend;
    }
    if let Some(variant) = args.variant {
        config.variant = variant;
    }
    if args.mute {
        config.auto_speak = false;
    }
    if let Some(locale) = args.locale {
        config.locale = Some(locale);
    }

    // --- 3. Initialize Logging ---
    // Logs go to stderr so they don't interleave with the conversation.
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        "Configuration loaded. Backend: {}, variant: {:?}",
        config.backend_url,
        config.variant
    );

    // --- 4. Initialize Clients and Speech Adapters ---
    let api = RemoteCoachClient::with_timeout(&config.backend_url, config.http_timeout)
        .context("Failed to build HTTP client for the coach backend")?;
    let output = CommandSynthesizer::from_command_line(&config.tts_command);
    let input = CommandRecognizer::from_command_line(config.stt_command.as_deref());
    if config.stt_command.is_none() {
        tracing::info!("No COACH_STT_COMMAND configured, voice input is disabled");
    }

    let session: Arc<Session> = Arc::new(CoachSession::new(
        api,
        output,
        input,
        config.session_options(),
    ));

    let voices = session.load_voices().await;
    tracing::info!("{} voices available", voices.len());

    println!("🎙️ Relationship AI Coach\n");
    println!("{}\n", repl::HELP);

    // --- 5. Read Commands Until EOF or Ctrl-C ---
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                match repl::parse(&line) {
                    None => {}
                    Some(Err(e)) => println!("{e}"),
                    Some(Ok(UserCommand::Quit)) => break,
                    Some(Ok(command)) => handle_command(command, &session).await,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, shutting down...");
                break;
            }
        }
    }

    tracing::info!("Shutting down...");
    Ok(())
}

async fn handle_command(command: UserCommand, session: &Arc<Session>) {
    match command {
        UserCommand::Say(message) => spawn_chat(session.clone(), Some(message)).await,
        UserCommand::Send => spawn_chat(session.clone(), None).await,
        UserCommand::Analyze(message) => {
            let session = session.clone();
            tokio::spawn(async move {
                let result = session.analyze(&message).await;
                if let Err(CoachError::EmptyInput) = result {
                    println!("{}", CoachError::EmptyInput);
                    return;
                }
                println!("{}", repl::render_response(&session.view().await));
            });
        }
        UserCommand::Summary => {
            let session = session.clone();
            tokio::spawn(async move {
                match session.summarize().await {
                    Ok(summary) => println!("📜 Session Summary\n{summary}"),
                    Err(CoachError::RemoteUnavailable(_)) => {
                        if let Some(notice) = session.view().await.notice {
                            println!("{notice}");
                        }
                    }
                    Err(e) => println!("{e}"),
                }
            });
        }
        UserCommand::Listen => {
            let session = session.clone();
            tokio::spawn(async move {
                println!("🎤 Listening...");
                match session.listen().await {
                    Ok(Some(transcript)) => {
                        println!("Heard: {transcript}\nType /send to send it.")
                    }
                    Ok(None) | Err(CoachError::SpeechUnsupported) => {
                        if let Some(notice) = session.view().await.notice {
                            println!("{notice}");
                        }
                    }
                    Err(e) => println!("{e}"),
                }
            });
        }
        UserCommand::Phase(None) => {
            let view = session.view().await;
            println!(
                "{}",
                repl::render_phases(&session.phase_choices().await, view.phase)
            );
        }
        UserCommand::Phase(Some(name)) => match name.parse::<PhaseId>() {
            Ok(phase) => {
                if session.select_phase(phase).await {
                    println!("Phase: {}", phase.label());
                } else {
                    println!("Phase {phase} is not available in this session.");
                }
            }
            Err(e) => println!("{e}"),
        },
        UserCommand::Voices => {
            let view = session.view().await;
            println!(
                "{}",
                repl::render_voices(&session.voices().await, view.selected_voice.as_ref())
            );
        }
        UserCommand::Voice(name) => {
            if session.select_voice(&name).await {
                println!("Voice: {name}");
            } else {
                println!("No voice named {name}. Type /voices for the list.");
            }
        }
        UserCommand::VoicesChanged => {
            let voices = session.voices_changed().await;
            println!("{} voices available", voices.len());
        }
        UserCommand::Locale(None) => {
            println!("{}", repl::render_locales(&session.view().await.locale));
        }
        UserCommand::Locale(Some(tag)) => {
            if session.set_locale(&tag).await {
                println!("Locale: {tag}");
            }
        }
        UserCommand::Speak => {
            if !session.speak_last_response().await {
                println!("Nothing to speak yet.");
            }
        }
        UserCommand::AutoSpeak(enabled) => {
            session.set_auto_speak(enabled).await;
            println!("Auto-speak {}", if enabled { "on" } else { "off" });
        }
        UserCommand::History => {
            println!("{}", repl::render_journal(&session.transcript().await));
        }
        UserCommand::Status => println!("{}", repl::render_status(&session.view().await)),
        UserCommand::Reset => match session.reset().await {
            Ok(()) => println!("Session cleared."),
            Err(e) => println!("{e}"),
        },
        UserCommand::Help => println!("{}", repl::HELP),
        UserCommand::Quit => {}
    }
}

/// Sends a message (or the draft) in the background so the prompt stays
/// responsive. A second message typed meanwhile is rejected by the session.
async fn spawn_chat(session: Arc<Session>, message: Option<String>) {
    // This loop is the only submitter.
    if let Err(e) = repl::check_send(&session.view().await, message.as_deref()) {
        println!("{e}");
        return;
    }

    println!("⏳ Thinking...");
    tokio::spawn(async move {
        let result = match &message {
            Some(message) => session.submit(message).await,
            None => session.submit_draft().await,
        };
        match result {
            Ok(_) | Err(CoachError::RemoteUnavailable(_)) => {
                println!("{}", repl::render_response(&session.view().await));
                session.acknowledge().await;
            }
            Err(e) => println!("{e}"),
        }
    });
}
