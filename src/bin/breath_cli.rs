use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use breath_coach::audio::{AudioBackend, CpalBackend, StubBackend};
use breath_coach::config::AppConfig;
use breath_coach::context::AppContext;
use breath_coach::session::{Phase, SessionEvent};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "breath_cli", about = "Terminal front end for guided breathing sessions")]
struct Cli {
    /// Override the JSON config file (defaults to assets/breath_config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Use the recording stub backend instead of the sound device
    #[arg(long)]
    silent: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a breathing session until the countdown finishes
    Run {
        /// Built-in pattern id (see `patterns`)
        #[arg(long, default_value = "focus")]
        pattern: String,
        /// Session length in minutes (overrides the config file)
        #[arg(long)]
        minutes: Option<u32>,
        /// Disable voice cues (the finish chime still plays)
        #[arg(long)]
        no_voice: bool,
        /// Disable the background ambience loop
        #[arg(long)]
        no_ambience: bool,
    },
    /// List the built-in breathing patterns
    Patterns,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_else(AppConfig::load);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    match cli.command {
        Commands::Run {
            pattern,
            minutes,
            no_voice,
            no_ambience,
        } => runtime.block_on(run_session(
            config,
            cli.silent,
            pattern,
            minutes,
            no_voice,
            no_ambience,
        )),
        Commands::Patterns => run_patterns(),
    }
}

fn run_patterns() -> Result<ExitCode> {
    for pattern in breath_coach::patterns::builtin_patterns() {
        println!(
            "{:<10} {:<22} {:>4}-{}-{}-{}  {}",
            pattern.id,
            pattern.name,
            pattern.inhale,
            pattern.hold_in,
            pattern.exhale,
            pattern.hold_out,
            pattern.description
        );
    }
    Ok(ExitCode::from(0))
}

async fn run_session(
    config: AppConfig,
    silent: bool,
    pattern: String,
    minutes: Option<u32>,
    no_voice: bool,
    no_ambience: bool,
) -> Result<ExitCode> {
    let backend: Arc<dyn AudioBackend> = if silent {
        Arc::new(StubBackend::new())
    } else {
        Arc::new(CpalBackend::new())
    };

    let context = AppContext::new(config, backend);
    if let Some(minutes) = minutes {
        context.set_session_minutes(minutes);
    }
    if no_voice {
        context.set_voice_enabled(false);
    }
    if no_ambience {
        context.set_ambience_enabled(false);
    }
    context.select_pattern_by_id(&pattern)?;

    let snapshot = context.snapshot();
    println!(
        "Starting '{}' for {} minute(s). Breathe with the prompts.",
        snapshot.pattern.name,
        snapshot.remaining_secs / 60
    );

    let mut events = context.subscribe_events();
    // The terminal invocation stands in for the user gesture.
    context.toggle_play();

    loop {
        match events.recv().await {
            Ok(SessionEvent::PhaseChanged { phase }) => match phase {
                Phase::Inhale => println!("  breathe in"),
                Phase::HoldIn | Phase::HoldOut => println!("  hold"),
                Phase::Exhale => println!("  breathe out"),
                Phase::Finished => {
                    println!("Session complete.");
                    break;
                }
                Phase::Idle => {}
            },
            Ok(SessionEvent::CountdownTick { remaining_secs }) => {
                if remaining_secs > 0 && remaining_secs % 60 == 0 {
                    println!("  -- {} minute(s) left --", remaining_secs / 60);
                }
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }

    context.dispose();
    Ok(ExitCode::from(0))
}
