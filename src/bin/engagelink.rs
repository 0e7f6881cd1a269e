//! Engagelink CLI - Command-line interface for the engagement relay
//!
//! Commands:
//! - send: Replay a scripted capture into a session (participant side)
//! - monitor: Join a session and render incoming telemetry (monitor side)
//! - extract: Convert landmark NDJSON into pose feature vectors (batch mode)

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use engagelink::channel::{ChannelEvent, SessionChannel};
use engagelink::error::RelayError;
use engagelink::features::PoseFeatureExtractor;
use engagelink::presenter::{PresenterTheme, TelemetryPresenter};
use engagelink::scheduler::CaptureScheduler;
use engagelink::session::{Role, SessionCode};
use engagelink::sim::{scripted_pair, CaptureScript};
use engagelink::types::Landmark;
use engagelink::{CLIENT_NAME, ENGAGELINK_VERSION};

/// Engagelink - Real-time engagement-signal relay for remote tutoring
#[derive(Parser)]
#[command(name = "engagelink")]
#[command(version = ENGAGELINK_VERSION)]
#[command(about = "Stream and monitor tutoring engagement telemetry", long_about = None)]
struct Cli {
    /// Log filter (overrides RUST_LOG)
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted capture into a session (participant side)
    Send {
        /// Relay endpoint, host:port
        #[arg(short, long, default_value = "127.0.0.1:8765")]
        endpoint: String,

        /// Session code to join (generated when omitted)
        #[arg(short, long)]
        code: Option<String>,

        /// Capture script to replay
        #[arg(long, default_value = "alternating")]
        script: ScriptKind,

        /// How long to stream, in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,
    },

    /// Join a session and render incoming telemetry (monitor side)
    Monitor {
        /// Relay endpoint, host:port
        #[arg(short, long, default_value = "127.0.0.1:8765")]
        endpoint: String,

        /// Session code to join
        #[arg(short, long)]
        code: String,

        /// Rendering detail level
        #[arg(long, default_value = "detailed")]
        theme: ThemeKind,
    },

    /// Convert landmark NDJSON into pose feature vectors (batch mode)
    Extract {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum ScriptKind {
    /// A single upright pose, repeated
    Upright,
    /// Alternating upright and slouched poses
    Alternating,
}

#[derive(Clone, ValueEnum)]
enum ThemeKind {
    /// Bare indicator lines
    Minimal,
    /// Labels, confidence, receipt time
    Detailed,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{CLIENT_NAME}: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(filter: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let env_filter = match filter {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), RelayError> {
    let runtime = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Send {
            endpoint,
            code,
            script,
            duration,
        } => runtime.block_on(cmd_send(&endpoint, code.as_deref(), script, duration)),

        Commands::Monitor {
            endpoint,
            code,
            theme,
        } => runtime.block_on(cmd_monitor(&endpoint, &code, theme)),

        Commands::Extract { input, output } => cmd_extract(&input, &output),
    }
}

async fn cmd_send(
    endpoint: &str,
    code: Option<&str>,
    script: ScriptKind,
    duration: u64,
) -> Result<(), RelayError> {
    let code = match code {
        Some(raw) => SessionCode::new(raw)?,
        None => SessionCode::generate(),
    };
    println!("session code: {code}");

    let channel = SessionChannel::connect(endpoint, code, Role::Participant).await?;

    let script = match script {
        ScriptKind::Upright => CaptureScript::upright(),
        ScriptKind::Alternating => CaptureScript::alternating(),
    };
    let (source, estimator) = scripted_pair(script);

    let mut scheduler = CaptureScheduler::new(source, estimator, channel.handle());
    scheduler.start().await?;

    // Periodic synthetic pointer movement so the heartbeat stays active
    let input = scheduler.input_handle();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(duration);
    let mut jiggle = tokio::time::interval(Duration::from_millis(700));
    loop {
        jiggle.tick().await;
        if tokio::time::Instant::now() >= deadline {
            break;
        }
        input.pointer_moved();
    }

    scheduler.stop().await;
    Ok(())
}

async fn cmd_monitor(endpoint: &str, code: &str, theme: ThemeKind) -> Result<(), RelayError> {
    let code = SessionCode::new(code)?;
    let mut channel = SessionChannel::connect(endpoint, code.clone(), Role::Monitor).await?;
    let mut events = channel.events().ok_or(RelayError::NotConnected)?;

    let theme = match theme {
        ThemeKind::Minimal => PresenterTheme::Minimal,
        ThemeKind::Detailed => PresenterTheme::Detailed,
    };
    let mut presenter = TelemetryPresenter::new(theme);
    presenter.begin_session(code);

    for line in presenter.render_lines() {
        println!("{line}");
    }

    while let Some(event) = events.recv().await {
        match event {
            ChannelEvent::Telemetry(snapshot) => {
                presenter.apply(snapshot);
                for line in presenter.render_lines() {
                    println!("{line}");
                }
                println!();
            }
            ChannelEvent::PeerStatus {
                participant_connected,
            } => {
                let state = if participant_connected {
                    "connected"
                } else {
                    "disconnected"
                };
                println!("participant {state}");
            }
            ChannelEvent::Closed { reason } => {
                match reason {
                    Some(reason) => println!("channel closed: {reason}"),
                    None => println!("channel closed"),
                }
                break;
            }
        }
    }

    presenter.end_session();
    Ok(())
}

fn cmd_extract(input: &PathBuf, output: &PathBuf) -> Result<(), RelayError> {
    let input_data = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            eprintln!("reading landmark NDJSON from stdin (end with Ctrl-D)");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let mut lines: Vec<String> = Vec::new();
    for (index, line) in input_data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let landmarks: Vec<Landmark> = serde_json::from_str(trimmed).map_err(|e| {
            RelayError::InvalidMessage(format!("line {}: {}", index + 1, e))
        })?;

        // Short landmark sets are routine drops, mirrored as nulls so output
        // lines stay aligned with input lines
        match PoseFeatureExtractor::extract(&landmarks) {
            Some(features) => lines.push(serde_json::to_string(&features)?),
            None => lines.push("null".to_string()),
        }
    }

    let output_data = if lines.is_empty() {
        String::new()
    } else {
        lines.join("\n") + "\n"
    };

    if output.to_string_lossy() == "-" {
        print!("{output_data}");
        io::stdout().flush()?;
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}
