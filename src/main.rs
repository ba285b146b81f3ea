//! Sapling - teach a robot a task by talking to it
//!
//! CLI entry point with global panic handler.

use std::io::Write;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sapling::cli::{
    SessionsCommand, SessionsOptions, ShowCommand, ShowOptions, TeachCommand, TeachOptions,
    TeachOutcome,
};
use sapling::config::{sapling_home, Config};
use sapling::error::exit_codes;
use sapling::storage::{FileTranscriptStore, MemoryTranscriptStore, TranscriptStore};

// =============================================================================
// CLI Definition
// =============================================================================

/// Sapling - teach a robot a task by talking to it
#[derive(Parser)]
#[command(name = "sapling")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive teaching session on stdin/stdout
    Teach {
        /// Print the summary as JSON (the dialogue moves to stderr)
        #[arg(long, short)]
        json: bool,
        /// Suppress the summary
        #[arg(long, short)]
        quiet: bool,
        /// Apologize for replies that make no sense instead of aborting
        #[arg(long)]
        lenient: bool,
        /// Do not save the transcript
        #[arg(long)]
        no_save: bool,
    },

    /// List saved teaching sessions
    Sessions {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
        /// Maximum number of sessions
        #[arg(long, short, default_value = "20")]
        limit: usize,
    },

    /// Print a saved transcript and the tree it produced
    Show {
        /// Session ID (see `sapling sessions`)
        session_id: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

// =============================================================================
// Main
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();
    init_tracing();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("sapling error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Set up the global panic handler.
///
/// On panic, logs to ~/.sapling/crash.log and exits with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("sapling panic: {}", info);

        if let Some(home) = sapling_home() {
            let crash_log = home.join("crash.log");
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::ABORTED);
    }));
}

/// Install the stderr log subscriber.
///
/// `SAPLING_LOG` wins over `RUST_LOG`; without either only warnings show.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("SAPLING_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Teach {
            json,
            quiet,
            lenient,
            no_save,
        } => run_teach(TeachOptions {
            json,
            quiet,
            lenient,
            no_save,
        }),
        Commands::Sessions { json, quiet, limit } => run_sessions(json, quiet, limit),
        Commands::Show {
            session_id,
            json,
            quiet,
        } => run_show(&session_id, json, quiet),
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

fn run_teach(options: TeachOptions) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = Config::load();

    if config.storage.save_transcripts && !options.no_save {
        teach_with(FileTranscriptStore::new()?, config, &options)
    } else {
        teach_with(MemoryTranscriptStore::new(), config, &options)
    }
}

fn teach_with<S: TranscriptStore>(
    store: S,
    config: Config,
    options: &TeachOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cmd = TeachCommand::new(store, config);
    let stdin = std::io::stdin().lock();

    let output = if options.json {
        cmd.run(stdin, &mut std::io::stderr(), options)
    } else {
        cmd.run(stdin, &mut std::io::stdout(), options)
    };

    let formatted = output.format_output(options);
    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    let code = match output.outcome {
        TeachOutcome::Aborted => exit_codes::ABORTED,
        _ if output.success => exit_codes::OK,
        _ => exit_codes::ERROR,
    };
    Ok(ExitCode::from(code as u8))
}

fn run_sessions(
    json: bool,
    quiet: bool,
    limit: usize,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let store = FileTranscriptStore::new()?;
    let cmd = SessionsCommand::new(store);
    let options = SessionsOptions { json, quiet, limit };

    let output = cmd.run(&options);
    let formatted = output.format_output(&options);
    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}

fn run_show(
    session_id: &str,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let store = FileTranscriptStore::new()?;
    let cmd = ShowCommand::new(store);
    let options = ShowOptions { json, quiet };

    let output = cmd.run(session_id);
    let formatted = output.format_output(&options);
    if !formatted.is_empty() {
        print!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::OK as u8)
    } else {
        ExitCode::from(exit_codes::ERROR as u8)
    }
}
