//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to the command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process;

/// A live scrolling spectrogram of your microphone, in the terminal
#[derive(Parser)]
#[command(name = "spectro")]
#[command(version)]
#[command(about = "Live scrolling spectrogram of your microphone, in the terminal")]
#[command(long_about = "Live scrolling spectrogram of your microphone, in the terminal.\n\nTime runs right to left along the bottom axis, frequency upward along the left\naxis, and brighter red means more energy.\n\nDEFAULT COMMAND:\n    If no command is specified, 'view' is used.\n\nKEYS:\n    Space       Pause or resume\n    q, Esc      Quit\n\nEXAMPLES:\n    # Show the spectrogram of the default input\n    $ spectro\n\n    # Pause or resume a running spectrogram from another shell\n    $ pkill -USR1 spectro\n\n    # Pick a different microphone\n    $ spectro list-devices\n    $ spectro config")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/spectro/spectro.toml\n    Logs:               ~/.local/state/spectro/spectro.log.*"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the live spectrogram (default)
    ///
    /// Press Space to pause/resume, Escape/q to quit.
    /// Sending SIGUSR1 also pauses/resumes.
    #[command(visible_alias = "v")]
    View,

    /// Open configuration file in your preferred editor
    ///
    /// Edit the input device, smoothing and decibel range.
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and formats to help configure
    /// the correct input device in spectro.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   spectro completions bash > spectro.bash
    ///   spectro completions zsh > _spectro
    ///   spectro completions fish > spectro.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that print to the terminal and need no logging
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "spectro", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => return exit_on_error(commands::handle_list_devices()),
        Some(Commands::Logs) => return exit_on_error(commands::handle_logs()),
        _ => {}
    }

    logging::init_logging()?;

    match cli.command {
        None | Some(Commands::View) => tokio::task::spawn_blocking(commands::handle_view).await??,
        Some(Commands::Config) => commands::handle_config()?,
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}

fn exit_on_error(result: anyhow::Result<()>) -> anyhow::Result<()> {
    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
    Ok(())
}
