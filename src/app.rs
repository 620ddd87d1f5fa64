//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

/// Chladni plate patterns driven by live audio, drawn in the terminal
#[derive(Parser, Debug)]
#[command(name = "chladni")]
#[command(version)]
#[command(about = "Chladni plate patterns driven by live audio, drawn in the terminal")]
#[command(long_about = "Chladni plate patterns driven by live audio, drawn in the terminal.\n\nTwo bins of the audio spectrum pick the vibration modes (m, n) of a square\nplate; the standing wave is painted every frame in magenta and green.\n\nDEFAULT COMMAND:\n    If no command is specified, 'tone' is used by default.\n\nKEYS:\n    t        start the test tone\n    f        start the loaded file\n    space/p  stop\n    [ ]      smaller / larger analysis window (applies on next start)\n    q/Esc    quit\n\nEXAMPLES:\n    # Visualize the built-in 440Hz test tone\n    $ chladni\n\n    # Visualize an audio file with a finer analysis window\n    $ chladni --fft-size 8192 play song.mp3\n\n    # Toggle playback from another process\n    $ pkill -USR1 chladni")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/chladni/chladni.toml\n    Logs:               ~/.local/state/chladni/chladni.log.*"
)]
struct Cli {
    /// Analysis window size in samples (power of two, 512 or more to drive the plate)
    #[arg(long, value_name = "N", global = true)]
    fft_size: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Visualize the built-in test tone (default)
    #[command(visible_alias = "t")]
    Tone,

    /// Visualize an audio file
    ///
    /// WAV files are read directly; other formats are converted with ffmpeg.
    ///
    /// Examples:
    ///   chladni play song.wav
    ///   chladni play voice-memo.mp3
    #[command(visible_alias = "p")]
    Play {
        /// Path to the audio file to play
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio output devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the output device in chladni.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    Logs {
        /// Number of lines to show
        #[arg(short = 'n', long, default_value_t = commands::logs::DEFAULT_LINES)]
        lines: usize,
    },

    /// Generate shell completion script
    ///
    /// Examples:
    ///   chladni completions bash > chladni.bash
    ///   chladni completions zsh > _chladni
    ///   chladni completions fish > chladni.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
///
/// # Errors
/// - If logging initialization or setup fails
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Commands that need neither logging nor a config file
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "chladni", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return exit_on_error(commands::handle_list_devices());
        }
        Some(Commands::Logs { lines }) => {
            return exit_on_error(commands::handle_logs(*lines));
        }
        _ => {}
    }

    let _log_guard = logging::init_logging()?;
    crate::setup::ensure_config()?;

    // Logged here so the record is flushed before the guard drops
    let result = dispatch(cli).await;
    if let Err(e) = &result {
        tracing::error!("{e:#}");
    }
    result
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        None | Some(Commands::Tone) => commands::handle_visualize(None, cli.fft_size).await,
        Some(Commands::Play { file }) => commands::handle_visualize(Some(file), cli.fft_size).await,
        Some(Commands::Config) => commands::handle_config(),
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs { .. }) => {
            unreachable!("These commands are handled earlier")
        }
    }
}

fn exit_on_error(result: anyhow::Result<()>) -> anyhow::Result<()> {
    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_tone() {
        let cli = Cli::try_parse_from(["chladni"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.fft_size, None);
    }

    #[test]
    fn test_play_with_global_fft_size() {
        let cli = Cli::try_parse_from(["chladni", "play", "song.wav", "--fft-size", "8192"]).unwrap();
        assert_eq!(cli.fft_size, Some(8192));
        match cli.command {
            Some(Commands::Play { file }) => assert_eq!(file, PathBuf::from("song.wav")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_logs_line_count() {
        let cli = Cli::try_parse_from(["chladni", "logs", "-n", "10"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Logs { lines: 10 })));
        let cli = Cli::try_parse_from(["chladni", "logs"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Logs { lines: 50 })));
    }

    #[test]
    fn test_play_requires_file() {
        assert!(Cli::try_parse_from(["chladni", "play"]).is_err());
    }
}
