//! CLI interface for fmpoly

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Real-time polyphonic FM synthesizer driven by MIDI input
#[derive(Parser)]
#[command(name = "fmpoly")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Show debug output, including every MIDI event
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play MIDI input through the synthesizer until Ctrl-C
    Play {
        /// Configuration file path (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// MIDI input port name, overrides the configuration
        #[arg(short, long)]
        port: Option<String>,
    },

    /// Render held notes to a WAV file
    Render {
        /// Configuration file path (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// MIDI note numbers to hold
        #[arg(short, long, num_args = 1.., required = true, value_parser = clap::value_parser!(u8).range(0..=127))]
        notes: Vec<u8>,

        /// Duration in seconds
        #[arg(short, long, default_value = "2.0")]
        duration: f64,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "fmpoly.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render() {
        let cli = Cli::try_parse_from([
            "fmpoly", "render", "--notes", "60", "64", "67", "--output", "chord.wav",
        ])
        .unwrap();

        match cli.command {
            Commands::Render { notes, duration, .. } => {
                assert_eq!(notes, vec![60, 64, 67]);
                assert_eq!(duration, 2.0);
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn test_render_rejects_out_of_range_note() {
        let result = Cli::try_parse_from(["fmpoly", "render", "--notes", "128", "--output", "x.wav"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_play_with_port() {
        let cli = Cli::try_parse_from(["fmpoly", "-v", "play", "--port", "Keystation"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Play { config, port } => {
                assert!(config.is_none());
                assert_eq!(port.as_deref(), Some("Keystation"));
            }
            _ => panic!("expected play"),
        }
    }
}
