use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the data folder, platform and number of modes found
    Setup,

    /// List installed language pairs
    Modes {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Translate text with an installed pair
    Translate {
        /// Source language (ISO 639 code)
        #[arg(short, long)]
        source: String,

        /// Target language (ISO 639 code)
        #[arg(short, long)]
        target: String,

        /// Text to translate; read from stdin when omitted
        #[arg(long)]
        text: Option<String>,

        /// Fail on a non-zero pipeline exit instead of printing its error output
        #[arg(long)]
        strict: bool,
    },

    /// Run an installer command, then rescan modes
    Install {
        /// Shell command performing the installation
        #[arg(long)]
        script: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_args() {
        let args = Args::try_parse_from(["apertium-native", "translate", "-s", "en", "-t", "es", "--text", "hi", "--strict"]).unwrap();
        match args.command {
            Commands::Translate { source, target, text, strict } => {
                assert_eq!(source, "en");
                assert_eq!(target, "es");
                assert_eq!(text.as_deref(), Some("hi"));
                assert!(strict);
            }
            _ => panic!("expected translate"),
        }
    }

    #[test]
    fn test_global_flags() {
        let args = Args::try_parse_from(["apertium-native", "-v", "-c", "my.toml", "modes", "--json"]).unwrap();
        assert!(args.verbose);
        assert_eq!(args.config, Some(PathBuf::from("my.toml")));
        assert!(matches!(args.command, Commands::Modes { json: true }));
    }
}
