//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

/// Replay a recorded landmark trace through the focus engine
#[derive(Parser, Debug)]
#[command(name = "focus-replay")]
#[command(version)]
#[command(about = "Replay a landmark trace through a focus session", long_about = None)]
pub struct Cli {
    /// Trace file (JSON array of samples)
    pub trace: PathBuf,

    /// Configuration file (defaults to ./focus-replay.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_trace_only() {
        let cli = Cli::try_parse_from(["focus-replay", "trace.json"]).unwrap();
        assert_eq!(cli.trace, PathBuf::from("trace.json"));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_config_flag() {
        let cli = Cli::try_parse_from(["focus-replay", "t.json", "--config", "c.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
    }

    #[test]
    fn test_missing_trace_rejected() {
        let err = Cli::try_parse_from(["focus-replay"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_extra_arguments_rejected() {
        let err = Cli::try_parse_from(["focus-replay", "t.json", "c.toml"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_help_and_version() {
        let help = Cli::try_parse_from(["focus-replay", "--help"]).unwrap_err();
        assert_eq!(help.kind(), ErrorKind::DisplayHelp);
        let version = Cli::try_parse_from(["focus-replay", "--version"]).unwrap_err();
        assert_eq!(version.kind(), ErrorKind::DisplayVersion);
    }
}
