// bases/sync_cli/src/args.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use sync_settings::DEFAULT_CONFIG_PATH;

/// Mirror remote playlists into a local music library
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// YAML settings file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Download every playlist that is not yet synced (default)
    Sync,
    /// Resolve playlists and show what a sync would do
    Status,
    /// Delete the per-playlist download archives so everything is re-checked
    ClearArchives,
    /// Forget which playlists are synced and all cached playlist info
    ResetState,
}

impl Args {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Sync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["playlist-sync"], Command::Sync)]
    #[case(&["playlist-sync", "status"], Command::Status)]
    #[case(&["playlist-sync", "clear-archives"], Command::ClearArchives)]
    #[case(&["playlist-sync", "reset-state", "-v"], Command::ResetState)]
    fn subcommands(#[case] argv: &[&str], #[case] expected: Command) {
        let args = Args::try_parse_from(argv).unwrap();
        assert_eq!(args.command(), expected);
    }

    #[test]
    fn global_options_after_subcommand() {
        let args =
            Args::try_parse_from(["playlist-sync", "status", "--config", "/etc/sync.yml", "-v"])
                .unwrap();
        assert_eq!(args.config, PathBuf::from("/etc/sync.yml"));
        assert!(args.verbose);
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["playlist-sync"]).unwrap();
        assert_eq!(args.config, PathBuf::from("config.yml"));
        assert!(!args.verbose);
    }
}
