//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

const AFTER_HELP: &str = "\
Quick Start:
  $ songdex init                    # Create .songdex/settings.toml
  $ songdex add-path ~/Songs        # Scan another level root
  $ songdex refresh --full          # Reload every level
  $ songdex list --wip              # Show the WIP pack
  $ songdex find --hash <HASH>      # Look up a level by content hash";

/// Custom level indexer
#[derive(Parser, Debug)]
#[command(
    name = "songdex",
    version = env!("CARGO_PKG_VERSION"),
    about = "Scan, hash and index custom levels",
    long_about = "Discover custom level folders under the configured roots, hash their \
                  contents and build the stable and WIP level packs.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show detailed loading information
    #[arg(long, global = true)]
    pub info: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set up .songdex directory with default settings
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,

    /// Scan the level roots and print a summary
    Refresh {
        /// Reload every level instead of only new folders
        #[arg(long)]
        full: bool,
    },

    /// List the levels of the stable or WIP pack
    List {
        /// List the WIP pack
        #[arg(long)]
        wip: bool,
    },

    /// Find a single level
    #[command(group = clap::ArgGroup::new("key").required(true))]
    Find {
        /// Level id, e.g. custom_level_<HASH>
        #[arg(long, group = "key")]
        id: Option<String>,

        /// Content hash
        #[arg(long, group = "key")]
        hash: Option<String>,

        /// Level folder
        #[arg(long, group = "key")]
        path: Option<PathBuf>,
    },

    /// Delete a level folder from disk
    Delete {
        /// Level folder to delete
        path: PathBuf,
    },

    /// Add a level root
    AddPath {
        path: PathBuf,

        /// Add to the WIP roots
        #[arg(long)]
        wip: bool,
    },

    /// Remove a level root
    RemovePath {
        path: PathBuf,

        /// Remove from the WIP roots
        #[arg(long)]
        wip: bool,
    },

    /// List the configured level roots
    ListPaths,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_find_requires_one_key() {
        assert!(Cli::try_parse_from(["songdex", "find"]).is_err());
        assert!(Cli::try_parse_from(["songdex", "find", "--id", "a", "--hash", "b"]).is_err());

        let cli = Cli::try_parse_from(["songdex", "find", "--hash", "ABC"]).unwrap();
        assert!(matches!(cli.command, Commands::Find { hash: Some(_), .. }));
    }

    #[test]
    fn test_add_path_wip_flag() {
        let cli = Cli::try_parse_from(["songdex", "add-path", "/songs", "--wip"]).unwrap();
        match cli.command {
            Commands::AddPath { path, wip } => {
                assert_eq!(path, PathBuf::from("/songs"));
                assert!(wip);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
