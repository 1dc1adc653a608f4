use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use treesync::TransportMode;

/// treesync - one-directional directory tree synchronization
#[derive(Parser, Debug)]
#[command(name = "treesync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Print a JSON summary on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synchronize SOURCE onto DESTINATION
    Sync {
        /// Config file (defaults to ./treesync.toml, then the user config)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Source locator (path, file://, sftp://, rsync://, user@host:path)
        source: Option<String>,

        /// Destination locator
        destination: Option<String>,

        /// Copy DESTINATION back onto SOURCE
        #[arg(long)]
        reverse: bool,

        /// Copy files regardless of modification times
        #[arg(short, long)]
        force: bool,

        /// Delete destination entries missing from the source
        #[arg(long)]
        delete: bool,

        /// Dry run - show what would be done
        #[arg(long)]
        dry_run: bool,

        /// Include prefix (only effective together with --exclude)
        #[arg(long = "include", value_name = "PREFIX")]
        include: Vec<String>,

        /// Exclude prefix
        #[arg(long = "exclude", value_name = "PREFIX")]
        exclude: Vec<String>,

        /// Backend selection
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Only sync these relative paths
        #[arg(last = true, value_name = "PATHS")]
        paths: Vec<String>,
    },

    /// Validate the configuration and show the selected backend
    Check {
        /// Config file (defaults to ./treesync.toml, then the user config)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Auto,
    Walk,
    Delegate,
}

impl From<ModeArg> for TransportMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => TransportMode::Auto,
            ModeArg::Walk => TransportMode::Walk,
            ModeArg::Delegate => TransportMode::Delegate,
        }
    }
}
