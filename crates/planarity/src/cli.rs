use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::multiplayer::Role;
use crate::session::{Level, Mode};

#[derive(Parser)]
#[command(name = "planarity")]
#[command(author, version, about)]
#[command(long_about = "Untangle a planar graph: drag the six nodes until no two edges cross.\n\n\
    Examples:\n  \
    planarity                        Open the game menu\n  \
    planarity play --mode crazy      Play one crazy-mode puzzle\n  \
    planarity duel --role join       Race the autoplayer over the in-memory broker\n  \
    planarity generate --seed 7      Print a reproducible puzzle\n  \
    planarity survey --count 10000   Generator statistics")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play one single-player puzzle
    Play {
        /// Game mode (defaults to the configured mode)
        #[arg(long, value_enum)]
        mode: Option<Mode>,

        /// Difficulty (defaults to the configured level)
        #[arg(long, value_enum)]
        level: Option<Level>,

        /// Leaderboard slot, 1 to 5
        #[arg(long)]
        player: Option<u8>,

        /// Seed for a reproducible puzzle
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Play one multiplayer match against the autoplayer
    Duel {
        /// Which side of the rendezvous you take
        #[arg(long, value_enum, default_value = "host")]
        role: Role,

        /// Seed for the generator of whichever side hosts
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Generate a puzzle and print it
    Generate {
        /// Seed for a reproducible puzzle
        #[arg(long)]
        seed: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "wire")]
        format: PuzzleFormat,
    },

    /// Count the edge crossings of a puzzle file
    Crossings {
        /// Puzzle file (YAML, JSON, or the two-line wire format)
        file: PathBuf,
    },

    /// Generate many puzzles in parallel and report statistics
    Survey {
        /// Number of puzzles to generate
        #[arg(short, long, default_value = "1000")]
        count: u64,

        /// First seed; puzzle i uses seed + i
        #[arg(long)]
        seed: Option<u64>,
    },

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. defaults.mode, generator.max_attempts, multiplayer.topic)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PuzzleFormat {
    /// Node payload line, then edge payload line
    Wire,
    Yaml,
    Json,
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Commands::Play {
                mode,
                level,
                player,
                seed,
            }) => crate::commands::play::run(mode, level, player, seed),
            Some(Commands::Duel { role, seed }) => crate::commands::duel::run(role, seed),
            Some(Commands::Generate { seed, format }) => {
                crate::commands::generate::run(seed, format)
            }
            Some(Commands::Crossings { file }) => {
                if !file.exists() {
                    anyhow::bail!("File not found: {}", file.display());
                }
                crate::commands::crossings::run(&file)
            }
            Some(Commands::Survey { count, seed }) => {
                crate::commands::survey::run(count, seed, self.quiet)
            }
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Version) => {
                println!("planarity {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
            None => crate::commands::menu::run(),
        }
    }
}
