//! Command-line interface for travelstore.
//!
//! This module provides the CLI structure for the `travelog` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, EntryDetails, ListCommand, OutputFormat, SearchCommand,
    UpdateCommand,
};

/// travelog - Keep a journal of the places you have been
///
/// Entries are stored locally as a single JSON collection in the data
/// directory.
#[derive(Debug, Parser)]
#[command(name = "travelog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a new entry
    Add(AddCommand),

    /// Add an entry from a JSON file
    Import {
        /// File holding one entry as a JSON object
        file: PathBuf,
    },

    /// List entries, newest first
    List(ListCommand),

    /// Show a single entry
    Show {
        /// Entry id
        id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Replace fields of an existing entry
    Update(UpdateCommand),

    /// Delete an entry
    Delete {
        /// Entry id
        id: String,
    },

    /// Delete every entry
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Print the number of entries
    Count,

    /// Search entries
    Search(SearchCommand),

    /// Show storage diagnostics
    Stats {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().copied()).unwrap()
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "travelog");
    }

    #[test]
    fn test_verbosity_flags() {
        use crate::logging::Verbosity;

        assert_eq!(parse(&["travelog", "count"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["travelog", "-v", "count"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["travelog", "-vv", "count"]).verbosity(), Verbosity::Trace);
        assert_eq!(parse(&["travelog", "-q", "count"]).verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_parse_add_with_negative_coordinates() {
        let cli = parse(&[
            "travelog",
            "add",
            "--address",
            "Lisbon",
            "--latitude",
            "38.72",
            "--longitude",
            "-9.14",
            "--tag",
            "city",
            "--tag",
            "coast",
        ]);
        let Command::Add(cmd) = cli.command else {
            panic!("expected add command");
        };
        assert_eq!(cmd.longitude, -9.14);
        assert_eq!(cmd.details.tags, vec!["city", "coast"]);
    }

    #[test]
    fn test_parse_add_requires_coordinates() {
        assert!(Cli::try_parse_from(["travelog", "add", "--address", "x"]).is_err());
    }

    #[test]
    fn test_parse_update() {
        let cli = parse(&["travelog", "update", "abc", "--address", "Porto"]);
        let Command::Update(cmd) = cli.command else {
            panic!("expected update command");
        };
        assert_eq!(cmd.id, "abc");
        assert_eq!(cmd.address.as_deref(), Some("Porto"));
    }

    #[test]
    fn test_parse_list_json() {
        let cli = parse(&["travelog", "list", "--limit", "3", "--format", "json"]);
        let Command::List(cmd) = cli.command else {
            panic!("expected list command");
        };
        assert_eq!(cmd.limit, Some(3));
        assert_eq!(cmd.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["travelog", "-c", "/custom/config.toml", "stats"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert!(matches!(cli.command, Command::Stats { json: false }));
    }

    #[test]
    fn test_parse_clear() {
        let cli = parse(&["travelog", "clear", "--yes"]);
        assert!(matches!(cli.command, Command::Clear { yes: true }));
    }
}
