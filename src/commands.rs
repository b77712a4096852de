//! This module defines the command-line interface for `gv` using `clap`.
//!
//! It provides a [`Cli`] struct holding the parsed arguments and a [`Commands`]
//! enum with one variant per graph operation.
//!
//! # Examples
//!
//! ```no_run
//! use clap::Parser;
//! use graph_vault::commands::{Cli, Commands};
//!
//! let cli = Cli::parse();
//! if let Commands::Search { query, limit } = cli.command {
//!     println!("searching for {query} (limit {limit:?})");
//! }
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Represents the parsed command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, propagate_version = true)]
pub struct Cli {
    /// YAML configuration file. Defaults to `<config_dir>/config.yaml` when it
    /// exists, otherwise the environment is used.
    #[arg(short, long, global = true, env = "GV_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Represents the available subcommands and their options.
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Connect and create (or migrate) the collection.
    ///
    /// A collection whose vector size doesn't match the embedding model is
    /// deleted and recreated, losing every stored point.
    Init,

    /// Store an entity, replacing any entity with the same name.
    #[clap(name = "add-entity")]
    AddEntity {
        name: String,

        #[arg(short = 't', long = "type")]
        entity_type: String,

        /// One observation; repeat for more.
        #[arg(short = 'o', long = "observation")]
        observations: Vec<String>,
    },

    /// Store a relation `<from> <relation_type> <to>`.
    #[clap(name = "add-relation")]
    AddRelation {
        from: String,
        relation_type: String,
        to: String,
    },

    /// Semantic search over entities and relations.
    #[clap(name = "search", alias = "s")]
    Search {
        query: String,

        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Remove an entity by name.
    #[clap(name = "delete-entity")]
    DeleteEntity { name: String },

    /// Remove a relation `<from> <relation_type> <to>`.
    #[clap(name = "delete-relation")]
    DeleteRelation {
        from: String,
        relation_type: String,
        to: String,
    },

    /// Print every entity and relation in the collection.
    Dump,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_entity() {
        let cli = Cli::try_parse_from([
            "gv",
            "add-entity",
            "Ferris",
            "-t",
            "crab",
            "-o",
            "likes Rust",
            "-o",
            "lives in the sea",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Commands::AddEntity {
                name: "Ferris".to_string(),
                entity_type: "crab".to_string(),
                observations: vec!["likes Rust".to_string(), "lives in the sea".to_string()],
            }
        );
    }

    #[test]
    fn test_parse_relation_commands() {
        let add = Cli::try_parse_from(["gv", "add-relation", "A", "knows", "B"]).unwrap();
        assert_eq!(
            add.command,
            Commands::AddRelation {
                from: "A".to_string(),
                relation_type: "knows".to_string(),
                to: "B".to_string(),
            }
        );

        let del = Cli::try_parse_from(["gv", "delete-relation", "A", "knows", "B"]).unwrap();
        assert!(matches!(del.command, Commands::DeleteRelation { .. }));
    }

    #[test]
    fn test_parse_search_with_global_config() {
        let cli =
            Cli::try_parse_from(["gv", "s", "who likes Rust", "-l", "3", "--config", "gv.yaml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("gv.yaml")));
        assert_eq!(
            cli.command,
            Commands::Search {
                query: "who likes Rust".to_string(),
                limit: Some(3)
            }
        );
    }
}
