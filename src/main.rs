//! Main module for the Graph Vault CLI application (gv).
//!
//! Parses the command line, loads configuration, builds a
//! [`GraphStore`](graph_vault::GraphStore) and runs one operation, printing any
//! result as JSON.
//!
//! # Examples
//!
//! ```sh
//! export QDRANT_URL=http://localhost:6333 COLLECTION_NAME=memory OPENAI_API_KEY=sk-...
//! gv init
//! gv add-entity Ferris -t crab -o "likes Rust"
//! gv add-relation Ferris maintains cargo
//! gv search "who likes Rust?" -l 5
//! ```

use clap::Parser;
use graph_vault::{
    GraphStore,
    commands::{Cli, Commands},
    config::{self, GraphVaultConfig},
    config_dir,
    models::{Entity, Relation},
};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::{error::Error, path::PathBuf};
use tracing::debug;

static TRACING: OnceCell<()> = OnceCell::new();

fn main() -> Result<(), Box<dyn Error>> {
    TRACING.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .init();
    });
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run())
}

/// Resolve configuration: explicit path, then `<config_dir>/config.yaml`, then env.
fn resolve_config(explicit: Option<PathBuf>) -> Result<GraphVaultConfig, Box<dyn Error>> {
    let path = match explicit {
        Some(path) => Some(path),
        None => Some(config_dir()?.join("config.yaml")).filter(|p| p.is_file()),
    };

    let config = match path {
        Some(path) => {
            debug!("Loading config from: {}", path.display());
            config::load_config(&path.to_string_lossy())?
        }
        None => {
            debug!("Loading config from environment");
            GraphVaultConfig::from_env()?
        }
    };
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Main asynchronous function of the Graph Vault CLI application.
///
/// # Errors
///
/// Returns an error if configuration can't be loaded or the chosen operation fails.
async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = resolve_config(cli.config)?;
    let graph = GraphStore::from_config(&config)?;

    match cli.command {
        Commands::Init => {
            graph.initialize().await?;
            eprintln!(
                "Collection {} ready",
                config.collection_name.as_deref().unwrap_or_default()
            );
        }
        Commands::AddEntity {
            name,
            entity_type,
            observations,
        } => {
            let entity = Entity::new(name, entity_type, observations);
            graph.persist_entity(&entity).await?;
            print_json(&entity)?;
        }
        Commands::AddRelation {
            from,
            relation_type,
            to,
        } => {
            let relation = Relation::new(from, relation_type, to);
            graph.persist_relation(&relation).await?;
            print_json(&relation)?;
        }
        Commands::Search { query, limit } => {
            let results = graph.search_similar(&query, limit).await?;
            print_json(&results)?;
        }
        Commands::DeleteEntity { name } => {
            graph.delete_entity(&name).await?;
            eprintln!("Deleted entity {name}");
        }
        Commands::DeleteRelation {
            from,
            relation_type,
            to,
        } => {
            let relation = Relation::new(from, relation_type, to);
            graph.delete_relation(&relation).await?;
            print_json(&relation)?;
        }
        Commands::Dump => {
            let knowledge_graph = graph.load_graph().await?;
            print_json(&knowledge_graph)?;
        }
    }

    Ok(())
}
