use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

use relmap::catalog::SchemaCatalog;
use relmap::config::{load_config, save_config, should_include_collection, RelmapConfig};
use relmap::errors::Result;
use relmap::types::*;
use tracing_subscriber::EnvFilter;

/// Relationship lookup for content schema snapshots.
#[derive(Parser)]
#[command(name = "relmap", about = "Relationship lookup for content schema snapshots")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration
    Init {
        /// Project path (default: current directory)
        path: Option<String>,
    },
    /// Resolve the relationship of one field
    Resolve {
        /// Collection name
        collection: String,
        /// Field name
        field: String,
        /// Project path
        #[arg(short, long)]
        path: Option<String>,
        /// Schema snapshot file (overrides the configured one)
        #[arg(short, long)]
        snapshot: Option<String>,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// List every relationship of one collection
    Describe {
        /// Collection name
        collection: String,
        /// Project path
        #[arg(short, long)]
        path: Option<String>,
        /// Schema snapshot file (overrides the configured one)
        #[arg(short, long)]
        snapshot: Option<String>,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// List the relationships of every configured collection
    Scan {
        /// Project path
        #[arg(short, long)]
        path: Option<String>,
        /// Schema snapshot file (overrides the configured one)
        #[arg(short, long)]
        snapshot: Option<String>,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

impl Commands {
    /// The project path argument shared by every subcommand.
    fn path(&self) -> Option<&str> {
        match self {
            Commands::Init { path }
            | Commands::Resolve { path, .. }
            | Commands::Describe { path, .. }
            | Commands::Scan { path, .. } => path.as_deref(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let project_path = resolve_path(cli.command.path().map(str::to_string));
    // `init` overwrites the config, so an unreadable one must not block it.
    let config = match cli.command {
        Commands::Init { .. } => RelmapConfig::default(),
        _ => load_config(&project_path)?,
    };
    init_logging(&config);

    match cli.command {
        Commands::Init { .. } => {
            save_config(&project_path, &config)?;
            tracing::info!(path = %project_path.display(), "wrote default config");
            println!("Initialized relmap at {}", project_path.display());
        }
        Commands::Resolve {
            collection,
            field,
            snapshot,
            json,
            ..
        } => {
            let catalog = load_catalog(&project_path, &config, snapshot)?;
            let relationship = catalog.resolver().resolve(&collection, &field)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&relationship)?);
            } else if relationship.is_relationship() {
                print_relationship(&relationship);
            } else {
                println!("No relationship for {}.{}", collection, field);
            }
        }
        Commands::Describe {
            collection,
            snapshot,
            json,
            ..
        } => {
            let catalog = load_catalog(&project_path, &config, snapshot)?;
            let relationships = catalog.resolver().resolve_collection(&collection)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&relationships)?);
            } else if relationships.is_empty() {
                println!("No relationships for '{}'", collection);
            } else {
                for r in &relationships {
                    print_relationship(r);
                }
            }
        }
        Commands::Scan { snapshot, json, .. } => {
            let catalog = load_catalog(&project_path, &config, snapshot)?;
            let resolver = catalog.resolver();

            let mut relationships = Vec::new();
            for collection in catalog.collections() {
                if !should_include_collection(collection, &config) {
                    tracing::debug!(collection, "skipping excluded collection");
                    continue;
                }
                relationships.extend(resolver.resolve_collection(collection)?);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&relationships)?);
            } else {
                for r in &relationships {
                    print_relationship(r);
                }
                println!("\n{} relationships", relationships.len());
            }
        }
    }
    Ok(())
}

/// Reads the snapshot named on the command line, or the configured one.
fn load_catalog(
    project_path: &Path,
    config: &RelmapConfig,
    snapshot: Option<String>,
) -> Result<SchemaCatalog> {
    let snapshot_path = match snapshot {
        Some(s) => PathBuf::from(s),
        None => config.snapshot_file(project_path),
    };
    SchemaCatalog::load(&snapshot_path)
}

/// Installs the stderr subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(config: &RelmapConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

fn print_relationship(relationship: &Relationship) {
    let (Some(kind), Some(collection), Some(field)) = (
        relationship.kind(),
        relationship.collection(),
        relationship.field(),
    ) else {
        return;
    };

    let targets: Vec<String> = relationship
        .references()
        .iter()
        .map(|r| format!("{}.{}", r.collection, r.primary_key))
        .collect();
    println!(
        "{}.{} ({}) -> {}",
        collection,
        field,
        kind.as_str(),
        targets.join(", ")
    );
}

/// Resolves an optional path argument to a `PathBuf`.
///
/// Defaults to the current working directory if no path is provided.
fn resolve_path(path: Option<String>) -> PathBuf {
    match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
