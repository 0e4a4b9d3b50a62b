use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use kanri::db::BoardDb;
use kanri::server::{ServerConfig, start_server};

#[derive(Parser)]
#[command(name = "kanri")]
#[command(version, about = "Kanban board manager")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Port to listen on (falls back to KANRI_PORT, then 4000)
        #[arg(short, long)]
        port: Option<u16>,
        /// SQLite database path (falls back to KANRI_DB, then kanri.db)
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Initialize the database and exit
    InitDb {
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn resolve_db_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var("KANRI_DB").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("kanri.db"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, db_path } => {
            let port = match port {
                Some(p) => p,
                None => match std::env::var("KANRI_PORT") {
                    Ok(v) => v.parse().context("Invalid KANRI_PORT value")?,
                    Err(_) => ServerConfig::default().port,
                },
            };
            start_server(ServerConfig {
                port,
                db_path: resolve_db_path(db_path),
            })
            .await
        }
        Commands::InitDb { db_path } => {
            let db_path = resolve_db_path(db_path);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .context("Failed to create database directory")?;
                }
            }
            BoardDb::new(&db_path)?;
            println!("Database initialized at {}", db_path.display());
            Ok(())
        }
    }
}
