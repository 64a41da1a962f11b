use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use patron_core::IdentityStore;
use patron_store::{default_db_path, SqliteStore};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "patron", about = "Kiosk identity database maintenance")]
struct Cli {
    /// Path to the identity database (default: $PATRON_DB_PATH or XDG data dir)
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List enrolled identities
    List,
    /// Remove an enrolled identity by id
    Remove {
        /// Identity id to remove
        id: String,
    },
    /// Delete every enrolled identity
    Reset {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
    /// Show store statistics
    Stats,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let db_path = cli.db.unwrap_or_else(default_db_path);
    let store = SqliteStore::open(&db_path)?;

    match cli.command {
        Commands::List => {
            let identities = store.load_all()?;
            if identities.is_empty() {
                println!("no identities enrolled");
                return Ok(());
            }
            println!("{:<38} {:<20} {:>5}  {}", "ID", "NAME", "DIM", "CREATED");
            for identity in identities {
                println!(
                    "{:<38} {:<20} {:>5}  {}",
                    identity.id,
                    identity.name,
                    identity.prototype.dim(),
                    identity.created_at
                );
            }
        }
        Commands::Remove { id } => {
            if store.remove(&id)? {
                println!("removed {id}");
            } else {
                bail!("no identity with id {id}");
            }
        }
        Commands::Reset { yes } => {
            if !yes {
                bail!("refusing to wipe {} without --yes", db_path.display());
            }
            let n = store.wipe()?;
            println!("removed {n} identities");
        }
        Commands::Stats => {
            let total = store.count()?;
            let readable = store.load_all()?.len() as u64;
            println!("database: {}", db_path.display());
            println!("identities: {total}");
            if readable < total {
                println!("corrupt rows: {}", total - readable);
            }
        }
    }

    Ok(())
}
