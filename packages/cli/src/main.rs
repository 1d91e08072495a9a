#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Maintenance CLI for the living lots database.
//!
//! Runs the certainty estimator and lot group maintenance against the
//! `DuckDB` lot database. Without a subcommand, an interactive menu is
//! shown.

mod commands;
mod interactive;

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use living_lots_database::{lot_db, paths};

#[derive(Parser)]
#[command(name = "living_lots", about = "Living lots maintenance tool")]
struct Cli {
    /// Path to the lot database (overrides `LIVING_LOTS_DB`)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the schema and seed the default known uses
    Init,
    /// List known uses
    Uses,
    /// Recompute known use certainty (locked lots are skipped)
    RefreshCertainty {
        /// Only refresh this lot
        #[arg(long)]
        lot: Option<i64>,
    },
    /// Show how a lot's certainty is computed
    ExplainCertainty {
        /// Lot ID
        lot: i64,
    },
    /// Manage lot groups
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },
    /// Delete a lot, recomputing its group
    DeleteLot {
        /// Lot ID
        lot: i64,
    },
}

#[derive(Subcommand)]
enum GroupCommands {
    /// Create an empty group
    Create {
        /// Group name
        #[arg(long)]
        name: String,
    },
    /// Move a lot into a group
    Add {
        /// Group ID
        #[arg(long)]
        group: i64,
        /// Lot ID
        #[arg(long)]
        lot: i64,
    },
    /// Take a lot out of its group
    Remove {
        /// Lot ID
        #[arg(long)]
        lot: i64,
    },
    /// Rebuild a group's polygon and centroid from its members
    Recompute {
        /// Group ID
        #[arg(long)]
        group: i64,
    },
}

fn run_group(
    store: &mut lot_db::DuckDbLotStore,
    command: GroupCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        GroupCommands::Create { name } => {
            let group = commands::group_create(store, &name)?;
            println!("Created group {} ({name})", group.id());
        }
        GroupCommands::Add { group, lot } => {
            let group = commands::group_add(store, group, lot)?;
            println!(
                "Lot {lot} is now in group {} ({:.0} sq ft)",
                group.id(),
                group.lot.polygon_area.unwrap_or_default()
            );
        }
        GroupCommands::Remove { lot } => match commands::group_remove(store, lot)? {
            Some(group) => println!("Lot {lot} removed from group {}", group.id()),
            None => println!("Lot {lot} is not in a group"),
        },
        GroupCommands::Recompute { group } => {
            let group = commands::group_recompute(store, group)?;
            let centroid = group
                .lot
                .centroid
                .map_or_else(|| "none".to_string(), |c| format!("{:.6}, {:.6}", c.y(), c.x()));
            println!("Recomputed group {} (centroid {centroid})", group.id());
        }
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let path = cli.db.unwrap_or_else(paths::lot_db_path);
    let mut store = lot_db::open(&path)?;

    let Some(command) = cli.command else {
        return interactive::run(&mut store);
    };

    match command {
        Commands::Init => {
            let inserted = commands::init(&store)?;
            log::info!("Database ready at {}", path.display());
            println!("Seeded {inserted} uses");
        }
        Commands::Uses => commands::print_uses(&store)?,
        Commands::RefreshCertainty { lot } => {
            let summary = commands::refresh_certainty(&mut store, lot, Utc::now())?;
            commands::print_summary(&summary);
        }
        Commands::ExplainCertainty { lot } => {
            let explanation = commands::explain_certainty(&store, lot, Utc::now())?;
            commands::print_explanation(lot, &explanation);
        }
        Commands::Group { command } => run_group(&mut store, command)?,
        Commands::DeleteLot { lot } => {
            let deleted = commands::delete_lot(&mut store, lot)?;
            println!("Deleted {}", deleted.display_name());
        }
    }

    Ok(())
}
