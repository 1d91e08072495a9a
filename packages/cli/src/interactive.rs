//! Interactive menu for when `living_lots` runs without a subcommand.

use chrono::Utc;
use dialoguer::{Confirm, Input, Select};
use living_lots_database::lot_db::DuckDbLotStore;

use crate::commands;

/// Top-level actions offered by the menu.
enum Action {
    Init,
    ListUses,
    RefreshAll,
    Explain,
    DeleteLot,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Init,
        Self::ListUses,
        Self::RefreshAll,
        Self::Explain,
        Self::DeleteLot,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Init => "Initialize database",
            Self::ListUses => "List known uses",
            Self::RefreshAll => "Refresh certainty for all lots",
            Self::Explain => "Explain a lot's certainty",
            Self::DeleteLot => "Delete a lot",
        }
    }
}

fn prompt_lot_id(prompt: &str) -> Result<i64, Box<dyn std::error::Error>> {
    let id: i64 = Input::new().with_prompt(prompt).interact_text()?;
    Ok(id)
}

/// Runs the interactive menu against an open store.
///
/// # Errors
///
/// Returns an error if a prompt or the selected operation fails.
pub fn run(store: &mut DuckDbLotStore) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Init => {
            let inserted = commands::init(store)?;
            println!("Database ready ({inserted} uses added).");
        }
        Action::ListUses => commands::print_uses(store)?,
        Action::RefreshAll => {
            let summary = commands::refresh_certainty(store, None, Utc::now())?;
            commands::print_summary(&summary);
        }
        Action::Explain => {
            let id = prompt_lot_id("Lot ID")?;
            let explanation = commands::explain_certainty(store, id, Utc::now())?;
            commands::print_explanation(id, &explanation);
        }
        Action::DeleteLot => {
            let id = prompt_lot_id("Lot ID to delete")?;
            let confirmed = Confirm::new()
                .with_prompt(format!("Delete lot {id}?"))
                .default(false)
                .interact()?;
            if confirmed {
                let lot = commands::delete_lot(store, id)?;
                println!("Deleted {}.", lot.display_name());
            }
        }
    }

    Ok(())
}
