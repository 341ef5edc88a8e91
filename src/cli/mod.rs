mod commands;
mod content;
mod info;
mod project;

pub use commands::{
    BlockCommands, ChildKind, ImageCommands, LifecycleArgs, LinkCommands, ListView,
    ProjectCommands, ReorderArgs,
};
pub use content::{run_block, run_image, run_link};
pub use info::run_info;
pub use project::run_project;

use std::sync::Arc;

use serde::Serialize;

use crate::config::FolioConfig;
use crate::portfolio::Portfolio;
use crate::store::SqliteStore;
use crate::types::Entity;

/// Open the portfolio in a data directory, checking it was initialized
pub fn init_portfolio(data_dir: &str) -> anyhow::Result<Portfolio> {
    let config = FolioConfig::load(data_dir)?;
    let db_path = config.db_path();

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'folio init' first.",
            db_path.display()
        );
    }

    let store = SqliteStore::new(&db_path)?;
    Ok(Portfolio::new(Arc::new(store), &config))
}

pub fn confirm_action(message: &str, yes: bool, non_interactive: bool) -> anyhow::Result<bool> {
    if yes {
        Ok(true)
    } else if non_interactive {
        anyhow::bail!("--yes is required for destructive operations in non-interactive mode");
    } else {
        Ok(inquire::Confirm::new(message)
            .with_default(false)
            .prompt()?)
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Lifecycle {
    Remove,
    Restore,
    Purge,
}

/// Apply a lifecycle transition to an entity and report the outcome.
fn run_lifecycle<E: Entity>(
    portfolio: &Portfolio,
    entity: &E,
    action: Lifecycle,
    args: &LifecycleArgs,
) -> anyhow::Result<()> {
    let kind = E::KIND;
    let name = entity.name();

    match action {
        Lifecycle::Remove => {
            if !portfolio.remove(entity)? {
                anyhow::bail!("{kind} '{name}' is already removed");
            }
            println!("Removed {kind} '{name}'");
        }
        Lifecycle::Restore => {
            if !portfolio.restore(entity)? {
                anyhow::bail!("{kind} '{name}' is not removed");
            }
            println!("Restored {kind} '{name}'");
        }
        Lifecycle::Purge => {
            if !entity.is_trashed() {
                anyhow::bail!(
                    "{kind} '{name}' must be removed before it can be purged. Run '{kind} remove' first."
                );
            }

            let confirmed = confirm_action(
                &format!("Permanently delete {kind} '{name}'?"),
                args.yes,
                args.non_interactive,
            )?;

            if !confirmed {
                println!("Cancelled.");
                return Ok(());
            }

            portfolio.purge(entity)?;
            println!("Purged {kind} '{name}'");
        }
    }

    Ok(())
}
