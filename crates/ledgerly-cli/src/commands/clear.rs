//! Clear command - Wipe locally stored offline data
//!
//! Removes the owner's offline expenses and pending queue. Anything not yet
//! synced is lost, so the command refuses to run without `--force`.

use anyhow::Result;
use clap::Args;

use ledgerly_core::ports::IRecordStore;

use crate::commands::AppContext;
use crate::output::Console;

#[derive(Debug, Args)]
pub struct ClearCommand {
    /// Confirm deletion of unsynced local data
    #[arg(long)]
    pub force: bool,
}

impl ClearCommand {
    pub async fn execute(&self, config_path: Option<&str>, json: bool) -> Result<()> {
        let console = Console::new(json);
        let ctx = AppContext::build(config_path).await?;
        let owner = ctx.owner().await?;

        let counts = ctx.store.pending_counts(&owner).await;
        if !self.force {
            if console.emit_json(&serde_json::json!({
                "cleared": false,
                "unsynced_expenses": counts.unsynced_expenses,
                "pending_operations": counts.pending_operations,
            })) {
                return Ok(());
            }
            console.warn(&format!(
                "This would delete {} unsynced expense(s) and {} queued operation(s); \
                 re-run with --force to confirm",
                counts.unsynced_expenses, counts.pending_operations
            ));
            return Ok(());
        }

        ctx.store.clear_owner(&owner).await?;
        ctx.gateway.invalidate_session();
        if console.emit_json(&serde_json::json!({ "cleared": true })) {
            return Ok(());
        }
        console.done("Offline data cleared");
        Ok(())
    }
}
