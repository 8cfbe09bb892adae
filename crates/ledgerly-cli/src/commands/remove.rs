//! Remove command - Delete an expense
//!
//! A record the remote never saw disappears entirely, pending INSERT
//! included; a synced record is deleted remotely, or queued for deletion
//! when offline.

use anyhow::Result;
use clap::Args;

use ledgerly_core::usecases::ExpenseWriter;

use crate::commands::{find_expense, AppContext};
use crate::output::Console;

#[derive(Debug, Args)]
pub struct RemoveCommand {
    /// Local id or remote row id of the expense (as shown by `list --json`)
    pub id: String,

    /// Month to search for the expense (YYYY-MM, default current month)
    #[arg(long)]
    pub month: Option<String>,
}

impl RemoveCommand {
    pub async fn execute(&self, config_path: Option<&str>, json: bool) -> Result<()> {
        let console = Console::new(json);
        let ctx = AppContext::build(config_path).await?;
        let owner = ctx.owner().await?;
        let record = find_expense(&ctx, &owner, &self.id, self.month.as_deref()).await?;

        let writer = ExpenseWriter::new(
            ctx.store.clone(),
            ctx.gateway.clone(),
            ctx.connectivity.clone(),
        );
        let outcome = writer.delete(&owner, &record).await?;

        if console.emit_json(&serde_json::json!({
            "local_id": outcome.record.local_id().as_str(),
            "queued": outcome.queued,
        })) {
            return Ok(());
        }
        if outcome.queued {
            console.done("Deletion recorded; it will sync when you're back online");
        } else {
            console.done("Expense deleted");
        }
        Ok(())
    }
}
