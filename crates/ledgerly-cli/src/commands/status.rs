//! Status command - Connectivity and pending offline counts

use anyhow::Result;
use clap::Args;

use ledgerly_core::ports::{IConnectivity, IRecordStore};

use crate::commands::AppContext;
use crate::output::Console;

#[derive(Debug, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(&self, config_path: Option<&str>, json: bool) -> Result<()> {
        let console = Console::new(json);
        let ctx = AppContext::build(config_path).await?;
        let owner = ctx.owner().await?;

        let online = ctx.connectivity.is_online().await;
        let counts = ctx.store.pending_counts(&owner).await;

        if console.emit_json(&serde_json::json!({
            "online": online,
            "unsynced_expenses": counts.unsynced_expenses,
            "pending_operations": counts.pending_operations,
        })) {
            return Ok(());
        }

        console.line(&format!(
            "Connectivity: {}",
            if online { "online" } else { "offline" }
        ));
        if counts.is_empty() {
            console.done("Everything is synced");
        } else {
            console.line(&format!(
                "Pending: {} expense(s), {} queued operation(s)",
                counts.unsynced_expenses, counts.pending_operations
            ));
        }
        Ok(())
    }
}
