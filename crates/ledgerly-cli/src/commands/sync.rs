//! Sync command - Manual sync trigger
//!
//! Runs one drain cycle and prints the tally.

use anyhow::Result;
use clap::Args;

use ledgerly_sync::{SyncEngine, SyncOutcome};

use crate::commands::AppContext;
use crate::output::{report_summary, Console};

#[derive(Debug, Args)]
pub struct SyncCommand {}

impl SyncCommand {
    pub async fn execute(&self, config_path: Option<&str>, json: bool) -> Result<()> {
        let console = Console::new(json);
        let ctx = AppContext::build(config_path).await?;
        let owner = ctx.owner().await?;

        let engine = SyncEngine::new(
            ctx.store.clone(),
            ctx.gateway.clone(),
            ctx.connectivity.clone(),
            &ctx.config,
        );

        match engine.sync(&owner).await? {
            SyncOutcome::Completed(report) => {
                if console.emit_json(&serde_json::json!({
                    "synced": report.synced,
                    "failed": report.failed,
                    "terminal": report.terminal,
                })) {
                    return Ok(());
                }
                if report.is_clean() {
                    console.done(&report_summary(&report));
                } else {
                    console.warn(&report_summary(&report));
                    for item in &report.terminal {
                        console.line(&format!("  dropped: {item}"));
                    }
                }
            }
            SyncOutcome::Offline => {
                if console.emit_json(&serde_json::json!({ "offline": true })) {
                    return Ok(());
                }
                console.warn("Offline: nothing was synced");
            }
            SyncOutcome::AlreadyRunning => {
                if console.emit_json(&serde_json::json!({ "already_running": true })) {
                    return Ok(());
                }
                console.warn("A sync cycle is already running");
            }
        }
        Ok(())
    }
}
