//! Watch command - Background sync loop
//!
//! Runs the periodic scheduler in the foreground: one cycle immediately,
//! then one per poll interval. Ctrl-C to stop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use ledgerly_sync::{SyncEngine, SyncScheduler};

use crate::commands::AppContext;
use crate::output::Console;

#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Override the poll interval in seconds
    #[arg(long)]
    pub interval: Option<u64>,
}

impl WatchCommand {
    pub async fn execute(&self, config_path: Option<&str>, json: bool) -> Result<()> {
        let console = Console::new(json);
        let ctx = AppContext::build(config_path).await?;
        let owner = ctx.owner().await?;

        let interval = self.interval.unwrap_or(ctx.config.sync.poll_interval);
        let engine = Arc::new(SyncEngine::new(
            ctx.store.clone(),
            ctx.gateway.clone(),
            ctx.connectivity.clone(),
            &ctx.config,
        ));
        let (scheduler, _trigger) =
            SyncScheduler::new(engine, owner, Duration::from_secs(interval));

        if !console.emit_json(&serde_json::json!({ "watching": true, "interval_secs": interval })) {
            console.line(&format!(
                "Watching; syncing every {interval}s (Ctrl-C to stop)"
            ));
        }
        scheduler.run().await;
        Ok(())
    }
}
