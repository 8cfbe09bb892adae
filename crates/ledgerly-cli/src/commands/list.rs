//! List command - Merged expense view for one month
//!
//! Shows remote rows for the month combined with local records the remote
//! has not seen yet; unsynced records are marked. Works fully offline.

use anyhow::Result;
use clap::Args;

use ledgerly_core::usecases::ExpenseReader;

use crate::commands::{month_bounds, AppContext};
use crate::output::{expense_json, expense_line, Console};

#[derive(Debug, Args)]
pub struct ListCommand {
    /// Month to list (YYYY-MM, default current month)
    #[arg(long)]
    pub month: Option<String>,
}

impl ListCommand {
    pub async fn execute(&self, config_path: Option<&str>, json: bool) -> Result<()> {
        let console = Console::new(json);
        let ctx = AppContext::build(config_path).await?;
        let owner = ctx.owner().await?;

        let (from, to) = month_bounds(self.month.as_deref())?;
        let reader = ExpenseReader::new(
            ctx.store.clone(),
            ctx.gateway.clone(),
            ctx.connectivity.clone(),
        );
        let view = reader.list(&owner, from, to).await;

        if console.emit_json(&serde_json::json!({
            "from": from.to_string(),
            "to": to.to_string(),
            "includes_remote": view.includes_remote,
            "expenses": view.records.iter().map(expense_json).collect::<Vec<_>>(),
        })) {
            return Ok(());
        }

        if !view.includes_remote {
            console.warn("Offline: showing locally stored expenses only");
        }
        if view.records.is_empty() {
            console.line("No expenses for this month");
            return Ok(());
        }

        let mut total = 0.0;
        for record in &view.records {
            console.line(&expense_line(record));
            total += record.amount().value();
        }
        console.done(&format!(
            "{} expenses, total {:.2} ('*' = not yet synced)",
            view.records.len(),
            total
        ));
        Ok(())
    }
}
