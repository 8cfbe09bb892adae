//! Add command - Record a new expense
//!
//! Online-first: the expense goes straight to the remote store when
//! reachable, otherwise it lands in the offline store with a queued INSERT
//! for the next sync cycle.

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Args;

use ledgerly_core::domain::newtypes::Amount;
use ledgerly_core::domain::{Category, ExpenseDraft};
use ledgerly_core::usecases::ExpenseWriter;

use crate::commands::AppContext;
use crate::output::{expense_json, Console};

#[derive(Debug, Args)]
pub struct AddCommand {
    /// Amount spent
    pub amount: f64,

    /// Category: Food, Transport, Academics, Entertainment or Misc
    pub category: String,

    /// Free-text description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Date of the expense (YYYY-MM-DD, default today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

impl AddCommand {
    pub async fn execute(&self, config_path: Option<&str>, json: bool) -> Result<()> {
        let console = Console::new(json);
        let ctx = AppContext::build(config_path).await?;
        let owner = ctx.owner().await?;

        let draft = ExpenseDraft {
            amount: Amount::new(self.amount).context("invalid amount")?,
            category: Category::from_str(&self.category).context("invalid category")?,
            description: self.description.clone(),
            date: self.date.unwrap_or_else(|| Utc::now().date_naive()),
        };

        let writer = ExpenseWriter::new(
            ctx.store.clone(),
            ctx.gateway.clone(),
            ctx.connectivity.clone(),
        );
        let outcome = writer.create(&owner, draft).await?;

        if console.emit_json(&serde_json::json!({
            "expense": expense_json(&outcome.record),
            "queued": outcome.queued,
        })) {
            return Ok(());
        }
        if outcome.queued {
            console.done(&format!(
                "Recorded {} {} offline; it will sync when you're back online",
                outcome.record.amount(),
                outcome.record.category()
            ));
        } else {
            console.done(&format!(
                "Recorded {} {}",
                outcome.record.amount(),
                outcome.record.category()
            ));
        }
        Ok(())
    }
}
