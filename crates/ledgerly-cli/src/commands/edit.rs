//! Edit command - Amend an existing expense
//!
//! Works on both synced and still-local records: a synced expense goes
//! through the remote store (or the queue when offline), a local one is
//! patched in place together with its pending INSERT.

use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Args;

use ledgerly_core::domain::newtypes::Amount;
use ledgerly_core::domain::{Category, ExpenseChanges};
use ledgerly_core::usecases::ExpenseWriter;

use crate::commands::{find_expense, AppContext};
use crate::output::{expense_json, Console};

#[derive(Debug, Args)]
pub struct EditCommand {
    /// Local id or remote row id of the expense (as shown by `list --json`)
    pub id: String,

    /// New amount
    #[arg(long)]
    pub amount: Option<f64>,

    /// New category
    #[arg(long)]
    pub category: Option<String>,

    /// New description
    #[arg(short, long)]
    pub description: Option<String>,

    /// New date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Month to search for the expense (YYYY-MM, default current month)
    #[arg(long)]
    pub month: Option<String>,
}

impl EditCommand {
    pub async fn execute(&self, config_path: Option<&str>, json: bool) -> Result<()> {
        let console = Console::new(json);
        let changes = build_changes(
            self.amount,
            self.category.as_deref(),
            self.description.clone(),
            self.date,
        )?;

        let ctx = AppContext::build(config_path).await?;
        let owner = ctx.owner().await?;
        let record = find_expense(&ctx, &owner, &self.id, self.month.as_deref()).await?;

        let writer = ExpenseWriter::new(
            ctx.store.clone(),
            ctx.gateway.clone(),
            ctx.connectivity.clone(),
        );
        let outcome = writer.update(&owner, &record, changes).await?;

        if console.emit_json(&serde_json::json!({
            "expense": expense_json(&outcome.record),
            "queued": outcome.queued,
        })) {
            return Ok(());
        }
        if outcome.queued {
            console.done("Change saved locally; it will sync when you're back online");
        } else {
            console.done("Change saved");
        }
        Ok(())
    }
}

/// Builds the partial patch from the provided flags
fn build_changes(
    amount: Option<f64>,
    category: Option<&str>,
    description: Option<String>,
    date: Option<NaiveDate>,
) -> Result<ExpenseChanges> {
    let changes = ExpenseChanges {
        amount: amount.map(Amount::new).transpose().context("invalid amount")?,
        category: category
            .map(Category::from_str)
            .transpose()
            .context("invalid category")?,
        description,
        date,
    };
    if changes.is_empty() {
        bail!("nothing to change; pass at least one of --amount, --category, --description, --date");
    }
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_changes_requires_a_field() {
        assert!(build_changes(None, None, None, None).is_err());
    }

    #[test]
    fn test_build_changes_validates_values() {
        assert!(build_changes(Some(-1.0), None, None, None).is_err());
        assert!(build_changes(None, Some("Gadgets"), None, None).is_err());
    }

    #[test]
    fn test_build_changes_carries_flags_through() {
        let changes =
            build_changes(Some(20.0), Some("Food"), Some("Lunch".to_string()), None).unwrap();
        assert_eq!(changes.amount.unwrap().value(), 20.0);
        assert_eq!(changes.category, Some(Category::Food));
        assert_eq!(changes.description.as_deref(), Some("Lunch"));
        assert!(changes.date.is_none());
    }
}
