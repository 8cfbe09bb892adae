//! Terminal rendering for command results
//!
//! Every command produces either a single JSON document (`--json`) or a
//! short human transcript. [`Console`] owns that choice; the free functions
//! own the line and document shapes shared between commands so `add` and
//! `list` render an expense identically.

use ledgerly_core::domain::ExpenseRecord;
use ledgerly_sync::SyncReport;

/// Routes command output to a human transcript or one JSON document
pub struct Console {
    json: bool,
}

impl Console {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Prints `value` and returns true when `--json` is active; callers
    /// skip their human transcript in that case
    pub fn emit_json(&self, value: &serde_json::Value) -> bool {
        if !self.json {
            return false;
        }
        match serde_json::to_string_pretty(value) {
            Ok(doc) => println!("{doc}"),
            Err(_) => println!("{value}"),
        }
        true
    }

    /// Closing line of a command that did what was asked
    pub fn done(&self, message: &str) {
        println!("\u{2714} {message}");
    }

    /// Cautionary line, kept on stderr so piped stdout stays clean
    pub fn warn(&self, message: &str) {
        eprintln!("warning: {message}");
    }

    /// Plain transcript line
    pub fn line(&self, message: &str) {
        println!("{message}");
    }
}

/// One expense as a transcript row; records the remote has not confirmed
/// yet are starred
pub fn expense_line(record: &ExpenseRecord) -> String {
    let marker = if record.is_synced() { ' ' } else { '*' };
    format!(
        "{} {} {:>10}  {:<13} {}",
        marker,
        record.date(),
        record.amount().to_string(),
        record.category().as_str(),
        record.description()
    )
}

/// One expense as the JSON object shared by `add --json` and `list --json`
pub fn expense_json(record: &ExpenseRecord) -> serde_json::Value {
    serde_json::json!({
        "local_id": record.local_id().as_str(),
        "remote_id": record.remote_id().map(|id| id.value()),
        "amount": record.amount().value(),
        "category": record.category().as_str(),
        "description": record.description(),
        "date": record.date().to_string(),
        "synced": record.is_synced(),
    })
}

/// One-line tally of a completed sync cycle
pub fn report_summary(report: &SyncReport) -> String {
    if report.is_clean() {
        format!("Synced {} item(s)", report.synced)
    } else {
        format!(
            "Synced {} item(s), {} still pending, {} dropped",
            report.synced,
            report.failed,
            report.terminal.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{NaiveDate, Utc};
    use ledgerly_core::domain::newtypes::{Amount, LocalId, OwnerId};
    use ledgerly_core::domain::{Category, ExpenseDraft};

    fn record() -> ExpenseRecord {
        let now = Utc::now();
        ExpenseRecord::new_local(
            OwnerId::new(),
            LocalId::generate(now),
            ExpenseDraft {
                amount: Amount::new(1500.0).unwrap(),
                category: Category::Food,
                description: "Lunch".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            },
            now,
        )
    }

    #[test]
    fn test_expense_line_stars_unsynced_records() {
        let mut record = record();
        assert!(expense_line(&record).starts_with('*'));
        record.mark_synced();
        assert!(expense_line(&record).starts_with(' '));
        assert!(expense_line(&record).contains("Lunch"));
    }

    #[test]
    fn test_expense_json_shape() {
        let value = expense_json(&record());
        assert_eq!(value["amount"], 1500.0);
        assert_eq!(value["category"], "Food");
        assert_eq!(value["remote_id"], serde_json::Value::Null);
        assert_eq!(value["synced"], false);
    }

    #[test]
    fn test_report_summary_mentions_failures() {
        let clean = SyncReport {
            synced: 3,
            ..Default::default()
        };
        assert_eq!(report_summary(&clean), "Synced 3 item(s)");

        let dirty = SyncReport {
            synced: 1,
            failed: 2,
            terminal: vec!["INSERT x".to_string()],
        };
        let summary = report_summary(&dirty);
        assert!(summary.contains("2 still pending"));
        assert!(summary.contains("1 dropped"));
    }
}
