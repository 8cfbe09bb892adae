//! CLI command implementations
//!
//! Each command wires the adapters together through [`AppContext`] and
//! renders through the console in `output.rs`.

pub mod add;
pub mod clear;
pub mod edit;
pub mod list;
pub mod remove;
pub mod status;
pub mod sync;
pub mod watch;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Months, NaiveDate, Utc};
use tracing::warn;

use ledgerly_core::config::Config;
use ledgerly_core::domain::newtypes::OwnerId;
use ledgerly_core::domain::ExpenseRecord;
use ledgerly_core::usecases::ExpenseReader;
use ledgerly_rest::{RestClient, RestRemoteStore};
use ledgerly_store::{DatabasePool, SqliteRecordStore};
use ledgerly_sync::HttpConnectivity;

/// Environment variable overriding the configured access token
const TOKEN_ENV: &str = "LEDGERLY_ACCESS_TOKEN";

/// Shared wiring for all commands: config plus the three adapters
pub(crate) struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteRecordStore>,
    pub gateway: Arc<RestRemoteStore>,
    pub connectivity: Arc<HttpConnectivity>,
}

impl AppContext {
    /// Builds the context from the config file at `config_path` (or the
    /// platform default path)
    pub async fn build(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(PathBuf::from)
            .unwrap_or_else(Config::default_path);
        let config = Config::load_or_default(&path);
        for error in config.validate() {
            warn!(%error, "configuration problem");
        }

        let pool = DatabasePool::new(Path::new(&config.storage.database))
            .await
            .context("Failed to open offline database")?;
        let store = Arc::new(SqliteRecordStore::new(pool.pool().clone()));

        let timeout = Duration::from_secs(config.remote.timeout_secs);
        let mut client = RestClient::new(
            &config.remote.base_url,
            config.remote.api_key.clone().unwrap_or_default(),
            timeout,
        )?;
        let token = std::env::var(TOKEN_ENV)
            .ok()
            .or_else(|| config.remote.access_token.clone());
        if let Some(token) = token {
            client.set_access_token(token);
        }
        let gateway = Arc::new(RestRemoteStore::new(
            client,
            Duration::from_secs(config.remote.session_ttl_secs),
        ));

        let connectivity = Arc::new(HttpConnectivity::new(&config.remote.base_url, timeout));

        Ok(Self {
            config,
            store,
            gateway,
            connectivity,
        })
    }

    /// Resolves the owner scope: the authenticated session when reachable,
    /// otherwise the owner id cached in the config
    pub async fn owner(&self) -> Result<OwnerId> {
        match self.gateway.current_owner().await {
            Ok(owner) => Ok(owner),
            Err(err) => {
                if let Some(raw) = self.config.remote.owner_id.as_deref() {
                    let owner = OwnerId::from_str(raw)
                        .with_context(|| format!("invalid cached owner id {raw:?}"))?;
                    warn!(error = %err, "session lookup failed, using cached owner");
                    return Ok(owner);
                }
                bail!("not signed in and no cached owner; check remote configuration ({err})")
            }
        }
    }
}

/// Resolves a `YYYY-MM` string (or the current month) into inclusive bounds
pub(crate) fn month_bounds(month: Option<&str>) -> Result<(NaiveDate, NaiveDate)> {
    let first = match month {
        Some(raw) => {
            let Some((year, month)) = raw.split_once('-') else {
                bail!("invalid month {raw:?}, expected YYYY-MM");
            };
            let year: i32 = year.parse()?;
            let month: u32 = month.parse()?;
            NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or_else(|| anyhow::anyhow!("invalid month {raw:?}"))?
        }
        None => {
            let today = Utc::now().date_naive();
            NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today)
        }
    };
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| anyhow::anyhow!("month out of range"))?;
    Ok((first, last))
}

/// Locates one expense within a month by its local id or remote row id.
/// `edit` and `remove` use this so the user can name a record the way
/// `list` displayed it.
pub(crate) async fn find_expense(
    ctx: &AppContext,
    owner: &OwnerId,
    id: &str,
    month: Option<&str>,
) -> Result<ExpenseRecord> {
    let (from, to) = month_bounds(month)?;
    let reader = ExpenseReader::new(
        ctx.store.clone(),
        ctx.gateway.clone(),
        ctx.connectivity.clone(),
    );
    let view = reader.list(owner, from, to).await;
    view.records
        .into_iter()
        .find(|record| {
            record.local_id().as_str() == id
                || record
                    .remote_id()
                    .is_some_and(|remote_id| remote_id.value().to_string() == id)
        })
        .ok_or_else(|| {
            anyhow::anyhow!("no expense with id {id:?} between {from} and {to}; try --month")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_bounds_explicit() {
        let (from, to) = month_bounds(Some("2025-03")).unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
    }

    #[test]
    fn test_month_bounds_february() {
        let (from, to) = month_bounds(Some("2024-02")).unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_month_bounds_rejects_garbage() {
        assert!(month_bounds(Some("march")).is_err());
        assert!(month_bounds(Some("2025-13")).is_err());
    }
}
