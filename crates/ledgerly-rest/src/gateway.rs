//! RestRemoteStore - IRemoteStore implementation
//!
//! Implements the remote store port against a PostgREST-compatible API.
//! All operations are scoped to the authenticated owner via query filters;
//! the remote table additionally enforces row-level ownership.
//!
//! ## Idempotency
//!
//! Inserts carry the client-generated local id; the remote table holds a
//! unique constraint on `(user_id, local_id)`. A unique-violation response
//! on that constraint is surfaced as [`InsertOutcome::Duplicate`] so a
//! lost-acknowledgment replay never creates a second row.

use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Method;
use serde_json::json;
use tracing::debug;

use ledgerly_core::cache::TtlCache;
use ledgerly_core::domain::newtypes::{OwnerId, RemoteRowId};
use ledgerly_core::domain::{ExpenseChanges, ExpensePayload};
use ledgerly_core::ports::{ExpenseRow, IRemoteStore, InsertOutcome, RemoteError};

use crate::client::{classify_status, RestClient};

/// Cache key for the owner lookup; there is one session per client
const SESSION_KEY: &str = "session";

/// PostgREST-backed implementation of the remote store port
pub struct RestRemoteStore {
    client: RestClient,
    /// Owner lookups are cached per access token for the session TTL
    sessions: TtlCache<String, OwnerId>,
}

impl RestRemoteStore {
    /// Creates a gateway over `client`, caching owner lookups for
    /// `session_ttl`
    pub fn new(client: RestClient, session_ttl: Duration) -> Self {
        Self {
            client,
            sessions: TtlCache::new(session_ttl),
        }
    }

    /// Returns the underlying client
    pub fn client(&self) -> &RestClient {
        &self.client
    }

    /// Resolves the authenticated owner, consulting the session cache first
    pub async fn current_owner(&self) -> Result<OwnerId, RemoteError> {
        let token = self
            .client
            .access_token()
            .ok_or(RemoteError::NotAuthenticated)?;
        let key = format!("{SESSION_KEY}:{token}");
        if let Some(owner) = self.sessions.get(&key) {
            return Ok(owner);
        }

        let request = self.client.request(Method::POST, "rpc/current_owner")?;
        let response = self.client.send(request).await?;
        if !response.status().is_success() {
            classify_status(response).await?;
            return Err(RemoteError::NotAuthenticated);
        }
        let raw: String = response
            .json()
            .await
            .map_err(|e| RemoteError::ServerError(format!("invalid owner response: {e}")))?;
        let owner = OwnerId::from_str(&raw)
            .map_err(|e| RemoteError::ServerError(format!("invalid owner id {raw:?}: {e}")))?;

        self.sessions.put(key, owner);
        debug!(owner = %owner, "resolved session owner");
        Ok(owner)
    }

    /// Drops cached session state (sign-out)
    pub fn invalidate_session(&self) {
        self.sessions.clear();
    }
}

#[async_trait::async_trait]
impl IRemoteStore for RestRemoteStore {
    async fn insert_expense(
        &self,
        owner: &OwnerId,
        payload: &ExpensePayload,
    ) -> Result<InsertOutcome, RemoteError> {
        let body = json!({
            "user_id": owner.to_string(),
            "local_id": payload.local_id.as_str(),
            "amount": payload.amount.value(),
            "category": payload.category.as_str(),
            "description": payload.description,
            "date": payload.date.to_string(),
            "created_at": payload.created_at.to_rfc3339(),
            "is_synced": true,
        });

        let request = self
            .client
            .request(Method::POST, "expenses")?
            .header("Prefer", "return=representation")
            .json(&body);
        let response = self.client.send(request).await?;

        if response.status().is_success() {
            let mut rows: Vec<ExpenseRow> = response
                .json()
                .await
                .map_err(|e| RemoteError::ServerError(format!("invalid insert response: {e}")))?;
            let row = rows
                .pop()
                .ok_or_else(|| RemoteError::ServerError("empty insert response".to_string()))?;
            debug!(remote_id = row.id, local_id = ?row.local_id, "expense inserted remotely");
            return Ok(InsertOutcome::Inserted(row));
        }

        if classify_status(response).await? {
            debug!(local_id = payload.local_id.as_str(), "duplicate token, insert already applied");
            Ok(InsertOutcome::Duplicate)
        } else {
            Err(RemoteError::ServerError(
                "unclassified insert failure".to_string(),
            ))
        }
    }

    async fn update_expense(
        &self,
        owner: &OwnerId,
        remote_id: RemoteRowId,
        changes: &ExpenseChanges,
    ) -> Result<(), RemoteError> {
        if changes.is_empty() {
            return Ok(());
        }

        let request = self
            .client
            .request(Method::PATCH, "expenses")?
            .query(&[
                ("id", format!("eq.{}", remote_id.value())),
                ("user_id", format!("eq.{owner}")),
            ])
            .json(changes);
        let response = self.client.send(request).await?;
        classify_status(response).await?;
        Ok(())
    }

    async fn delete_expense(
        &self,
        owner: &OwnerId,
        remote_id: RemoteRowId,
    ) -> Result<(), RemoteError> {
        let request = self.client.request(Method::DELETE, "expenses")?.query(&[
            ("id", format!("eq.{}", remote_id.value())),
            ("user_id", format!("eq.{owner}")),
        ]);
        let response = self.client.send(request).await?;
        classify_status(response).await?;
        Ok(())
    }

    async fn list_expenses(
        &self,
        owner: &OwnerId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ExpenseRow>, RemoteError> {
        let request = self.client.request(Method::GET, "expenses")?.query(&[
            ("user_id", format!("eq.{owner}")),
            ("date", format!("gte.{from}")),
            ("date", format!("lte.{to}")),
            ("order", "date.desc,created_at.desc".to_string()),
        ]);
        let response = self.client.send(request).await?;
        if !response.status().is_success() {
            classify_status(response).await?;
            return Ok(Vec::new());
        }
        response
            .json()
            .await
            .map_err(|e| RemoteError::ServerError(format!("invalid list response: {e}")))
    }
}
