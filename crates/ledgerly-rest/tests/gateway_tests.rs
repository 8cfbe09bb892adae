//! Integration tests for RestRemoteStore
//!
//! Exercises the gateway against a wiremock server, covering status
//! classification, the duplicate-token path, and session caching.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ledgerly_core::domain::newtypes::{Amount, LocalId, OwnerId, RemoteRowId};
use ledgerly_core::domain::{Category, ExpenseChanges, ExpensePayload};
use ledgerly_core::ports::{IRemoteStore, InsertOutcome, RemoteError};
use ledgerly_rest::{RestClient, RestRemoteStore};

// ============================================================================
// Test helpers
// ============================================================================

async fn setup() -> (MockServer, RestRemoteStore, OwnerId) {
    let server = MockServer::start().await;
    let client = RestClient::with_base_url(server.uri());
    let gateway = RestRemoteStore::new(client, Duration::from_secs(300));
    (server, gateway, OwnerId::new())
}

fn payload() -> ExpensePayload {
    ExpensePayload {
        local_id: LocalId::generate(Utc::now()),
        amount: Amount::new(1500.0).unwrap(),
        category: Category::Food,
        description: "Lunch".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        created_at: Utc::now(),
    }
}

fn row_json(owner: &OwnerId, local_id: &str, id: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "user_id": owner.to_string(),
        "local_id": local_id,
        "amount": 1500.0,
        "category": "Food",
        "description": "Lunch",
        "date": "2025-03-10",
        "is_synced": true,
        "created_at": Utc::now().to_rfc3339(),
    })
}

// ============================================================================
// Insert
// ============================================================================

#[tokio::test]
async fn test_insert_success() {
    let (server, gateway, owner) = setup().await;
    let payload = payload();

    Mock::given(method("POST"))
        .and(path("/expenses"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(serde_json::json!([row_json(&owner, payload.local_id.as_str(), 42)])),
        )
        .mount(&server)
        .await;

    match gateway.insert_expense(&owner, &payload).await.unwrap() {
        InsertOutcome::Inserted(row) => {
            assert_eq!(row.id, 42);
            assert_eq!(row.local_id.as_deref(), Some(payload.local_id.as_str()));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_insert_duplicate_token_maps_to_duplicate() {
    let (server, gateway, owner) = setup().await;

    Mock::given(method("POST"))
        .and(path("/expenses"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"expenses_user_id_local_id_key\""
        })))
        .mount(&server)
        .await;

    let outcome = gateway.insert_expense(&owner, &payload()).await.unwrap();
    assert_eq!(outcome, InsertOutcome::Duplicate);
}

#[tokio::test]
async fn test_insert_other_constraint_is_terminal() {
    let (server, gateway, owner) = setup().await;

    Mock::given(method("POST"))
        .and(path("/expenses"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "code": "23503",
            "message": "insert or update violates foreign key constraint"
        })))
        .mount(&server)
        .await;

    let err = gateway.insert_expense(&owner, &payload()).await.unwrap_err();
    assert!(matches!(err, RemoteError::ConstraintViolation(_)));
    assert!(err.is_terminal());
}

#[tokio::test]
async fn test_unauthorized_maps_to_not_authenticated() {
    let (server, gateway, owner) = setup().await;

    Mock::given(method("POST"))
        .and(path("/expenses"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = gateway.insert_expense(&owner, &payload()).await.unwrap_err();
    assert_eq!(err, RemoteError::NotAuthenticated);
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let (server, gateway, owner) = setup().await;

    Mock::given(method("POST"))
        .and(path("/expenses"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = gateway.insert_expense(&owner, &payload()).await.unwrap_err();
    assert!(matches!(err, RemoteError::ServerError(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_unreachable_server_is_network_unavailable() {
    let client = RestClient::with_base_url("http://127.0.0.1:1");
    let gateway = RestRemoteStore::new(client, Duration::from_secs(300));

    let err = gateway
        .insert_expense(&OwnerId::new(), &payload())
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::NetworkUnavailable(_)));
    assert!(err.is_retryable());
}

// ============================================================================
// Update / delete / list
// ============================================================================

#[tokio::test]
async fn test_update_success() {
    let (server, gateway, owner) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/expenses"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let changes = ExpenseChanges {
        amount: Some(Amount::new(2000.0).unwrap()),
        ..Default::default()
    };
    gateway
        .update_expense(&owner, RemoteRowId::new(42).unwrap(), &changes)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_empty_update_skips_request() {
    // No mock mounted; an HTTP call would fail the test
    let client = RestClient::with_base_url("http://127.0.0.1:1");
    let gateway = RestRemoteStore::new(client, Duration::from_secs(300));

    gateway
        .update_expense(
            &OwnerId::new(),
            RemoteRowId::new(1).unwrap(),
            &ExpenseChanges::default(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_success() {
    let (server, gateway, owner) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/expenses"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    gateway
        .delete_expense(&owner, RemoteRowId::new(42).unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_returns_rows() {
    let (server, gateway, owner) = setup().await;

    Mock::given(method("GET"))
        .and(path("/expenses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            row_json(&owner, "local_1700000000000_aaaaaaaa", 1),
            row_json(&owner, "local_1700000000001_bbbbbbbb", 2),
        ])))
        .mount(&server)
        .await;

    let rows = gateway
        .list_expenses(
            &owner,
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, 1);
}

// ============================================================================
// Session cache
// ============================================================================

#[tokio::test]
async fn test_owner_lookup_is_cached() {
    let (server, gateway, owner) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rpc/current_owner"))
        .respond_with(ResponseTemplate::new(200).set_body_json(owner.to_string()))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(gateway.current_owner().await.unwrap(), owner);
    // Second call must hit the cache, not the server (expect(1) above)
    assert_eq!(gateway.current_owner().await.unwrap(), owner);
}

#[tokio::test]
async fn test_invalidate_session_forces_lookup() {
    let (server, gateway, owner) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rpc/current_owner"))
        .respond_with(ResponseTemplate::new(200).set_body_json(owner.to_string()))
        .expect(2)
        .mount(&server)
        .await;

    gateway.current_owner().await.unwrap();
    gateway.invalidate_session();
    gateway.current_owner().await.unwrap();
}
