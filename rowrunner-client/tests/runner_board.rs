//! Runner board: available list, live refresh, runs and earnings

mod common;

use common::*;
use rowrunner_client::backend::{Operation, Table};
use rowrunner_client::{Backend, ErrorCode, OrderStatus, RowRunner};
use serde_json::json;

#[tokio::test]
async fn test_available_is_venue_unclaimed_oldest_first() {
    let backend = stadium();
    let mut claimed = pending_order("o4", "2026-05-01T18:00:00Z");
    claimed["runner_id"] = json!("someone");
    claimed["status"] = json!("claimed");
    let mut other_venue = pending_order("o3", "2026-05-01T18:30:00Z");
    other_venue["venue_id"] = json!("v2");
    let mut confirmed = pending_order("o5", "2026-05-01T19:20:00Z");
    confirmed["status"] = json!("confirmed");
    backend.seed(
        Table::Orders,
        [
            pending_order("o2", "2026-05-01T19:10:00Z"),
            pending_order("o1", "2026-05-01T19:00:00Z"),
            other_venue,
            claimed,
            confirmed,
        ],
    );

    let client = signed_in_runner(&backend).await;
    let mut board = client.runner_board(VENUE_ID).unwrap();
    let available = board.refresh_available().await.unwrap();

    let ids: Vec<_> = available.iter().map(|o| o.id()).collect();
    assert_eq!(ids, ["o1", "o2", "o5"]);
    assert_eq!(available[0].restaurant_name(), "Dog House");
    assert_eq!(available[0].seat_line(), "Sec 112 · Row F · Seat 7");
}

#[tokio::test]
async fn test_board_requires_sign_in() {
    let backend = stadium();
    let client = RowRunner::in_memory(backend);
    let err = client.runner_board(VENUE_ID).err().unwrap();
    assert_eq!(err.code, ErrorCode::NotAuthenticated);
}

#[tokio::test]
async fn test_sync_refetches_after_changes() {
    let backend = stadium();
    backend.seed(Table::Orders, [pending_order("o1", "2026-05-01T19:00:00Z")]);
    let client = signed_in_runner(&backend).await;
    let mut board = client.runner_board(VENUE_ID).unwrap();
    board.refresh_available().await.unwrap();
    board.subscribe().await.unwrap();
    assert!(board.is_live());

    assert!(!board.sync().await.unwrap());

    backend
        .insert(Table::Orders, vec![pending_order("o2", "2026-05-01T19:05:00Z")])
        .await
        .unwrap();
    assert!(board.sync().await.unwrap());
    assert_eq!(board.available().len(), 2);

    // Changes at other venues are not delivered
    let mut elsewhere = pending_order("o9", "2026-05-01T19:06:00Z");
    elsewhere["venue_id"] = json!("v2");
    backend.insert(Table::Orders, vec![elsewhere]).await.unwrap();
    assert!(!board.sync().await.unwrap());
}

#[tokio::test]
async fn test_wait_for_change_sees_external_claim() {
    let backend = stadium();
    backend.seed(Table::Orders, [pending_order("o1", "2026-05-01T19:00:00Z")]);
    let client = signed_in_runner(&backend).await;
    let mut board = client.runner_board(VENUE_ID).unwrap();
    board.refresh_available().await.unwrap();
    board.subscribe().await.unwrap();

    assert!(backend.external_update(
        Table::Orders,
        "o1",
        json!({ "runner_id": "someone", "status": "claimed" })
    ));
    assert!(board.wait_for_change().await.unwrap());
    assert!(board.available().is_empty());
}

#[tokio::test]
async fn test_wait_without_subscription() {
    let backend = stadium();
    let client = signed_in_runner(&backend).await;
    let mut board = client.runner_board(VENUE_ID).unwrap();
    assert!(!board.wait_for_change().await.unwrap());
    assert!(!board.sync().await.unwrap());

    backend.fail(Operation::Subscribe, None);
    assert!(board.subscribe().await.is_err());
    assert!(!board.is_live());
}

#[tokio::test]
async fn test_advance_through_delivery() {
    let backend = stadium();
    backend.seed(Table::Orders, [pending_order("o1", "2026-05-01T19:00:00Z")]);
    let client = signed_in_runner(&backend).await;
    let mut board = client.runner_board(VENUE_ID).unwrap().with_venue_name("Arena");

    assert!(board.claim("o1").await.unwrap().is_claimed());
    let runs = board.my_runs().await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, "claimed");

    let picked_up = board.advance("o1", OrderStatus::Claimed).await.unwrap();
    assert_eq!(picked_up.status, "confirmed");

    // Stale view: the order is no longer claimed
    let err = board.advance("o1", OrderStatus::Claimed).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderStateChanged);
    assert_eq!(backend.row(Table::Orders, "o1").unwrap()["status"], "confirmed");

    let delivered = board.advance("o1", OrderStatus::Confirmed).await.unwrap();
    assert_eq!(delivered.status, "delivered");
    assert!(board.my_runs().await.unwrap().is_empty());

    let statuses: Vec<_> = emails(&backend)
        .iter()
        .map(|e| e["status"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(statuses, ["claimed", "confirmed", "delivered"]);
    assert!(emails(&backend).iter().all(|e| e["venueName"] == "Arena"));
}

#[tokio::test]
async fn test_advance_refused_for_another_runners_order() {
    let backend = stadium();
    let mut theirs = pending_order("o1", "2026-05-01T19:00:00Z");
    theirs["runner_id"] = json!("someone");
    theirs["status"] = json!("claimed");
    backend.seed(Table::Orders, [theirs]);

    let client = signed_in_runner(&backend).await;
    let board = client.runner_board(VENUE_ID).unwrap();
    let err = board.advance("o1", OrderStatus::Claimed).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderStateChanged);
    assert_eq!(backend.row(Table::Orders, "o1").unwrap()["status"], "claimed");
    assert!(emails(&backend).is_empty());
}

#[tokio::test]
async fn test_delivered_history_and_earnings() {
    let backend = stadium();
    let client = signed_in_runner(&backend).await;
    let runner_id = client.session().user_id().unwrap();

    let delivered = |id: &str, total: f64, created: &str| {
        let mut row = pending_order(id, created);
        row["runner_id"] = json!(runner_id);
        row["status"] = json!("delivered");
        row["total"] = json!(total);
        row
    };
    let mut in_flight = delivered("o3", 50.0, "2026-05-01T19:30:00Z");
    in_flight["status"] = json!("confirmed");
    backend.seed(
        Table::Orders,
        [
            delivered("o1", 20.0, "2026-05-01T19:00:00Z"),
            delivered("o2", 10.0, "2026-05-01T19:10:00Z"),
            in_flight,
        ],
    );

    let board = client.runner_board(VENUE_ID).unwrap();
    let summary = board.delivered().await.unwrap();
    let ids: Vec<_> = summary.orders.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, ["o2", "o1"]);
    assert!((summary.total_earned - 4.5).abs() < 0.001);
}
