//! Fixtures shared by the integration tests

#![allow(dead_code)]

use rowrunner_client::backend::Table;
use rowrunner_client::{CartDraft, MemoryBackend, RowRunner};
use serde_json::{Value, json};
use shared::models::{MenuItem, Role};
use std::sync::Arc;

pub const VENUE_ID: &str = "v1";
pub const RESTAURANT_ID: &str = "r1";

pub const RUNNER_EMAIL: &str = "runner@example.com";
pub const RUNNER_PASSWORD: &str = "runfast1";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin1234";
pub const FAN_EMAIL: &str = "fan@example.com";
pub const FAN_PASSWORD: &str = "goteam99";

/// Backend with one venue, one restaurant, a small menu and three accounts
pub fn stadium() -> Arc<MemoryBackend> {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed(
        Table::Venues,
        [json!({
            "id": VENUE_ID, "name": "Arena", "city": "Philadelphia", "state": "PA",
            "latitude": 39.9012, "longitude": -75.172
        })],
    );
    backend.seed(
        Table::Restaurants,
        [json!({ "id": RESTAURANT_ID, "venue_id": VENUE_ID, "name": "Dog House" })],
    );
    backend.seed(
        Table::MenuItems,
        [
            json!({ "id": "m1", "restaurant_id": RESTAURANT_ID, "name": "Hot Dog", "price": 7.5, "section": "Mains" }),
            json!({ "id": "m2", "restaurant_id": RESTAURANT_ID, "name": "Soda", "price": 4.0, "section": "Drinks" }),
        ],
    );
    backend.add_user(RUNNER_EMAIL, RUNNER_PASSWORD, "Rae Runner", &[Role::Runner]);
    backend.add_user(ADMIN_EMAIL, ADMIN_PASSWORD, "Ada Admin", &[Role::Admin]);
    backend.add_user(FAN_EMAIL, FAN_PASSWORD, "Sam Fan", &[Role::Customer]);
    backend
}

pub fn hot_dog() -> MenuItem {
    MenuItem {
        id: "m1".into(),
        restaurant_id: RESTAURANT_ID.into(),
        name: "Hot Dog".into(),
        description: None,
        price: 7.5,
        section: Some("Mains".into()),
    }
}

/// Cart ready for checkout: two hot dogs to Sec 112, Row F, Seat 7
pub fn ready_cart() -> CartDraft {
    let mut cart = CartDraft::new();
    cart.set_venue(VENUE_ID, "Arena");
    cart.customer_name = "Sam Fan".into();
    cart.set_seat("112", "F", "7");
    cart.phone = "555-123-4567".into();
    cart.email = FAN_EMAIL.into();
    cart.add_item(&hot_dog());
    cart.add_item(&hot_dog());
    cart
}

/// Pending, unclaimed order row at the venue
pub fn pending_order(id: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "venue_id": VENUE_ID,
        "restaurant_id": RESTAURANT_ID,
        "status": "pending",
        "runner_id": null,
        "customer_name": "Sam Fan",
        "customer_email": FAN_EMAIL,
        "section": "112", "row": "F", "seat": "7",
        "total": 21.55,
        "created_at": created_at
    })
}

/// Client signed in as the seeded runner
pub async fn signed_in_runner(backend: &Arc<MemoryBackend>) -> RowRunner {
    let client = RowRunner::in_memory(backend.clone());
    client
        .auth()
        .sign_in_runner(RUNNER_EMAIL, RUNNER_PASSWORD)
        .await
        .unwrap();
    client
}

/// Email function calls with their payloads
pub fn emails(backend: &MemoryBackend) -> Vec<Value> {
    backend
        .invocations()
        .into_iter()
        .filter(|(name, _)| name == "send-order-email")
        .map(|(_, body)| body)
        .collect()
}
