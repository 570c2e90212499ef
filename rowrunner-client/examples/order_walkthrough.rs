//! One order from seat to delivery against the in-memory backend
//!
//! Run with `RUST_LOG=debug` to see every backend call.

use rowrunner_client::backend::Table;
use rowrunner_client::discovery::choose_event;
use rowrunner_client::{CartDraft, FixedLocation, MemoryBackend, OrderStatus, RowRunner};
use serde_json::json;
use shared::models::Role;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rowrunner_client::logger::init_logger()?;

    let backend = Arc::new(MemoryBackend::new());
    seed(&backend);

    // ========== Customer ==========
    let customer = RowRunner::in_memory(backend.clone());
    customer.auth().continue_as_guest().await?;

    let selection = customer
        .discovery(Arc::new(FixedLocation::at(39.95, -75.16)))
        .load(chrono::Utc::now())
        .await;
    let Some(event) = selection.selected_event() else {
        anyhow::bail!("no events on offer");
    };
    println!(
        "Nearest event: {} at {} ({:.1} mi)",
        event.title,
        event.venue_name,
        event.distance_miles.unwrap_or_default()
    );

    let mut cart = CartDraft::new();
    choose_event(&mut cart, event);

    let catalog = customer.catalog();
    let restaurant = catalog
        .restaurants(&event.venue_id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("venue has no restaurants"))?;
    for section in catalog.menu_sections(&restaurant.id).await? {
        for item in &section.items {
            cart.add_item(item);
        }
    }
    cart.customer_name = "Sam Fan".into();
    cart.set_seat("112", "F", "7");
    cart.phone = "5551234567".into();
    cart.email = "fan@example.com".into();

    let placed = customer.checkout().place(&mut cart).await?;
    println!(
        "Placed order {} for ${:.2}",
        placed.order_id, placed.pricing.total
    );

    let mut tracker = customer.tracker(&placed.order_id);
    tracker.start().await?;
    println!("Tracker: {} ({})", tracker.headline(), tracker.status());

    // ========== Runner ==========
    let runner = RowRunner::in_memory(backend.clone());
    runner
        .auth()
        .sign_in_runner("runner@example.com", "runfast1")
        .await?;
    let mut board = runner
        .runner_board(&event.venue_id)?
        .with_venue_name(event.venue_name.as_str());
    board.start_shift().await;

    for order in board.refresh_available().await? {
        println!("Available: {} from {}", order.seat_line(), order.restaurant_name());
    }
    let outcome = board.claim(&placed.order_id).await?;
    if let Some(notice) = outcome.notice(&placed.order_id) {
        anyhow::bail!(notice.message);
    }
    board.advance(&placed.order_id, OrderStatus::Claimed).await?;
    board.advance(&placed.order_id, OrderStatus::Confirmed).await?;

    tracker.apply_pending();
    println!("Tracker: {} (step {})", tracker.headline(), tracker.step());

    let summary = board.delivered().await?;
    println!(
        "Runner delivered {} order(s), earned ${:.2}",
        summary.orders.len(),
        summary.total_earned
    );
    tracker.apply_pending();
    println!("Tracker finished: {}", tracker.is_finished());
    println!("Emails sent: {}", backend.invocations().len());
    Ok(())
}

fn seed(backend: &MemoryBackend) {
    let now = chrono::Utc::now();
    backend.seed(
        Table::Venues,
        [json!({
            "id": "v1", "name": "Arena", "city": "Philadelphia", "state": "PA",
            "latitude": 39.9012, "longitude": -75.172
        })],
    );
    backend.seed(
        Table::Events,
        [json!({
            "id": "e1", "title": "Home Opener", "venue_id": "v1", "is_active": true,
            "starts_at": now.to_rfc3339(),
            "ends_at": (now + chrono::Duration::hours(3)).to_rfc3339()
        })],
    );
    backend.seed(
        Table::Restaurants,
        [json!({ "id": "r1", "venue_id": "v1", "name": "Dog House" })],
    );
    backend.seed(
        Table::MenuItems,
        [
            json!({ "id": "m1", "restaurant_id": "r1", "name": "Hot Dog", "price": 7.5, "section": "Mains" }),
            json!({ "id": "m2", "restaurant_id": "r1", "name": "Soda", "price": 4.0, "section": "Drinks" }),
        ],
    );
    backend.add_user("runner@example.com", "runfast1", "Rae Runner", &[Role::Runner]);
}
