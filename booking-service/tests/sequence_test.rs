mod common;

use booking_service::models::{BookingDraft, BookingStatus};
use booking_service::services::{parse_booking_seq, BookingStore, MemoryStore};
use common::TestApp;
use std::collections::HashSet;
use std::sync::Arc;

fn existing_booking(id: &str) -> booking_service::models::Booking {
    let draft = BookingDraft {
        name: "Earlier Rider".to_string(),
        phone: "+911112223334".to_string(),
        email: "earlier@example.com".to_string(),
        passengers: 1,
        pickup_location: "Old Town".to_string(),
        drop_location: "Harbour".to_string(),
        start_date: "2026-01-15".to_string(),
        start_time: "08:00".to_string(),
    };
    draft.into_booking(id.to_string())
}

#[tokio::test]
async fn ids_allocate_sequentially_from_one() {
    let app = TestApp::spawn().await;

    for expected in ["MSC000001", "MSC000002", "MSC000003"] {
        let email = format!("{}@example.com", expected.to_lowercase());
        app.verify_and_confirm(&email).await;
        let res = app.create_booking(&email).await;
        assert_eq!(res.status().as_u16(), 201);
        let body: serde_json::Value = res.json().await.expect("create body");
        assert_eq!(body["booking"]["id"], expected);
    }
}

#[tokio::test]
async fn restart_seeds_the_counter_above_existing_ids() {
    // Simulate a store left behind by an earlier process lifetime.
    let store = Arc::new(MemoryStore::new());
    store
        .insert_booking(&existing_booking("MSC000050"))
        .await
        .expect("insert pre-existing booking");
    store
        .insert_booking(&existing_booking("MSC000007"))
        .await
        .expect("insert pre-existing booking");

    let app = TestApp::spawn_with_store(store).await;

    let email = "rider@example.com";
    app.verify_and_confirm(email).await;
    let res = app.create_booking(email).await;
    assert_eq!(res.status().as_u16(), 201);

    let body: serde_json::Value = res.json().await.expect("create body");
    assert_eq!(body["booking"]["id"], "MSC000051");
}

#[tokio::test]
async fn concurrent_creations_yield_distinct_well_formed_ids() {
    let app = TestApp::spawn().await;

    let emails: Vec<String> = (0..8).map(|i| format!("rider{}@example.com", i)).collect();
    for email in &emails {
        app.verify_and_confirm(email).await;
    }

    let creations = emails.iter().map(|email| app.create_booking(email));
    let responses = futures::future::join_all(creations).await;

    let mut ids = HashSet::new();
    for res in responses {
        assert_eq!(res.status().as_u16(), 201);
        let body: serde_json::Value = res.json().await.expect("create body");
        let id = body["booking"]["id"].as_str().expect("booking id").to_string();

        let seq = parse_booking_seq(&id).expect("id matches MSC followed by digits");
        assert!(seq >= 1 && seq <= 8, "sequence {} out of range", seq);
        assert!(ids.insert(id), "duplicate booking id allocated");
    }
    assert_eq!(ids.len(), 8);

    let page = app
        .store
        .list_bookings(None, 1, 20)
        .await
        .expect("list bookings");
    assert_eq!(page.total, 8);
    assert!(page
        .bookings
        .iter()
        .all(|b| b.status == BookingStatus::Pending));
}
