mod common;

use booking_service::services::BookingStore;
use common::{TestApp, OFFICE_EMAIL};

#[tokio::test]
async fn verified_booking_is_created_and_confirmed_by_email() {
    let app = TestApp::spawn().await;
    let email = "rider@example.com";

    app.verify_and_confirm(email).await;

    let res = app.create_booking(email).await;
    assert_eq!(res.status().as_u16(), 201);

    let body: serde_json::Value = res.json().await.expect("create body");
    assert_eq!(body["success"], true);
    let id = body["booking"]["id"].as_str().expect("booking id");
    assert_eq!(id, "MSC000001");
    assert_eq!(body["booking"]["status"], "pending");
    assert_eq!(body["booking"]["pickupLocation"], "Airport Terminal 1");

    let stored = app
        .store
        .find_booking(id)
        .await
        .expect("store lookup")
        .expect("booking persisted");
    assert_eq!(stored.email, email);

    // Verification code + customer confirmation + internal notice.
    let sent = app.mailer.sent();
    assert!(sent
        .iter()
        .any(|m| m.to == email && m.subject.contains("received")));
    assert!(sent
        .iter()
        .any(|m| m.to == OFFICE_EMAIL && m.subject.contains("New booking")));
}

#[tokio::test]
async fn create_without_verification_is_forbidden() {
    let app = TestApp::spawn().await;

    let res = app.create_booking("stranger@example.com").await;
    assert_eq!(res.status().as_u16(), 403);

    // No record was created.
    let page = app
        .store
        .list_bookings(None, 1, 10)
        .await
        .expect("list bookings");
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn consumed_verification_cannot_be_reused() {
    let app = TestApp::spawn().await;
    let email = "rider@example.com";

    app.verify_and_confirm(email).await;
    let res = app.create_booking(email).await;
    assert_eq!(res.status().as_u16(), 201);

    // The ledger entry was deleted on first use; the gate fails again.
    let res = app.create_booking(email).await;
    assert_eq!(res.status().as_u16(), 403);

    // A fresh cycle unlocks a second, distinct booking.
    app.verify_and_confirm(email).await;
    let res = app.create_booking(email).await;
    assert_eq!(res.status().as_u16(), 201);
    let body: serde_json::Value = res.json().await.expect("create body");
    assert_eq!(body["booking"]["id"], "MSC000002");
}

#[tokio::test]
async fn wrong_code_and_missing_request_are_distinct_errors() {
    let app = TestApp::spawn().await;
    let email = "rider@example.com";

    // Never requested.
    let res = app
        .client
        .post(format!("{}/bookings/confirm", app.address))
        .json(&serde_json::json!({ "email": email, "code": "123456" }))
        .send()
        .await
        .expect("confirm request failed");
    assert_eq!(res.status().as_u16(), 400);
    let body: serde_json::Value = res.json().await.expect("error body");
    let never_requested = body["error"].as_str().expect("error message").to_string();

    // Requested, but the wrong code.
    let res = app
        .client
        .post(format!("{}/bookings/verify", app.address))
        .json(&serde_json::json!({ "email": email }))
        .send()
        .await
        .expect("verify request failed");
    assert_eq!(res.status().as_u16(), 200);

    let code = app.last_code_for(email).expect("code mailed");
    let wrong = if code == "000000" { "111111" } else { "000000" };
    let res = app
        .client
        .post(format!("{}/bookings/confirm", app.address))
        .json(&serde_json::json!({ "email": email, "code": wrong }))
        .send()
        .await
        .expect("confirm request failed");
    assert_eq!(res.status().as_u16(), 400);
    let body: serde_json::Value = res.json().await.expect("error body");
    let mismatch = body["error"].as_str().expect("error message").to_string();

    assert_ne!(never_requested, mismatch);
}

#[tokio::test]
async fn sixth_code_request_is_rate_limited() {
    let app = TestApp::spawn().await;
    let email = "eager@example.com";

    for _ in 0..5 {
        let res = app
            .client
            .post(format!("{}/bookings/verify", app.address))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .expect("verify request failed");
        assert_eq!(res.status().as_u16(), 200);
    }

    let res = app
        .client
        .post(format!("{}/bookings/verify", app.address))
        .json(&serde_json::json!({ "email": email }))
        .send()
        .await
        .expect("verify request failed");
    assert_eq!(res.status().as_u16(), 429);
}

#[tokio::test]
async fn email_failure_does_not_fail_booking_creation() {
    let app = TestApp::spawn().await;
    let email = "rider@example.com";

    app.verify_and_confirm(email).await;

    // Every send fails from here on; the booking must still be created.
    app.mailer.set_failing(true);

    let res = app.create_booking(email).await;
    assert_eq!(res.status().as_u16(), 201);

    let body: serde_json::Value = res.json().await.expect("create body");
    let id = body["booking"]["id"].as_str().expect("booking id");
    assert!(app
        .store
        .find_booking(id)
        .await
        .expect("store lookup")
        .is_some());
}

#[tokio::test]
async fn invalid_booking_payload_is_rejected_before_the_gate() {
    let app = TestApp::spawn().await;
    let email = "rider@example.com";
    app.verify_and_confirm(email).await;

    let mut payload = app.booking_payload(email);
    payload["passengers"] = serde_json::json!(0);

    let res = app
        .client
        .post(format!("{}/bookings", app.address))
        .json(&payload)
        .send()
        .await
        .expect("create request failed");
    assert_eq!(res.status().as_u16(), 400);

    let mut payload = app.booking_payload(email);
    payload["startDate"] = serde_json::json!("01-09-2026");

    let res = app
        .client
        .post(format!("{}/bookings", app.address))
        .json(&payload)
        .send()
        .await
        .expect("create request failed");
    assert_eq!(res.status().as_u16(), 400);

    // Validation failed before the gate, so the verification is intact and
    // a correct payload still goes through.
    let res = app.create_booking(email).await;
    assert_eq!(res.status().as_u16(), 201);
}
