mod common;

use common::TestApp;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;

    let res = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("health request failed");

    assert_eq!(res.status().as_u16(), 200);

    let body: serde_json::Value = res.json().await.expect("health body");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "booking-service");
}

#[tokio::test]
async fn readiness_check_works() {
    let app = TestApp::spawn().await;

    let res = app
        .client
        .get(format!("{}/ready", app.address))
        .send()
        .await
        .expect("ready request failed");

    assert_eq!(res.status().as_u16(), 200);
}
