use booking_service::config::{
    AdminConfig, BookingConfig, DatabaseConfig, MongoConfig, NotifyConfig, PostgresConfig,
    SmtpConfig, StoreBackend,
};
use booking_service::services::{MemoryStore, MockEmailProvider};
use booking_service::startup::Application;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;

pub const ADMIN_EMAIL: &str = "admin@test.local";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const OFFICE_EMAIL: &str = "office@test.local";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<MockEmailProvider>,
}

fn test_config() -> BookingConfig {
    BookingConfig {
        common: CoreConfig { port: 0 },
        database: DatabaseConfig {
            backend: StoreBackend::Memory,
            mongodb: MongoConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: "booking_test".to_string(),
            },
            postgres: PostgresConfig {
                url: "postgres://localhost:5432/booking_test".to_string(),
                max_connections: 2,
            },
        },
        smtp: SmtpConfig {
            host: "smtp.test.local".to_string(),
            port: 587,
            user: "test".to_string(),
            password: "test".to_string(),
            from_email: "noreply@test.local".to_string(),
            from_name: "Test Service".to_string(),
            enabled: false, // Use mock
        },
        admin: AdminConfig {
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
            jwt_secret: "test-secret".to_string(),
            token_expiry_minutes: 60,
        },
        notify: NotifyConfig {
            internal_recipients: vec![OFFICE_EMAIL.to_string()],
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_store(Arc::new(MemoryStore::new())).await
    }

    /// Spawn against a pre-populated store, e.g. to simulate a restart over
    /// existing bookings.
    pub async fn spawn_with_store(store: Arc<MemoryStore>) -> Self {
        let mailer = Arc::new(MockEmailProvider::new(true));

        let app = Application::build_with(test_config(), store.clone(), mailer.clone())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
            store,
            mailer,
        }
    }

    /// Most recent verification code mailed to `email`.
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.mailer
            .sent()
            .into_iter()
            .rev()
            .find(|m| m.to == email && m.subject.contains("verification code"))
            .and_then(|m| m.body_text.as_deref().and_then(extract_code))
    }

    /// Run the verify/confirm cycle for a booking intent.
    pub async fn verify_and_confirm(&self, email: &str) {
        let res = self
            .client
            .post(format!("{}/bookings/verify", self.address))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .expect("verify request failed");
        assert_eq!(res.status().as_u16(), 200, "verify should succeed");

        let code = self.last_code_for(email).expect("no code was mailed");

        let res = self
            .client
            .post(format!("{}/bookings/confirm", self.address))
            .json(&serde_json::json!({ "email": email, "code": code }))
            .send()
            .await
            .expect("confirm request failed");
        assert_eq!(res.status().as_u16(), 200, "confirm should succeed");
    }

    pub fn booking_payload(&self, email: &str) -> serde_json::Value {
        serde_json::json!({
            "name": "Asha Kumar",
            "phone": "+911234567890",
            "email": email,
            "passengers": 2,
            "pickupLocation": "Airport Terminal 1",
            "dropLocation": "City Centre",
            "startDate": "2026-09-01",
            "startTime": "10:30"
        })
    }

    pub async fn create_booking(&self, email: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/bookings", self.address))
            .json(&self.booking_payload(email))
            .send()
            .await
            .expect("create request failed")
    }

    pub async fn admin_token(&self) -> String {
        let res = self
            .client
            .post(format!("{}/admin/login", self.address))
            .json(&serde_json::json!({
                "email": ADMIN_EMAIL,
                "password": ADMIN_PASSWORD
            }))
            .send()
            .await
            .expect("login request failed");
        assert_eq!(res.status().as_u16(), 200, "login should succeed");

        let body: serde_json::Value = res.json().await.expect("login response body");
        body["token"].as_str().expect("token in response").to_string()
    }
}

/// First run of six consecutive ASCII digits in `text`.
pub fn extract_code(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut run_start = 0;
    let mut run_len = 0;
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            if run_len == 0 {
                run_start = i;
            }
            run_len += 1;
            if run_len == 6 {
                return Some(text[run_start..=i].to_string());
            }
        } else {
            run_len = 0;
        }
    }
    None
}
