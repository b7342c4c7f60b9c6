//! Application startup and lifecycle management.

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use service_core::error::AppError;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{BookingConfig, StoreBackend};
use crate::handlers;
use crate::middleware::admin_auth_middleware;
use crate::models::Admin;
use crate::services::{
    BookingStore, EmailProvider, JwtService, Mailer, MemoryStore, MockEmailProvider, MongoStore,
    PgStore, SmtpProvider, VerificationLedger,
};
use crate::utils::password::{hash_password, Password};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: BookingConfig,
    pub store: Arc<dyn BookingStore>,
    pub ledger: Arc<VerificationLedger>,
    pub mailer: Mailer,
    pub jwt: JwtService,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration, constructing the
    /// configured store and email provider.
    pub async fn build(config: BookingConfig) -> Result<Self, AppError> {
        let store: Arc<dyn BookingStore> = match config.database.backend {
            StoreBackend::Mongodb => {
                let store = MongoStore::connect(
                    &config.database.mongodb.uri,
                    &config.database.mongodb.database,
                )
                .await?;
                store.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    e
                })?;
                Arc::new(store)
            }
            StoreBackend::Postgres => {
                let store = PgStore::connect(
                    &config.database.postgres.url,
                    config.database.postgres.max_connections,
                )
                .await?;
                store.initialize().await.map_err(|e| {
                    tracing::error!("Failed to initialize database schema: {}", e);
                    e
                })?;
                Arc::new(store)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data will not survive a restart");
                Arc::new(MemoryStore::new())
            }
        };

        let email_provider: Arc<dyn EmailProvider> = if config.smtp.enabled {
            match SmtpProvider::new(config.smtp.clone()) {
                Ok(provider) => {
                    tracing::info!("SMTP email provider initialized");
                    Arc::new(provider)
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize SMTP provider: {}. Using mock.", e);
                    Arc::new(MockEmailProvider::new(true))
                }
            }
        } else {
            tracing::info!("SMTP provider disabled, using mock email provider");
            Arc::new(MockEmailProvider::new(true))
        };

        Self::build_with(config, store, email_provider).await
    }

    /// Build the application around an already-constructed store and email
    /// provider. Tests use this to inject the memory store and the mock
    /// provider while exercising the real startup path.
    pub async fn build_with(
        config: BookingConfig,
        store: Arc<dyn BookingStore>,
        email_provider: Arc<dyn EmailProvider>,
    ) -> Result<Self, AppError> {
        // Seed the sequence counter above every persisted id so a restart
        // against a pre-populated store never re-issues an identifier.
        let max_seq = store.max_booking_seq().await?;
        store.seed_sequence(max_seq).await?;
        if max_seq > 0 {
            tracing::info!(max_seq, "Sequence counter seeded from existing bookings");
        }

        if store.count_admins().await? == 0 {
            let hash = hash_password(&Password::new(config.admin.password.clone()))
                .map_err(AppError::InternalError)?;
            let admin = Admin::new(config.admin.email.clone(), hash.into_string());
            store.insert_admin(&admin).await?;
            tracing::info!(email = %admin.email, "Provisioned default admin account");
        }

        let state = AppState {
            store: store.clone(),
            ledger: Arc::new(VerificationLedger::new()),
            mailer: Mailer::new(email_provider, config.notify.internal_recipients.clone()),
            jwt: JwtService::new(
                &config.admin.jwt_secret,
                config.admin.token_expiry_minutes,
            ),
            config: config.clone(),
        };

        let admin_routes = Router::new()
            .route("/admin/bookings", get(handlers::list_bookings))
            .route("/admin/bookings/:id", get(handlers::get_booking))
            .route(
                "/admin/bookings/:id/status",
                put(handlers::update_booking_status),
            )
            .route_layer(from_fn_with_state(state.clone(), admin_auth_middleware));

        let app = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/bookings/verify", post(handlers::request_booking_verification))
            .route("/bookings/confirm", post(handlers::confirm_booking_verification))
            .route("/bookings", post(handlers::create_booking))
            .route("/contact/verify", post(handlers::request_contact_verification))
            .route("/contact/confirm", post(handlers::confirm_contact_verification))
            .route("/admin/login", post(handlers::admin_login))
            .merge(admin_routes)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());

        // Port 0 binds a random free port, used by the test harness.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn store(&self) -> &Arc<dyn BookingStore> {
        &self.state.store
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
