use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub database: DatabaseConfig,
    pub smtp: SmtpConfig,
    pub admin: AdminConfig,
    pub notify: NotifyConfig,
}

/// Which persistence backend serves bookings and admins. Both durable
/// backends behave identically from the caller's perspective; `Memory`
/// exists for hermetic tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongodb,
    Postgres,
    Memory,
}

impl StoreBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mongodb" => Some(StoreBackend::Mongodb),
            "postgres" => Some(StoreBackend::Postgres),
            "memory" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub mongodb: MongoConfig,
    pub postgres: PostgresConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Bootstrap credentials for the default admin provisioned at startup
    /// when the store holds no admin account.
    pub email: String,
    pub password: String,
    pub jwt_secret: String,
    pub token_expiry_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Internal distribution list for new-booking notices and contact
    /// messages.
    pub internal_recipients: Vec<String>,
}

impl BookingConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let backend_raw = get_env("DATABASE_BACKEND", Some("mongodb"), is_prod)?;
        let backend = StoreBackend::parse(&backend_raw).ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_BACKEND must be one of mongodb, postgres, memory (got {})",
                backend_raw
            ))
        })?;

        Ok(BookingConfig {
            common: common_config,
            database: DatabaseConfig {
                backend,
                mongodb: MongoConfig {
                    uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                    database: get_env("MONGODB_DATABASE", Some("booking_db"), is_prod)?,
                },
                postgres: PostgresConfig {
                    url: get_env(
                        "POSTGRES_URL",
                        Some("postgres://localhost:5432/booking_db"),
                        is_prod,
                    )?,
                    max_connections: get_env("POSTGRES_MAX_CONNECTIONS", Some("5"), is_prod)?
                        .parse()
                        .unwrap_or(5),
                },
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("smtp.gmail.com"), is_prod)?,
                port: get_env("SMTP_PORT", Some("587"), is_prod)?
                    .parse()
                    .unwrap_or(587),
                user: get_env("SMTP_USER", Some(""), is_prod)?,
                password: get_env("SMTP_PASSWORD", Some(""), is_prod)?,
                from_email: get_env("SMTP_FROM_EMAIL", Some("noreply@example.com"), is_prod)?,
                from_name: get_env("SMTP_FROM_NAME", Some("MSC Cabs"), is_prod)?,
                enabled: env::var("SMTP_ENABLED")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .unwrap_or(false),
            },
            admin: AdminConfig {
                email: get_env("ADMIN_EMAIL", Some("admin@example.com"), is_prod)?,
                password: get_env("ADMIN_PASSWORD", Some("change-me"), is_prod)?,
                jwt_secret: get_env("ADMIN_JWT_SECRET", Some("dev-only-secret"), is_prod)?,
                token_expiry_minutes: get_env("ADMIN_TOKEN_EXPIRY_MINUTES", Some("60"), is_prod)?
                    .parse()
                    .unwrap_or(60),
            },
            notify: NotifyConfig {
                internal_recipients: get_env(
                    "NOTIFY_INTERNAL_RECIPIENTS",
                    Some("office@example.com"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
