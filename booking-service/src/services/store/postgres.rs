use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

use super::{BookingPage, BookingStore, COUNTER_KEY};
use crate::models::{Admin, Booking, BookingStatus};
use crate::services::sequence::parse_booking_seq;

#[derive(Debug, FromRow)]
struct BookingRow {
    id: String,
    name: String,
    phone: String,
    email: String,
    passengers: i32,
    pickup_location: String,
    drop_location: String,
    start_date: String,
    start_time: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    fn try_from(row: BookingRow) -> Result<Self, AppError> {
        let status = BookingStatus::parse(&row.status).ok_or_else(|| {
            AppError::DatabaseError(anyhow::anyhow!(
                "Booking {} has unknown status {}",
                row.id,
                row.status
            ))
        })?;
        Ok(Booking {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            passengers: row.passengers,
            pickup_location: row.pickup_location,
            drop_location: row.drop_location,
            start_date: row.start_date,
            start_time: row.start_time,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AdminRow {
    admin_id: Uuid,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<AdminRow> for Admin {
    fn from(row: AdminRow) -> Self {
        Self {
            admin_id: row.admin_id,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, AppError> {
        tracing::info!("Connecting to Postgres");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to Postgres: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(Self { pool })
    }

    /// Create tables and indexes when missing.
    pub async fn initialize(&self) -> Result<(), AppError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                phone TEXT NOT NULL,
                email TEXT NOT NULL,
                passengers INTEGER NOT NULL,
                pickup_location TEXT NOT NULL,
                drop_location TEXT NOT NULL,
                start_date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS bookings_status_idx ON bookings (status)",
            "CREATE INDEX IF NOT EXISTS bookings_created_at_idx ON bookings (created_at DESC)",
            r#"
            CREATE TABLE IF NOT EXISTS admins (
                admin_id UUID PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS counters (
                name TEXT PRIMARY KEY,
                seq BIGINT NOT NULL
            )
            "#,
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(map_db_err)?;
        }
        Ok(())
    }
}

fn map_db_err(e: sqlx::Error) -> AppError {
    AppError::DatabaseError(anyhow::anyhow!(e))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .map_or(false, |code| code == "23505")
}

#[async_trait]
impl BookingStore for PgStore {
    async fn insert_booking(&self, booking: &Booking) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO bookings
                (id, name, phone, email, passengers, pickup_location, drop_location,
                 start_date, start_time, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.name)
        .bind(&booking.phone)
        .bind(&booking.email)
        .bind(booking.passengers)
        .bind(&booking.pickup_location)
        .bind(&booking.drop_location)
        .bind(&booking.start_date)
        .bind(&booking.start_time)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(anyhow::anyhow!("Booking id {} already exists", booking.id))
            } else {
                tracing::error!("Failed to insert booking: {}", e);
                map_db_err(e)
            }
        })?;
        Ok(())
    }

    async fn list_bookings(
        &self,
        status: Option<BookingStatus>,
        page: u64,
        page_size: u64,
    ) -> Result<BookingPage, AppError> {
        let status_filter = status.map(|s| s.as_str().to_string());
        let offset = page.saturating_sub(1) * page_size;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bookings WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(&status_filter)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;

        let rows: Vec<BookingRow> = sqlx::query_as(
            r#"
            SELECT * FROM bookings
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&status_filter)
        .bind(page_size as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        let bookings = rows
            .into_iter()
            .map(Booking::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BookingPage {
            bookings,
            total: total as u64,
        })
    }

    async fn find_booking(&self, id: &str) -> Result<Option<Booking>, AppError> {
        let row: Option<BookingRow> = sqlx::query_as("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        row.map(Booking::try_from).transpose()
    }

    async fn update_booking_status(
        &self,
        id: &str,
        status: BookingStatus,
    ) -> Result<Option<Booking>, AppError> {
        let row: Option<BookingRow> =
            sqlx::query_as("UPDATE bookings SET status = $2 WHERE id = $1 RETURNING *")
                .bind(id)
                .bind(status.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_err)?;
        row.map(Booking::try_from).transpose()
    }

    async fn next_sequence(&self) -> Result<i64, AppError> {
        let row: Option<(i64,)> =
            sqlx::query_as("UPDATE counters SET seq = seq + 1 WHERE name = $1 RETURNING seq")
                .bind(COUNTER_KEY)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_err)?;

        if let Some((seq,)) = row {
            return Ok(seq);
        }

        // Lazily create the counter, then increment again. The ON CONFLICT
        // guard keeps concurrent first users from double-creating it.
        sqlx::query("INSERT INTO counters (name, seq) VALUES ($1, 0) ON CONFLICT (name) DO NOTHING")
            .bind(COUNTER_KEY)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        let (seq,): (i64,) =
            sqlx::query_as("UPDATE counters SET seq = seq + 1 WHERE name = $1 RETURNING seq")
                .bind(COUNTER_KEY)
                .fetch_one(&self.pool)
                .await
                .map_err(map_db_err)?;
        Ok(seq)
    }

    async fn seed_sequence(&self, floor: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO counters (name, seq) VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET seq = GREATEST(counters.seq, EXCLUDED.seq)
            "#,
        )
        .bind(COUNTER_KEY)
        .bind(floor)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn max_booking_seq(&self) -> Result<i64, AppError> {
        // Fixed-width zero-padded ids order lexicographically like numbers.
        let row: Option<(String,)> =
            sqlx::query_as("SELECT id FROM bookings ORDER BY id DESC LIMIT 1")
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_err)?;
        Ok(row.and_then(|(id,)| parse_booking_seq(&id)).unwrap_or(0))
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, AppError> {
        let row: Option<AdminRow> =
            sqlx::query_as("SELECT * FROM admins WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_err)?;
        Ok(row.map(Admin::from))
    }

    async fn insert_admin(&self, admin: &Admin) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO admins (admin_id, email, password_hash, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(admin.admin_id)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(admin.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(anyhow::anyhow!("Admin {} already exists", admin.email))
            } else {
                map_db_err(e)
            }
        })?;
        Ok(())
    }

    async fn count_admins(&self) -> Result<u64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(count as u64)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Postgres health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Postgres health check failed: {}", e))
            })?;
        Ok(())
    }
}
