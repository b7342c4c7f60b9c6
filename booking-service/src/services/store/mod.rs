//! Storage capability interface for bookings, admins, and the booking
//! sequence counter.
//!
//! Two durable backends exist (MongoDB, Postgres), selected by
//! configuration at startup; neither leaks into the API layer. The
//! in-process `MemoryStore` backs the integration tests.

pub mod memory;
pub mod mongo;
pub mod postgres;

use async_trait::async_trait;
use service_core::error::AppError;

use crate::models::{Admin, Booking, BookingStatus};

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use postgres::PgStore;

/// Fixed key of the single persisted sequence counter.
pub const COUNTER_KEY: &str = "bookingSeq";

/// One page of bookings plus the unpaged total.
#[derive(Debug, Clone)]
pub struct BookingPage {
    pub bookings: Vec<Booking>,
    pub total: u64,
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert a new booking. Fails with `AppError::Conflict` when the id is
    /// already taken, so the caller can re-draw the sequence and retry.
    async fn insert_booking(&self, booking: &Booking) -> Result<(), AppError>;

    /// List bookings, newest first, optionally filtered by status.
    async fn list_bookings(
        &self,
        status: Option<BookingStatus>,
        page: u64,
        page_size: u64,
    ) -> Result<BookingPage, AppError>;

    async fn find_booking(&self, id: &str) -> Result<Option<Booking>, AppError>;

    /// Persist a new status and return the updated booking, or `None` when
    /// no booking has that id.
    async fn update_booking_status(
        &self,
        id: &str,
        status: BookingStatus,
    ) -> Result<Option<Booking>, AppError>;

    /// Atomically increment the sequence counter and return the new value.
    /// Creates the counter on first use. Never a read-then-write pair.
    async fn next_sequence(&self) -> Result<i64, AppError>;

    /// Raise the sequence counter to at least `floor`. Never lowers it, so
    /// concurrent seeders are safe.
    async fn seed_sequence(&self, floor: i64) -> Result<(), AppError>;

    /// Largest numeric suffix among persisted booking ids, 0 when none.
    async fn max_booking_seq(&self) -> Result<i64, AppError>;

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, AppError>;

    async fn insert_admin(&self, admin: &Admin) -> Result<(), AppError>;

    async fn count_admins(&self) -> Result<u64, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}
