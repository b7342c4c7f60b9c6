use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{BookingPage, BookingStore};
use crate::models::{Admin, Booking, BookingStatus};
use crate::services::sequence::parse_booking_seq;

/// In-process store for tests. `AtomicI64::fetch_add` plays the role of the
/// durable backends' atomic increment-and-fetch, `fetch_max` the role of
/// the seed-to-at-least upsert.
#[derive(Default)]
pub struct MemoryStore {
    bookings: Mutex<HashMap<String, Booking>>,
    admins: Mutex<Vec<Admin>>,
    seq: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_booking(&self, booking: &Booking) -> Result<(), AppError> {
        let mut bookings = self.bookings.lock().unwrap_or_else(PoisonError::into_inner);
        if bookings.contains_key(&booking.id) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Booking id {} already exists",
                booking.id
            )));
        }
        bookings.insert(booking.id.clone(), booking.clone());
        Ok(())
    }

    async fn list_bookings(
        &self,
        status: Option<BookingStatus>,
        page: u64,
        page_size: u64,
    ) -> Result<BookingPage, AppError> {
        let bookings = self.bookings.lock().unwrap_or_else(PoisonError::into_inner);
        let mut matching: Vec<Booking> = bookings
            .values()
            .filter(|b| status.map_or(true, |s| b.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = matching.len() as u64;
        let offset = (page.saturating_sub(1) * page_size) as usize;
        let page_items: Vec<Booking> = matching
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();

        Ok(BookingPage {
            bookings: page_items,
            total,
        })
    }

    async fn find_booking(&self, id: &str) -> Result<Option<Booking>, AppError> {
        let bookings = self.bookings.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(bookings.get(id).cloned())
    }

    async fn update_booking_status(
        &self,
        id: &str,
        status: BookingStatus,
    ) -> Result<Option<Booking>, AppError> {
        let mut bookings = self.bookings.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(bookings.get_mut(id).map(|booking| {
            booking.status = status;
            booking.clone()
        }))
    }

    async fn next_sequence(&self) -> Result<i64, AppError> {
        Ok(self.seq.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn seed_sequence(&self, floor: i64) -> Result<(), AppError> {
        self.seq.fetch_max(floor, Ordering::SeqCst);
        Ok(())
    }

    async fn max_booking_seq(&self) -> Result<i64, AppError> {
        let bookings = self.bookings.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(bookings
            .keys()
            .filter_map(|id| parse_booking_seq(id))
            .max()
            .unwrap_or(0))
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, AppError> {
        let admins = self.admins.lock().unwrap_or_else(PoisonError::into_inner);
        let needle = email.to_lowercase();
        Ok(admins.iter().find(|a| a.email == needle).cloned())
    }

    async fn insert_admin(&self, admin: &Admin) -> Result<(), AppError> {
        let mut admins = self.admins.lock().unwrap_or_else(PoisonError::into_inner);
        if admins.iter().any(|a| a.email == admin.email) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Admin {} already exists",
                admin.email
            )));
        }
        admins.push(admin.clone());
        Ok(())
    }

    async fn count_admins(&self) -> Result<u64, AppError> {
        let admins = self.admins.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(admins.len() as u64)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
