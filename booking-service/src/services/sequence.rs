//! Booking identifier allocation.
//!
//! Identifiers are `MSC` followed by six zero-padded decimal digits,
//! strictly increasing in allocation order. The counter lives in the store
//! and is bumped with the backend's atomic increment-and-fetch, so two
//! concurrent creations can never draw the same value. The insert still
//! guards against the (rare) duplicate-id race with a bounded retry that
//! re-draws the sequence each time.

use service_core::error::AppError;
use std::sync::Arc;

use crate::models::{Booking, BookingDraft};
use crate::services::store::BookingStore;

pub const BOOKING_ID_PREFIX: &str = "MSC";
pub const BOOKING_SEQ_WIDTH: usize = 6;

const INSERT_ATTEMPTS: u32 = 3;

pub fn format_booking_id(seq: i64) -> String {
    format!("{}{:0width$}", BOOKING_ID_PREFIX, seq, width = BOOKING_SEQ_WIDTH)
}

/// Numeric suffix of a well-formed booking id, `None` otherwise.
pub fn parse_booking_seq(id: &str) -> Option<i64> {
    let suffix = id.strip_prefix(BOOKING_ID_PREFIX)?;
    if suffix.len() < BOOKING_SEQ_WIDTH || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Draw the next sequence value and format it.
///
/// A non-positive value from the driver falls back to 1 rather than
/// producing a malformed id. That floor can collide with an existing
/// MSC000001; it exists only to keep a broken driver from minting garbage.
pub async fn allocate_booking_id(store: &dyn BookingStore) -> Result<String, AppError> {
    let mut seq = store.next_sequence().await?;
    if seq <= 0 {
        tracing::warn!(seq, "Sequence counter returned a non-positive value, falling back to 1");
        seq = 1;
    }
    Ok(format_booking_id(seq))
}

/// Allocate an id and persist the booking, retrying with a freshly drawn
/// sequence on a duplicate-id conflict.
pub async fn create_booking(
    store: &Arc<dyn BookingStore>,
    draft: BookingDraft,
) -> Result<Booking, AppError> {
    for attempt in 1..=INSERT_ATTEMPTS {
        let id = allocate_booking_id(store.as_ref()).await?;
        let booking = draft.clone().into_booking(id);
        match store.insert_booking(&booking).await {
            Ok(()) => return Ok(booking),
            Err(AppError::Conflict(_)) if attempt < INSERT_ATTEMPTS => {
                tracing::warn!(
                    booking_id = %booking.id,
                    attempt,
                    "Booking id collision, re-drawing sequence"
                );
            }
            Err(AppError::Conflict(err)) => {
                tracing::error!(
                    booking_id = %booking.id,
                    "Exhausted {} attempts allocating a unique booking id",
                    INSERT_ATTEMPTS
                );
                return Err(AppError::InternalError(err));
            }
            Err(e) => return Err(e),
        }
    }
    Err(AppError::InternalError(anyhow::anyhow!(
        "Booking id allocation retry loop exited unexpectedly"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Admin, BookingStatus};
    use crate::services::store::BookingPage;
    use async_trait::async_trait;

    #[test]
    fn formats_with_zero_padding() {
        assert_eq!(format_booking_id(1), "MSC000001");
        assert_eq!(format_booking_id(42), "MSC000042");
        assert_eq!(format_booking_id(999_999), "MSC999999");
        assert_eq!(format_booking_id(1_000_000), "MSC1000000");
    }

    #[test]
    fn parses_only_well_formed_ids() {
        assert_eq!(parse_booking_seq("MSC000042"), Some(42));
        assert_eq!(parse_booking_seq("MSC1000000"), Some(1_000_000));
        assert_eq!(parse_booking_seq("MSC00004"), None);
        assert_eq!(parse_booking_seq("MSC00004x"), None);
        assert_eq!(parse_booking_seq("BKG000042"), None);
        assert_eq!(parse_booking_seq(""), None);
    }

    /// Store whose counter misbehaves, for exercising the defensive floor.
    struct BrokenCounterStore(i64);

    #[async_trait]
    impl BookingStore for BrokenCounterStore {
        async fn insert_booking(&self, _booking: &Booking) -> Result<(), AppError> {
            unimplemented!()
        }
        async fn list_bookings(
            &self,
            _status: Option<BookingStatus>,
            _page: u64,
            _page_size: u64,
        ) -> Result<BookingPage, AppError> {
            unimplemented!()
        }
        async fn find_booking(&self, _id: &str) -> Result<Option<Booking>, AppError> {
            unimplemented!()
        }
        async fn update_booking_status(
            &self,
            _id: &str,
            _status: BookingStatus,
        ) -> Result<Option<Booking>, AppError> {
            unimplemented!()
        }
        async fn next_sequence(&self) -> Result<i64, AppError> {
            Ok(self.0)
        }
        async fn seed_sequence(&self, _floor: i64) -> Result<(), AppError> {
            unimplemented!()
        }
        async fn max_booking_seq(&self) -> Result<i64, AppError> {
            unimplemented!()
        }
        async fn find_admin_by_email(&self, _email: &str) -> Result<Option<Admin>, AppError> {
            unimplemented!()
        }
        async fn insert_admin(&self, _admin: &Admin) -> Result<(), AppError> {
            unimplemented!()
        }
        async fn count_admins(&self) -> Result<u64, AppError> {
            unimplemented!()
        }
        async fn health_check(&self) -> Result<(), AppError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn non_positive_sequence_falls_back_to_one() {
        let id = allocate_booking_id(&BrokenCounterStore(0)).await.expect("allocate");
        assert_eq!(id, "MSC000001");

        let id = allocate_booking_id(&BrokenCounterStore(-3)).await.expect("allocate");
        assert_eq!(id, "MSC000001");
    }

    #[tokio::test]
    async fn positive_sequence_is_used_verbatim() {
        let id = allocate_booking_id(&BrokenCounterStore(51)).await.expect("allocate");
        assert_eq!(id, "MSC000051");
    }
}
