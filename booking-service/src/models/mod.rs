pub mod admin;
pub mod booking;

pub use admin::Admin;
pub use booking::{Booking, BookingDraft, BookingStatus};
