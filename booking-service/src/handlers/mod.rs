pub mod admin;
pub mod bookings;
pub mod contact;
pub mod health;

pub use admin::{admin_login, get_booking, list_bookings, update_booking_status};
pub use bookings::{confirm_booking_verification, create_booking, request_booking_verification};
pub use contact::{confirm_contact_verification, request_contact_verification};
pub use health::{health_check, readiness_check};
