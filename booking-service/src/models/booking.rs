//! Booking model - a customer's ride request with a lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Booking lifecycle status. Transitions are admin-driven; a booking is
/// always created as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Rejected,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "rejected" => Some(BookingStatus::Rejected),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted booking. `id` is the human-readable `MSC######` identifier
/// handed out by the sequence allocator; it is unique and immutable once
/// assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub passengers: i32,
    pub pickup_location: String,
    pub drop_location: String,
    pub start_date: String,
    pub start_time: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// Validated booking fields awaiting an allocated identifier.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub passengers: i32,
    pub pickup_location: String,
    pub drop_location: String,
    pub start_date: String,
    pub start_time: String,
}

impl BookingDraft {
    pub fn into_booking(self, id: String) -> Booking {
        Booking {
            id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            passengers: self.passengers,
            pickup_location: self.pickup_location,
            drop_location: self.drop_location,
            start_date: self.start_date,
            start_time: self.start_time,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Rejected,
            BookingStatus::Completed,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("cancelled"), None);
    }

    #[test]
    fn booking_serializes_with_camel_case_keys() {
        let draft = BookingDraft {
            name: "Asha".to_string(),
            phone: "+911234567890".to_string(),
            email: "asha@example.com".to_string(),
            passengers: 2,
            pickup_location: "Airport".to_string(),
            drop_location: "City Centre".to_string(),
            start_date: "2026-09-01".to_string(),
            start_time: "10:30".to_string(),
        };
        let booking = draft.into_booking("MSC000042".to_string());
        assert_eq!(booking.status, BookingStatus::Pending);

        let json = serde_json::to_value(&booking).expect("serialize booking");
        assert_eq!(json["id"], "MSC000042");
        assert_eq!(json["pickupLocation"], "Airport");
        assert_eq!(json["dropLocation"], "City Centre");
        assert_eq!(json["status"], "pending");
    }
}
