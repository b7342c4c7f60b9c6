//! Booking endpoints: the two-step verification gate and the gated create.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{Booking, BookingDraft};
use crate::services::sequence;
use crate::startup::AppState;
use service_core::error::AppError;

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookingVerifyRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub success: bool,
    pub email_sent: bool,
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(equal = 6, message = "Code must be 6 digits"))]
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(length(min = 7, max = 20, message = "Invalid phone number"))]
    pub phone: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(range(min = 1, message = "Passengers must be at least 1"))]
    pub passengers: i32,
    #[validate(length(min = 1, message = "Pickup location cannot be empty"))]
    pub pickup_location: String,
    #[validate(length(min = 1, message = "Drop location cannot be empty"))]
    pub drop_location: String,
    #[validate(custom(function = "validate_start_date"))]
    pub start_date: String,
    #[validate(custom(function = "validate_start_time"))]
    pub start_time: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub success: bool,
    pub booking: Booking,
    pub message: String,
}

fn validate_start_date(value: &str) -> Result<(), ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ValidationError::new("start_date"))
}

fn validate_start_time(value: &str) -> Result<(), ValidationError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(|_| ())
        .map_err(|_| ValidationError::new("start_time"))
}

/// Mint and email a verification code for a booking intent.
///
/// POST /bookings/verify
#[tracing::instrument(skip(state, request), fields(email = %request.email))]
pub async fn request_booking_verification(
    State(state): State<AppState>,
    Json(request): Json<BookingVerifyRequest>,
) -> Result<(StatusCode, Json<VerifyResponse>), AppError> {
    request.validate()?;

    let payload = serde_json::to_value(&request)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?;
    let code = state.ledger.request_code(&request.email, payload)?;

    let email_sent = state
        .mailer
        .send_verification_code(&request.email, &code)
        .await;

    Ok((
        StatusCode::OK,
        Json(VerifyResponse {
            success: true,
            email_sent,
            message: "Verification code sent. Please check your inbox.".to_string(),
        }),
    ))
}

/// Validate a submitted code and unlock the gated booking write.
///
/// POST /bookings/confirm
#[tracing::instrument(skip(state, request), fields(email = %request.email))]
pub async fn confirm_booking_verification(
    State(state): State<AppState>,
    Json(request): Json<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>, AppError> {
    request.validate()?;

    state.ledger.confirm_code(&request.email, &request.code)?;

    Ok(Json(ConfirmResponse {
        success: true,
        message: "Email verified. You can now submit your booking.".to_string(),
    }))
}

/// Create a booking. Requires a verified ledger entry for the submitter's
/// email; the entry is consumed on success (one-time use).
///
/// POST /bookings
#[tracing::instrument(skip(state, request), fields(email = %request.email))]
pub async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), AppError> {
    request.validate()?;

    // Gate first: no side effects for unverified submitters.
    state.ledger.take_verified(&request.email)?;

    let draft = BookingDraft {
        name: request.name,
        phone: request.phone,
        email: request.email,
        passengers: request.passengers,
        pickup_location: request.pickup_location,
        drop_location: request.drop_location,
        start_date: request.start_date,
        start_time: request.start_time,
    };

    let booking = sequence::create_booking(&state.store, draft).await?;

    tracing::info!(booking_id = %booking.id, "Booking created");

    // The booking is durably created; email failures must not fail the
    // response.
    state.mailer.send_booking_confirmation(&booking).await;
    state.mailer.send_booking_notice(&booking).await;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            success: true,
            booking,
            message: "Booking created successfully.".to_string(),
        }),
    ))
}
