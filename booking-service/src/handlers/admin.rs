//! Admin endpoints: login, booking reads, and status transitions.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Booking, BookingStatus};
use crate::startup::AppState;
use crate::utils::password::{verify_password, Password, PasswordHashString};
use service_core::error::AppError;

#[derive(Debug, Deserialize, Validate)]
pub struct AdminLoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginResponse {
    pub success: bool,
    pub token: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingListParams {
    pub status: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingListResponse {
    pub success: bool,
    pub bookings: Vec<Booking>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub success: bool,
    pub booking: Booking,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusResponse {
    pub success: bool,
    pub booking: Booking,
    pub message: String,
}

/// Authenticate an admin and issue a session token.
///
/// POST /admin/login
#[tracing::instrument(skip(state, request), fields(email = %request.email))]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(request): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, AppError> {
    request.validate()?;

    let admin = state
        .store
        .find_admin_by_email(&request.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Invalid email or password")))?;

    verify_password(
        &Password::new(request.password),
        &PasswordHashString::new(admin.password_hash.clone()),
    )
    .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Invalid email or password")))?;

    let token = state
        .jwt
        .generate_token(&admin.admin_id.to_string(), &admin.email)
        .map_err(AppError::InternalError)?;

    tracing::info!(admin_id = %admin.admin_id, "Admin logged in");

    Ok(Json(AdminLoginResponse {
        success: true,
        token,
        expires_in: state.jwt.token_expiry_seconds(),
    }))
}

/// List bookings, newest first, optionally filtered by status.
///
/// GET /admin/bookings
#[tracing::instrument(skip(state))]
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(params): Query<BookingListParams>,
) -> Result<Json<BookingListResponse>, AppError> {
    let status = params
        .status
        .as_deref()
        .map(|s| {
            BookingStatus::parse(s)
                .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Unknown status {}", s)))
        })
        .transpose()?;

    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).clamp(1, 100);

    let result = state.store.list_bookings(status, page, page_size).await?;
    let total_pages = result.total.div_ceil(page_size);

    Ok(Json(BookingListResponse {
        success: true,
        bookings: result.bookings,
        total: result.total,
        page,
        page_size,
        total_pages,
    }))
}

/// Fetch one booking by id.
///
/// GET /admin/bookings/:id
#[tracing::instrument(skip(state))]
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state
        .store
        .find_booking(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Booking {} not found", id)))?;

    Ok(Json(BookingResponse {
        success: true,
        booking,
    }))
}

/// Move a booking to a new status and notify the customer.
///
/// PUT /admin/bookings/:id/status
#[tracing::instrument(skip(state, request))]
pub async fn update_booking_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<UpdateStatusResponse>, AppError> {
    let status = BookingStatus::parse(&request.status).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "Status must be one of pending, confirmed, rejected, completed"
        ))
    })?;

    let booking = state
        .store
        .update_booking_status(&id, status)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Booking {} not found", id)))?;

    tracing::info!(booking_id = %booking.id, status = %status, "Booking status updated");

    // Status is persisted; the notification is best-effort.
    state.mailer.send_status_update(&booking).await;

    Ok(Json(UpdateStatusResponse {
        success: true,
        booking,
        message: format!("Booking {} moved to {}", id, status),
    }))
}
