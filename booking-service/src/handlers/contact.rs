//! Contact endpoints: the same two-step gate as bookings, but the payload
//! is a free-text message and nothing is persisted - delivery is by email
//! only.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::mailer::ContactMessage;
use crate::startup::AppState;
use service_core::error::AppError;

use super::bookings::{ConfirmResponse, VerifyResponse};

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactVerifyRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "Message cannot be empty"))]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactConfirmRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "Message cannot be empty"))]
    pub message: String,
    #[validate(length(equal = 6, message = "Code must be 6 digits"))]
    pub code: String,
}

/// Mint and email a verification code for a contact message.
///
/// POST /contact/verify
#[tracing::instrument(skip(state, request), fields(email = %request.email))]
pub async fn request_contact_verification(
    State(state): State<AppState>,
    Json(request): Json<ContactVerifyRequest>,
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

/// Validate the code, deliver the message to the internal distribution
/// list, acknowledge the sender, and consume the ledger entry.
///
/// POST /contact/confirm
#[tracing::instrument(skip(state, request), fields(email = %request.email))]
pub async fn confirm_contact_verification(
    State(state): State<AppState>,
    Json(request): Json<ContactConfirmRequest>,
) -> Result<Json<ConfirmResponse>, AppError> {
    request.validate()?;

    state.ledger.confirm_code(&request.email, &request.code)?;
    state.ledger.take_verified(&request.email)?;

    let contact = ContactMessage {
        name: request.name,
        email: request.email,
        phone: request.phone,
        message: request.message,
    };

    // Delivery is best-effort; the verification has already been consumed
    // and the caller gets a success either way.
    state.mailer.send_contact_message(&contact).await;
    state.mailer.send_contact_ack(&contact).await;

    Ok(Json(ConfirmResponse {
        success: true,
        message: "Your message has been sent. We will get back to you shortly.".to_string(),
    }))
}
