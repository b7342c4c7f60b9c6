//! Transactional email dispatch.
//!
//! Every send is bounded by a fixed timeout and resolves to a plain bool;
//! the triggering business operation has already completed by the time an
//! email goes out, so a failed or timed-out send is logged and swallowed,
//! never propagated as the HTTP failure.

use std::sync::Arc;
use std::time::Duration;

use crate::models::Booking;
use crate::services::providers::{EmailMessage, EmailProvider};

pub const SEND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct Mailer {
    provider: Arc<dyn EmailProvider>,
    internal_recipients: Vec<String>,
}

/// Contact-form submission (not persisted; delivered by email only).
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

impl Mailer {
    pub fn new(provider: Arc<dyn EmailProvider>, internal_recipients: Vec<String>) -> Self {
        Self {
            provider,
            internal_recipients,
        }
    }

    /// Send one message, true iff the transport accepted it within
    /// `SEND_TIMEOUT`.
    pub async fn dispatch(&self, message: EmailMessage) -> bool {
        let to = message.to.clone();
        let subject = message.subject.clone();
        match tokio::time::timeout(SEND_TIMEOUT, self.provider.send(&message)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::error!(to = %to, subject = %subject, error = %e, "Failed to send email");
                false
            }
            Err(_) => {
                tracing::error!(
                    to = %to,
                    subject = %subject,
                    timeout_secs = SEND_TIMEOUT.as_secs(),
                    "Email send timed out"
                );
                false
            }
        }
    }

    /// Fan a message out to the internal distribution list, true iff every
    /// recipient was accepted.
    async fn dispatch_internal(&self, subject: &str, text: String, html: String) -> bool {
        let mut all_ok = true;
        for recipient in &self.internal_recipients {
            let ok = self
                .dispatch(EmailMessage {
                    to: recipient.clone(),
                    subject: subject.to_string(),
                    body_text: Some(text.clone()),
                    body_html: Some(html.clone()),
                    reply_to: None,
                })
                .await;
            all_ok &= ok;
        }
        all_ok
    }

    pub async fn send_verification_code(&self, to: &str, code: &str) -> bool {
        let html = format!(
            r#"<html>
                <body style="font-family: Arial, sans-serif;">
                    <h2>Your verification code</h2>
                    <p>Use this code to verify your email address:</p>
                    <p style="font-size: 28px; font-weight: bold; letter-spacing: 4px;">{code}</p>
                    <p style="color: #666; font-size: 12px;">
                        The code expires in 15 minutes. If you didn't request this, please ignore this email.
                    </p>
                </body>
            </html>"#
        );
        let text = format!(
            "Your verification code is: {code}\n\n\
            The code expires in 15 minutes. If you didn't request this, please ignore this email."
        );

        self.dispatch(EmailMessage {
            to: to.to_string(),
            subject: "Your verification code".to_string(),
            body_text: Some(text),
            body_html: Some(html),
            reply_to: None,
        })
        .await
    }

    pub async fn send_booking_confirmation(&self, booking: &Booking) -> bool {
        let html = format!(
            r#"<html>
                <body style="font-family: Arial, sans-serif;">
                    <h2>Booking received</h2>
                    <p>Dear {name},</p>
                    <p>Thank you for booking with us. Your booking reference is
                       <strong>{id}</strong>.</p>
                    <table cellpadding="4">
                        <tr><td>Pickup</td><td>{pickup}</td></tr>
                        <tr><td>Drop</td><td>{drop}</td></tr>
                        <tr><td>Date</td><td>{date} at {time}</td></tr>
                        <tr><td>Passengers</td><td>{passengers}</td></tr>
                    </table>
                    <p>We will confirm your ride shortly.</p>
                </body>
            </html>"#,
            name = booking.name,
            id = booking.id,
            pickup = booking.pickup_location,
            drop = booking.drop_location,
            date = booking.start_date,
            time = booking.start_time,
            passengers = booking.passengers,
        );
        let text = format!(
            "Dear {},\n\nThank you for booking with us. Your booking reference is {}.\n\n\
            Pickup: {}\nDrop: {}\nDate: {} at {}\nPassengers: {}\n\n\
            We will confirm your ride shortly.",
            booking.name,
            booking.id,
            booking.pickup_location,
            booking.drop_location,
            booking.start_date,
            booking.start_time,
            booking.passengers,
        );

        self.dispatch(EmailMessage {
            to: booking.email.clone(),
            subject: format!("Booking {} received", booking.id),
            body_text: Some(text),
            body_html: Some(html),
            reply_to: None,
        })
        .await
    }

    pub async fn send_booking_notice(&self, booking: &Booking) -> bool {
        let html = format!(
            r#"<html>
                <body style="font-family: Arial, sans-serif;">
                    <h2>New booking {id}</h2>
                    <table cellpadding="4">
                        <tr><td>Customer</td><td>{name}</td></tr>
                        <tr><td>Phone</td><td>{phone}</td></tr>
                        <tr><td>Email</td><td>{email}</td></tr>
                        <tr><td>Pickup</td><td>{pickup}</td></tr>
                        <tr><td>Drop</td><td>{drop}</td></tr>
                        <tr><td>Date</td><td>{date} at {time}</td></tr>
                        <tr><td>Passengers</td><td>{passengers}</td></tr>
                    </table>
                </body>
            </html>"#,
            id = booking.id,
            name = booking.name,
            phone = booking.phone,
            email = booking.email,
            pickup = booking.pickup_location,
            drop = booking.drop_location,
            date = booking.start_date,
            time = booking.start_time,
            passengers = booking.passengers,
        );
        let text = format!(
            "New booking {}\n\nCustomer: {}\nPhone: {}\nEmail: {}\n\
            Pickup: {}\nDrop: {}\nDate: {} at {}\nPassengers: {}",
            booking.id,
            booking.name,
            booking.phone,
            booking.email,
            booking.pickup_location,
            booking.drop_location,
            booking.start_date,
            booking.start_time,
            booking.passengers,
        );

        self.dispatch_internal(&format!("New booking {}", booking.id), text, html)
            .await
    }

    pub async fn send_status_update(&self, booking: &Booking) -> bool {
        let (subject, line) = match booking.status {
            crate::models::BookingStatus::Pending => (
                format!("Booking {} is pending", booking.id),
                "Your booking has been moved back to pending review.",
            ),
            crate::models::BookingStatus::Confirmed => (
                format!("Booking {} confirmed", booking.id),
                "Good news! Your booking has been confirmed. Your driver details will follow before pickup.",
            ),
            crate::models::BookingStatus::Rejected => (
                format!("Booking {} could not be accepted", booking.id),
                "We are sorry - we could not accept your booking. Please contact us to find an alternative.",
            ),
            crate::models::BookingStatus::Completed => (
                format!("Booking {} completed", booking.id),
                "Your ride is complete. Thank you for travelling with us!",
            ),
        };

        let html = format!(
            r#"<html>
                <body style="font-family: Arial, sans-serif;">
                    <h2>{subject}</h2>
                    <p>Dear {name},</p>
                    <p>{line}</p>
                    <p>Booking reference: <strong>{id}</strong><br/>
                       {pickup} → {drop}, {date} at {time}</p>
                </body>
            </html>"#,
            subject = subject,
            name = booking.name,
            line = line,
            id = booking.id,
            pickup = booking.pickup_location,
            drop = booking.drop_location,
            date = booking.start_date,
            time = booking.start_time,
        );
        let text = format!(
            "Dear {},\n\n{}\n\nBooking reference: {}\n{} to {}, {} at {}",
            booking.name,
            line,
            booking.id,
            booking.pickup_location,
            booking.drop_location,
            booking.start_date,
            booking.start_time,
        );

        self.dispatch(EmailMessage {
            to: booking.email.clone(),
            subject,
            body_text: Some(text),
            body_html: Some(html),
            reply_to: None,
        })
        .await
    }

    pub async fn send_contact_message(&self, contact: &ContactMessage) -> bool {
        let phone = contact.phone.as_deref().unwrap_or("-");
        let html = format!(
            r#"<html>
                <body style="font-family: Arial, sans-serif;">
                    <h2>Contact message from {name}</h2>
                    <p><strong>Email:</strong> {email}<br/>
                       <strong>Phone:</strong> {phone}</p>
                    <p>{message}</p>
                </body>
            </html>"#,
            name = contact.name,
            email = contact.email,
            phone = phone,
            message = contact.message,
        );
        let text = format!(
            "Contact message from {}\nEmail: {}\nPhone: {}\n\n{}",
            contact.name, contact.email, phone, contact.message,
        );

        let mut all_ok = true;
        for recipient in &self.internal_recipients {
            let ok = self
                .dispatch(EmailMessage {
                    to: recipient.clone(),
                    subject: format!("Contact message from {}", contact.name),
                    body_text: Some(text.clone()),
                    body_html: Some(html.clone()),
                    reply_to: Some(contact.email.clone()),
                })
                .await;
            all_ok &= ok;
        }
        all_ok
    }

    pub async fn send_contact_ack(&self, contact: &ContactMessage) -> bool {
        let html = format!(
            r#"<html>
                <body style="font-family: Arial, sans-serif;">
                    <h2>We received your message</h2>
                    <p>Dear {name},</p>
                    <p>Thank you for getting in touch. Our team will reply as soon as possible.</p>
                </body>
            </html>"#,
            name = contact.name,
        );
        let text = format!(
            "Dear {},\n\nThank you for getting in touch. Our team will reply as soon as possible.",
            contact.name,
        );

        self.dispatch(EmailMessage {
            to: contact.email.clone(),
            subject: "We received your message".to_string(),
            body_text: Some(text),
            body_html: Some(html),
            reply_to: None,
        })
        .await
    }
}
