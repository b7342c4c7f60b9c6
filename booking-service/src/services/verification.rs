//! Email-verification ledger.
//!
//! A process-lifetime map from normalized email address to a pending
//! verification challenge. Entries are single-use: a gated write consumes
//! its entry, so a second write with the same email must start over with a
//! fresh verify/confirm cycle. Every check-and-mutate on an entry happens
//! under one lock acquisition; a multi-instance deployment would fragment
//! this state and needs an external TTL store instead.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use subtle::ConstantTimeEq;
use thiserror::Error;

pub const CODE_LENGTH: usize = 6;
pub const CODE_TTL_MINUTES: i64 = 15;
pub const MAX_CODE_REQUESTS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct VerificationRecord {
    pub code: String,
    pub payload: serde_json::Value,
    pub expires_at: DateTime<Utc>,
    pub attempts: u32,
    pub verified: bool,
}

impl VerificationRecord {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Too many verification requests for this email. Please try again later.")]
    RateLimited,

    #[error("No verification code was requested for this email.")]
    NotRequested,

    #[error("The verification code has expired. Please request a new one.")]
    Expired,

    #[error("The verification code is incorrect.")]
    CodeMismatch,

    #[error("This email has not completed verification.")]
    NotVerified,
}

impl From<VerificationError> for AppError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::RateLimited => AppError::TooManyRequests(
                err.to_string(),
                Some((CODE_TTL_MINUTES * 60) as u64),
            ),
            VerificationError::NotRequested
            | VerificationError::Expired
            | VerificationError::CodeMismatch => AppError::BadRequest(anyhow::anyhow!(err)),
            VerificationError::NotVerified => AppError::Forbidden(anyhow::anyhow!(err)),
        }
    }
}

#[derive(Default)]
pub struct VerificationLedger {
    entries: Mutex<HashMap<String, VerificationRecord>>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| rng.gen_range(0..10).to_string())
        .collect()
}

fn codes_match(submitted: &str, expected: &str) -> bool {
    submitted.len() == expected.len()
        && bool::from(submitted.as_bytes().ct_eq(expected.as_bytes()))
}

impl VerificationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a code for `email`, storing `payload` alongside it.
    ///
    /// An unexpired entry that has already accepted `MAX_CODE_REQUESTS`
    /// requests rejects further minting; an accepted request overwrites the
    /// entry (new code, extended expiry, `verified` reset) and bumps the
    /// accepted-request counter.
    pub fn request_code(
        &self,
        email: &str,
        payload: serde_json::Value,
    ) -> Result<String, VerificationError> {
        let key = normalize_email(email);
        let now = Utc::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let code = generate_code();
        match entries.get_mut(&key) {
            Some(record) if !record.is_expired(now) => {
                if record.attempts >= MAX_CODE_REQUESTS {
                    return Err(VerificationError::RateLimited);
                }
                record.code = code.clone();
                record.payload = payload;
                record.expires_at = now + Duration::minutes(CODE_TTL_MINUTES);
                record.attempts += 1;
                record.verified = false;
            }
            _ => {
                entries.insert(
                    key,
                    VerificationRecord {
                        code: code.clone(),
                        payload,
                        expires_at: now + Duration::minutes(CODE_TTL_MINUTES),
                        attempts: 1,
                        verified: false,
                    },
                );
            }
        }
        Ok(code)
    }

    /// Validate a submitted code and flip the entry to verified. The entry
    /// is left in place; the gated write consumes it later.
    pub fn confirm_code(&self, email: &str, code: &str) -> Result<(), VerificationError> {
        let key = normalize_email(email);
        let now = Utc::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        match entries.get_mut(&key) {
            None => Err(VerificationError::NotRequested),
            Some(record) if record.is_expired(now) => Err(VerificationError::Expired),
            Some(record) => {
                if !codes_match(code, &record.code) {
                    return Err(VerificationError::CodeMismatch);
                }
                record.verified = true;
                Ok(())
            }
        }
    }

    /// Consume the verified entry for `email`, returning it. Fails without
    /// side effects when no entry exists, the entry is unexpired but not
    /// yet verified, or it has expired.
    pub fn take_verified(&self, email: &str) -> Result<VerificationRecord, VerificationError> {
        let key = normalize_email(email);
        let now = Utc::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        match entries.remove(&key) {
            Some(record) if record.verified && !record.is_expired(now) => Ok(record),
            Some(record) => {
                // Not consumable; put it back untouched.
                entries.insert(key, record);
                Err(VerificationError::NotVerified)
            }
            None => Err(VerificationError::NotVerified),
        }
    }
}
