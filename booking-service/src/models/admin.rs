//! Admin account model.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Dashboard administrator. The password is stored as an argon2 hash;
/// the plain text never leaves the login handler.
#[derive(Debug, Clone)]
pub struct Admin {
    pub admin_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            admin_id: Uuid::new_v4(),
            email: email.to_lowercase(),
            password_hash,
            created_at: Utc::now(),
        }
    }
}
