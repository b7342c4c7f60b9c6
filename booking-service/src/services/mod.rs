pub mod jwt;
pub mod mailer;
pub mod providers;
pub mod sequence;
pub mod store;
pub mod verification;

pub use jwt::{AdminClaims, JwtService};
pub use mailer::Mailer;
pub use providers::{EmailMessage, EmailProvider, MockEmailProvider, ProviderError, SmtpProvider};
pub use sequence::{create_booking, format_booking_id, parse_booking_seq};
pub use store::{BookingPage, BookingStore, MemoryStore, MongoStore, PgStore};
pub use verification::{VerificationError, VerificationLedger, VerificationRecord};
