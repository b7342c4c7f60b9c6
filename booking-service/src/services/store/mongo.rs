use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    error::{ErrorKind, WriteFailure},
    options::{
        FindOneAndUpdateOptions, FindOneOptions, FindOptions, IndexOptions, ReturnDocument,
        UpdateOptions,
    },
    Client as MongoClient, Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

use super::{BookingPage, BookingStore, COUNTER_KEY};
use crate::models::{Admin, Booking, BookingStatus};
use crate::services::sequence::parse_booking_seq;

const BOOKINGS: &str = "bookings";
const ADMINS: &str = "admins";
const COUNTERS: &str = "counters";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    booking_id: String,
    name: String,
    phone: String,
    email: String,
    passengers: i32,
    pickup_location: String,
    drop_location: String,
    start_date: String,
    start_time: String,
    status: BookingStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

impl From<&Booking> for BookingDoc {
    fn from(booking: &Booking) -> Self {
        Self {
            id: None,
            booking_id: booking.id.clone(),
            name: booking.name.clone(),
            phone: booking.phone.clone(),
            email: booking.email.clone(),
            passengers: booking.passengers,
            pickup_location: booking.pickup_location.clone(),
            drop_location: booking.drop_location.clone(),
            start_date: booking.start_date.clone(),
            start_time: booking.start_time.clone(),
            status: booking.status,
            created_at: booking.created_at,
        }
    }
}

impl From<BookingDoc> for Booking {
    fn from(doc: BookingDoc) -> Self {
        Self {
            id: doc.booking_id,
            name: doc.name,
            phone: doc.phone,
            email: doc.email,
            passengers: doc.passengers,
            pickup_location: doc.pickup_location,
            drop_location: doc.drop_location,
            start_date: doc.start_date,
            start_time: doc.start_time,
            status: doc.status,
            created_at: doc.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AdminDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    admin_id: Uuid,
    email: String,
    password_hash: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

impl From<AdminDoc> for Admin {
    fn from(doc: AdminDoc) -> Self {
        Self {
            admin_id: doc.admin_id,
            email: doc.email,
            password_hash: doc.password_hash,
            created_at: doc.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CounterDoc {
    #[serde(rename = "_id")]
    name: String,
    seq: i64,
}

#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        let bookings = self.bookings();

        let booking_id_index = IndexModel::builder()
            .keys(doc! { "bookingId": 1 })
            .options(
                IndexOptions::builder()
                    .name("booking_id_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        bookings
            .create_index(booking_id_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create bookingId index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let status_index = IndexModel::builder()
            .keys(doc! { "status": 1 })
            .options(
                IndexOptions::builder()
                    .name("status_idx".to_string())
                    .build(),
            )
            .build();
        bookings.create_index(status_index, None).await.map_err(|e| {
            tracing::error!("Failed to create status index: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        let created_index = IndexModel::builder()
            .keys(doc! { "createdAt": -1 })
            .options(
                IndexOptions::builder()
                    .name("created_at_idx".to_string())
                    .build(),
            )
            .build();
        bookings.create_index(created_index, None).await.map_err(|e| {
            tracing::error!("Failed to create createdAt index: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        let admin_email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .name("admin_email_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.admins()
            .create_index(admin_email_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create admin email index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        Ok(())
    }

    fn bookings(&self) -> Collection<BookingDoc> {
        self.db.collection(BOOKINGS)
    }

    fn admins(&self) -> Collection<AdminDoc> {
        self.db.collection(ADMINS)
    }

    fn counters(&self) -> Collection<CounterDoc> {
        self.db.collection(COUNTERS)
    }
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == 11000
    )
}

#[async_trait]
impl BookingStore for MongoStore {
    async fn insert_booking(&self, booking: &Booking) -> Result<(), AppError> {
        self.bookings()
            .insert_one(BookingDoc::from(booking), None)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    AppError::Conflict(anyhow::anyhow!("Booking id {} already exists", booking.id))
                } else {
                    tracing::error!("Failed to insert booking: {}", e);
                    AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
                }
            })?;
        Ok(())
    }

    async fn list_bookings(
        &self,
        status: Option<BookingStatus>,
        page: u64,
        page_size: u64,
    ) -> Result<BookingPage, AppError> {
        let mut filter = doc! {};
        if let Some(status) = status {
            filter.insert("status", status.as_str());
        }

        let total = self
            .bookings()
            .count_documents(filter.clone(), None)
            .await
            .map_err(AppError::from)?;

        let find_options = FindOptions::builder()
            .sort(doc! { "createdAt": -1, "bookingId": -1 })
            .skip(page.saturating_sub(1) * page_size)
            .limit(page_size as i64)
            .build();

        let cursor = self
            .bookings()
            .find(filter, find_options)
            .await
            .map_err(AppError::from)?;

        let docs: Vec<BookingDoc> = cursor.try_collect().await.map_err(AppError::from)?;

        Ok(BookingPage {
            bookings: docs.into_iter().map(Booking::from).collect(),
            total,
        })
    }

    async fn find_booking(&self, id: &str) -> Result<Option<Booking>, AppError> {
        let doc = self
            .bookings()
            .find_one(doc! { "bookingId": id }, None)
            .await
            .map_err(AppError::from)?;
        Ok(doc.map(Booking::from))
    }

    async fn update_booking_status(
        &self,
        id: &str,
        status: BookingStatus,
    ) -> Result<Option<Booking>, AppError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let doc = self
            .bookings()
            .find_one_and_update(
                doc! { "bookingId": id },
                doc! { "$set": { "status": status.as_str() } },
                options,
            )
            .await
            .map_err(AppError::from)?;
        Ok(doc.map(Booking::from))
    }

    async fn next_sequence(&self) -> Result<i64, AppError> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let counter = self
            .counters()
            .find_one_and_update(
                doc! { "_id": COUNTER_KEY },
                doc! { "$inc": { "seq": 1i64 } },
                options,
            )
            .await
            .map_err(AppError::from)?;

        counter.map(|c| c.seq).ok_or_else(|| {
            AppError::DatabaseError(anyhow::anyhow!("Counter upsert returned no document"))
        })
    }

    async fn seed_sequence(&self, floor: i64) -> Result<(), AppError> {
        let options = UpdateOptions::builder().upsert(true).build();
        self.counters()
            .update_one(
                doc! { "_id": COUNTER_KEY },
                doc! { "$max": { "seq": floor } },
                options,
            )
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn max_booking_seq(&self) -> Result<i64, AppError> {
        // Ids are fixed-width and zero-padded, so the lexicographic maximum
        // is the numeric maximum.
        let options = FindOneOptions::builder()
            .sort(doc! { "bookingId": -1 })
            .build();
        let doc = self
            .bookings()
            .find_one(doc! {}, options)
            .await
            .map_err(AppError::from)?;
        Ok(doc
            .and_then(|d| parse_booking_seq(&d.booking_id))
            .unwrap_or(0))
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, AppError> {
        let doc = self
            .admins()
            .find_one(doc! { "email": email.to_lowercase() }, None)
            .await
            .map_err(AppError::from)?;
        Ok(doc.map(Admin::from))
    }

    async fn insert_admin(&self, admin: &Admin) -> Result<(), AppError> {
        let doc = AdminDoc {
            id: None,
            admin_id: admin.admin_id,
            email: admin.email.clone(),
            password_hash: admin.password_hash.clone(),
            created_at: admin.created_at,
        };
        self.admins().insert_one(doc, None).await.map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::Conflict(anyhow::anyhow!("Admin {} already exists", admin.email))
            } else {
                AppError::from(e)
            }
        })?;
        Ok(())
    }

    async fn count_admins(&self) -> Result<u64, AppError> {
        self.admins()
            .count_documents(doc! {}, None)
            .await
            .map_err(AppError::from)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }
}
