/// Scheduled events and capacity-gated registration
///
/// # Schema
///
/// ```sql
/// CREATE TABLE events (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     location VARCHAR(255) NOT NULL DEFAULT '',
///     starts_at TIMESTAMPTZ NOT NULL,
///     capacity INTEGER NOT NULL CHECK (capacity > 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE event_registrations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     event_id UUID NOT NULL REFERENCES events(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     registered_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT event_registrations_event_user_key UNIQUE (event_id, user_id)
/// );
/// ```
///
/// # Capacity
///
/// [`EventRegistration::register`] locks the event row (`SELECT ... FOR UPDATE`)
/// before counting, so concurrent registrations for the same event are
/// serialized and the count can never pass `capacity`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::User;
use crate::db::unique_violation;

const EVENT_USER_CONSTRAINT: &str = "event_registrations_event_user_key";

/// Why a registration or cancellation was refused
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Event not found")]
    EventNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Already registered for this event")]
    AlreadyRegistered,

    #[error("Event is full")]
    EventFull,

    #[error("Registration not found")]
    NotRegistered,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Event with its current registration count
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub capacity: i32,
    pub registered_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Seats still available
    pub fn spots_left(&self) -> i64 {
        (i64::from(self.capacity) - self.registered_count).max(0)
    }

    pub fn is_full(&self) -> bool {
        self.spots_left() == 0
    }
}

/// Event as returned by the API, with derived seat availability
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    #[serde(flatten)]
    pub event: Event,
    pub spots_left: i64,
    pub is_full: bool,
}

impl From<Event> for EventSummary {
    fn from(event: Event) -> Self {
        Self {
            spots_left: event.spots_left(),
            is_full: event.is_full(),
            event,
        }
    }
}

/// Input for creating an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,

    /// Must be positive
    pub capacity: i32,
}

/// A user's seat at an event
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EventRegistration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub registered_at: DateTime<Utc>,
}

impl Event {
    pub async fn create(pool: &PgPool, data: CreateEvent) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (title, description, location, starts_at, capacity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, location, starts_at, capacity,
                      0::BIGINT AS registered_count, created_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.location)
        .bind(data.starts_at)
        .bind(data.capacity)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT e.id, e.title, e.description, e.location, e.starts_at, e.capacity,
                   COUNT(r.id) AS registered_count, e.created_at
            FROM events e
            LEFT JOIN event_registrations r ON r.event_id = e.id
            WHERE e.id = $1
            GROUP BY e.id
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists events by start time; `upcoming_only` hides events already started
    pub async fn list(pool: &PgPool, upcoming_only: bool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT e.id, e.title, e.description, e.location, e.starts_at, e.capacity,
                   COUNT(r.id) AS registered_count, e.created_at
            FROM events e
            LEFT JOIN event_registrations r ON r.event_id = e.id
            WHERE NOT $1 OR e.starts_at >= NOW()
            GROUP BY e.id
            ORDER BY e.starts_at ASC
            "#,
        )
        .bind(upcoming_only)
        .fetch_all(pool)
        .await
    }
}

impl EventRegistration {
    /// Registers a user for an event
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::EventNotFound`] / [`RegistrationError::UserNotFound`]
    /// - [`RegistrationError::AlreadyRegistered`] for a second registration
    /// - [`RegistrationError::EventFull`] once registrations reach capacity
    pub async fn register(
        pool: &PgPool,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Self, RegistrationError> {
        if !User::exists(pool, user_id).await? {
            return Err(RegistrationError::UserNotFound);
        }

        let mut tx = pool.begin().await?;

        let capacity: Option<i32> =
            sqlx::query_scalar("SELECT capacity FROM events WHERE id = $1 FOR UPDATE")
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await?;
        let capacity = capacity.ok_or(RegistrationError::EventNotFound)?;

        let already: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM event_registrations WHERE event_id = $1 AND user_id = $2)",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        if already {
            return Err(RegistrationError::AlreadyRegistered);
        }

        let (registered,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM event_registrations WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&mut *tx)
                .await?;
        if registered >= i64::from(capacity) {
            return Err(RegistrationError::EventFull);
        }

        let registration = sqlx::query_as::<_, EventRegistration>(
            r#"
            INSERT INTO event_registrations (event_id, user_id)
            VALUES ($1, $2)
            RETURNING id, event_id, user_id, registered_at
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            if unique_violation(&err) == Some(EVENT_USER_CONSTRAINT) {
                RegistrationError::AlreadyRegistered
            } else {
                RegistrationError::Database(err)
            }
        })?;

        tx.commit().await?;

        tracing::info!(%event_id, %user_id, seats_taken = registered + 1, capacity, "Event registration created");
        Ok(registration)
    }

    /// Cancels a registration
    ///
    /// # Errors
    ///
    /// [`RegistrationError::NotRegistered`] if the user holds no seat.
    pub async fn cancel(pool: &PgPool, event_id: Uuid, user_id: Uuid) -> Result<(), RegistrationError> {
        let result =
            sqlx::query("DELETE FROM event_registrations WHERE event_id = $1 AND user_id = $2")
                .bind(event_id)
                .bind(user_id)
                .execute(pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RegistrationError::NotRegistered);
        }

        tracing::info!(%event_id, %user_id, "Event registration cancelled");
        Ok(())
    }
}
