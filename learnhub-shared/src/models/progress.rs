/// Per-user course progress
///
/// One row per (user, course), created on the first update and upserted on
/// every later one. The auto-completion rule lives in
/// [`ProgressStatus::resolve`]: a percentage of 100 always stores
/// `Completed`, whatever status the caller sent. The schema repeats the rule
/// as a CHECK constraint.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE course_progress (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     course_id UUID NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
///     percentage INTEGER NOT NULL CHECK (percentage BETWEEN 0 AND 100),
///     status progress_status NOT NULL DEFAULT 'In Progress',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT course_progress_user_course_key UNIQUE (user_id, course_id),
///     CONSTRAINT course_progress_completed_check CHECK (percentage < 100 OR status = 'Completed')
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Percentage at which a course counts as finished
pub const COMPLETE_PERCENTAGE: i32 = 100;

/// Progress status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "progress_status")]
pub enum ProgressStatus {
    #[sqlx(rename = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,

    #[sqlx(rename = "Completed")]
    #[serde(rename = "Completed")]
    Completed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::InProgress => "In Progress",
            ProgressStatus::Completed => "Completed",
        }
    }

    /// Status to store for an update
    ///
    /// Reaching 100% forces `Completed` even if the caller asked for something
    /// else. Below 100% the requested status wins, defaulting to `In Progress`.
    pub fn resolve(percentage: i32, requested: Option<ProgressStatus>) -> ProgressStatus {
        if percentage >= COMPLETE_PERCENTAGE {
            ProgressStatus::Completed
        } else {
            requested.unwrap_or(ProgressStatus::InProgress)
        }
    }
}

/// Stored progress row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub percentage: i32,
    pub status: ProgressStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseProgress {
    /// Whether this row satisfies certificate issuance
    pub fn is_complete(&self) -> bool {
        self.percentage == COMPLETE_PERCENTAGE && self.status == ProgressStatus::Completed
    }
}

/// Progress row joined with its course title, for listings
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProgressWithCourse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub percentage: i32,
    pub status: ProgressStatus,
    pub updated_at: DateTime<Utc>,
}

/// Input for a progress update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertProgress {
    pub user_id: Uuid,
    pub course_id: Uuid,

    /// 0-100; callers validate the range before upserting
    pub percentage: i32,

    /// Caller-supplied status; ignored when `percentage` is 100
    pub status: Option<ProgressStatus>,
}

impl CourseProgress {
    /// Inserts or updates the row for (user, course)
    ///
    /// The stored status is [`ProgressStatus::resolve`]d from the input.
    pub async fn upsert(pool: &PgPool, data: UpsertProgress) -> Result<Self, sqlx::Error> {
        let status = ProgressStatus::resolve(data.percentage, data.status);

        sqlx::query_as::<_, CourseProgress>(
            r#"
            INSERT INTO course_progress (user_id, course_id, percentage, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT ON CONSTRAINT course_progress_user_course_key
            DO UPDATE SET percentage = EXCLUDED.percentage,
                          status = EXCLUDED.status,
                          updated_at = NOW()
            RETURNING id, user_id, course_id, percentage, status, created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.course_id)
        .bind(data.percentage)
        .bind(status)
        .fetch_one(pool)
        .await
    }

    pub async fn find(
        pool: &PgPool,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CourseProgress>(
            r#"
            SELECT id, user_id, course_id, percentage, status, created_at, updated_at
            FROM course_progress
            WHERE user_id = $1 AND course_id = $2
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(pool)
        .await
    }

    /// All progress rows for a user
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CourseProgress>(
            r#"
            SELECT id, user_id, course_id, percentage, status, created_at, updated_at
            FROM course_progress
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// A user's progress with course titles, most recently updated first
    pub async fn list_with_courses(
        pool: &PgPool,
        user_id: Uuid,
        course_id: Option<Uuid>,
    ) -> Result<Vec<ProgressWithCourse>, sqlx::Error> {
        sqlx::query_as::<_, ProgressWithCourse>(
            r#"
            SELECT p.id, p.user_id, p.course_id, c.title AS course_title,
                   p.percentage, p.status, p.updated_at
            FROM course_progress p
            JOIN courses c ON c.id = p.course_id
            WHERE p.user_id = $1
              AND ($2::UUID IS NULL OR p.course_id = $2)
            ORDER BY p.updated_at DESC
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_all(pool)
        .await
    }
}
