/// Course catalog entries
///
/// Courses are created by admins and then only read; progress rows,
/// certificates and training paths refer to them by ID.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE courses (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     category VARCHAR(100) NOT NULL,
///     level VARCHAR(50) NOT NULL,
///     duration_hours INTEGER NOT NULL DEFAULT 0,
///     instructor VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Catalog course
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,

    /// Free-form level label, e.g. "Beginner"
    pub level: String,

    pub duration_hours: i32,
    pub instructor: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCourse {
    pub title: String,
    pub description: String,
    pub category: String,
    pub level: String,
    pub duration_hours: i32,
    pub instructor: Option<String>,
}

/// Optional catalog filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseFilter {
    /// Exact category match
    pub category: Option<String>,

    /// Case-insensitive substring of the title
    pub search: Option<String>,
}

impl Course {
    pub async fn create(pool: &PgPool, data: CreateCourse) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (title, description, category, level, duration_hours, instructor)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, category, level, duration_hours, instructor, created_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.category)
        .bind(data.level)
        .bind(data.duration_hours)
        .bind(data.instructor)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, category, level, duration_hours, instructor, created_at
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM courses WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Lists courses, newest first, applying the optional filters
    pub async fn list(pool: &PgPool, filter: &CourseFilter) -> Result<Vec<Self>, sqlx::Error> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.replace('%', "\\%").replace('_', "\\_")));

        sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, category, level, duration_hours, instructor, created_at
            FROM courses
            WHERE ($1::TEXT IS NULL OR category = $1)
              AND ($2::TEXT IS NULL OR title ILIKE $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.category.as_deref())
        .bind(search)
        .fetch_all(pool)
        .await
    }

    /// Returns which of `ids` do not refer to an existing course
    ///
    /// Training paths validate their course list with this before writing.
    pub async fn missing_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Uuid>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM courses WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await?;

        Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_serializes_camel_case() {
        let course = Course {
            id: Uuid::new_v4(),
            title: "Blast Furnace Safety".to_string(),
            description: "Hazards and controls".to_string(),
            category: "Safety".to_string(),
            level: "Beginner".to_string(),
            duration_hours: 6,
            instructor: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&course).unwrap();
        assert_eq!(json["durationHours"], 6);
        assert_eq!(json["title"], "Blast Furnace Safety");
        assert!(json["instructor"].is_null());
    }

    #[test]
    fn test_course_filter_default() {
        let filter = CourseFilter::default();
        assert!(filter.category.is_none());
        assert!(filter.search.is_none());
    }
}
