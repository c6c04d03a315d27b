/// Training paths: ordered groupings of courses
///
/// A path only stores course IDs; progress along a path is derived on read
/// from the user's [`CourseProgress`] rows by [`PathProgress::compute`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE training_paths (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     course_ids UUID[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::progress::{CourseProgress, ProgressStatus};

/// Stored training path
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPath {
    pub id: Uuid,
    pub title: String,
    pub description: String,

    /// Courses in the order they should be taken
    pub course_ids: Vec<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a training path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTrainingPath {
    pub title: String,
    pub description: String,
    pub course_ids: Vec<Uuid>,
}

/// Partial update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTrainingPath {
    pub title: Option<String>,
    pub description: Option<String>,
    pub course_ids: Option<Vec<Uuid>>,
}

impl TrainingPath {
    pub async fn create(pool: &PgPool, data: CreateTrainingPath) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TrainingPath>(
            r#"
            INSERT INTO training_paths (title, description, course_ids)
            VALUES ($1, $2, $3)
            RETURNING id, title, description, course_ids, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.course_ids)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TrainingPath>(
            r#"
            SELECT id, title, description, course_ids, created_at, updated_at
            FROM training_paths
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// All paths, alphabetically
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TrainingPath>(
            r#"
            SELECT id, title, description, course_ids, created_at, updated_at
            FROM training_paths
            ORDER BY title ASC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Applies a partial update, returning `None` if the path does not exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTrainingPath,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TrainingPath>(
            r#"
            UPDATE training_paths
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                course_ids = COALESCE($4, course_ids),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, course_ids, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.course_ids)
        .fetch_optional(pool)
        .await
    }

    /// Returns whether a row was deleted
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM training_paths WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Where a user stands on one course of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseState {
    #[serde(rename = "Not Started")]
    NotStarted,

    #[serde(rename = "In Progress")]
    InProgress,

    #[serde(rename = "Completed")]
    Completed,
}

impl From<ProgressStatus> for CourseState {
    fn from(status: ProgressStatus) -> Self {
        match status {
            ProgressStatus::InProgress => CourseState::InProgress,
            ProgressStatus::Completed => CourseState::Completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathCourseProgress {
    pub course_id: Uuid,
    pub percentage: i32,
    pub status: CourseState,
}

/// A user's progress along a training path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathProgress {
    pub path_id: Uuid,
    pub user_id: Uuid,
    pub courses: Vec<PathCourseProgress>,

    /// Integer mean of the course percentages, 0 for an empty path
    pub percentage: i32,

    /// True once every course is completed; false for an empty path
    pub completed: bool,
}

impl PathProgress {
    /// Combines a path with the user's progress rows
    ///
    /// Rows for courses outside the path are ignored. Courses without a row
    /// count as 0% and `Not Started`.
    pub fn compute(path: &TrainingPath, user_id: Uuid, rows: &[CourseProgress]) -> Self {
        let courses: Vec<PathCourseProgress> = path
            .course_ids
            .iter()
            .map(|course_id| {
                match rows
                    .iter()
                    .find(|row| row.user_id == user_id && row.course_id == *course_id)
                {
                    Some(row) => PathCourseProgress {
                        course_id: *course_id,
                        percentage: row.percentage,
                        status: row.status.into(),
                    },
                    None => PathCourseProgress {
                        course_id: *course_id,
                        percentage: 0,
                        status: CourseState::NotStarted,
                    },
                }
            })
            .collect();

        let percentage = if courses.is_empty() {
            0
        } else {
            let total: i64 = courses.iter().map(|c| i64::from(c.percentage)).sum();
            (total / courses.len() as i64) as i32
        };

        let completed = !courses.is_empty()
            && courses.iter().all(|c| c.status == CourseState::Completed);

        Self {
            path_id: path.id,
            user_id,
            courses,
            percentage,
            completed,
        }
    }

    /// Loads the user's rows and computes progress for `path`
    pub async fn load(
        pool: &PgPool,
        path: &TrainingPath,
        user_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let rows = CourseProgress::list_by_user(pool, user_id).await?;
        Ok(Self::compute(path, user_id, &rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(course_ids: Vec<Uuid>) -> TrainingPath {
        TrainingPath {
            id: Uuid::new_v4(),
            title: "Plant Operations Foundations".to_string(),
            description: String::new(),
            course_ids,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn row(user_id: Uuid, course_id: Uuid, percentage: i32) -> CourseProgress {
        CourseProgress {
            id: Uuid::new_v4(),
            user_id,
            course_id,
            percentage,
            status: ProgressStatus::resolve(percentage, None),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_path() {
        let progress = PathProgress::compute(&path(vec![]), Uuid::new_v4(), &[]);
        assert_eq!(progress.percentage, 0);
        assert!(!progress.completed);
        assert!(progress.courses.is_empty());
    }

    #[test]
    fn test_missing_rows_are_not_started() {
        let user = Uuid::new_v4();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let progress = PathProgress::compute(
            &path(vec![a, b, c]),
            user,
            &[row(user, a, 100), row(user, b, 50)],
        );

        assert_eq!(progress.courses[0].status, CourseState::Completed);
        assert_eq!(progress.courses[1].status, CourseState::InProgress);
        assert_eq!(progress.courses[2].status, CourseState::NotStarted);
        assert_eq!(progress.courses[2].percentage, 0);
        // (100 + 50 + 0) / 3
        assert_eq!(progress.percentage, 50);
        assert!(!progress.completed);
    }

    #[test]
    fn test_mean_truncates() {
        let user = Uuid::new_v4();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let progress = PathProgress::compute(
            &path(vec![a, b, c]),
            user,
            &[row(user, a, 100), row(user, b, 100)],
        );
        assert_eq!(progress.percentage, 66);
    }

    #[test]
    fn test_all_completed() {
        let user = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let progress = PathProgress::compute(
            &path(vec![a, b]),
            user,
            &[row(user, b, 100), row(user, a, 100)],
        );
        assert_eq!(progress.percentage, 100);
        assert!(progress.completed);
    }

    #[test]
    fn test_ignores_other_users_and_courses() {
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        let a = Uuid::new_v4();

        let progress = PathProgress::compute(
            &path(vec![a]),
            user,
            &[row(other, a, 100), row(user, Uuid::new_v4(), 80)],
        );
        assert_eq!(progress.courses[0].status, CourseState::NotStarted);
        assert_eq!(progress.percentage, 0);
    }

    #[test]
    fn test_course_state_serializes_with_display_names() {
        assert_eq!(
            serde_json::to_string(&CourseState::NotStarted).unwrap(),
            "\"Not Started\""
        );
    }
}
