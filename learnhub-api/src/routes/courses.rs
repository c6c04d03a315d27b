/// Course catalog endpoints
///
/// # Endpoints
///
/// - `GET  /api/courses?category=&search=` - List courses (public)
/// - `GET  /api/courses/:id` - Get a course (public)
/// - `POST /api/courses` - Create a course (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use learnhub_shared::{
    auth::{authorization::require_admin, middleware::AuthContext},
    models::course::{Course, CourseFilter, CreateCourse},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ListCoursesQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CourseListResponse {
    pub courses: Vec<Course>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[validate(length(min = 1, max = 100, message = "Category is required"))]
    pub category: String,

    #[validate(length(min = 1, max = 50, message = "Level is required"))]
    pub level: String,

    #[validate(range(min = 0, max = 1000, message = "Duration must be between 0 and 1000 hours"))]
    #[serde(default)]
    pub duration_hours: i32,

    pub instructor: Option<String>,
}

/// List courses, newest first
pub async fn list_courses(
    State(state): State<AppState>,
    Query(query): Query<ListCoursesQuery>,
) -> ApiResult<Json<CourseListResponse>> {
    let filter = CourseFilter {
        category: query.category.filter(|c| !c.trim().is_empty()),
        search: query.search,
    };

    let courses = Course::list(&state.db, &filter).await?;
    Ok(Json(CourseListResponse { courses }))
}

/// Get a course
///
/// # Errors
///
/// - `404 Not Found`: No such course
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Course>> {
    Course::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))
}

/// Create a course
///
/// # Endpoint
///
/// ```text
/// POST /api/courses
/// Authorization: Bearer <admin token>
///
/// { "title": "Blast Furnace Safety", "category": "Safety", "level": "Beginner", "durationHours": 6 }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `403 Forbidden`: Caller is not an admin
pub async fn create_course(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateCourseRequest>,
) -> ApiResult<(StatusCode, Json<Course>)> {
    require_admin(&auth)?;
    req.validate()?;

    let course = Course::create(
        &state.db,
        CreateCourse {
            title: req.title.trim().to_string(),
            description: req.description,
            category: req.category.trim().to_string(),
            level: req.level.trim().to_string(),
            duration_hours: req.duration_hours,
            instructor: req.instructor.filter(|i| !i.trim().is_empty()),
        },
    )
    .await?;

    tracing::info!(course_id = %course.id, created_by = %auth.user_id, "Course created");
    Ok((StatusCode::CREATED, Json(course)))
}
