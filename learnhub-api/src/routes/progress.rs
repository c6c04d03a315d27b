/// Course progress endpoints
///
/// # Endpoints
///
/// - `GET  /api/progress?userId=&courseId=` - List progress rows with course titles
/// - `POST /api/progress` - Record progress for a course
///
/// Both act on the caller unless `userId` names someone else, which requires
/// admin.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use learnhub_shared::{
    auth::{authorization::resolve_target_user, middleware::AuthContext},
    models::{
        course::Course,
        progress::{CourseProgress, ProgressStatus, ProgressWithCourse, UpsertProgress},
        user::User,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProgressQuery {
    pub user_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ProgressListResponse {
    pub progress: Vec<ProgressWithCourse>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    pub user_id: Option<Uuid>,
    pub course_id: Uuid,

    #[validate(range(min = 0, max = 100, message = "Percentage must be between 0 and 100"))]
    pub percentage: i32,

    /// Ignored when `percentage` is 100
    pub status: Option<ProgressStatus>,
}

pub async fn list_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListProgressQuery>,
) -> ApiResult<Json<ProgressListResponse>> {
    let user_id = resolve_target_user(&auth, query.user_id)?;

    let progress = CourseProgress::list_with_courses(&state.db, user_id, query.course_id).await?;
    Ok(Json(ProgressListResponse { progress }))
}

/// Record progress
///
/// # Endpoint
///
/// ```text
/// POST /api/progress
/// Authorization: Bearer <token>
///
/// { "courseId": "uuid", "percentage": 100, "status": "In Progress" }
/// ```
///
/// # Response
///
/// The stored row. A percentage of 100 is always stored as `Completed`.
///
/// # Errors
///
/// - `400 Bad Request`: Percentage outside 0-100
/// - `403 Forbidden`: Updating another user without admin
/// - `404 Not Found`: User or course does not exist
pub async fn update_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<UpdateProgressRequest>,
) -> ApiResult<Json<CourseProgress>> {
    req.validate()?;
    let user_id = resolve_target_user(&auth, req.user_id)?;

    if !User::exists(&state.db, user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    if !Course::exists(&state.db, req.course_id).await? {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    let progress = CourseProgress::upsert(
        &state.db,
        UpsertProgress {
            user_id,
            course_id: req.course_id,
            percentage: req.percentage,
            status: req.status,
        },
    )
    .await?;

    tracing::info!(
        %user_id,
        course_id = %req.course_id,
        percentage = progress.percentage,
        status = progress.status.as_str(),
        "Progress updated"
    );
    Ok(Json(progress))
}
