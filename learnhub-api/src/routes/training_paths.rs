/// Training path endpoints
///
/// # Endpoints
///
/// - `GET    /api/training-paths` - List paths (public)
/// - `GET    /api/training-paths/:id` - Get a path (public)
/// - `POST   /api/training-paths` - Create (admin)
/// - `PUT    /api/training-paths/:id` - Update (admin)
/// - `DELETE /api/training-paths/:id` - Delete (admin)
/// - `GET    /api/training-paths/:id/progress?userId=` - Progress along a path (self or admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
    routes::auth::MessageResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use learnhub_shared::{
    auth::{
        authorization::{require_admin, resolve_target_user},
        middleware::AuthContext,
    },
    models::{
        course::Course,
        training_path::{CreateTrainingPath, PathProgress, TrainingPath, UpdateTrainingPath},
    },
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPathListResponse {
    pub training_paths: Vec<TrainingPath>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrainingPathRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub course_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTrainingPathRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,
    pub course_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathProgressQuery {
    pub user_id: Option<Uuid>,
}

/// Rejects duplicate or unknown course IDs
async fn check_course_ids(pool: &PgPool, course_ids: &[Uuid]) -> ApiResult<()> {
    let mut seen = std::collections::HashSet::new();
    if let Some(dup) = course_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(ApiError::invalid_field(
            "courseIds",
            format!("Course {} is listed more than once", dup),
        ));
    }

    let missing = Course::missing_ids(pool, course_ids).await?;
    if !missing.is_empty() {
        let ids: Vec<String> = missing.iter().map(Uuid::to_string).collect();
        return Err(ApiError::invalid_field(
            "courseIds",
            format!("Unknown course IDs: {}", ids.join(", ")),
        ));
    }

    Ok(())
}

async fn find_path(pool: &PgPool, id: Uuid) -> ApiResult<TrainingPath> {
    TrainingPath::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Training path not found".to_string()))
}

pub async fn list_paths(State(state): State<AppState>) -> ApiResult<Json<TrainingPathListResponse>> {
    let training_paths = TrainingPath::list(&state.db).await?;
    Ok(Json(TrainingPathListResponse { training_paths }))
}

pub async fn get_path(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TrainingPath>> {
    Ok(Json(find_path(&state.db, id).await?))
}

/// Create a training path
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or a course ID does not exist
/// - `403 Forbidden`: Caller is not an admin
pub async fn create_path(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateTrainingPathRequest>,
) -> ApiResult<(StatusCode, Json<TrainingPath>)> {
    require_admin(&auth)?;
    req.validate()?;
    check_course_ids(&state.db, &req.course_ids).await?;

    let path = TrainingPath::create(
        &state.db,
        CreateTrainingPath {
            title: req.title.trim().to_string(),
            description: req.description,
            course_ids: req.course_ids,
        },
    )
    .await?;

    tracing::info!(path_id = %path.id, courses = path.course_ids.len(), "Training path created");
    Ok((StatusCode::CREATED, Json(path)))
}

/// Update a training path
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or a course ID does not exist
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: No such path
pub async fn update_path(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateTrainingPathRequest>,
) -> ApiResult<Json<TrainingPath>> {
    require_admin(&auth)?;
    req.validate()?;

    if let Some(course_ids) = &req.course_ids {
        check_course_ids(&state.db, course_ids).await?;
    }

    let path = TrainingPath::update(
        &state.db,
        id,
        UpdateTrainingPath {
            title: req.title.map(|t| t.trim().to_string()),
            description: req.description,
            course_ids: req.course_ids,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Training path not found".to_string()))?;

    tracing::info!(path_id = %path.id, "Training path updated");
    Ok(Json(path))
}

/// Delete a training path
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: No such path
pub async fn delete_path(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    require_admin(&auth)?;

    if !TrainingPath::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Training path not found".to_string()));
    }

    tracing::info!(path_id = %id, "Training path deleted");
    Ok(MessageResponse::new("Training path deleted"))
}

/// Progress along a training path
///
/// # Response
///
/// ```json
/// {
///   "pathId": "uuid",
///   "userId": "uuid",
///   "courses": [
///     { "courseId": "uuid", "percentage": 100, "status": "Completed" },
///     { "courseId": "uuid", "percentage": 0, "status": "Not Started" }
///   ],
///   "percentage": 50,
///   "completed": false
/// }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Asking for another user without admin
/// - `404 Not Found`: No such path
pub async fn get_path_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Query(query): Query<PathProgressQuery>,
) -> ApiResult<Json<PathProgress>> {
    let user_id = resolve_target_user(&auth, query.user_id)?;
    let path = find_path(&state.db, id).await?;

    Ok(Json(PathProgress::load(&state.db, &path, user_id).await?))
}
