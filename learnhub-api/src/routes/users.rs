/// User administration endpoints
///
/// # Endpoints
///
/// - `GET    /api/users?limit=&offset=` - List users (admin)
/// - `POST   /api/users` - Create a user with any role (admin)
/// - `GET    /api/users/:id` - Get a user (self or admin)
/// - `PUT    /api/users/:id` - Update a user (self or admin; role changes admin only)
/// - `DELETE /api/users/:id` - Delete a user and everything they own (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
    routes::auth::{reject_demo_email, MessageResponse},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use learnhub_shared::{
    auth::{
        authorization::{require_admin, require_self_or_admin},
        middleware::AuthContext,
        password,
    },
    models::user::{CreateUser, UpdateUser, User, UserRole},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub total: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    #[serde(default)]
    pub role: UserRole,

    #[validate(length(max = 100, message = "Department must be at most 100 characters"))]
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub role: Option<UserRole>,

    /// Empty string clears the department
    #[validate(length(max = 100, message = "Department must be at most 100 characters"))]
    pub department: Option<String>,
}

fn page(query: &ListUsersQuery) -> (i64, i64) {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);
    (limit, offset)
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<UserListResponse>> {
    require_admin(&auth)?;

    let (limit, offset) = page(&query);
    let users = User::list(&state.db, limit, offset).await?;
    let total = User::count(&state.db).await?;

    Ok(Json(UserListResponse { users, total }))
}

/// Create a user
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or email already exists
/// - `403 Forbidden`: Caller is not an admin
pub async fn create_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    require_admin(&auth)?;
    req.validate()?;
    reject_demo_email(&state, Some(&req.email))?;
    password::validate_new_password(&req.password)
        .map_err(|message| ApiError::invalid_field("password", message))?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            password_hash,
            role: req.role,
            department: req.department.filter(|d| !d.trim().is_empty()),
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), created_by = %auth.user_id, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Get a user
///
/// # Errors
///
/// - `403 Forbidden`: Another user's record without admin
/// - `404 Not Found`: No such user
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    require_self_or_admin(&auth, id)?;

    User::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Update a user
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, nothing to update, or email taken
/// - `403 Forbidden`: Another user's record, or a role change, without admin
/// - `404 Not Found`: No such user
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    require_self_or_admin(&auth, id)?;
    req.validate()?;
    reject_demo_email(&state, req.email.as_deref())?;

    if req.role.is_some() {
        require_admin(&auth)?;
    }

    let update = UpdateUser {
        name: req.name.map(|n| n.trim().to_string()),
        email: req.email.map(|e| e.trim().to_lowercase()),
        role: req.role,
        department: req
            .department
            .map(|d| Some(d.trim().to_string()).filter(|d| !d.is_empty())),
    };

    if update.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let user = User::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, updated_by = %auth.user_id, "User updated");
    Ok(Json(user))
}

/// Delete a user
///
/// Progress, certificates and registrations are removed with the account.
///
/// # Errors
///
/// - `400 Bad Request`: Deleting yourself
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: No such user
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    require_admin(&auth)?;

    if id == auth.user_id {
        return Err(ApiError::BadRequest("You cannot delete your own account".to_string()));
    }

    if !User::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %id, deleted_by = %auth.user_id, "User deleted");
    Ok(MessageResponse::new("User deleted"))
}
