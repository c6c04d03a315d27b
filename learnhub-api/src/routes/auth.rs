/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/login` - Login and get a session token
/// - `POST /api/auth/register` - Register new employee account
/// - `GET  /api/auth/me` - Current user's profile
/// - `POST /api/auth/change-password` - Change password
/// - `POST /api/auth/forgot-password` - Request a reset token by mail
/// - `POST /api/auth/reset-password` - Set a new password with a reset token
/// - `PUT  /api/auth/update-profile` - Update own name, email or department
///
/// Session tokens are HS256 JWTs; see `learnhub_shared::auth::jwt`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use learnhub_shared::{
    auth::{jwt, middleware::AuthContext, password, reset_token},
    mail::password_reset_email,
    models::user::{CreateUser, UpdateUser, User, UserRole},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Strength is checked separately by `password::validate_new_password`
    pub password: String,

    #[validate(length(max = 100, message = "Department must be at most 100 characters"))]
    pub department: Option<String>,
}

/// Token plus profile, returned by login and register
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Profile update; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// Empty string clears the department
    #[validate(length(max = 100, message = "Department must be at most 100 characters"))]
    pub department: Option<String>,
}

/// Plain confirmation body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

fn issue_session(state: &AppState, user: User) -> ApiResult<SessionResponse> {
    let claims = jwt::Claims::for_user(&user, state.config.token_lifetime());
    let token = jwt::create_token(&claims, state.jwt_secret())?;
    Ok(SessionResponse { token, user })
}

fn check_new_password(new_password: &str) -> ApiResult<()> {
    password::validate_new_password(new_password)
        .map_err(|message| ApiError::invalid_field("password", message))
}

/// Refuses the configured demo address on any write that sets an email
///
/// Whoever holds that address logs in without a password.
pub(crate) fn reject_demo_email(state: &AppState, email: Option<&str>) -> ApiResult<()> {
    match email {
        Some(email) if state.config.is_demo_account(email) => Err(ApiError::invalid_field(
            "email",
            "This email address is reserved",
        )),
        _ => Ok(()),
    }
}

/// Finds the demo account, creating it on first use
///
/// Returns `None` when the address belongs to anything but an employee
/// account; such accounts go through the normal password check.
async fn demo_account(state: &AppState, email: &str) -> ApiResult<Option<User>> {
    if let Some(user) = User::find_by_email(&state.db, email).await? {
        if user.role != UserRole::Employee {
            tracing::warn!(user_id = %user.id, role = user.role.as_str(), "Demo address held by a privileged account, bypass refused");
            return Ok(None);
        }
        return Ok(Some(user));
    }

    // Nobody knows this password; the account is only reachable via the bypass
    let (unusable, _) = reset_token::generate_reset_token();
    let password_hash = password::hash_password(&unusable)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: "Demo User".to_string(),
            email: email.trim().to_lowercase(),
            password_hash,
            role: UserRole::Employee,
            department: Some("Demo".to_string()),
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "Demo account created");
    Ok(Some(user))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// { "email": "user@example.com", "password": "..." }
/// ```
///
/// # Response
///
/// ```json
/// { "token": "eyJ...", "user": { "id": "uuid", "name": "...", "role": "employee", ... } }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Unknown email or wrong password
///
/// The configured demo account accepts any password, as long as it is
/// still an employee account.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    req.validate()?;

    let demo = if state.config.is_demo_account(&req.email) {
        demo_account(&state, &req.email).await?
    } else {
        None
    };

    let user = if let Some(user) = demo {
        tracing::warn!(user_id = %user.id, "Demo account login, password check bypassed");
        user
    } else {
        let user = User::find_by_email(&state.db, &req.email)
            .await?
            .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !password::verify_password(&req.password, &user.password_hash)? {
            tracing::info!(user_id = %user.id, "Login rejected: wrong password");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
        user
    };

    User::update_last_login(&state.db, user.id).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(issue_session(&state, user)?))
}

/// Register a new user
///
/// New accounts always get the `employee` role.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// { "name": "Asha Rao", "email": "asha@example.com", "password": "...", "department": "Operations" }
/// ```
///
/// # Response
///
/// `201 Created` with the same body as login.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or email already exists
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    req.validate()?;
    check_new_password(&req.password)?;
    reject_demo_email(&state, Some(&req.email))?;

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    // A concurrent registration still hits the unique index and maps to the same conflict
    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            password_hash,
            role: UserRole::Employee,
            department: req.department.filter(|d| !d.trim().is_empty()),
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(issue_session(&state, user)?)))
}

/// Current user's profile
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: The account was deleted after the token was issued
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Change password
///
/// # Errors
///
/// - `400 Bad Request`: New password too short or too long
/// - `401 Unauthorized`: Current password is wrong
/// - `403 Forbidden`: Demo account
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if state.config.is_demo_account(&auth.email) {
        return Err(ApiError::Forbidden(
            "Password cannot be changed for the demo account".to_string(),
        ));
    }

    check_new_password(&req.new_password)?;

    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !password::verify_password(&req.current_password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Current password is incorrect".to_string()));
    }

    let password_hash = password::hash_password(&req.new_password)?;
    User::set_password_hash(&state.db, user.id, &password_hash).await?;

    tracing::info!(user_id = %user.id, "Password changed");
    Ok(MessageResponse::new("Password updated successfully"))
}

/// Request a password reset
///
/// Always answers 200 so the response does not reveal whether the address
/// has an account. For known users a reset token is generated, its hash
/// stored with an expiry, and the token mailed.
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    const RESPONSE: &str = "If that email is registered, a reset link has been sent";

    let Some(user) = User::find_by_email(&state.db, &req.email).await? else {
        tracing::debug!("Password reset requested for unknown email");
        return Ok(MessageResponse::new(RESPONSE));
    };

    let (token, token_hash) = reset_token::generate_reset_token();
    let ttl = state.config.reset_token_ttl();
    let expires_at = reset_token::expires_at(Utc::now(), ttl);

    User::set_reset_token(&state.db, user.id, &token_hash, expires_at).await?;

    let email = password_reset_email(&user.email, &user.name, &token, ttl.num_minutes());
    if let Err(err) = state.mailer.send(email).await {
        // Same answer either way; the token stays valid until it expires
        tracing::error!(user_id = %user.id, error = %err, "Failed to send password reset email");
        return Ok(MessageResponse::new(RESPONSE));
    }

    tracing::info!(user_id = %user.id, %expires_at, "Password reset token issued");
    Ok(MessageResponse::new(RESPONSE))
}

/// Reset a password with a mailed token
///
/// # Errors
///
/// - `400 Bad Request`: Unknown, expired or malformed token, or weak password
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let invalid = || ApiError::BadRequest("Invalid or expired reset token".to_string());

    if !reset_token::is_well_formed(&req.token) {
        return Err(invalid());
    }

    check_new_password(&req.new_password)?;

    let token_hash = reset_token::hash_reset_token(&req.token);
    let user = User::find_by_reset_token(&state.db, &token_hash)
        .await?
        .ok_or_else(invalid)?;

    let password_hash = password::hash_password(&req.new_password)?;
    User::set_password_hash(&state.db, user.id, &password_hash).await?;

    tracing::info!(user_id = %user.id, "Password reset completed");
    Ok(MessageResponse::new("Password has been reset"))
}

/// Update own profile
///
/// Role cannot be changed here; admins use `PUT /api/users/:id`.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, nothing to update, or email taken
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;
    reject_demo_email(&state, req.email.as_deref())?;

    let update = UpdateUser {
        name: req.name.map(|n| n.trim().to_string()),
        email: req.email.map(|e| e.trim().to_lowercase()),
        role: None,
        department: req
            .department
            .map(|d| Some(d.trim().to_string()).filter(|d| !d.is_empty())),
    };

    if update.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let user = User::update(&state.db, auth.user_id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_rejects_bad_email() {
        let req = LoginRequest {
            email: "not-an-email".to_string(),
            password: "whatever".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            password: "longenough".to_string(),
            department: None,
        };
        assert!(valid.validate().is_ok());

        let empty_name = RegisterRequest {
            name: String::new(),
            ..valid
        };
        assert!(empty_name.validate().is_err());
    }

    #[test]
    fn test_short_password_is_validation_error() {
        assert!(matches!(
            check_new_password("short"),
            Err(ApiError::ValidationError(_))
        ));
        assert!(check_new_password("long enough password").is_ok());
    }

    #[test]
    fn test_change_password_request_is_camel_case() {
        let req: ChangePasswordRequest =
            serde_json::from_str(r#"{"currentPassword":"a","newPassword":"b"}"#).unwrap();
        assert_eq!(req.current_password, "a");
        assert_eq!(req.new_password, "b");
    }
}
