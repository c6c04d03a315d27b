/// Event endpoints
///
/// # Endpoints
///
/// - `GET    /api/events?upcoming=true` - List events (public)
/// - `GET    /api/events/:id` - Get an event (public)
/// - `POST   /api/events` - Create an event (admin)
/// - `POST   /api/events/:id/register` - Register (self, or any user as admin)
/// - `DELETE /api/events/:id/register` - Cancel a registration
///
/// Registration bodies are optional: `{"userId": "uuid"}` targets another
/// user, an empty body targets the caller. A body that does not parse is
/// rejected with 400.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, OptionalJson},
    routes::auth::MessageResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use learnhub_shared::{
    auth::{
        authorization::{require_admin, resolve_target_user},
        middleware::AuthContext,
    },
    models::event::{CreateEvent, Event, EventRegistration, EventSummary},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    #[serde(default)]
    pub upcoming: bool,
}

#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub events: Vec<EventSummary>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: String,

    pub starts_at: DateTime<Utc>,

    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub user_id: Option<Uuid>,
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> ApiResult<Json<EventListResponse>> {
    let events = Event::list(&state.db, query.upcoming)
        .await?
        .into_iter()
        .map(EventSummary::from)
        .collect();
    Ok(Json(EventListResponse { events }))
}

/// Get an event with its registration count and remaining seats
///
/// # Errors
///
/// - `404 Not Found`: No such event
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<EventSummary>> {
    Event::find_by_id(&state.db, id)
        .await?
        .map(|event| Json(event.into()))
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))
}

/// Create an event
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed (capacity must be positive)
/// - `403 Forbidden`: Caller is not an admin
pub async fn create_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<EventSummary>)> {
    require_admin(&auth)?;
    req.validate()?;

    let event = Event::create(
        &state.db,
        CreateEvent {
            title: req.title.trim().to_string(),
            description: req.description,
            location: req.location.trim().to_string(),
            starts_at: req.starts_at,
            capacity: req.capacity,
        },
    )
    .await?;

    tracing::info!(event_id = %event.id, capacity = event.capacity, "Event created");
    Ok((StatusCode::CREATED, Json(event.into())))
}

/// Register for an event
///
/// # Response
///
/// `201 Created` with the registration.
///
/// # Errors
///
/// - `400 Bad Request`: Already registered, or the event is full
/// - `403 Forbidden`: Registering another user without admin
/// - `404 Not Found`: Event or user does not exist
pub async fn register(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(event_id): Path<Uuid>,
    OptionalJson(body): OptionalJson<RegistrationRequest>,
) -> ApiResult<(StatusCode, Json<EventRegistration>)> {
    let req = body.unwrap_or_default();
    let user_id = resolve_target_user(&auth, req.user_id)?;

    let registration = EventRegistration::register(&state.db, event_id, user_id).await?;

    Ok((StatusCode::CREATED, Json(registration)))
}

/// Cancel a registration
///
/// # Errors
///
/// - `403 Forbidden`: Cancelling for another user without admin
/// - `404 Not Found`: The user holds no registration for this event
pub async fn cancel_registration(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(event_id): Path<Uuid>,
    OptionalJson(body): OptionalJson<RegistrationRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let req = body.unwrap_or_default();
    let user_id = resolve_target_user(&auth, req.user_id)?;

    EventRegistration::cancel(&state.db, event_id, user_id).await?;

    Ok(MessageResponse::new("Registration cancelled"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(capacity: i32) -> CreateEventRequest {
        CreateEventRequest {
            title: "Lean Manufacturing Workshop".to_string(),
            description: String::new(),
            location: "Jamshedpur".to_string(),
            starts_at: Utc::now(),
            capacity,
        }
    }

    #[test]
    fn test_capacity_must_be_positive() {
        assert!(request(1).validate().is_ok());
        assert!(request(0).validate().is_err());
        assert!(request(-5).validate().is_err());
    }

    #[test]
    fn test_registration_request_defaults_to_caller() {
        let req: RegistrationRequest = serde_json::from_str("{}").unwrap();
        assert!(req.user_id.is_none());
    }
}
