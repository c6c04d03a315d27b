/// Request extractors
///
/// [`ApiJson`] is `axum::Json` with rejections reported through [`ApiError`],
/// so a malformed body gets the same `{"error", "code"}` envelope and a 400
/// like every other client error.
///
/// [`OptionalJson`] is for endpoints whose body may be left out entirely. An
/// empty body yields `None`; anything else must parse or the request fails.

use crate::error::ApiError;
use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::JsonRejection, FromRequest, Request},
};
use serde::de::DeserializeOwned;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Optional JSON request body
///
/// Content type is not checked: a non-empty body is always parsed as JSON.
#[derive(Debug)]
pub struct OptionalJson<T>(pub Option<T>);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJson(None));
        }

        serde_json::from_slice(&bytes)
            .map(|value| OptionalJson(Some(value)))
            .map_err(|err| ApiError::BadRequest(format!("Invalid JSON body: {}", err)))
    }
}
