/// Certificate endpoints
///
/// # Endpoints
///
/// - `GET  /api/certificates?userId=` - List a user's certificates
/// - `POST /api/certificates` - Issue a certificate for a completed course
/// - `GET  /api/certificates/verify/:certificate_id` - Public verification
/// - `GET  /api/certificates/:certificate_id/download` - PDF (owner or admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use learnhub_shared::{
    auth::{
        authorization::{require_self_or_admin, resolve_target_user},
        middleware::AuthContext,
    },
    models::certificate::{Certificate, CertificateDetails},
    render::render_certificate_pdf,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name printed on rendered certificates
pub const PORTAL_NAME: &str = "LearnHub Learning & Development Portal";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCertificatesQuery {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CertificateListResponse {
    pub certificates: Vec<CertificateDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCertificateRequest {
    pub user_id: Option<Uuid>,
    pub course_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateDetails>,
}

pub async fn list_certificates(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListCertificatesQuery>,
) -> ApiResult<Json<CertificateListResponse>> {
    let user_id = resolve_target_user(&auth, query.user_id)?;

    let certificates = Certificate::list_details_by_user(&state.db, user_id).await?;
    Ok(Json(CertificateListResponse { certificates }))
}

/// Issue a certificate
///
/// # Endpoint
///
/// ```text
/// POST /api/certificates
/// Authorization: Bearer <token>
///
/// { "courseId": "uuid" }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// { "id": "uuid", "certificateId": "CERT-1709294400000-0042", "userId": "uuid", "courseId": "uuid", "issuedAt": "..." }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Course not completed, or certificate already issued
/// - `403 Forbidden`: Issuing for another user without admin
/// - `404 Not Found`: User or course does not exist
pub async fn issue_certificate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<IssueCertificateRequest>,
) -> ApiResult<(StatusCode, Json<Certificate>)> {
    let user_id = resolve_target_user(&auth, req.user_id)?;

    let certificate = Certificate::issue(&state.db, user_id, req.course_id).await?;

    Ok((StatusCode::CREATED, Json(certificate)))
}

/// Verify a certificate by its public identifier
///
/// Answers `200 {"valid": true, "certificate": {...}}` for a known
/// identifier and `404 {"valid": false}` otherwise.
pub async fn verify_certificate(
    State(state): State<AppState>,
    Path(certificate_id): Path<String>,
) -> ApiResult<(StatusCode, Json<VerifyResponse>)> {
    let details = Certificate::find_details(&state.db, &certificate_id).await?;

    tracing::debug!(%certificate_id, valid = details.is_some(), "Certificate verification");

    Ok(match details {
        Some(certificate) => (
            StatusCode::OK,
            Json(VerifyResponse {
                valid: true,
                certificate: Some(certificate),
            }),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(VerifyResponse {
                valid: false,
                certificate: None,
            }),
        ),
    })
}

/// Download a certificate as PDF
///
/// # Response
///
/// `application/pdf` with
/// `Content-Disposition: attachment; filename="certificate-<certificate_id>.pdf"`.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is neither the holder nor an admin
/// - `404 Not Found`: Unknown certificate
pub async fn download_certificate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(certificate_id): Path<String>,
) -> ApiResult<Response> {
    let details = Certificate::find_details(&state.db, &certificate_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Certificate not found".to_string()))?;

    require_self_or_admin(&auth, details.user_id)?;

    let pdf = render_certificate_pdf(&details, PORTAL_NAME);
    tracing::info!(certificate_id = %details.certificate_id, bytes = pdf.len(), "Certificate rendered");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&details.certificate_id)),
        ],
        pdf,
    )
        .into_response())
}

fn content_disposition(certificate_id: &str) -> String {
    // Identifiers are CERT-<digits>-<digits>; strip anything that could break the header
    let safe: String = certificate_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    format!("attachment; filename=\"certificate-{}.pdf\"", safe)
}
