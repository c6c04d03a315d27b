/// Course completion certificates
///
/// A certificate is minted once per (user, course) and only after the user's
/// progress row for that course is at 100% and `Completed`. Each certificate
/// has a public identifier of the form `CERT-<unix millis>-<4 digits>` that
/// anyone can verify.
///
/// Uniqueness is enforced by the store (`certificates_user_course_key`); the
/// read-side checks in [`Certificate::issue`] only produce friendlier errors.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE certificates (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     certificate_id VARCHAR(64) NOT NULL,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     course_id UUID NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
///     issued_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT certificates_certificate_id_key UNIQUE (certificate_id),
///     CONSTRAINT certificates_user_course_key UNIQUE (user_id, course_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use learnhub_shared::models::certificate::Certificate;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid, course_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let certificate = Certificate::issue(&pool, user_id, course_id).await?;
///
/// let details = Certificate::find_details(&pool, &certificate.certificate_id).await?;
/// assert!(details.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{course::Course, progress::CourseProgress, user::User};
use crate::db::unique_violation;

/// Prefix of every public certificate identifier
pub const CERTIFICATE_ID_PREFIX: &str = "CERT";

const USER_COURSE_CONSTRAINT: &str = "certificates_user_course_key";
const CERTIFICATE_ID_CONSTRAINT: &str = "certificates_certificate_id_key";

/// Why an issuance was refused
#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("User not found")]
    UserNotFound,

    #[error("Course not found")]
    CourseNotFound,

    #[error("Certificate already issued for this course")]
    AlreadyIssued,

    #[error("Course not completed")]
    CourseNotCompleted,

    /// Two issuances drew the same public identifier
    #[error("Certificate identifier collision, please retry")]
    IdentifierCollision,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Stored certificate
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: Uuid,

    /// Public identifier, `CERT-<millis>-<4 digits>`
    pub certificate_id: String,

    pub user_id: Uuid,
    pub course_id: Uuid,
    pub issued_at: DateTime<Utc>,
}

/// Certificate joined with the names verification and rendering need
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CertificateDetails {
    pub certificate_id: String,
    pub user_id: Uuid,
    pub user_name: String,
    pub department: Option<String>,
    pub course_id: Uuid,
    pub course_title: String,
    pub issued_at: DateTime<Utc>,
}

/// Generates a public identifier for a certificate issued at `now`
///
/// Millisecond timestamp plus a random 4-digit suffix. Collisions are possible
/// but need two issuances in the same millisecond drawing the same suffix; the
/// unique constraint turns one into [`CertificateError::IdentifierCollision`].
pub fn generate_certificate_id(now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!(
        "{}-{}-{:04}",
        CERTIFICATE_ID_PREFIX,
        now.timestamp_millis(),
        suffix
    )
}

/// Checks the `CERT-<digits>-<digits>` shape
pub fn is_certificate_id(value: &str) -> bool {
    let mut parts = value.split('-');

    matches!(
        (parts.next(), parts.next(), parts.next(), parts.next()),
        (Some(CERTIFICATE_ID_PREFIX), Some(millis), Some(suffix), None)
            if is_digits(millis) && is_digits(suffix)
    )
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

impl Certificate {
    /// Issues a certificate for a completed course
    ///
    /// # Errors
    ///
    /// - [`CertificateError::UserNotFound`] / [`CertificateError::CourseNotFound`]
    /// - [`CertificateError::AlreadyIssued`] if the pair already has one,
    ///   including when a concurrent request wins the insert
    /// - [`CertificateError::CourseNotCompleted`] unless progress is 100% and `Completed`
    pub async fn issue(
        pool: &PgPool,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Self, CertificateError> {
        if !User::exists(pool, user_id).await? {
            return Err(CertificateError::UserNotFound);
        }

        if !Course::exists(pool, course_id).await? {
            return Err(CertificateError::CourseNotFound);
        }

        if Self::find_by_user_and_course(pool, user_id, course_id)
            .await?
            .is_some()
        {
            return Err(CertificateError::AlreadyIssued);
        }

        let completed = CourseProgress::find(pool, user_id, course_id)
            .await?
            .map(|p| p.is_complete())
            .unwrap_or(false);
        if !completed {
            return Err(CertificateError::CourseNotCompleted);
        }

        let certificate_id = generate_certificate_id(Utc::now());

        let inserted = sqlx::query_as::<_, Certificate>(
            r#"
            INSERT INTO certificates (certificate_id, user_id, course_id)
            VALUES ($1, $2, $3)
            RETURNING id, certificate_id, user_id, course_id, issued_at
            "#,
        )
        .bind(&certificate_id)
        .bind(user_id)
        .bind(course_id)
        .fetch_one(pool)
        .await;

        match inserted {
            Ok(certificate) => {
                tracing::info!(
                    certificate_id = %certificate.certificate_id,
                    %user_id,
                    %course_id,
                    "Certificate issued"
                );
                Ok(certificate)
            }
            Err(err) => {
                let constraint = unique_violation(&err).map(str::to_owned);
                Err(match constraint.as_deref() {
                    Some(USER_COURSE_CONSTRAINT) => CertificateError::AlreadyIssued,
                    Some(CERTIFICATE_ID_CONSTRAINT) => CertificateError::IdentifierCollision,
                    _ => CertificateError::Database(err),
                })
            }
        }
    }

    pub async fn find_by_user_and_course(
        pool: &PgPool,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Certificate>(
            r#"
            SELECT id, certificate_id, user_id, course_id, issued_at
            FROM certificates
            WHERE user_id = $1 AND course_id = $2
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(pool)
        .await
    }

    /// Looks up a certificate by public identifier with user and course names
    pub async fn find_details(
        pool: &PgPool,
        certificate_id: &str,
    ) -> Result<Option<CertificateDetails>, sqlx::Error> {
        sqlx::query_as::<_, CertificateDetails>(
            r#"
            SELECT c.certificate_id, c.user_id, u.name AS user_name, u.department,
                   c.course_id, co.title AS course_title, c.issued_at
            FROM certificates c
            JOIN users u ON u.id = c.user_id
            JOIN courses co ON co.id = c.course_id
            WHERE c.certificate_id = $1
            "#,
        )
        .bind(certificate_id.trim())
        .fetch_optional(pool)
        .await
    }

    /// A user's certificates, newest first
    pub async fn list_details_by_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<CertificateDetails>, sqlx::Error> {
        sqlx::query_as::<_, CertificateDetails>(
            r#"
            SELECT c.certificate_id, c.user_id, u.name AS user_name, u.department,
                   c.course_id, co.title AS course_title, c.issued_at
            FROM certificates c
            JOIN users u ON u.id = c.user_id
            JOIN courses co ON co.id = c.course_id
            WHERE c.user_id = $1
            ORDER BY c.issued_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_certificate_id_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let id = generate_certificate_id(now);

        let expected_prefix = format!("CERT-{}-", now.timestamp_millis());
        assert!(id.starts_with(&expected_prefix), "unexpected id {}", id);
        assert_eq!(id.len(), expected_prefix.len() + 4);
        assert!(is_certificate_id(&id));
    }

    #[test]
    fn test_generated_ids_are_always_well_formed() {
        for _ in 0..200 {
            assert!(is_certificate_id(&generate_certificate_id(Utc::now())));
        }
    }

    #[test]
    fn test_is_certificate_id_rejects_other_shapes() {
        assert!(is_certificate_id("CERT-1700000000000-0042"));
        assert!(!is_certificate_id("CERT-1700000000000"));
        assert!(!is_certificate_id("CERT-17000x0000000-0042"));
        assert!(!is_certificate_id("cert-1700000000000-0042"));
        assert!(!is_certificate_id("CERT-1700000000000-0042-1"));
        assert!(!is_certificate_id("CERT--0042"));
        assert!(!is_certificate_id(""));
    }

    #[test]
    fn test_certificate_error_messages() {
        assert_eq!(CertificateError::CourseNotCompleted.to_string(), "Course not completed");
        assert_eq!(
            CertificateError::AlreadyIssued.to_string(),
            "Certificate already issued for this course"
        );
    }
}
