/// Role and ownership checks
///
/// LearnHub has a flat permission model:
///
/// 1. **Admin**: manages the catalog, events and user accounts, and may act on
///    behalf of any user.
/// 2. **Manager / Employee**: may read the catalog and act on their own
///    progress, certificates, registrations and profile.
///
/// # Example
///
/// ```
/// use learnhub_shared::auth::authorization::{require_admin, require_self_or_admin};
/// use learnhub_shared::auth::middleware::AuthContext;
/// use learnhub_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let auth = AuthContext {
///     user_id: Uuid::new_v4(),
///     email: "priya@example.com".to_string(),
///     name: "Priya".to_string(),
///     role: UserRole::Employee,
///     department: None,
/// };
///
/// assert!(require_self_or_admin(&auth, auth.user_id).is_ok());
/// assert!(require_admin(&auth).is_err());
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::user::UserRole;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller doesn't have the required role
    #[error("Insufficient permissions: requires {required:?}")]
    InsufficientRole { required: UserRole },

    /// Caller is acting on another user's resources
    #[error("Not authorized to access this resource")]
    NotAuthorized,
}

/// Requires the caller to be an admin
pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole {
            required: UserRole::Admin,
        })
    }
}

/// Requires the caller to be `user_id` or an admin
pub fn require_self_or_admin(auth: &AuthContext, user_id: Uuid) -> Result<(), AuthzError> {
    if auth.can_act_for(user_id) {
        Ok(())
    } else {
        Err(AuthzError::NotAuthorized)
    }
}

/// Resolves the user a request acts on
///
/// Requests may name a target user explicitly; when they don't, the caller
/// acts on their own behalf. Naming someone else requires admin.
pub fn resolve_target_user(auth: &AuthContext, requested: Option<Uuid>) -> Result<Uuid, AuthzError> {
    let user_id = requested.unwrap_or(auth.user_id);
    require_self_or_admin(auth, user_id)?;
    Ok(user_id)
}
