/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and validation
/// - [`jwt`]: Session token generation and validation
/// - [`reset_token`]: Time-boxed password reset tokens
/// - [`middleware`]: Bearer-token authentication and the request [`middleware::AuthContext`]
/// - [`authorization`]: Admin and ownership checks
///
/// # Example
///
/// ```no_run
/// use learnhub_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod reset_token;
