/// Database models for LearnHub
///
/// Each model owns its table and exposes its CRUD operations as associated
/// functions taking a `&PgPool`.
///
/// # Models
///
/// - `user`: accounts, roles and password reset state
/// - `course`: the course catalog
/// - `training_path`: ordered course groupings and derived path progress
/// - `progress`: per-user course progress with auto-completion
/// - `certificate`: completion certificates
/// - `event`: events and capacity-gated registration
///
/// # Example
///
/// ```no_run
/// use learnhub_shared::models::user::{User, UserRole, CreateUser};
/// use learnhub_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     name: "Asha Rao".to_string(),
///     email: "asha@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: UserRole::Employee,
///     department: Some("Operations".to_string()),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod certificate;
pub mod course;
pub mod event;
pub mod progress;
pub mod training_path;
pub mod user;
