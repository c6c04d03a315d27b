/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login, registration, session profile and password management
/// - `courses`: Course catalog
/// - `training_paths`: Training paths and path progress
/// - `progress`: Per-course progress
/// - `certificates`: Issuance, verification and PDF download
/// - `events`: Events and registration
/// - `users`: User administration

pub mod auth;
pub mod certificates;
pub mod courses;
pub mod events;
pub mod health;
pub mod progress;
pub mod training_paths;
pub mod users;
