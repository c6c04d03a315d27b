/// Middleware modules for the API server
///
/// - `security`: security response headers
///
/// Authentication is a `from_fn_with_state` layer defined in `app.rs`.

pub mod security;
