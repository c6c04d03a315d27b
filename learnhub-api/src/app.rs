/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use learnhub_api::{app::AppState, config::Config};
/// use learnhub_shared::mail::LogMailer;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let mailer = Arc::new(LogMailer::new(config.mail.from.clone()));
/// let state = AppState::new(pool, config, mailer);
/// let app = learnhub_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, post, put, MethodRouter},
    Router,
};
use learnhub_shared::{auth::middleware::authenticate, mail::Mailer};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Outbound mail transport
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                  public
/// └── /api/
///     ├── /auth/login, /register               public
///     ├── /auth/forgot-password, /reset-password   public
///     ├── /auth/me, /change-password, /update-profile   JWT
///     ├── /courses[/:id]                       GET public, POST admin
///     ├── /training-paths[/:id]                GET public, writes admin
///     ├── /training-paths/:id/progress         JWT
///     ├── /progress                            JWT
///     ├── /certificates                        JWT
///     ├── /certificates/verify/:certificate_id public
///     ├── /certificates/:certificate_id/download   JWT
///     ├── /events[/:id]                        GET public, POST admin
///     ├── /events/:id/register                 JWT
///     └── /users[/:id]                         JWT
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{auth, certificates, courses, events, health, progress, training_paths, users};

    // Wraps a method router so only its handlers require a valid token
    let authed = |route: MethodRouter<AppState>| {
        route.route_layer(from_fn_with_state(state.clone(), jwt_auth_layer))
    };

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route("/me", authed(get(auth::me)))
        .route("/change-password", authed(post(auth::change_password)))
        .route("/update-profile", authed(put(auth::update_profile)));

    let course_routes = Router::new()
        .route(
            "/",
            get(courses::list_courses).merge(authed(post(courses::create_course))),
        )
        .route("/:id", get(courses::get_course));

    let training_path_routes = Router::new()
        .route(
            "/",
            get(training_paths::list_paths).merge(authed(post(training_paths::create_path))),
        )
        .route(
            "/:id",
            get(training_paths::get_path).merge(authed(
                put(training_paths::update_path).delete(training_paths::delete_path),
            )),
        )
        .route("/:id/progress", authed(get(training_paths::get_path_progress)));

    let progress_routes = Router::new().route(
        "/",
        authed(get(progress::list_progress).post(progress::update_progress)),
    );

    let certificate_routes = Router::new()
        .route(
            "/",
            authed(get(certificates::list_certificates).post(certificates::issue_certificate)),
        )
        .route("/verify/:certificate_id", get(certificates::verify_certificate))
        .route(
            "/:certificate_id/download",
            authed(get(certificates::download_certificate)),
        );

    let event_routes = Router::new()
        .route(
            "/",
            get(events::list_events).merge(authed(post(events::create_event))),
        )
        .route("/:id", get(events::get_event))
        .route(
            "/:id/register",
            authed(post(events::register).delete(events::cancel_registration)),
        );

    let user_routes = Router::new()
        .route("/", authed(get(users::list_users).post(users::create_user)))
        .route(
            "/:id",
            authed(get(users::get_user).put(users::update_user).delete(users::delete_user)),
        );

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/courses", course_routes)
        .nest("/training-paths", training_path_routes)
        .nest("/progress", progress_routes)
        .nest("/certificates", certificate_routes)
        .nest("/events", event_routes)
        .nest("/users", user_routes);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// JWT authentication middleware layer
///
/// Validates the bearer token and injects an
/// [`AuthContext`](learnhub_shared::auth::middleware::AuthContext) into
/// request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(&req, state.jwt_secret())?;

    tracing::debug!(user_id = %auth_context.user_id, role = ?auth_context.role, "Authenticated request");
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
