//! Common test utilities for integration tests
//!
//! Tests run against the PostgreSQL database named by `DATABASE_URL`
//! (loaded from `.env` when present). Every test creates its own users,
//! courses and events with unique names, and removes them in `cleanup`.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use learnhub_api::app::{build_router, AppState};
use learnhub_api::config::Config;
use learnhub_shared::auth::jwt::{create_token, Claims};
use learnhub_shared::auth::password::hash_password;
use learnhub_shared::mail::MemoryMailer;
use learnhub_shared::models::course::{Course, CreateCourse};
use learnhub_shared::models::event::{CreateEvent, Event};
use learnhub_shared::models::user::{CreateUser, User, UserRole};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

/// Password given to every user created by [`TestContext::create_user`]
pub const TEST_PASSWORD: &str = "correct horse battery";

const FALLBACK_JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub mailer: Arc<MemoryMailer>,

    /// Regular employee
    pub user: User,
    pub user_token: String,

    /// Admin account
    pub admin: User,
    pub admin_token: String,

    created_users: Mutex<Vec<Uuid>>,
    created_courses: Mutex<Vec<Uuid>>,
    created_events: Mutex<Vec<Uuid>>,
}

/// Response status with the decoded JSON body (`Null` for empty or non-JSON bodies)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
    pub bytes: Vec<u8>,
}

impl TestContext {
    /// Connects, migrates and seeds an employee and an admin
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        if std::env::var("JWT_SECRET").is_err() {
            std::env::set_var("JWT_SECRET", FALLBACK_JWT_SECRET);
        }

        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Path relative to Cargo.toml, not this file
        sqlx::migrate!("../migrations").run(&db).await?;

        let mailer = Arc::new(MemoryMailer::new());
        let state = AppState::new(db.clone(), config.clone(), mailer.clone());
        let app = build_router(state);

        let user = insert_user(&db, UserRole::Employee).await?;
        let admin = insert_user(&db, UserRole::Admin).await?;
        let user_token = token_for(&config, &user)?;
        let admin_token = token_for(&config, &admin)?;

        Ok(TestContext {
            created_users: Mutex::new(vec![user.id, admin.id]),
            created_courses: Mutex::new(Vec::new()),
            created_events: Mutex::new(Vec::new()),
            db,
            app,
            config,
            mailer,
            user,
            user_token,
            admin,
            admin_token,
        })
    }

    /// Creates another user with [`TEST_PASSWORD`], returning it with a session token
    pub async fn create_user(&self, role: UserRole) -> anyhow::Result<(User, String)> {
        let user = insert_user(&self.db, role).await?;
        let token = token_for(&self.config, &user)?;
        self.track_user(user.id);
        Ok((user, token))
    }

    /// Registers a user created through the API for cleanup
    pub fn track_user(&self, id: Uuid) {
        if let Ok(mut users) = self.created_users.lock() {
            users.push(id);
        }
    }

    pub async fn create_course(&self, title: &str) -> anyhow::Result<Course> {
        let course = Course::create(
            &self.db,
            CreateCourse {
                title: format!("{} {}", title, Uuid::new_v4()),
                description: "Integration test course".to_string(),
                category: "Safety".to_string(),
                level: "Beginner".to_string(),
                duration_hours: 4,
                instructor: None,
            },
        )
        .await?;

        if let Ok(mut courses) = self.created_courses.lock() {
            courses.push(course.id);
        }
        Ok(course)
    }

    pub async fn create_event(&self, capacity: i32) -> anyhow::Result<Event> {
        let event = Event::create(
            &self.db,
            CreateEvent {
                title: format!("Workshop {}", Uuid::new_v4()),
                description: String::new(),
                location: "Training Centre".to_string(),
                starts_at: chrono::Utc::now() + chrono::Duration::days(7),
                capacity,
            },
        )
        .await?;

        if let Ok(mut events) = self.created_events.lock() {
            events.push(event.id);
        }
        Ok(event)
    }

    /// Sends a request through the router
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        match body {
            Some(json) => {
                self.send_raw(&self.app, method, uri, token, Some("application/json"), json.to_string())
                    .await
            }
            None => self.send_raw(&self.app, method, uri, token, None, String::new()).await,
        }
    }

    /// Sends `body` verbatim through `app`, with an optional content type
    pub async fn send_raw(
        &self,
        app: &axum::Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        content_type: Option<&str>,
        body: String,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }

        let request = builder.body(Body::from(body)).unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            bytes,
        }
    }

    /// Router sharing this database but treating `email` as the demo account
    pub fn app_with_demo_account(&self, email: &str) -> axum::Router {
        let mut config = self.config.clone();
        config.auth.demo_account_email = Some(email.to_lowercase());
        build_router(AppState::new(self.db.clone(), config, self.mailer.clone()))
    }

    /// Inserts a user with a chosen email and [`TEST_PASSWORD`]
    pub async fn create_user_with_email(&self, role: UserRole, email: &str) -> anyhow::Result<User> {
        let user = User::create(
            &self.db,
            CreateUser {
                name: format!("Test {}", role.as_str()),
                email: email.to_string(),
                password_hash: hash_password(TEST_PASSWORD)?,
                role,
                department: None,
            },
        )
        .await?;
        self.track_user(user.id);
        Ok(user)
    }

    /// Removes everything this context created
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        let users = self.created_users.lock().map(|v| v.clone()).unwrap_or_default();
        let courses = self.created_courses.lock().map(|v| v.clone()).unwrap_or_default();
        let events = self.created_events.lock().map(|v| v.clone()).unwrap_or_default();

        // Cascades to progress, certificates and registrations
        sqlx::query("DELETE FROM users WHERE id = ANY($1)")
            .bind(&users)
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM courses WHERE id = ANY($1)")
            .bind(&courses)
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM events WHERE id = ANY($1)")
            .bind(&events)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

async fn insert_user(db: &PgPool, role: UserRole) -> anyhow::Result<User> {
    let user = User::create(
        db,
        CreateUser {
            name: format!("Test {}", role.as_str()),
            email: format!("test-{}@example.com", Uuid::new_v4()),
            password_hash: hash_password(TEST_PASSWORD)?,
            role,
            department: Some("Operations".to_string()),
        },
    )
    .await?;

    Ok(user)
}

fn token_for(config: &Config, user: &User) -> anyhow::Result<String> {
    let claims = Claims::for_user(user, config.token_lifetime());
    Ok(create_token(&claims, &config.jwt.secret)?)
}
