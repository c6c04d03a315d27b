//! # LearnHub Shared Library
//!
//! This crate contains the domain models, store operations and business rules
//! used by the LearnHub API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `auth`: Password hashing, JWT sessions, reset tokens and request auth context
//! - `db`: Connection pool and embedded migrations
//! - `render`: Document rendering (certificate PDFs)
//! - `mail`: Outbound mail abstraction

pub mod auth;
pub mod db;
pub mod mail;
pub mod models;
pub mod render;

/// Current version of the LearnHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
