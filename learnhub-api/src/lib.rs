//! # LearnHub API Server Library
//!
//! HTTP/JSON API for the LearnHub learning portal: course catalog, training
//! paths, progress tracking, certificates, events and user administration.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
