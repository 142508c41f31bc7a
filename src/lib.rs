//! # Waaed Platform Library
//!
//! Core functionality for the Waaed workforce attendance platform:
//! multi-tenant HTTP API, repositories, background notification
//! dispatcher, and server configuration.

pub mod auth;
pub mod config;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod location;
pub mod models;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod telemetry;
pub use migration;
