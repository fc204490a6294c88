//! penwise HTTP server.
//!
//! This crate wires the assistant services to an axum router:
//! - `POST /analyze` for single-turn message analysis
//! - `POST /threads/turn` and `GET /threads` for conversation threads
//! - `GET /callback` for the sign-in redirect
//!
//! Threads live in Postgres when a database is configured and in memory
//! otherwise.

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, StartupError};
