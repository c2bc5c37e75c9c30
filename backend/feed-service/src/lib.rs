/// Feed Service Library
///
/// Handles the social feed endpoints: posts with an attached image, the
/// like/dislike toggle, and comments.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `models`: Users, posts, comments and their response shapes
/// - `services`: Business logic layer
/// - `db`: Persistence layer (PostgreSQL and in-memory stores)
/// - `uploads`: Multipart form reading and image storage
/// - `middleware`: Bearer token verification
/// - `validation`: Field rules and sanitization
/// - `routes`: Route table
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod uploads;
pub mod validation;

pub use config::Config;
pub use error::{AppError, Result};
