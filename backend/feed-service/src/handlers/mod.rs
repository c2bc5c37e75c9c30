/// HTTP handlers for feed endpoints
///
/// - Posts: list, read, create, update, delete, like toggle, comments
/// - Health: liveness and readiness probes
pub mod health;
pub mod posts;

pub use health::{health_check, readiness_check};
pub use posts::{
    add_comment, create_post, delete_post, get_post, get_posts, like_dislike, update_post,
};
