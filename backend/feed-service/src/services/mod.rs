/// Business logic layer for feed-service
///
/// - Post service: post lifecycle, the like toggle, comments and the
///   user-to-posts bookkeeping that goes with them
pub mod posts;

pub use posts::PostService;
