/// Database access layer
///
/// This module provides:
/// - The `FeedStore` seam the service layer talks to
/// - A PostgreSQL implementation built on the post/user repositories
/// - An in-memory implementation for tests and local runs
///
/// Users and posts reference each other without foreign keys; keeping the
/// two sides consistent is the caller's job.
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Post, User, UserSummary};

#[cfg(test)]
pub(crate) mod faulty;
pub mod memory;
pub mod pg;
pub mod post_repo;
pub mod user_repo;

pub use memory::InMemoryFeedStore;
pub use pg::PgFeedStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Cheap round-trip used by readiness checks
    async fn ping(&self) -> StoreResult<()>;

    /// All posts in storage (insertion) order
    async fn list_posts(&self) -> StoreResult<Vec<Post>>;

    async fn find_post(&self, post_id: Uuid) -> StoreResult<Option<Post>>;

    async fn insert_post(&self, post: &Post) -> StoreResult<()>;

    /// Overwrite the mutable fields of an existing post
    async fn save_post(&self, post: &Post) -> StoreResult<()>;

    /// Returns false when nothing was deleted
    async fn delete_post(&self, post_id: Uuid) -> StoreResult<bool>;

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>>;

    /// Insert or overwrite a user record
    async fn save_user(&self, user: &User) -> StoreResult<()>;

    /// Look up the expansion fields for a batch of user ids. Unknown ids are
    /// simply absent from the map.
    async fn find_user_summaries(
        &self,
        user_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, UserSummary>>;
}
