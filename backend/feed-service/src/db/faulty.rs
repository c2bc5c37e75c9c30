//! In-memory store with switchable write failures, for exercising error paths
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use super::{FeedStore, InMemoryFeedStore, StoreError, StoreResult};
use crate::models::{Post, User, UserSummary};

#[derive(Default)]
pub struct FaultyStore {
    pub inner: InMemoryFeedStore,
    pub fail_ping: AtomicBool,
    pub fail_save_post: AtomicBool,
    pub fail_save_user: AtomicBool,
}

fn unavailable() -> StoreError {
    StoreError::Sqlx(sqlx::Error::PoolTimedOut)
}

fn check(flag: &AtomicBool) -> StoreResult<()> {
    if flag.load(Ordering::SeqCst) {
        return Err(unavailable());
    }
    Ok(())
}

#[async_trait]
impl FeedStore for FaultyStore {
    async fn ping(&self) -> StoreResult<()> {
        check(&self.fail_ping)?;
        self.inner.ping().await
    }

    async fn list_posts(&self) -> StoreResult<Vec<Post>> {
        self.inner.list_posts().await
    }

    async fn find_post(&self, post_id: Uuid) -> StoreResult<Option<Post>> {
        self.inner.find_post(post_id).await
    }

    async fn insert_post(&self, post: &Post) -> StoreResult<()> {
        self.inner.insert_post(post).await
    }

    async fn save_post(&self, post: &Post) -> StoreResult<()> {
        check(&self.fail_save_post)?;
        self.inner.save_post(post).await
    }

    async fn delete_post(&self, post_id: Uuid) -> StoreResult<bool> {
        self.inner.delete_post(post_id).await
    }

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        self.inner.find_user(user_id).await
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        check(&self.fail_save_user)?;
        self.inner.save_user(user).await
    }

    async fn find_user_summaries(
        &self,
        user_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, UserSummary>> {
        self.inner.find_user_summaries(user_ids).await
    }
}
