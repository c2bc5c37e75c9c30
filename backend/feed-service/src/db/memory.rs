use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{FeedStore, StoreResult};
use crate::models::{Post, User, UserSummary};

#[derive(Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    // Vec keeps insertion order, which is the listing order
    posts: Vec<Post>,
}

/// Process-local store with the same contract as the PostgreSQL one
#[derive(Default)]
pub struct InMemoryFeedStore {
    inner: RwLock<Collections>,
}

impl InMemoryFeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn post_count(&self) -> usize {
        self.inner.read().await.posts.len()
    }
}

#[async_trait]
impl FeedStore for InMemoryFeedStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn list_posts(&self) -> StoreResult<Vec<Post>> {
        Ok(self.inner.read().await.posts.clone())
    }

    async fn find_post(&self, post_id: Uuid) -> StoreResult<Option<Post>> {
        let guard = self.inner.read().await;
        Ok(guard.posts.iter().find(|p| p.id == post_id).cloned())
    }

    async fn insert_post(&self, post: &Post) -> StoreResult<()> {
        self.inner.write().await.posts.push(post.clone());
        Ok(())
    }

    async fn save_post(&self, post: &Post) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        if let Some(existing) = guard.posts.iter_mut().find(|p| p.id == post.id) {
            *existing = post.clone();
        }
        Ok(())
    }

    async fn delete_post(&self, post_id: Uuid) -> StoreResult<bool> {
        let mut guard = self.inner.write().await;
        let before = guard.posts.len();
        guard.posts.retain(|p| p.id != post_id);
        Ok(guard.posts.len() != before)
    }

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&user_id).cloned())
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .users
            .insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user_summaries(
        &self,
        user_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, UserSummary>> {
        let guard = self.inner.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| guard.users.get(id))
            .map(|user| (user.id, UserSummary::from(user)))
            .collect())
    }
}
